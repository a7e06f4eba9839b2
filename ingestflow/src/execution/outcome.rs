//! Terminal outcomes of a pipeline execution.

use crate::document::IngestDocument;
use crate::errors::IngestError;

/// The terminal outcome of running a document through a pipeline.
///
/// Every execution produces exactly one outcome, reported only after all the
/// steps that ran have finished.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The pipeline completed and the transformed document survives.
    Kept(IngestDocument),
    /// A processor discarded the document on purpose.
    Dropped,
    /// The execution failed with an error nothing handled.
    Failed(IngestError),
}

impl PipelineOutcome {
    /// Whether the document survived.
    #[must_use]
    pub const fn is_kept(&self) -> bool {
        matches!(self, Self::Kept(_))
    }

    /// Whether the document was discarded.
    #[must_use]
    pub const fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }

    /// Whether the execution failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The surviving document, if any.
    #[must_use]
    pub const fn document(&self) -> Option<&IngestDocument> {
        match self {
            Self::Kept(document) => Some(document),
            _ => None,
        }
    }

    /// Consumes the outcome, returning the surviving document, if any.
    #[must_use]
    pub fn into_document(self) -> Option<IngestDocument> {
        match self {
            Self::Kept(document) => Some(document),
            _ => None,
        }
    }

    /// The failure, if the execution failed.
    #[must_use]
    pub const fn error(&self) -> Option<&IngestError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProcessorError;

    #[test]
    fn test_outcome_predicates() {
        let kept = PipelineOutcome::Kept(IngestDocument::new());
        assert!(kept.is_kept());
        assert!(kept.document().is_some());
        assert!(kept.error().is_none());

        let dropped = PipelineOutcome::Dropped;
        assert!(dropped.is_dropped());
        assert!(dropped.document().is_none());

        let failed = PipelineOutcome::Failed(ProcessorError::new("set", "boom").into());
        assert!(failed.is_failed());
        assert!(failed.error().is_some());
        assert!(failed.into_document().is_none());
    }
}
