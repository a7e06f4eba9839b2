//! The mutable document flowing through a pipeline.

use super::metadata::DocumentMetadata;
use super::path;
use crate::errors::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document being transformed by a pipeline.
///
/// The body is a tree of string-keyed fields addressed by dotted paths
/// (`user.address.city`). Numeric segments index into sequences (`tags.0`).
/// Alongside the body travels a [`DocumentMetadata`] envelope that exists for
/// the whole life of the document.
///
/// A document is owned by exactly one execution at a time: each step receives
/// the document, mutates it in place, and passes it on. Reads of missing
/// fields fail with [`DocumentError::FieldNotFound`]; writes create missing
/// intermediate objects on the way to the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestDocument {
    source: Map<String, Value>,
    metadata: DocumentMetadata,
}

impl IngestDocument {
    /// Creates an empty document with a fresh envelope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: Map::new(),
            metadata: DocumentMetadata::new(),
        }
    }

    /// Creates a document from an existing field tree.
    #[must_use]
    pub fn from_source(source: Map<String, Value>) -> Self {
        Self {
            source,
            metadata: DocumentMetadata::new(),
        }
    }

    /// Sets the destination index on the envelope.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.metadata.index = Some(index.into());
        self
    }

    /// Sets the document id on the envelope.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.id = Some(id.into());
        self
    }

    /// Sets the routing value on the envelope.
    #[must_use]
    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.metadata.routing = Some(routing.into());
        self
    }

    /// The document's field tree.
    #[must_use]
    pub fn source(&self) -> &Map<String, Value> {
        &self.source
    }

    /// Mutable access to the field tree, bypassing path resolution.
    pub fn source_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.source
    }

    /// Consumes the document, returning the field tree as a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.source)
    }

    /// The metadata envelope.
    #[must_use]
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Mutable access to the metadata envelope.
    pub fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }

    /// Reads the value at a dotted path.
    pub fn get(&self, field_path: &str) -> Result<&Value, DocumentError> {
        let segments = path::split(field_path)?;
        let (first, rest) = match segments.split_first() {
            Some(parts) => parts,
            None => return Err(DocumentError::invalid_path(field_path, "path is empty")),
        };

        let mut current = self
            .source
            .get(*first)
            .ok_or_else(|| DocumentError::field_not_found(field_path))?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map
                    .get(*segment)
                    .ok_or_else(|| DocumentError::field_not_found(field_path))?,
                Value::Array(items) => {
                    let index = path::parse_index(segment, field_path)?;
                    items
                        .get(index)
                        .ok_or_else(|| DocumentError::field_not_found(field_path))?
                }
                other => {
                    return Err(DocumentError::type_conflict(
                        field_path,
                        *segment,
                        path::type_name(other),
                    ))
                }
            };
        }
        Ok(current)
    }

    /// Mutable access to the value at a dotted path.
    ///
    /// Unlike [`set`](Self::set), this never creates missing intermediates.
    pub fn get_mut(&mut self, field_path: &str) -> Result<&mut Value, DocumentError> {
        let segments = path::split(field_path)?;
        let (first, rest) = match segments.split_first() {
            Some(parts) => parts,
            None => return Err(DocumentError::invalid_path(field_path, "path is empty")),
        };

        let mut current = self
            .source
            .get_mut(*first)
            .ok_or_else(|| DocumentError::field_not_found(field_path))?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map
                    .get_mut(*segment)
                    .ok_or_else(|| DocumentError::field_not_found(field_path))?,
                Value::Array(items) => {
                    let index = path::parse_index(segment, field_path)?;
                    items
                        .get_mut(index)
                        .ok_or_else(|| DocumentError::field_not_found(field_path))?
                }
                other => {
                    return Err(DocumentError::type_conflict(
                        field_path,
                        *segment,
                        path::type_name(other),
                    ))
                }
            };
        }
        Ok(current)
    }

    /// Reads the string at a dotted path.
    pub fn get_str(&self, field_path: &str) -> Result<&str, DocumentError> {
        let value = self.get(field_path)?;
        value.as_str().ok_or_else(|| {
            let last = field_path.rsplit('.').next().unwrap_or(field_path);
            DocumentError::type_conflict(field_path, last, path::type_name(value))
        })
    }

    /// Whether a dotted path resolves to a value.
    #[must_use]
    pub fn has(&self, field_path: &str) -> bool {
        self.get(field_path).is_ok()
    }

    /// Writes a value at a dotted path.
    ///
    /// Missing intermediate objects are created; traversing an existing
    /// non-container value fails with [`DocumentError::TypeConflict`].
    /// Writing into a sequence replaces in range, or extends by one when the
    /// index equals the current length.
    pub fn set(&mut self, field_path: &str, value: impl Into<Value>) -> Result<(), DocumentError> {
        let segments = path::split(field_path)?;
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => return Err(DocumentError::invalid_path(field_path, "path is empty")),
        };
        let value = value.into();

        let (first, rest) = match parents.split_first() {
            Some(parts) => parts,
            None => {
                self.source.insert((*last).to_string(), value);
                return Ok(());
            }
        };

        let mut current: &mut Value = self
            .source
            .entry((*first).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        for segment in rest {
            current = match current {
                Value::Object(map) => map
                    .entry((*segment).to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(items) => {
                    let index = path::parse_index(segment, field_path)?;
                    let len = items.len();
                    items.get_mut(index).ok_or_else(|| {
                        DocumentError::invalid_path(
                            field_path,
                            format!("index {index} out of bounds for sequence of length {len}"),
                        )
                    })?
                }
                other => {
                    return Err(DocumentError::type_conflict(
                        field_path,
                        *segment,
                        path::type_name(other),
                    ))
                }
            };
        }

        match current {
            Value::Object(map) => {
                map.insert((*last).to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let index = path::parse_index(last, field_path)?;
                let len = items.len();
                if index < len {
                    items[index] = value;
                    Ok(())
                } else if index == len {
                    items.push(value);
                    Ok(())
                } else {
                    Err(DocumentError::invalid_path(
                        field_path,
                        format!("index {index} out of bounds for sequence of length {len}"),
                    ))
                }
            }
            other => Err(DocumentError::type_conflict(
                field_path,
                *last,
                path::type_name(other),
            )),
        }
    }

    /// Removes and returns the value at a dotted path.
    pub fn remove(&mut self, field_path: &str) -> Result<Value, DocumentError> {
        let segments = path::split(field_path)?;
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => return Err(DocumentError::invalid_path(field_path, "path is empty")),
        };

        let (first, rest) = match parents.split_first() {
            Some(parts) => parts,
            None => {
                return self
                    .source
                    .remove(*last)
                    .ok_or_else(|| DocumentError::field_not_found(field_path));
            }
        };

        let mut current = self
            .source
            .get_mut(*first)
            .ok_or_else(|| DocumentError::field_not_found(field_path))?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map
                    .get_mut(*segment)
                    .ok_or_else(|| DocumentError::field_not_found(field_path))?,
                Value::Array(items) => {
                    let index = path::parse_index(segment, field_path)?;
                    items
                        .get_mut(index)
                        .ok_or_else(|| DocumentError::field_not_found(field_path))?
                }
                other => {
                    return Err(DocumentError::type_conflict(
                        field_path,
                        *segment,
                        path::type_name(other),
                    ))
                }
            };
        }

        match current {
            Value::Object(map) => map
                .remove(*last)
                .ok_or_else(|| DocumentError::field_not_found(field_path)),
            Value::Array(items) => {
                let index = path::parse_index(last, field_path)?;
                if index < items.len() {
                    Ok(items.remove(index))
                } else {
                    Err(DocumentError::field_not_found(field_path))
                }
            }
            other => Err(DocumentError::type_conflict(
                field_path,
                *last,
                path::type_name(other),
            )),
        }
    }

    /// Appends a value to the sequence at a dotted path.
    ///
    /// A missing field becomes a one-element sequence, an existing scalar is
    /// promoted to a sequence holding the old and new values, and appending a
    /// sequence appends each of its elements.
    pub fn append(&mut self, field_path: &str, value: impl Into<Value>) -> Result<(), DocumentError> {
        let value = value.into();

        if !self.has(field_path) {
            let initial = match value {
                Value::Array(items) => Value::Array(items),
                single => Value::Array(vec![single]),
            };
            return self.set(field_path, initial);
        }

        let current = self.get_mut(field_path)?;
        match current {
            Value::Array(items) => match value {
                Value::Array(mut new_items) => items.append(&mut new_items),
                single => items.push(single),
            },
            other => {
                let existing = other.take();
                let mut items = vec![existing];
                match value {
                    Value::Array(mut new_items) => items.append(&mut new_items),
                    single => items.push(single),
                }
                *other = Value::Array(items);
            }
        }
        Ok(())
    }
}
