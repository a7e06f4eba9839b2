//! Pipeline assembly: conditions, compound steps, definitions, and storage.

mod compound;
#[cfg(test)]
mod compound_tests;
mod condition;
mod definition;
mod store;

pub use compound::CompoundProcessor;
pub use condition::{
    AlwaysCondition, Condition, FieldEqualsCondition, FnCondition, HasFieldCondition,
    ScriptCondition,
};
pub use definition::Pipeline;
pub use store::{InMemoryPipelineStore, PipelineResolver};
