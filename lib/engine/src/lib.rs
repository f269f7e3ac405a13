//! The entry point of RDF Delta.
//!
//! The [IncrementalEngine] evaluates operation requests with the incremental operators of
//! `rdf-delta-physical`. Inner joins are delegated to the [JoinActor] with the lowest estimated
//! cost.

mod actor;
mod engine;
mod options;
mod request;

pub use actor::{BindJoinActor, JoinActor, MultiBindJoinActor, PartialHashJoinActor};
pub use engine::IncrementalEngine;
pub use options::EngineOptions;
pub use request::{OperationOutput, OperationRequest, PhysicalPlanMetadata};
