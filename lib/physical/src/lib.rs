//! Contains the incremental physical operators of RDF Delta.
//!
//! All operators consume and produce streams of [SignedBindings](rdf_delta_model::SignedBindings).
//! Each operator keeps the state that is necessary to turn the changes of its inputs into the
//! changes of its output.

mod bucket;
pub mod group;
pub mod join;

pub use bucket::BucketMemory;
