//! Incremental inner joins.
//!
//! - [PartialHashJoin] joins two streams with symmetric bucket memories.
//! - [BindJoin] evaluates the remaining entry once per binding of the driving entry.
//! - [MultiBindJoin] does the same for multiple remaining entries and remembers the results of
//!   each sub-evaluation.

mod bind;
mod entry;
mod inner;
mod materialize;
mod multi_bind;
mod partial_hash;
mod sort;

pub use bind::BindJoin;
pub use entry::{JoinCoefficients, JoinEntry};
pub use inner::{IncrementalInnerJoinStream, IncrementalJoinState, JoinSide};
pub use materialize::materialize_operation;
pub use multi_bind::MultiBindJoin;
pub use partial_hash::PartialHashJoin;
pub use sort::{sort_join_entries, CardinalityJoinEntriesSort, JoinEntriesSort};
