mod context;
pub mod error;
mod hash;
mod mediator;
mod options;
mod stream;

pub use context::*;
pub use hash::*;
pub use mediator::*;
pub use options::*;
pub use stream::*;

pub type DeltaResult<T> = Result<T, error::DeltaError>;
