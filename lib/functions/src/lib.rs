pub mod aggregates;
mod expression;
mod name;
mod order;
mod registry;

pub use expression::*;
pub use name::*;
pub use order::*;
pub use registry::*;
