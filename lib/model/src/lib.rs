mod bindings;
mod error;
mod signed;
mod xsd;

pub use bindings::*;
pub use error::*;
pub use signed::*;
pub use xsd::*;

// Re-export some oxrdf types.
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Literal, LiteralRef, NamedNode, NamedNodeRef, Term, TermRef, Triple,
    Variable, VariableRef,
};
pub use oxsdatatypes::{Boolean, Decimal, Double, Float, Integer};

// Re-export the algebra types that operators consume.
pub mod algebra {
    pub use spargebra::algebra::{
        AggregateExpression, AggregateFunction, Expression, Function, GraphPattern,
        OrderExpression, PropertyPathExpression,
    };
    pub use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};
}
