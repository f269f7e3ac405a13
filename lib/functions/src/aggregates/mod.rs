//! Incremental aggregates.
//!
//! Contrary to regular SPARQL aggregates, an incremental aggregate must also support removing a
//! previously added value. Each aggregate consists of two parts:
//! - An [IncrementalAccumulator] that maintains the aggregate state over terms.
//! - A [BindingsAggregator] that evaluates the aggregate input for a [Bindings] and feeds the
//!   result into the accumulator.

mod avg;
mod count;
mod extremum;
mod group_concat;
mod multiset;
mod sample;
mod sum;
mod wildcard_count;

pub use avg::AvgAccumulator;
pub use count::CountAccumulator;
pub use extremum::ExtremumAccumulator;
pub use group_concat::GroupConcatAccumulator;
pub use multiset::Multiset;
pub use sample::SampleAccumulator;
pub use sum::SumAccumulator;
pub use wildcard_count::WildcardCountAggregator;

use crate::ExpressionEvaluator;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::vocab::xsd;
use rdf_delta_model::{Bindings, Literal, Term, ThinResult};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::trace;

/// Maintains the state of an aggregate over a multiset of terms.
pub trait IncrementalAccumulator: Debug + Send {
    /// Adds a value to the aggregate. Returns a [ThinError](rdf_delta_model::ThinError) if the
    /// value is not valid for this aggregate, in which case the state is unchanged.
    fn addition(&mut self, value: &Term) -> ThinResult<()>;

    /// Removes a previously added value from the aggregate.
    ///
    /// Values that would have been rejected by [Self::addition] are ignored. Removing a valid
    /// value that is not part of the aggregate is an error.
    fn deletion(&mut self, value: &Term) -> DeltaResult<()>;

    /// Returns the current value of the aggregate or [None] if it is unbound.
    fn current_value(&self) -> Option<Term>;
}

/// An aggregate over the bindings of a single group.
pub trait BindingsAggregator: Debug + Send {
    fn put(&mut self, bindings: &Bindings) -> DeltaResult<()>;

    fn remove(&mut self, bindings: &Bindings) -> DeltaResult<()>;

    fn result(&self) -> Option<Term>;
}

/// Evaluates an expression and feeds the results into an [IncrementalAccumulator].
///
/// Bindings for which the expression fails to evaluate are ignored. As evaluation is
/// deterministic, the removal of such bindings is ignored as well.
#[derive(Debug)]
pub struct ExpressionAggregator {
    evaluator: Arc<dyn ExpressionEvaluator>,
    distinct: Option<Multiset<Term>>,
    accumulator: Box<dyn IncrementalAccumulator>,
}

impl ExpressionAggregator {
    pub fn new(
        evaluator: Arc<dyn ExpressionEvaluator>,
        accumulator: Box<dyn IncrementalAccumulator>,
        distinct: bool,
    ) -> Self {
        Self {
            evaluator,
            distinct: distinct.then(Multiset::default),
            accumulator,
        }
    }
}

impl BindingsAggregator for ExpressionAggregator {
    fn put(&mut self, bindings: &Bindings) -> DeltaResult<()> {
        let Ok(value) = self.evaluator.evaluate(bindings) else {
            trace!(%bindings, "Aggregate input could not be evaluated");
            return Ok(());
        };

        if let Some(distinct) = &mut self.distinct {
            if !distinct.insert(value.clone()) {
                return Ok(());
            }
        }

        if self.accumulator.addition(&value).is_err() {
            trace!(%value, "Value rejected by accumulator");
        }
        Ok(())
    }

    fn remove(&mut self, bindings: &Bindings) -> DeltaResult<()> {
        let Ok(value) = self.evaluator.evaluate(bindings) else {
            return Ok(());
        };

        if let Some(distinct) = &mut self.distinct {
            if !distinct.remove(&value)? {
                return Ok(());
            }
        }

        self.accumulator.deletion(&value)
    }

    fn result(&self) -> Option<Term> {
        self.accumulator.current_value()
    }
}

/// Creates an `xsd:integer` term, used for counts.
fn integer_term(value: u64) -> Term {
    Literal::new_typed_literal(value.to_string(), xsd::INTEGER).into()
}
