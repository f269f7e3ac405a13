use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::algebra::Expression;
use rdf_delta_model::vocab::xsd;
use rdf_delta_model::{Bindings, Decimal, Literal, Numeric, Term, ThinError, ThinResult, Variable};
use std::fmt::Debug;
use std::sync::Arc;

/// A reference-counted pointer to an [ExpressionEvaluatorFactory].
pub type ExpressionEvaluatorFactoryRef = Arc<dyn ExpressionEvaluatorFactory>;

/// Evaluates an expression against a single [Bindings].
pub trait ExpressionEvaluator: Debug + Send + Sync {
    /// Returns a [ThinError] if the expression has no value for `bindings` (e.g., due to a type
    /// error or an unbound variable).
    fn evaluate(&self, bindings: &Bindings) -> ThinResult<Term>;
}

/// Creates [ExpressionEvaluator]s for the input expressions of aggregates.
pub trait ExpressionEvaluatorFactory: Debug + Send + Sync {
    fn create_evaluator(&self, expression: &Expression)
        -> DeltaResult<Arc<dyn ExpressionEvaluator>>;
}

/// Supports variables, constants, arithmetic, `BOUND`, `IF`, and `COALESCE`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultExpressionEvaluatorFactory;

impl ExpressionEvaluatorFactory for DefaultExpressionEvaluatorFactory {
    fn create_evaluator(
        &self,
        expression: &Expression,
    ) -> DeltaResult<Arc<dyn ExpressionEvaluator>> {
        Ok(Arc::new(TermExpression::try_from_expression(expression)?))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum TermExpression {
    Constant(Term),
    Variable(Variable),
    Bound(Variable),
    Add(Box<TermExpression>, Box<TermExpression>),
    Subtract(Box<TermExpression>, Box<TermExpression>),
    Multiply(Box<TermExpression>, Box<TermExpression>),
    Divide(Box<TermExpression>, Box<TermExpression>),
    UnaryPlus(Box<TermExpression>),
    UnaryMinus(Box<TermExpression>),
    If(Box<TermExpression>, Box<TermExpression>, Box<TermExpression>),
    Coalesce(Vec<TermExpression>),
}

impl TermExpression {
    fn try_from_expression(expression: &Expression) -> DeltaResult<Self> {
        let boxed = |e: &Expression| Self::try_from_expression(e).map(Box::new);
        Ok(match expression {
            Expression::NamedNode(node) => TermExpression::Constant(node.clone().into()),
            Expression::Literal(literal) => TermExpression::Constant(literal.clone().into()),
            Expression::Variable(variable) => TermExpression::Variable(variable.clone()),
            Expression::Bound(variable) => TermExpression::Bound(variable.clone()),
            Expression::Add(lhs, rhs) => TermExpression::Add(boxed(lhs)?, boxed(rhs)?),
            Expression::Subtract(lhs, rhs) => TermExpression::Subtract(boxed(lhs)?, boxed(rhs)?),
            Expression::Multiply(lhs, rhs) => TermExpression::Multiply(boxed(lhs)?, boxed(rhs)?),
            Expression::Divide(lhs, rhs) => TermExpression::Divide(boxed(lhs)?, boxed(rhs)?),
            Expression::UnaryPlus(inner) => TermExpression::UnaryPlus(boxed(inner)?),
            Expression::UnaryMinus(inner) => TermExpression::UnaryMinus(boxed(inner)?),
            Expression::If(condition, then, otherwise) => {
                TermExpression::If(boxed(condition)?, boxed(then)?, boxed(otherwise)?)
            }
            Expression::Coalesce(inner) => TermExpression::Coalesce(
                inner
                    .iter()
                    .map(Self::try_from_expression)
                    .collect::<DeltaResult<_>>()?,
            ),
            _ => return Err(DeltaError::UnsupportedExpression(expression.to_string())),
        })
    }

    fn evaluate_numeric(&self, bindings: &Bindings) -> ThinResult<Numeric> {
        Numeric::from_term(&self.evaluate(bindings)?)
    }

    fn evaluate_arithmetic(
        bindings: &Bindings,
        lhs: &TermExpression,
        rhs: &TermExpression,
        op: impl Fn(Numeric, Numeric) -> ThinResult<Numeric>,
    ) -> ThinResult<Term> {
        let lhs = lhs.evaluate_numeric(bindings)?;
        let rhs = rhs.evaluate_numeric(bindings)?;
        Ok(op(lhs, rhs)?.into_literal().into())
    }
}

impl ExpressionEvaluator for TermExpression {
    fn evaluate(&self, bindings: &Bindings) -> ThinResult<Term> {
        match self {
            TermExpression::Constant(term) => Ok(term.clone()),
            TermExpression::Variable(variable) => {
                bindings.get(variable).cloned().ok_or(ThinError::default())
            }
            TermExpression::Bound(variable) => {
                Ok(Literal::from(bindings.contains(variable)).into())
            }
            TermExpression::Add(lhs, rhs) => {
                Self::evaluate_arithmetic(bindings, lhs, rhs, Numeric::checked_add)
            }
            TermExpression::Subtract(lhs, rhs) => {
                Self::evaluate_arithmetic(bindings, lhs, rhs, Numeric::checked_sub)
            }
            TermExpression::Multiply(lhs, rhs) => {
                Self::evaluate_arithmetic(bindings, lhs, rhs, Numeric::checked_mul)
            }
            TermExpression::Divide(lhs, rhs) => {
                Self::evaluate_arithmetic(bindings, lhs, rhs, Numeric::checked_div)
            }
            TermExpression::UnaryPlus(inner) => {
                Ok(inner.evaluate_numeric(bindings)?.into_literal().into())
            }
            TermExpression::UnaryMinus(inner) => Ok(inner
                .evaluate_numeric(bindings)?
                .checked_neg()?
                .into_literal()
                .into()),
            TermExpression::If(condition, then, otherwise) => {
                if effective_boolean_value(&condition.evaluate(bindings)?)? {
                    then.evaluate(bindings)
                } else {
                    otherwise.evaluate(bindings)
                }
            }
            TermExpression::Coalesce(inner) => inner
                .iter()
                .find_map(|e| e.evaluate(bindings).ok())
                .ok_or(ThinError::default()),
        }
    }
}

/// Computes the effective boolean value of a term.
fn effective_boolean_value(term: &Term) -> ThinResult<bool> {
    let Term::Literal(literal) = term else {
        return ThinError::expected();
    };

    if literal.datatype() == xsd::BOOLEAN {
        return match literal.value() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => ThinError::expected(),
        };
    }
    if literal.datatype() == xsd::STRING {
        return Ok(!literal.value().is_empty());
    }

    match Numeric::from_literal(literal.as_ref())? {
        Numeric::Integer(value) => Ok(i64::from(value) != 0),
        Numeric::Decimal(value) => Ok(value != Decimal::from(0_i64)),
        Numeric::Float(value) => {
            let value = f32::from(value);
            Ok(value != 0.0 && !value.is_nan())
        }
        Numeric::Double(value) => {
            let value = f64::from(value);
            Ok(value != 0.0 && !value.is_nan())
        }
    }
}
