use rdf_delta_model::algebra::{
    Expression, GraphPattern, NamedNodePattern, OrderExpression, TermPattern, TriplePattern,
};
use rdf_delta_model::{Bindings, Literal, Term, Variable};

/// Replaces the variables of `operation` that are bound in `bindings` with their values.
///
/// Bound variables are removed from projections. If a variable in a predicate position is bound
/// to a term that is not an IRI, the triple pattern cannot match and the pattern is replaced by an
/// empty `VALUES` clause. Operators that introduce a new scope (e.g., `GROUP BY`) are kept as is;
/// incompatible results are removed when they are merged with the bindings.
pub fn materialize_operation(operation: &GraphPattern, bindings: &Bindings) -> GraphPattern {
    if bindings.is_empty() {
        return operation.clone();
    }
    materialize_pattern(operation, bindings).unwrap_or_else(empty_pattern)
}

fn empty_pattern() -> GraphPattern {
    GraphPattern::Values {
        variables: Vec::new(),
        bindings: Vec::new(),
    }
}

/// Returns [None] if the pattern cannot produce any results.
fn materialize_pattern(pattern: &GraphPattern, bindings: &Bindings) -> Option<GraphPattern> {
    let boxed = |p: &GraphPattern| Box::new(materialize_operation(p, bindings));
    let result = match pattern {
        GraphPattern::Bgp { patterns } => GraphPattern::Bgp {
            patterns: patterns
                .iter()
                .map(|p| materialize_triple_pattern(p, bindings))
                .collect::<Option<_>>()?,
        },
        GraphPattern::Path {
            subject,
            path,
            object,
        } => GraphPattern::Path {
            subject: materialize_term_pattern(subject, bindings),
            path: path.clone(),
            object: materialize_term_pattern(object, bindings),
        },
        GraphPattern::Join { left, right } => GraphPattern::Join {
            left: boxed(left),
            right: boxed(right),
        },
        GraphPattern::LeftJoin {
            left,
            right,
            expression,
        } => GraphPattern::LeftJoin {
            left: boxed(left),
            right: boxed(right),
            expression: expression
                .as_ref()
                .map(|e| materialize_expression(e, bindings)),
        },
        GraphPattern::Filter { expr, inner } => GraphPattern::Filter {
            expr: materialize_expression(expr, bindings),
            inner: boxed(inner),
        },
        GraphPattern::Union { left, right } => GraphPattern::Union {
            left: boxed(left),
            right: boxed(right),
        },
        GraphPattern::Graph { name, inner } => GraphPattern::Graph {
            name: materialize_named_node_pattern(name, bindings)?,
            inner: boxed(inner),
        },
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } => GraphPattern::Extend {
            inner: boxed(inner),
            variable: variable.clone(),
            expression: materialize_expression(expression, bindings),
        },
        GraphPattern::Minus { left, right } => GraphPattern::Minus {
            left: boxed(left),
            right: boxed(right),
        },
        GraphPattern::OrderBy { inner, expression } => GraphPattern::OrderBy {
            inner: boxed(inner),
            expression: expression
                .iter()
                .map(|e| match e {
                    OrderExpression::Asc(e) => {
                        OrderExpression::Asc(materialize_expression(e, bindings))
                    }
                    OrderExpression::Desc(e) => {
                        OrderExpression::Desc(materialize_expression(e, bindings))
                    }
                })
                .collect(),
        },
        GraphPattern::Project { inner, variables } => GraphPattern::Project {
            inner: boxed(inner),
            variables: variables
                .iter()
                .filter(|v| !bindings.contains(v))
                .cloned()
                .collect(),
        },
        GraphPattern::Distinct { inner } => GraphPattern::Distinct {
            inner: boxed(inner),
        },
        GraphPattern::Reduced { inner } => GraphPattern::Reduced {
            inner: boxed(inner),
        },
        GraphPattern::Slice {
            inner,
            start,
            length,
        } => GraphPattern::Slice {
            inner: boxed(inner),
            start: *start,
            length: *length,
        },
        _ => pattern.clone(),
    };
    Some(result)
}

fn materialize_triple_pattern(
    pattern: &TriplePattern,
    bindings: &Bindings,
) -> Option<TriplePattern> {
    Some(TriplePattern {
        subject: materialize_term_pattern(&pattern.subject, bindings),
        predicate: materialize_named_node_pattern(&pattern.predicate, bindings)?,
        object: materialize_term_pattern(&pattern.object, bindings),
    })
}

fn materialize_term_pattern(pattern: &TermPattern, bindings: &Bindings) -> TermPattern {
    let TermPattern::Variable(variable) = pattern else {
        return pattern.clone();
    };
    match bindings.get(variable) {
        Some(Term::NamedNode(node)) => TermPattern::NamedNode(node.clone()),
        Some(Term::BlankNode(node)) => TermPattern::BlankNode(node.clone()),
        Some(Term::Literal(literal)) => TermPattern::Literal(literal.clone()),
        _ => pattern.clone(),
    }
}

fn materialize_named_node_pattern(
    pattern: &NamedNodePattern,
    bindings: &Bindings,
) -> Option<NamedNodePattern> {
    let NamedNodePattern::Variable(variable) = pattern else {
        return Some(pattern.clone());
    };
    match bindings.get(variable) {
        None => Some(pattern.clone()),
        Some(Term::NamedNode(node)) => Some(NamedNodePattern::NamedNode(node.clone())),
        Some(_) => None,
    }
}

fn materialize_variable(variable: &Variable, bindings: &Bindings) -> Expression {
    match bindings.get(variable) {
        Some(Term::NamedNode(node)) => Expression::NamedNode(node.clone()),
        Some(Term::Literal(literal)) => Expression::Literal(literal.clone()),
        _ => Expression::Variable(variable.clone()),
    }
}

fn materialize_expression(expression: &Expression, bindings: &Bindings) -> Expression {
    let boxed = |e: &Expression| Box::new(materialize_expression(e, bindings));
    let all = |e: &[Expression]| {
        e.iter()
            .map(|e| materialize_expression(e, bindings))
            .collect::<Vec<_>>()
    };
    match expression {
        Expression::NamedNode(_) | Expression::Literal(_) => expression.clone(),
        Expression::Variable(variable) => materialize_variable(variable, bindings),
        Expression::Bound(variable) => {
            if bindings.contains(variable) {
                Expression::Literal(Literal::from(true))
            } else {
                expression.clone()
            }
        }
        Expression::Or(lhs, rhs) => Expression::Or(boxed(lhs), boxed(rhs)),
        Expression::And(lhs, rhs) => Expression::And(boxed(lhs), boxed(rhs)),
        Expression::Equal(lhs, rhs) => Expression::Equal(boxed(lhs), boxed(rhs)),
        Expression::SameTerm(lhs, rhs) => Expression::SameTerm(boxed(lhs), boxed(rhs)),
        Expression::Greater(lhs, rhs) => Expression::Greater(boxed(lhs), boxed(rhs)),
        Expression::GreaterOrEqual(lhs, rhs) => {
            Expression::GreaterOrEqual(boxed(lhs), boxed(rhs))
        }
        Expression::Less(lhs, rhs) => Expression::Less(boxed(lhs), boxed(rhs)),
        Expression::LessOrEqual(lhs, rhs) => Expression::LessOrEqual(boxed(lhs), boxed(rhs)),
        Expression::In(lhs, rhs) => Expression::In(boxed(lhs), all(rhs)),
        Expression::Add(lhs, rhs) => Expression::Add(boxed(lhs), boxed(rhs)),
        Expression::Subtract(lhs, rhs) => Expression::Subtract(boxed(lhs), boxed(rhs)),
        Expression::Multiply(lhs, rhs) => Expression::Multiply(boxed(lhs), boxed(rhs)),
        Expression::Divide(lhs, rhs) => Expression::Divide(boxed(lhs), boxed(rhs)),
        Expression::UnaryPlus(inner) => Expression::UnaryPlus(boxed(inner)),
        Expression::UnaryMinus(inner) => Expression::UnaryMinus(boxed(inner)),
        Expression::Not(inner) => Expression::Not(boxed(inner)),
        Expression::Exists(pattern) => {
            Expression::Exists(Box::new(materialize_operation(pattern, bindings)))
        }
        Expression::If(condition, then, otherwise) => {
            Expression::If(boxed(condition), boxed(then), boxed(otherwise))
        }
        Expression::Coalesce(inner) => Expression::Coalesce(all(inner)),
        Expression::FunctionCall(function, args) => {
            Expression::FunctionCall(function.clone(), all(args))
        }
    }
}
