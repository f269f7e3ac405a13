use rdf_delta_model::vocab::xsd;
use rdf_delta_model::{Literal, Numeric, Term};
use std::cmp::Ordering;

/// Compares two terms with the SPARQL `ORDER BY` ordering.
///
/// Blank nodes come before IRIs, which come before literals. Literals of comparable datatypes are
/// compared by their value. All remaining ties are broken by the lexical form, the datatype, and
/// the language, so the result is a total order.
pub fn compare_terms(lhs: &Term, rhs: &Term) -> Ordering {
    match (lhs, rhs) {
        (Term::BlankNode(lhs), Term::BlankNode(rhs)) => lhs.as_str().cmp(rhs.as_str()),
        (Term::BlankNode(_), _) => Ordering::Less,
        (_, Term::BlankNode(_)) => Ordering::Greater,
        (Term::NamedNode(lhs), Term::NamedNode(rhs)) => lhs.as_str().cmp(rhs.as_str()),
        (Term::NamedNode(_), _) => Ordering::Less,
        (_, Term::NamedNode(_)) => Ordering::Greater,
        (Term::Literal(lhs), Term::Literal(rhs)) => compare_literals(lhs, rhs),
        #[allow(unreachable_patterns)]
        _ => lhs.to_string().cmp(&rhs.to_string()),
    }
}

fn compare_literals(lhs: &Literal, rhs: &Literal) -> Ordering {
    let by_value = partial_cmp_literal_values(lhs, rhs).unwrap_or(Ordering::Equal);
    by_value.then_with(|| {
        (lhs.value(), lhs.datatype(), lhs.language()).cmp(&(
            rhs.value(),
            rhs.datatype(),
            rhs.language(),
        ))
    })
}

fn partial_cmp_literal_values(lhs: &Literal, rhs: &Literal) -> Option<Ordering> {
    if let (Ok(lhs), Ok(rhs)) = (
        Numeric::from_literal(lhs.as_ref()),
        Numeric::from_literal(rhs.as_ref()),
    ) {
        return lhs.partial_cmp(&rhs);
    }

    if is_string(lhs) && is_string(rhs) {
        return Some(lhs.value().cmp(rhs.value()));
    }

    if lhs.datatype() == xsd::BOOLEAN && rhs.datatype() == xsd::BOOLEAN {
        let lhs = lhs.value().parse::<bool>().ok()?;
        let rhs = rhs.value().parse::<bool>().ok()?;
        return Some(lhs.cmp(&rhs));
    }

    None
}

fn is_string(literal: &Literal) -> bool {
    literal.datatype() == xsd::STRING && literal.language().is_none()
}
