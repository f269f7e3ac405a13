use crate::xsd::is_integer_datatype;
use crate::{ThinError, ThinResult};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, LiteralRef, Term};
use oxsdatatypes::{Decimal, Double, Float, Integer};
use std::cmp::Ordering;

/// The numeric datatypes, ordered by the XSD type promotion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericKind {
    Integer,
    Decimal,
    Float,
    Double,
}

/// A numeric value of one of the four primitive XSD numeric datatypes.
///
/// Derived integer datatypes (e.g., `xsd:byte`) are read as [Numeric::Integer].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

impl Numeric {
    /// Parses a numeric literal. Fails for non-numeric datatypes and invalid lexical forms.
    pub fn from_literal(literal: LiteralRef<'_>) -> ThinResult<Self> {
        let datatype = literal.datatype();
        let value = literal.value();
        if is_integer_datatype(datatype) {
            Ok(Numeric::Integer(value.parse()?))
        } else if datatype == xsd::DECIMAL {
            Ok(Numeric::Decimal(value.parse()?))
        } else if datatype == xsd::FLOAT {
            Ok(Numeric::Float(value.parse()?))
        } else if datatype == xsd::DOUBLE {
            Ok(Numeric::Double(value.parse()?))
        } else {
            ThinError::expected()
        }
    }

    /// Parses a numeric term. Only literals can be numeric.
    pub fn from_term(term: &Term) -> ThinResult<Self> {
        match term {
            Term::Literal(literal) => Self::from_literal(literal.as_ref()),
            _ => ThinError::expected(),
        }
    }

    pub fn kind(self) -> NumericKind {
        match self {
            Numeric::Integer(_) => NumericKind::Integer,
            Numeric::Decimal(_) => NumericKind::Decimal,
            Numeric::Float(_) => NumericKind::Float,
            Numeric::Double(_) => NumericKind::Double,
        }
    }

    #[must_use]
    pub fn format_value(&self) -> String {
        match self {
            Numeric::Integer(value) => value.to_string(),
            Numeric::Decimal(value) => value.to_string(),
            Numeric::Float(value) => value.to_string(),
            Numeric::Double(value) => value.to_string(),
        }
    }

    /// Converts the value into a typed literal of its datatype.
    pub fn into_literal(self) -> Literal {
        let datatype = match self {
            Numeric::Integer(_) => xsd::INTEGER,
            Numeric::Decimal(_) => xsd::DECIMAL,
            Numeric::Float(_) => xsd::FLOAT,
            Numeric::Double(_) => xsd::DOUBLE,
        };
        Literal::new_typed_literal(self.format_value(), datatype)
    }

    /// Casts the value to the given kind. Casting to a narrower kind is not supported.
    pub fn cast_to(self, kind: NumericKind) -> ThinResult<Self> {
        let result = match (self, kind) {
            (value, kind) if value.kind() == kind => value,
            (Numeric::Integer(value), NumericKind::Decimal) => Numeric::Decimal(value.into()),
            (Numeric::Integer(value), NumericKind::Float) => Numeric::Float(value.into()),
            (Numeric::Integer(value), NumericKind::Double) => Numeric::Double(value.into()),
            (Numeric::Decimal(value), NumericKind::Float) => Numeric::Float(value.into()),
            (Numeric::Decimal(value), NumericKind::Double) => Numeric::Double(value.into()),
            (Numeric::Float(value), NumericKind::Double) => Numeric::Double(value.into()),
            _ => return ThinError::expected(),
        };
        Ok(result)
    }

    pub fn checked_add(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_add(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_add(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs + rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs + rhs)),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_sub(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_sub(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_sub(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs - rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs - rhs)),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_mul(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_mul(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_mul(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs * rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs * rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// Divides two numerics. Dividing two integers yields a decimal.
    pub fn checked_div(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => Decimal::from(lhs)
                .checked_div(rhs)
                .map(Numeric::Decimal),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_div(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs / rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs / rhs)),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_neg(self) -> ThinResult<Numeric> {
        match self {
            Numeric::Integer(value) => value.checked_neg().map(Numeric::Integer),
            Numeric::Decimal(value) => value.checked_neg().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(-value)),
            Numeric::Double(value) => Some(Numeric::Double(-value)),
        }
        .ok_or(ThinError::default())
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match NumericPair::with_casts_from(*self, *other) {
            NumericPair::Integer(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Decimal(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Float(lhs, rhs) => lhs.partial_cmp(&rhs),
            NumericPair::Double(lhs, rhs) => lhs.partial_cmp(&rhs),
        }
    }
}

/// Two numerics promoted to their common datatype.
pub enum NumericPair {
    Integer(Integer, Integer),
    Decimal(Decimal, Decimal),
    Float(Float, Float),
    Double(Double, Double),
}

impl NumericPair {
    pub fn with_casts_from(lhs: Numeric, rhs: Numeric) -> NumericPair {
        match (lhs, rhs) {
            (Numeric::Integer(lhs), Numeric::Integer(rhs)) => NumericPair::Integer(lhs, rhs),
            (Numeric::Integer(lhs), Numeric::Decimal(rhs)) => {
                NumericPair::Decimal(Decimal::from(lhs), rhs)
            }
            (Numeric::Integer(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs.into(), rhs),
            (Numeric::Integer(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs.into(), rhs),

            (Numeric::Decimal(lhs), Numeric::Integer(rhs)) => NumericPair::Decimal(lhs, rhs.into()),
            (Numeric::Decimal(lhs), Numeric::Decimal(rhs)) => NumericPair::Decimal(lhs, rhs),
            (Numeric::Decimal(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs.into(), rhs),
            (Numeric::Decimal(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs.into(), rhs),

            (Numeric::Float(lhs), Numeric::Integer(rhs)) => NumericPair::Float(lhs, rhs.into()),
            (Numeric::Float(lhs), Numeric::Decimal(rhs)) => NumericPair::Float(lhs, rhs.into()),
            (Numeric::Float(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs, rhs),
            (Numeric::Float(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs.into(), rhs),

            (Numeric::Double(lhs), Numeric::Integer(rhs)) => NumericPair::Double(lhs, rhs.into()),
            (Numeric::Double(lhs), Numeric::Decimal(rhs)) => NumericPair::Double(lhs, rhs.into()),
            (Numeric::Double(lhs), Numeric::Float(rhs)) => NumericPair::Double(lhs, rhs.into()),
            (Numeric::Double(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs, rhs),
        }
    }
}
