use crate::aggregates::IncrementalAccumulator;
use itertools::Itertools;
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::{Literal, Term, ThinError, ThinResult};

/// `GROUP_CONCAT(expr; SEPARATOR = sep)`
///
/// Concatenates the lexical forms of the literals in the order of their addition. If all values
/// share the same language tag, the result carries this tag. The default separator is a single
/// space.
#[derive(Debug)]
pub struct GroupConcatAccumulator {
    separator: String,
    values: Vec<(String, Option<String>)>,
}

impl GroupConcatAccumulator {
    pub const DEFAULT_SEPARATOR: &'static str = " ";

    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            values: Vec::new(),
        }
    }

    fn to_entry(value: &Term) -> ThinResult<(String, Option<String>)> {
        match value {
            Term::Literal(literal) => Ok((
                literal.value().to_owned(),
                literal.language().map(ToOwned::to_owned),
            )),
            _ => ThinError::expected(),
        }
    }

    fn common_language(&self) -> Option<&str> {
        let (_, first) = self.values.first()?;
        let first = first.as_deref()?;
        self.values
            .iter()
            .all(|(_, language)| language.as_deref() == Some(first))
            .then_some(first)
    }
}

impl Default for GroupConcatAccumulator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEPARATOR)
    }
}

impl IncrementalAccumulator for GroupConcatAccumulator {
    fn addition(&mut self, value: &Term) -> ThinResult<()> {
        self.values.push(Self::to_entry(value)?);
        Ok(())
    }

    fn deletion(&mut self, value: &Term) -> DeltaResult<()> {
        let Ok(entry) = Self::to_entry(value) else {
            return Ok(());
        };
        let Some(position) = self.values.iter().position(|v| *v == entry) else {
            return Err(DeltaError::DeletionForNonExistingAddition);
        };
        self.values.remove(position);
        Ok(())
    }

    fn current_value(&self) -> Option<Term> {
        let value = self
            .values
            .iter()
            .map(|(value, _)| value.as_str())
            .join(&self.separator);
        let literal = match self.common_language() {
            Some(language) => Literal::new_language_tagged_literal_unchecked(value, language),
            None => Literal::new_simple_literal(value),
        };
        Some(literal.into())
    }
}
