use oxrdf::{Term, Variable};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// An immutable-by-convention mapping from variables to RDF terms.
///
/// Entries are kept sorted by variable, so two [Bindings] with the same content compare (and hash)
/// equal independently of the order in which the variables were bound.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bindings {
    entries: BTreeMap<Variable, Term>,
}

impl Bindings {
    /// Creates an empty [Bindings].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of these bindings with `variable` bound to `term`.
    #[must_use]
    pub fn with(mut self, variable: Variable, term: impl Into<Term>) -> Self {
        self.insert(variable, term);
        self
    }

    /// Binds `variable` to `term`, replacing a previous value.
    pub fn insert(&mut self, variable: Variable, term: impl Into<Term>) -> Option<Term> {
        self.entries.insert(variable, term.into())
    }

    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.entries.get(variable)
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.entries.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Variable, Term> {
        self.entries.iter()
    }

    /// Returns the bound variables in ascending order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries.keys()
    }

    /// Restricts the bindings to `variables`. Variables that are not bound are skipped.
    #[must_use]
    pub fn project(&self, variables: &[Variable]) -> Self {
        variables
            .iter()
            .filter_map(|v| self.get(v).map(|t| (v.clone(), t.clone())))
            .collect()
    }

    /// Computes the union of two compatible solution mappings.
    ///
    /// Returns [None] if a variable is bound in both mappings to different terms.
    pub fn merge(&self, other: &Bindings) -> Option<Bindings> {
        let (mut result, smaller) = if self.len() >= other.len() {
            (self.clone(), other)
        } else {
            (other.clone(), self)
        };

        for (variable, term) in smaller.iter() {
            match result.entries.get(variable) {
                Some(existing) if existing != term => return None,
                Some(_) => {}
                None => {
                    result.entries.insert(variable.clone(), term.clone());
                }
            }
        }
        Some(result)
    }
}

impl FromIterator<(Variable, Term)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (Variable, Term)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Bindings {
    type Item = (Variable, Term);
    type IntoIter = btree_map::IntoIter<Variable, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = (&'a Variable, &'a Term);
    type IntoIter = btree_map::Iter<'a, Variable, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Display for Bindings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable} -> {term}")?;
        }
        f.write_str("}")
    }
}
