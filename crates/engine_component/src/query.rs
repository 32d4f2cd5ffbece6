//! Query signatures.
//!
//! A [`QuerySignature`] is the canonical form of "every entity that has all of
//! these component types". Two requests naming the same set of types in any
//! order, with or without duplicates, produce equal signatures, so the
//! signature doubles as a query cache key.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// Canonical, order-independent set of required component type names.
///
/// The empty signature is the "all live entities" query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuerySignature {
    required: BTreeSet<String>,
}

impl QuerySignature {
    /// The signature matching every live entity.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Canonicalise a list of type names.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            required: names.into_iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }

    /// Add a required component type.
    #[must_use]
    pub fn with(mut self, component: impl Into<String>) -> Self {
        self.required.insert(component.into());
        self
    }

    /// Returns `true` for the "all live entities" signature.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.required.is_empty()
    }

    /// The required type names, sorted.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    /// Returns `true` if `component` is one of the required types.
    #[must_use]
    pub fn mentions(&self, component: &str) -> bool {
        self.required.contains(component)
    }

    /// Returns `true` if an entity with component set `components` satisfies
    /// this signature.
    #[must_use]
    pub fn matches(&self, components: &HashSet<String>) -> bool {
        self.required.iter().all(|c| components.contains(c))
    }
}

impl std::fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.required.is_empty() {
            return f.write_str("*");
        }
        for (i, name) in self.required.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
