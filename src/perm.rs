use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;

use crate::format::write_with_separator;
use crate::tvar::TypeVar;

/// A finite partial permutation over rigid type variables: a bijection
/// between its domain and image, undefined (identity) outside the domain.
///
/// The forward and inverse maps are kept in lock step, giving O(1)
/// application in both directions and cheap composition.
#[derive(Clone, Debug, Default)]
pub struct Perm {
    fwd: HashMap<TypeVar, TypeVar>,
    inv: HashMap<TypeVar, TypeVar>,
}

impl Perm {
    /// The identity permutation (empty domain).
    pub fn identity() -> Self {
        Self::default()
    }

    /// The transposition exchanging `a` and `b`.
    pub fn swap(a: TypeVar, b: TypeVar) -> Self {
        if a == b {
            return Self::identity();
        }
        let mut fwd = HashMap::new();
        fwd.insert(a, b);
        fwd.insert(b, a);
        Self {
            inv: fwd.clone(),
            fwd,
        }
    }

    /// Build a permutation from disjoint `(from, to)` pairs. Panics if the
    /// pairs do not describe a permutation of a finite support, i.e. a
    /// bijection whose domain and image are the same set.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (TypeVar, TypeVar)>) -> Self {
        let mut perm = Self::identity();
        for (from, to) in pairs {
            if from == to {
                continue;
            }
            let prev = perm.fwd.insert(from, to);
            assert!(prev.is_none(), "duplicated domain entry {from}");
            let prev = perm.inv.insert(to, from);
            assert!(prev.is_none(), "duplicated image entry {to}");
        }
        assert!(
            perm.fwd.keys().all(|v| perm.inv.contains_key(v)),
            "domain and image differ, not a permutation"
        );
        perm
    }

    pub fn is_identity(&self) -> bool {
        self.fwd.is_empty()
    }

    /// Apply to a variable; variables outside the domain are unchanged.
    pub fn apply(&self, var: TypeVar) -> TypeVar {
        self.fwd.get(&var).copied().unwrap_or(var)
    }

    /// Apply the inverse to a variable.
    pub fn apply_inv(&self, var: TypeVar) -> TypeVar {
        self.inv.get(&var).copied().unwrap_or(var)
    }

    /// Left-to-right composition: `self.then(other)` applies `self` first.
    pub fn then(&self, other: &Perm) -> Perm {
        if self.is_identity() {
            return other.clone();
        }
        if other.is_identity() {
            return self.clone();
        }
        let mut result = Perm::identity();
        for (&from, &mid) in &self.fwd {
            let to = other.apply(mid);
            if from != to {
                result.fwd.insert(from, to);
                result.inv.insert(to, from);
            }
        }
        for (&from, &to) in &other.fwd {
            if !self.fwd.contains_key(&from) && from != to {
                result.fwd.insert(from, to);
                result.inv.insert(to, from);
            }
        }
        result
    }

    /// The inverse permutation.
    pub fn inverse(&self) -> Perm {
        Perm {
            fwd: self.inv.clone(),
            inv: self.fwd.clone(),
        }
    }

    /// Restriction to the domain entries satisfying `keep`. The kept entries
    /// must form whole cycles, so that the result is itself a permutation.
    pub fn restrict(&self, keep: impl Fn(TypeVar) -> bool) -> Perm {
        let mut result = Perm::identity();
        for (&from, &to) in &self.fwd {
            if keep(from) {
                result.fwd.insert(from, to);
                result.inv.insert(to, from);
            }
        }
        debug_assert!(
            result.fwd.keys().all(|v| result.inv.contains_key(v)),
            "restriction cut a cycle"
        );
        result
    }

    /// Domain of the permutation, in no particular order.
    pub fn domain(&self) -> impl Iterator<Item = TypeVar> + '_ {
        self.fwd.keys().copied()
    }
}

/// Structural equality as functions: same domain, same images.
impl PartialEq for Perm {
    fn eq(&self, other: &Self) -> bool {
        self.fwd == other.fwd
    }
}
impl Eq for Perm {}

impl fmt::Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return write!(f, "id");
        }
        write!(f, "{{")?;
        write_with_separator(
            self.fwd
                .iter()
                .sorted()
                .map(|(from, to)| format!("{from}↦{to}")),
            ", ",
            f,
        )?;
        write!(f, "}}")
    }
}
