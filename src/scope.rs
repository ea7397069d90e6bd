use std::fmt;
use std::rc::Rc;

use ustr::Ustr;

use crate::format::write_with_separator;
use crate::perm::Perm;
use crate::tvar::TypeVar;

/// One rigid variable admitted into a scope, together with the level the
/// scope had when the variable was added.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScopeEntry {
    var: TypeVar,
    name: Option<Ustr>,
    level: u32,
}

/// An append-only set of rigid variables ordered by extension, tagged with a
/// monotone nonnegative level.
///
/// Scopes are persistent values: extension returns a new scope sharing the
/// spine with the old one. A scope contains a variable iff it was added along
/// the chain; the level counts the `incr_level` steps performed.
#[derive(Clone, Debug)]
pub struct Scope {
    entries: Rc<Vec<ScopeEntry>>,
    level: u32,
}

impl Scope {
    /// The empty scope at level 0.
    pub fn initial() -> Self {
        Self {
            entries: Rc::new(Vec::new()),
            level: 0,
        }
    }

    /// Extend with a rigid variable. Idempotent on an already-present one.
    pub fn add(&self, var: TypeVar) -> Self {
        self.add_inner(var, None)
    }

    /// Extend with a named rigid variable. Idempotent on an already-present
    /// one.
    pub fn add_named(&self, var: TypeVar, name: Ustr) -> Self {
        self.add_inner(var, Some(name))
    }

    fn add_inner(&self, var: TypeVar, name: Option<Ustr>) -> Self {
        if self.mem(var) {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        entries.push(ScopeEntry {
            var,
            name,
            level: self.level,
        });
        Self {
            entries: Rc::new(entries),
            level: self.level,
        }
    }

    /// Whether the scope contains `var`.
    pub fn mem(&self, var: TypeVar) -> bool {
        self.entries.iter().any(|entry| entry.var == var)
    }

    /// The level the scope had when `var` was added, if present.
    pub fn level_of(&self, var: TypeVar) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.var == var)
            .map(|entry| entry.level)
    }

    /// Rewrite the scope's variables through a permutation.
    pub fn perm(&self, perm: &Perm) -> Self {
        if perm.is_identity() {
            return self.clone();
        }
        let entries = self
            .entries
            .iter()
            .map(|entry| ScopeEntry {
                var: perm.apply(entry.var),
                ..*entry
            })
            .collect();
        Self {
            entries: Rc::new(entries),
            level: self.level,
        }
    }

    /// A scope differing only in its (incremented) level, used to open a
    /// fresh region at generalization and let boundaries.
    pub fn incr_level(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            level: self.level + 1,
        }
    }

    /// The number of level increments performed along the chain.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Keep only the entries satisfying `keep`; the level is unchanged.
    /// Scopes only ever shrink through this.
    pub(crate) fn filter(&self, keep: impl Fn(TypeVar, u32) -> bool) -> Self {
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| keep(entry.var, entry.level))
            .copied()
            .collect();
        Self {
            entries: Rc::new(entries),
            level: self.level,
        }
    }

    /// Variables of the scope, in extension order.
    pub fn vars(&self) -> impl Iterator<Item = TypeVar> + '_ {
        self.entries.iter().map(|entry| entry.var)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        write_with_separator(self.vars(), ", ", f)?;
        write!(f, "}}@{}", self.level)
    }
}
