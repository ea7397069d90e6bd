use std::fmt;

use ustr::Ustr;

use crate::format::{type_variable_index_to_string_greek, type_variable_subscript};
use crate::ident::IdSupply;
use crate::kind::Kind;

/// A rigid (skolem) type variable: uniquely identified, carries a kind, and
/// is never mutated. Opaque to unification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeVar(u32);

impl TypeVar {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 8 {
            write!(f, "{}", type_variable_index_to_string_greek(self.0))
        } else {
            write!(f, "t{}", type_variable_subscript(self.0))
        }
    }
}

struct TypeVarData {
    kind: Kind,
    name: Option<Ustr>,
}

/// The per-session registry of rigid variables. Entries live for the whole
/// session; `fix`ed unification variables are promoted into it.
#[derive(Default)]
pub struct TypeVarRegistry {
    vars: Vec<TypeVarData>,
    supply: IdSupply,
}

impl TypeVarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh anonymous rigid variable of the given kind.
    pub fn fresh(&mut self, kind: Kind) -> TypeVar {
        self.fresh_inner(kind, None)
    }

    /// Allocate a fresh rigid variable carrying a display name.
    pub fn fresh_named(&mut self, kind: Kind, name: Ustr) -> TypeVar {
        self.fresh_inner(kind, Some(name))
    }

    fn fresh_inner(&mut self, kind: Kind, name: Option<Ustr>) -> TypeVar {
        let id = self.supply.fresh();
        debug_assert_eq!(id as usize, self.vars.len());
        self.vars.push(TypeVarData { kind, name });
        TypeVar(id)
    }

    pub fn kind(&self, var: TypeVar) -> &Kind {
        &self.vars[var.0 as usize].kind
    }

    pub fn name(&self, var: TypeVar) -> Option<Ustr> {
        self.vars[var.0 as usize].name
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl crate::format::FormatWith<crate::unif::Unif> for TypeVar {
    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, unif: &crate::unif::Unif) -> fmt::Result {
        match unif.tvars.name(*self) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{self}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{k_effect, k_type};
    use ustr::ustr;

    #[test]
    fn fresh_variables_are_distinct() {
        let mut registry = TypeVarRegistry::new();
        let a = registry.fresh(k_type());
        let b = registry.fresh(k_type());
        let c = registry.fresh_named(k_effect(), ustr("Exn"));
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(registry.kind(c), &k_effect());
        assert_eq!(registry.name(c), Some(ustr("Exn")));
        assert_eq!(registry.name(a), None);
    }
}
