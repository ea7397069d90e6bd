use ustr::Ustr;

use crate::builtins::BuiltinTypes;
use crate::error::ErrorChannel;
use crate::ident::IdSupply;
use crate::kind::{Kind, KindStore};
use crate::perm::Perm;
use crate::scheme::VarId;
use crate::scope::Scope;
use crate::tvar::{TypeVar, TypeVarRegistry};
use crate::r#type::Type;
use crate::uvar::{UVar, UVarStore};

/// One inference session: the kind store, the rigid-variable registry, the
/// unification-variable arena and the error channel.
///
/// Sessions are single-threaded and entirely disjoint from one another;
/// tearing one down is dropping this value.
pub struct Unif {
    pub kinds: KindStore,
    pub tvars: TypeVarRegistry,
    pub uvars: UVarStore,
    pub errors: ErrorChannel,
    pub builtins: BuiltinTypes,
    vars: IdSupply,
    initial_scope: Scope,
}

impl Unif {
    pub fn new() -> Self {
        let mut tvars = TypeVarRegistry::new();
        let mut vars = IdSupply::new();
        let builtins = BuiltinTypes::register(&mut tvars, &mut vars);
        let initial_scope = builtins.initial_scope();
        Self {
            kinds: KindStore::new(),
            tvars,
            uvars: UVarStore::new(),
            errors: ErrorChannel::new(),
            builtins,
            vars,
            initial_scope,
        }
    }

    /// A fresh term-variable identity, for proof variables and the other
    /// term-level bindings data definitions carry.
    pub fn fresh_var(&mut self) -> VarId {
        VarId::new(self.vars.fresh())
    }

    /// The scope containing exactly the built-ins, at level 0.
    pub fn initial_scope(&self) -> Scope {
        self.initial_scope.clone()
    }

    /// A fresh anonymous rigid variable.
    pub fn fresh_tvar(&mut self, kind: Kind) -> TypeVar {
        self.tvars.fresh(kind)
    }

    /// A fresh named rigid variable.
    pub fn fresh_named_tvar(&mut self, kind: Kind, name: Ustr) -> TypeVar {
        self.tvars.fresh_named(kind, name)
    }

    /// A fresh unification variable of the given kind in the given scope.
    pub fn fresh_uvar(&mut self, kind: Kind, scope: Scope) -> UVar {
        self.uvars.fresh(kind, scope)
    }

    /// Write a unification variable through a mention carrying the delayed
    /// permutation `perm`. Returns the scope the incoming type must fit
    /// into; the caller follows up with a shrink of `t` against it.
    pub fn raw_set(&mut self, perm: &Perm, u: UVar, t: Type) -> Scope {
        debug_assert!(
            self.kinds_agree(&self.uvars.kind(u).clone(), &self.kind_of(&t)),
            "setting {u} to a type of a different kind"
        );
        debug_assert!(!self.occurs_check(u, &t), "setting {u} to a cyclic type");
        self.uvars.raw_set(perm, u, t)
    }

    /// Promote an unset unification variable to a fresh rigid of the same
    /// kind. Subsequent reads of the variable behave as the rigid.
    pub fn fix(&mut self, u: UVar) -> TypeVar {
        let kind = self.uvars.kind(u).clone();
        let var = self.tvars.fresh(kind);
        self.uvars.promote(u, var);
        var
    }

    /// Apply a permutation to a unification-variable cell; it composes after
    /// every delayed permutation attached to mentions of the cell.
    pub fn apply_perm_to_uvar(&mut self, perm: &Perm, u: UVar) {
        self.uvars.apply_perm(perm, u);
    }
}

impl Default for Unif {
    fn default() -> Self {
        Self::new()
    }
}
