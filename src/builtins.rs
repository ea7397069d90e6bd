use ustr::{ustr, Ustr};

use crate::ident::IdSupply;
use crate::kind::{k_effect, k_type};
use crate::scheme::VarId;
use crate::scope::Scope;
use crate::tvar::{TypeVar, TypeVarRegistry};

/// The predefined rigid variables every session starts with: the value types
/// `Int`, `Int64`, `String`, `Char` and `Unit`, plus the `IO` effect.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinTypes {
    pub int: TypeVar,
    pub int64: TypeVar,
    pub string: TypeVar,
    pub char: TypeVar,
    pub unit: TypeVar,
    /// The computationally irrelevant proof term inhabiting `Unit`, the
    /// analogue of an ADT's deconstruction proof. The elaborator uses it to
    /// deconstruct `Unit` purely.
    pub unit_prf: VarId,
    pub io: TypeVar,
}

impl BuiltinTypes {
    pub(crate) fn register(tvars: &mut TypeVarRegistry, vars: &mut IdSupply) -> Self {
        Self {
            int: tvars.fresh_named(k_type(), ustr("Int")),
            int64: tvars.fresh_named(k_type(), ustr("Int64")),
            string: tvars.fresh_named(k_type(), ustr("String")),
            char: tvars.fresh_named(k_type(), ustr("Char")),
            unit: tvars.fresh_named(k_type(), ustr("Unit")),
            unit_prf: VarId::new(vars.fresh()),
            io: tvars.fresh_named(k_effect(), ustr("IO")),
        }
    }

    /// The addressable table of built-in value types, as (name, rigid) pairs.
    pub fn all(&self) -> [(Ustr, TypeVar); 5] {
        [
            (ustr("Int"), self.int),
            (ustr("Int64"), self.int64),
            (ustr("String"), self.string),
            (ustr("Char"), self.char),
            (ustr("Unit"), self.unit),
        ]
    }

    /// The scope every session opens with: all built-ins, level 0.
    pub(crate) fn initial_scope(&self) -> Scope {
        let mut scope = Scope::initial();
        for (name, var) in self.all() {
            scope = scope.add_named(var, name);
        }
        scope.add_named(self.io, ustr("IO"))
    }
}
