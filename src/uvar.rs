use std::fmt;

use crate::format::type_variable_subscript;
use crate::ident::IdSupply;
use crate::kind::Kind;
use crate::perm::Perm;
use crate::scope::Scope;
use crate::tvar::TypeVar;
use crate::r#type::Type;

/// Identity of a type unification variable within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UVar(u32);

impl UVar {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", type_variable_subscript(self.0))
    }
}

enum UVarState {
    Unset,
    Set(Type),
}

/// A unification-variable cell.
///
/// The stored contents and the scope are expressed in the cell's own frame.
/// A mention `TUVar(π, u)` observes them through the effective permutation
/// `π.then(cell.perm)`: the delayed permutation applies first, then the one
/// accumulated on the cell.
struct UVarCell {
    kind: Kind,
    scope: Scope,
    perm: Perm,
    state: UVarState,
}

/// The per-session arena of unification variables. Cells transition
/// unset → set exactly once; their scope only ever shrinks.
#[derive(Default)]
pub struct UVarStore {
    cells: Vec<UVarCell>,
    supply: IdSupply,
}

impl UVarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh unset variable of the given kind, scoped to `scope`.
    pub fn fresh(&mut self, kind: Kind, scope: Scope) -> UVar {
        let id = self.supply.fresh();
        debug_assert_eq!(id as usize, self.cells.len());
        self.cells.push(UVarCell {
            kind,
            scope,
            perm: Perm::identity(),
            state: UVarState::Unset,
        });
        UVar(id)
    }

    fn cell(&self, u: UVar) -> &UVarCell {
        &self.cells[u.0 as usize]
    }

    pub fn kind(&self, u: UVar) -> &Kind {
        &self.cell(u).kind
    }

    /// The cell-frame scope of the variable.
    pub fn scope(&self, u: UVar) -> &Scope {
        &self.cell(u).scope
    }

    /// The level of the variable's scope, a lower bound used for escape
    /// detection.
    pub fn level(&self, u: UVar) -> u32 {
        self.cell(u).scope.level()
    }

    pub fn is_set(&self, u: UVar) -> bool {
        matches!(self.cell(u).state, UVarState::Set(_))
    }

    pub(crate) fn contents(&self, u: UVar) -> Option<&Type> {
        match &self.cell(u).state {
            UVarState::Set(t) => Some(t),
            UVarState::Unset => None,
        }
    }

    pub(crate) fn cell_perm(&self, u: UVar) -> &Perm {
        &self.cell(u).perm
    }

    /// The effective permutation of a mention carrying the delayed
    /// permutation `perm`.
    pub(crate) fn effective_perm(&self, perm: &Perm, u: UVar) -> Perm {
        perm.then(&self.cell(u).perm)
    }

    /// Write the cell through a mention. `t` is expressed in the mention's
    /// frame; it is translated into the cell frame before storing. Returns
    /// the mention-frame image of the cell's scope: the scope the incoming
    /// `t` must fit into, which the caller subsequently shrinks `t` against.
    ///
    /// The cell must be unset, and `kind(u)` must agree with the kind of `t`
    /// (checked by the caller, which can compute kinds).
    pub(crate) fn raw_set(&mut self, perm: &Perm, u: UVar, t: Type) -> Scope {
        let cell = self.cell(u);
        assert!(
            matches!(cell.state, UVarState::Unset),
            "unification variable {u} set twice"
        );
        let eff = perm.then(&cell.perm);
        let fit_scope = cell.scope.perm(&eff);
        let contents = t.apply_perm(&eff.inverse());
        self.cells[u.0 as usize].state = UVarState::Set(contents);
        fit_scope
    }

    /// Shrink the scope of `u` to the rigids `v` with
    /// `level(v) <= target_level` or `pred(v)`. `pred` sees cell-frame
    /// variables. Rigids eliminated here must not occur in the cell's
    /// contents; the caller guarantees this or raises an escape error.
    pub fn filter_scope(&mut self, u: UVar, target_level: u32, pred: impl Fn(TypeVar) -> bool) {
        let cell = &mut self.cells[u.0 as usize];
        cell.scope = cell
            .scope
            .filter(|var, level| level <= target_level || pred(var));
    }

    /// Apply a permutation to the cell: it composes after every delayed
    /// permutation attached to mentions of this cell.
    pub(crate) fn apply_perm(&mut self, perm: &Perm, u: UVar) {
        let cell = &mut self.cells[u.0 as usize];
        cell.perm = cell.perm.then(perm);
    }

    /// Promote an unset variable to the rigid `var` (already allocated with
    /// the same kind). Subsequent reads behave as the rigid.
    pub(crate) fn promote(&mut self, u: UVar, var: TypeVar) {
        let cell = &self.cells[u.0 as usize];
        assert!(
            matches!(cell.state, UVarState::Unset),
            "cannot promote the already-set variable {u}"
        );
        self.cells[u.0 as usize].state = UVarState::Set(Type::var(var));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
