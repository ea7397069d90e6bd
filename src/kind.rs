use std::fmt;

use enum_as_inner::EnumAsInner;

use crate::format::type_variable_subscript;
use crate::ident::IdSupply;

/// Identity of a kind unification variable within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KindUVar(u32);

impl KindUVar {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for KindUVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "κ{}", type_variable_subscript(self.0))
    }
}

/// Kinds classify types: values, ground effects, effect rows, kind functions,
/// and unification variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner)]
pub enum Kind {
    /// Kind of value types.
    Type,
    /// Kind of closed ground effects.
    Effect,
    /// Kind of effect rows.
    EffRow,
    /// Kind function; the codomain always has the non-effect property.
    Arrow(Box<Kind>, Box<Kind>),
    /// A kind unification variable.
    UVar(KindUVar),
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Kind::*;
        match self {
            Type => write!(f, "type"),
            Effect => write!(f, "effect"),
            EffRow => write!(f, "effrow"),
            Arrow(k1, k2) => match **k1 {
                Arrow(_, _) => write!(f, "({k1}) -> {k2}"),
                _ => write!(f, "{k1} -> {k2}"),
            },
            UVar(u) => write!(f, "{u}"),
        }
    }
}

struct KindCell {
    /// When set, this variable may never become `Effect` or `EffRow`.
    non_effect: bool,
    state: Option<Kind>,
}

/// The per-session store of kind unification variables.
///
/// Cells are written at most once; the non-effect constraint may be turned on
/// at any time before the write and is checked by it.
#[derive(Default)]
pub struct KindStore {
    cells: Vec<KindCell>,
    supply: IdSupply,
}

impl KindStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh kind unification variable, optionally carrying the
    /// non-effect constraint from birth.
    pub fn fresh_uvar(&mut self, non_effect: bool) -> Kind {
        let id = self.supply.fresh();
        debug_assert_eq!(id as usize, self.cells.len());
        self.cells.push(KindCell {
            non_effect,
            state: None,
        });
        Kind::UVar(KindUVar(id))
    }

    fn cell(&self, u: KindUVar) -> &KindCell {
        &self.cells[u.0 as usize]
    }

    /// Follow set unification variables at the head. An unset variable is
    /// returned as-is; arguments of an arrow are not forced.
    pub fn view(&self, kind: &Kind) -> Kind {
        match kind {
            Kind::UVar(u) => match &self.cell(*u).state {
                Some(k) => self.view(k),
                None => kind.clone(),
            },
            _ => kind.clone(),
        }
    }

    /// Whether `kind` transitively mentions the unification variable `u`,
    /// following set variables.
    pub fn contains_uvar(&self, u: KindUVar, kind: &Kind) -> bool {
        match kind {
            Kind::Type | Kind::Effect | Kind::EffRow => false,
            Kind::Arrow(k1, k2) => self.contains_uvar(u, k1) || self.contains_uvar(u, k2),
            Kind::UVar(v) => {
                *v == u
                    || match &self.cell(*v).state {
                        Some(k) => self.contains_uvar(u, k),
                        None => false,
                    }
            }
        }
    }

    /// Link `u` to `kind`. Returns `false` iff `u` carries the non-effect
    /// constraint and `kind` is an effect kind. Being already set or failing
    /// the occurs check are internal invariant violations.
    pub fn set(&mut self, u: KindUVar, kind: Kind) -> bool {
        assert!(
            self.cell(u).state.is_none(),
            "kind unification variable {u} set twice"
        );
        assert!(
            !self.contains_uvar(u, &kind),
            "occurs check failure: {u} occurs in {kind}"
        );
        if self.cell(u).non_effect && !self.set_non_effect(&kind) {
            return false;
        }
        self.cells[u.0 as usize].state = Some(kind);
        true
    }

    /// Like [`Self::set`], restricted to kinds the caller has statically
    /// guaranteed to be non-effect.
    pub fn set_safe(&mut self, u: KindUVar, kind: Kind) {
        debug_assert!(self.non_effect(&kind) || matches!(self.view(&kind), Kind::UVar(_)));
        let ok = self.set(u, kind);
        assert!(ok, "set_safe used with an effect kind");
    }

    /// Whether `kind` is known to satisfy the non-effect property. An unset
    /// unification variable satisfies it only if its constraint flag is on.
    pub fn non_effect(&self, kind: &Kind) -> bool {
        match self.view(kind) {
            Kind::Type | Kind::Arrow(_, _) => true,
            Kind::Effect | Kind::EffRow => false,
            Kind::UVar(u) => self.cell(u).non_effect,
        }
    }

    /// Whether `kind` resolves to an effect kind (ground or row).
    pub fn is_effect(&self, kind: &Kind) -> bool {
        matches!(self.view(kind), Kind::Effect | Kind::EffRow)
    }

    /// Constrain `kind` to be non-effect. On a concrete non-effect head this
    /// is a no-op returning `true`; on an effect head it returns `false`; on
    /// an unset variable it turns the constraint flag on. Idempotent.
    pub fn set_non_effect(&mut self, kind: &Kind) -> bool {
        match self.view(kind) {
            Kind::Type | Kind::Arrow(_, _) => true,
            Kind::Effect | Kind::EffRow => false,
            Kind::UVar(u) => {
                self.cells[u.0 as usize].non_effect = true;
                true
            }
        }
    }

    /// Build an arrow kind; the codomain must have the non-effect property.
    pub fn k_arrow(&self, k1: Kind, k2: Kind) -> Kind {
        assert!(
            self.non_effect(&k2),
            "arrow codomain {k2} lacks the non-effect property"
        );
        Kind::Arrow(Box::new(k1), Box::new(k2))
    }

    /// Build a curried arrow kind over all domains in `ks`.
    pub fn k_arrows(&self, ks: Vec<Kind>, ret: Kind) -> Kind {
        ks.into_iter()
            .rev()
            .fold(ret, |acc, k| self.k_arrow(k, acc))
    }
}

/// The kind of value types.
pub fn k_type() -> Kind {
    Kind::Type
}

/// The kind of closed ground effects.
pub fn k_effect() -> Kind {
    Kind::Effect
}

/// The kind of effect rows.
pub fn k_effrow() -> Kind {
    Kind::EffRow
}
