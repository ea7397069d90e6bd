// Copyright 2026 Effra Language Developers
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with the License. You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the specific language governing permissions and limitations under the License.
//

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use derive_new::new;
use enum_as_inner::EnumAsInner;

use crate::containers::SmallVec2;
use crate::format::{write_with_separator, FormatWith};
use crate::kind::Kind;
use crate::perm::Perm;
use crate::scheme::Scheme;
use crate::tvar::TypeVar;
use crate::unif::Unif;
use crate::uvar::UVar;

/// A first-class handler type: interprets the effect variable `eff` through
/// the capability `cap`, delimiting a computation of type `in_ty` and row
/// `in_eff` into `out_ty` and `out_eff`. The variable `eff` is bound in
/// `cap`, `in_ty` and `in_eff`.
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct HandlerType {
    pub eff: TypeVar,
    pub cap: Type,
    pub in_ty: Type,
    pub in_eff: Type,
    pub out_ty: Type,
    pub out_eff: Type,
}

/// A first-class delimiter type: a label for the ground effect `eff`, with
/// the delimiter type `delim_ty` and delimiter row `delim_eff`.
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct LabelType {
    pub eff: Type,
    pub delim_ty: Type,
    pub delim_eff: Type,
}

/// The representation of a type. Kept private to the module: all inspection
/// goes through [`Unif::view`] and [`Unif::whnf`], so no caller can observe a
/// set unification variable or produce an ill-kinded type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TypeKind {
    /// A unification variable with its delayed permutation.
    UVar(Perm, UVar),
    /// A rigid variable.
    Var(TypeVar),
    /// A ground effect: a finite set of effect rigid variables.
    Effect(BTreeSet<TypeVar>),
    /// An effect row: simple effect variables plus an end. `None` is closed;
    /// an open end is a uvar, a rigid row variable, or a type application.
    Effrow(BTreeSet<TypeVar>, Option<Type>),
    /// A total, effect-free arrow.
    PureArrow(Scheme, Type),
    /// An impure arrow with its effect row.
    Arrow(Scheme, Type, Type),
    Handler(Box<HandlerType>),
    Label(Box<LabelType>),
    /// Neutral application.
    App(Type, Type),
}

/// A type term. Immutable and cheap to clone; mutation happens only inside
/// unification-variable cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type(Rc<TypeKind>);

impl Type {
    pub(crate) fn new(kind: TypeKind) -> Self {
        Self(Rc::new(kind))
    }

    pub(crate) fn data(&self) -> &TypeKind {
        &self.0
    }

    pub(crate) fn var(var: TypeVar) -> Self {
        Self::new(TypeKind::Var(var))
    }

    /// Rewrite every rigid mention through the permutation; mentions of
    /// unification variables compose the permutation into their delayed one.
    pub(crate) fn apply_perm(&self, perm: &Perm) -> Type {
        if perm.is_identity() {
            return self.clone();
        }
        use TypeKind::*;
        let kind = match self.data() {
            UVar(delayed, u) => UVar(delayed.then(perm), *u),
            Var(v) => Var(perm.apply(*v)),
            Effect(vars) => Effect(vars.iter().map(|&v| perm.apply(v)).collect()),
            Effrow(vars, end) => Effrow(
                vars.iter().map(|&v| perm.apply(v)).collect(),
                end.as_ref().map(|e| e.apply_perm(perm)),
            ),
            PureArrow(arg, ret) => PureArrow(arg.apply_perm(perm), ret.apply_perm(perm)),
            Arrow(arg, ret, eff) => Arrow(
                arg.apply_perm(perm),
                ret.apply_perm(perm),
                eff.apply_perm(perm),
            ),
            Handler(h) => Handler(Box::new(HandlerType {
                eff: perm.apply(h.eff),
                cap: h.cap.apply_perm(perm),
                in_ty: h.in_ty.apply_perm(perm),
                in_eff: h.in_eff.apply_perm(perm),
                out_ty: h.out_ty.apply_perm(perm),
                out_eff: h.out_eff.apply_perm(perm),
            })),
            Label(l) => Label(Box::new(LabelType {
                eff: l.eff.apply_perm(perm),
                delim_ty: l.delim_ty.apply_perm(perm),
                delim_eff: l.delim_eff.apply_perm(perm),
            })),
            App(f, a) => App(f.apply_perm(perm), a.apply_perm(perm)),
        };
        Type::new(kind)
    }
}

/// One peeled constructor, as returned by [`Unif::view`]. Never a set
/// unification variable.
#[derive(Clone, Debug, PartialEq, Eq, EnumAsInner)]
pub enum TypeView {
    UVar(Perm, UVar),
    Var(TypeVar),
    Effect(BTreeSet<TypeVar>),
    Effrow(BTreeSet<TypeVar>, Option<Type>),
    PureArrow(Scheme, Type),
    Arrow(Scheme, Type, Type),
    Handler(HandlerType),
    Label(LabelType),
    App(Type, Type),
}

/// The head of a neutral application in weak head normal form.
#[derive(Clone, Debug, PartialEq, Eq, EnumAsInner)]
pub enum WhnfHead {
    UVar(Perm, UVar),
    Var(TypeVar),
}

/// Weak head normal form: unification variables and application heads are
/// unfolded until one of these shapes is exposed. Arguments of a neutral are
/// in reverse application order (last argument first), enabling tail-to-head
/// matching without re-allocation.
#[derive(Clone, Debug, PartialEq, Eq, EnumAsInner)]
pub enum TypeWhnf {
    Neutral(WhnfHead, SmallVec2<Type>),
    Effect(BTreeSet<TypeVar>),
    Effrow(BTreeSet<TypeVar>, Option<Type>),
    PureArrow(Scheme, Type),
    Arrow(Scheme, Type, Type),
    Handler(HandlerType),
    Label(LabelType),
}

impl Unif {
    /// Resolve chains of set unification variables at the head of `t`,
    /// applying the effective permutations as it goes. The result never has
    /// a set variable at its head.
    fn resolve_head(&self, t: &Type) -> Type {
        let mut current = t.clone();
        loop {
            let next = match current.data() {
                TypeKind::UVar(delayed, u) => self.uvars.contents(*u).map(|contents| {
                    let eff = self.uvars.effective_perm(delayed, *u);
                    contents.apply_perm(&eff)
                }),
                _ => None,
            };
            match next {
                Some(resolved) => current = resolved,
                None => return current,
            }
        }
    }

    /// Peel exactly one constructor. A set unification variable is read
    /// through, so the returned view is never a set variable.
    pub fn view(&self, t: &Type) -> TypeView {
        use TypeKind::*;
        let t = self.resolve_head(t);
        match t.data() {
            UVar(delayed, u) => TypeView::UVar(delayed.clone(), *u),
            Var(v) => TypeView::Var(*v),
            Effect(vars) => TypeView::Effect(vars.clone()),
            Effrow(vars, end) => TypeView::Effrow(vars.clone(), end.clone()),
            PureArrow(arg, ret) => TypeView::PureArrow(arg.clone(), ret.clone()),
            Arrow(arg, ret, eff) => TypeView::Arrow(arg.clone(), ret.clone(), eff.clone()),
            Handler(h) => TypeView::Handler((**h).clone()),
            Label(l) => TypeView::Label((**l).clone()),
            App(f, a) => TypeView::App(f.clone(), a.clone()),
        }
    }

    /// Reduce to weak head normal form: unfold set unification variables and
    /// application spines until a head shape is reached.
    pub fn whnf(&self, t: &Type) -> TypeWhnf {
        use TypeKind::*;
        let mut args: SmallVec2<Type> = SmallVec2::new();
        let mut head = t.clone();
        loop {
            enum Step {
                Unfold(Type),
                Done(TypeWhnf),
            }
            let step = match head.data() {
                App(f, a) => {
                    args.push(a.clone());
                    Step::Unfold(f.clone())
                }
                UVar(delayed, u) => match self.uvars.contents(*u) {
                    Some(contents) => {
                        let eff = self.uvars.effective_perm(delayed, *u);
                        Step::Unfold(contents.apply_perm(&eff))
                    }
                    None => Step::Done(TypeWhnf::Neutral(
                        WhnfHead::UVar(delayed.clone(), *u),
                        std::mem::take(&mut args),
                    )),
                },
                Var(v) => Step::Done(TypeWhnf::Neutral(
                    WhnfHead::Var(*v),
                    std::mem::take(&mut args),
                )),
                other => {
                    assert!(
                        args.is_empty(),
                        "application of a non-neutral head in weak head normal form"
                    );
                    Step::Done(match other {
                        Effect(vars) => TypeWhnf::Effect(vars.clone()),
                        Effrow(vars, end) => TypeWhnf::Effrow(vars.clone(), end.clone()),
                        PureArrow(arg, ret) => TypeWhnf::PureArrow(arg.clone(), ret.clone()),
                        Arrow(arg, ret, eff) => {
                            TypeWhnf::Arrow(arg.clone(), ret.clone(), eff.clone())
                        }
                        Handler(h) => TypeWhnf::Handler((**h).clone()),
                        Label(l) => TypeWhnf::Label((**l).clone()),
                        UVar(_, _) | Var(_) | App(_, _) => unreachable!(),
                    })
                }
            };
            match step {
                Step::Unfold(next) => head = next,
                Step::Done(whnf) => return whnf,
            }
        }
    }

    /// Compute the kind of a type on demand.
    pub fn kind_of(&self, t: &Type) -> Kind {
        use TypeKind::*;
        match t.data() {
            UVar(_, u) => self.uvars.kind(*u).clone(),
            Var(v) => self.tvars.kind(*v).clone(),
            Effect(_) => Kind::Effect,
            Effrow(_, _) => Kind::EffRow,
            PureArrow(_, _) | Arrow(_, _, _) | Handler(_) | Label(_) => Kind::Type,
            App(f, _) => match self.kinds.view(&self.kind_of(f)) {
                Kind::Arrow(_, codomain) => *codomain,
                kind => panic!("application head has non-arrow kind {kind}"),
            },
        }
    }

    /// Best-effort kind agreement: structural equality modulo unset kind
    /// unification variables, which agree with anything.
    pub fn kinds_agree(&self, k1: &Kind, k2: &Kind) -> bool {
        match (self.kinds.view(k1), self.kinds.view(k2)) {
            (Kind::UVar(_), _) | (_, Kind::UVar(_)) => true,
            (Kind::Arrow(a1, a2), Kind::Arrow(b1, b2)) => {
                self.kinds_agree(&a1, &b1) && self.kinds_agree(&a2, &b2)
            }
            (a, b) => a == b,
        }
    }

    fn expect_kind(&self, t: &Type, expected: &Kind, what: &str) {
        let kind = self.kind_of(t);
        assert!(
            self.kinds_agree(&kind, expected),
            "{what} has kind {kind}, expected {expected}"
        );
    }

    // constructors

    /// Mention a unification variable, with a delayed permutation.
    pub fn t_uvar(&self, perm: Perm, u: UVar) -> Type {
        Type::new(TypeKind::UVar(perm, u))
    }

    /// A rigid variable.
    pub fn t_var(&self, var: TypeVar) -> Type {
        Type::var(var)
    }

    /// A ground effect from a set of effect rigid variables.
    pub fn t_effect(&self, vars: impl IntoIterator<Item = TypeVar>) -> Type {
        let vars: BTreeSet<TypeVar> = vars.into_iter().collect();
        for &v in &vars {
            assert!(
                self.kinds_agree(self.tvars.kind(v), &Kind::Effect),
                "ground effect member {v} is not an effect variable"
            );
        }
        Type::new(TypeKind::Effect(vars))
    }

    /// An effect row from simple effect variables and an end. A syntactic
    /// row end is spliced into the row.
    pub fn t_effrow(&self, vars: impl IntoIterator<Item = TypeVar>, end: Option<Type>) -> Type {
        let mut vars: BTreeSet<TypeVar> = vars.into_iter().collect();
        for &v in &vars {
            assert!(
                self.kinds_agree(self.tvars.kind(v), &Kind::Effect),
                "row member {v} is not an effect variable"
            );
        }
        let mut current = end;
        let end = loop {
            let Some(e) = current else { break None };
            let spliced = match e.data() {
                TypeKind::Effrow(inner_vars, inner_end) => {
                    vars.extend(inner_vars.iter().copied());
                    inner_end.clone()
                }
                _ => {
                    self.expect_kind(&e, &Kind::EffRow, "row end");
                    break Some(e.clone());
                }
            };
            current = spliced;
        };
        Type::new(TypeKind::Effrow(vars, end))
    }

    /// A closed effect row.
    pub fn t_closed_effrow(&self, vars: impl IntoIterator<Item = TypeVar>) -> Type {
        self.t_effrow(vars, None)
    }

    /// A pure arrow: total and effect-free.
    pub fn t_pure_arrow(&self, arg: Scheme, ret: Type) -> Type {
        self.expect_kind(&arg.body, &Kind::Type, "argument type");
        self.expect_kind(&ret, &Kind::Type, "result type");
        Type::new(TypeKind::PureArrow(arg, ret))
    }

    /// An impure arrow carrying an effect row.
    pub fn t_arrow(&self, arg: Scheme, ret: Type, eff: Type) -> Type {
        self.expect_kind(&arg.body, &Kind::Type, "argument type");
        self.expect_kind(&ret, &Kind::Type, "result type");
        self.expect_kind(&eff, &Kind::EffRow, "arrow effect");
        Type::new(TypeKind::Arrow(arg, ret, eff))
    }

    /// A first-class handler type.
    pub fn t_handler(&self, h: HandlerType) -> Type {
        assert!(
            self.kinds_agree(self.tvars.kind(h.eff), &Kind::Effect),
            "handled variable {} is not an effect variable",
            h.eff
        );
        self.expect_kind(&h.cap, &Kind::Type, "capability type");
        self.expect_kind(&h.in_ty, &Kind::Type, "handler inner type");
        self.expect_kind(&h.in_eff, &Kind::EffRow, "handler inner effect");
        self.expect_kind(&h.out_ty, &Kind::Type, "handler outer type");
        self.expect_kind(&h.out_eff, &Kind::EffRow, "handler outer effect");
        Type::new(TypeKind::Handler(Box::new(h)))
    }

    /// A first-class delimiter (label) type.
    pub fn t_label(&self, l: LabelType) -> Type {
        self.expect_kind(&l.eff, &Kind::Effect, "label effect");
        self.expect_kind(&l.delim_ty, &Kind::Type, "delimiter type");
        self.expect_kind(&l.delim_eff, &Kind::EffRow, "delimiter effect");
        Type::new(TypeKind::Label(Box::new(l)))
    }

    /// Neutral application. The head's kind must be a resolved arrow whose
    /// domain agrees with the argument's kind.
    pub fn t_app(&self, f: Type, a: Type) -> Type {
        match self.kinds.view(&self.kind_of(&f)) {
            Kind::Arrow(domain, _) => {
                let arg_kind = self.kind_of(&a);
                assert!(
                    self.kinds_agree(&domain, &arg_kind),
                    "applied {arg_kind} where {domain} was expected"
                );
            }
            kind => panic!("application head has non-arrow kind {kind}"),
        }
        Type::new(TypeKind::App(f, a))
    }

    /// Iterated application.
    pub fn t_apps(&self, f: Type, args: impl IntoIterator<Item = Type>) -> Type {
        args.into_iter().fold(f, |f, a| self.t_app(f, a))
    }

    // queries

    /// Whether the unset unification variable `u` occurs in `t`, through any
    /// nesting, reading set variables through.
    pub fn occurs_check(&self, u: UVar, t: &Type) -> bool {
        match self.view(t) {
            TypeView::UVar(_, v) => v == u,
            TypeView::Var(_) | TypeView::Effect(_) => false,
            TypeView::Effrow(_, end) => end.map_or(false, |e| self.occurs_check(u, &e)),
            TypeView::PureArrow(arg, ret) => {
                self.occurs_check_scheme(u, &arg) || self.occurs_check(u, &ret)
            }
            TypeView::Arrow(arg, ret, eff) => {
                self.occurs_check_scheme(u, &arg)
                    || self.occurs_check(u, &ret)
                    || self.occurs_check(u, &eff)
            }
            TypeView::Handler(h) => [&h.cap, &h.in_ty, &h.in_eff, &h.out_ty, &h.out_eff]
                .into_iter()
                .any(|t| self.occurs_check(u, t)),
            TypeView::Label(l) => [&l.eff, &l.delim_ty, &l.delim_eff]
                .into_iter()
                .any(|t| self.occurs_check(u, t)),
            TypeView::App(f, a) => self.occurs_check(u, &f) || self.occurs_check(u, &a),
        }
    }

    pub(crate) fn occurs_check_scheme(&self, u: UVar, scheme: &Scheme) -> bool {
        scheme
            .named
            .iter()
            .any(|(_, sch)| self.occurs_check_scheme(u, sch))
            || self.occurs_check(u, &scheme.body)
    }

    /// The rigid variables free in `t`, reading set unification variables
    /// through and skipping bound ones.
    pub fn free_rigids(&self, t: &Type) -> BTreeSet<TypeVar> {
        let mut acc = BTreeSet::new();
        self.free_rigids_into(t, &mut acc);
        acc
    }

    pub(crate) fn free_rigids_into(&self, t: &Type, acc: &mut BTreeSet<TypeVar>) {
        match self.view(t) {
            TypeView::UVar(_, _) => {}
            TypeView::Var(v) => {
                acc.insert(v);
            }
            TypeView::Effect(vars) => acc.extend(vars),
            TypeView::Effrow(vars, end) => {
                acc.extend(vars);
                if let Some(e) = end {
                    self.free_rigids_into(&e, acc);
                }
            }
            TypeView::PureArrow(arg, ret) => {
                self.free_rigids_scheme_into(&arg, acc);
                self.free_rigids_into(&ret, acc);
            }
            TypeView::Arrow(arg, ret, eff) => {
                self.free_rigids_scheme_into(&arg, acc);
                self.free_rigids_into(&ret, acc);
                self.free_rigids_into(&eff, acc);
            }
            TypeView::Handler(h) => {
                let mut inner = BTreeSet::new();
                self.free_rigids_into(&h.cap, &mut inner);
                self.free_rigids_into(&h.in_ty, &mut inner);
                self.free_rigids_into(&h.in_eff, &mut inner);
                inner.remove(&h.eff);
                acc.extend(inner);
                self.free_rigids_into(&h.out_ty, acc);
                self.free_rigids_into(&h.out_eff, acc);
            }
            TypeView::Label(l) => {
                self.free_rigids_into(&l.eff, acc);
                self.free_rigids_into(&l.delim_ty, acc);
                self.free_rigids_into(&l.delim_eff, acc);
            }
            TypeView::App(f, a) => {
                self.free_rigids_into(&f, acc);
                self.free_rigids_into(&a, acc);
            }
        }
    }

    pub(crate) fn free_rigids_scheme_into(&self, scheme: &Scheme, acc: &mut BTreeSet<TypeVar>) {
        let mut inner = BTreeSet::new();
        for (_, sch) in &scheme.named {
            self.free_rigids_scheme_into(sch, &mut inner);
        }
        self.free_rigids_into(&scheme.body, &mut inner);
        for (_, var) in &scheme.targs {
            inner.remove(var);
        }
        acc.extend(inner);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TypeKind::*;
        match self.data() {
            UVar(perm, u) if perm.is_identity() => write!(f, "{u}"),
            UVar(perm, u) => write!(f, "{u}@{perm}"),
            Var(v) => write!(f, "{v}"),
            Effect(vars) => {
                write!(f, "{{")?;
                write_with_separator(vars.iter(), ",", f)?;
                write!(f, "}}")
            }
            Effrow(vars, end) => {
                write!(f, "[")?;
                write_with_separator(vars.iter(), ",", f)?;
                if let Some(e) = end {
                    if !vars.is_empty() {
                        write!(f, "|")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "]")
            }
            PureArrow(arg, ret) => write!(f, "({arg}) -> {ret}"),
            Arrow(arg, ret, eff) => write!(f, "({arg}) ->{eff} {ret}"),
            Handler(h) => write!(
                f,
                "handler {} of {} in {} /{} out {} /{}",
                h.eff, h.cap, h.in_ty, h.in_eff, h.out_ty, h.out_eff
            ),
            Label(l) => write!(f, "label {} /{} of {}", l.delim_ty, l.delim_eff, l.eff),
            App(g, a) => write!(f, "{g} ({a})"),
        }
    }
}

/// Session-aware formatting: set unification variables are read through and
/// rigid variables print their registered names.
impl FormatWith<Unif> for Type {
    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, unif: &Unif) -> fmt::Result {
        match unif.view(self) {
            TypeView::UVar(perm, u) if perm.is_identity() => write!(f, "{u}"),
            TypeView::UVar(perm, u) => write!(f, "{u}@{perm}"),
            TypeView::Var(v) => v.fmt_with(f, unif),
            TypeView::Effect(vars) => {
                write!(f, "{{")?;
                for (i, v) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    v.fmt_with(f, unif)?;
                }
                write!(f, "}}")
            }
            TypeView::Effrow(vars, end) => {
                write!(f, "[")?;
                for (i, v) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    v.fmt_with(f, unif)?;
                }
                if let Some(e) = end {
                    if !vars.is_empty() {
                        write!(f, "|")?;
                    }
                    e.fmt_with(f, unif)?;
                }
                write!(f, "]")
            }
            TypeView::PureArrow(arg, ret) => {
                write!(f, "(")?;
                arg.fmt_with(f, unif)?;
                write!(f, ") -> ")?;
                ret.fmt_with(f, unif)
            }
            TypeView::Arrow(arg, ret, eff) => {
                write!(f, "(")?;
                arg.fmt_with(f, unif)?;
                write!(f, ") ->")?;
                eff.fmt_with(f, unif)?;
                write!(f, " ")?;
                ret.fmt_with(f, unif)
            }
            TypeView::Handler(h) => {
                write!(f, "handler ")?;
                h.eff.fmt_with(f, unif)?;
                write!(f, " of ")?;
                h.cap.fmt_with(f, unif)?;
                write!(f, " in ")?;
                h.in_ty.fmt_with(f, unif)?;
                write!(f, " /")?;
                h.in_eff.fmt_with(f, unif)?;
                write!(f, " out ")?;
                h.out_ty.fmt_with(f, unif)?;
                write!(f, " /")?;
                h.out_eff.fmt_with(f, unif)
            }
            TypeView::Label(l) => {
                write!(f, "label ")?;
                l.delim_ty.fmt_with(f, unif)?;
                write!(f, " /")?;
                l.delim_eff.fmt_with(f, unif)?;
                write!(f, " of ")?;
                l.eff.fmt_with(f, unif)
            }
            TypeView::App(g, a) => {
                g.fmt_with(f, unif)?;
                write!(f, " (")?;
                a.fmt_with(f, unif)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{k_effect, k_type};

    #[test]
    fn view_reads_set_variables_through() {
        let mut unif = Unif::new();
        let scope = unif.initial_scope();
        let u = unif.fresh_uvar(k_type(), scope);
        let mention = unif.t_uvar(Perm::identity(), u);
        assert!(matches!(unif.view(&mention), TypeView::UVar(_, _)));

        let unit = unif.t_var(unif.builtins.unit);
        let _ = unif.raw_set(&Perm::identity(), u, unit);
        match unif.view(&mention) {
            TypeView::Var(v) => assert_eq!(v, unif.builtins.unit),
            view => panic!("expected a rigid view, got {view:?}"),
        }
    }

    #[test]
    fn view_resolves_chains_of_set_variables() {
        let mut unif = Unif::new();
        let scope = unif.initial_scope();
        let u1 = unif.fresh_uvar(k_type(), scope.clone());
        let u2 = unif.fresh_uvar(k_type(), scope);
        let mention2 = unif.t_uvar(Perm::identity(), u2);
        let _ = unif.raw_set(&Perm::identity(), u1, mention2);
        let unit = unif.t_var(unif.builtins.unit);
        let _ = unif.raw_set(&Perm::identity(), u2, unit);

        let mention1 = unif.t_uvar(Perm::identity(), u1);
        assert!(matches!(unif.view(&mention1), TypeView::Var(v) if v == unif.builtins.unit));
    }

    #[test]
    fn delayed_permutations_rewrite_contents() {
        let mut unif = Unif::new();
        let a = unif.fresh_tvar(k_type());
        let b = unif.fresh_tvar(k_type());
        let scope = unif.initial_scope().add(a).add(b);
        let u = unif.fresh_uvar(k_type(), scope);
        let var_a = unif.t_var(a);
        let _ = unif.raw_set(&Perm::identity(), u, var_a);

        let mention = unif.t_uvar(Perm::swap(a, b), u);
        assert!(matches!(unif.view(&mention), TypeView::Var(v) if v == b));
    }

    #[test]
    fn whnf_returns_arguments_in_reverse_application_order() {
        let mut unif = Unif::new();
        let fun_kind = unif.kinds.k_arrows(vec![k_type(), k_effect()], k_type());
        let f = unif.fresh_tvar(fun_kind);
        let a = unif.fresh_tvar(k_type());
        let e = unif.fresh_tvar(k_effect());

        let head = unif.t_var(f);
        let args = [unif.t_var(a), unif.t_var(e)];
        let t = unif.t_apps(head, args);
        match unif.whnf(&t) {
            TypeWhnf::Neutral(WhnfHead::Var(v), args) => {
                assert_eq!(v, f);
                assert_eq!(args.len(), 2);
                assert!(matches!(unif.view(&args[0]), TypeView::Var(v) if v == e));
                assert!(matches!(unif.view(&args[1]), TypeView::Var(v) if v == a));
            }
            whnf => panic!("expected a neutral, got {whnf:?}"),
        }
    }

    #[test]
    fn whnf_unfolds_set_variables_in_head_position() {
        let mut unif = Unif::new();
        let fun_kind = unif.kinds.k_arrow(k_type(), k_type());
        let f = unif.fresh_tvar(fun_kind.clone());
        let a = unif.fresh_tvar(k_type());
        let scope = unif.initial_scope().add(f).add(a);
        let u = unif.fresh_uvar(fun_kind, scope);
        let var_f = unif.t_var(f);
        let _ = unif.raw_set(&Perm::identity(), u, var_f);

        let head = unif.t_uvar(Perm::identity(), u);
        let arg = unif.t_var(a);
        let t = unif.t_app(head, arg);
        match unif.whnf(&t) {
            TypeWhnf::Neutral(WhnfHead::Var(v), args) => {
                assert_eq!(v, f);
                assert_eq!(args.len(), 1);
            }
            whnf => panic!("expected a neutral, got {whnf:?}"),
        }
    }

    #[test]
    fn fix_promotes_to_a_rigid_of_the_same_kind() {
        let mut unif = Unif::new();
        let scope = unif.initial_scope();
        let u = unif.fresh_uvar(k_effect(), scope);
        let promoted = unif.fix(u);
        assert_eq!(unif.tvars.kind(promoted), &Kind::Effect);

        let mention = unif.t_uvar(Perm::identity(), u);
        assert!(matches!(unif.view(&mention), TypeView::Var(v) if v == promoted));
    }

    #[test]
    fn free_rigids_sees_through_set_variables() {
        let mut unif = Unif::new();
        let a = unif.fresh_tvar(k_type());
        let scope = unif.initial_scope().add(a);
        let u = unif.fresh_uvar(k_type(), scope);
        let var_a = unif.t_var(a);
        let _ = unif.raw_set(&Perm::identity(), u, var_a);

        let mention = unif.t_uvar(Perm::identity(), u);
        let arg = Scheme::of_type(unif.t_var(unif.builtins.int));
        let arrow = unif.t_pure_arrow(arg, mention);
        let free = unif.free_rigids(&arrow);
        assert!(free.contains(&a));
        assert!(free.contains(&unif.builtins.int));
    }

    #[test]
    fn occurs_check_finds_nested_mentions() {
        let mut unif = Unif::new();
        let scope = unif.initial_scope();
        let u = unif.fresh_uvar(k_type(), scope);
        let mention = unif.t_uvar(Perm::identity(), u);
        let arg = Scheme::of_type(unif.t_var(unif.builtins.unit));
        let nested = unif.t_pure_arrow(arg, mention);
        assert!(unif.occurs_check(u, &nested));

        let flat = unif.t_var(unif.builtins.unit);
        assert!(!unif.occurs_check(u, &flat));
    }
}
