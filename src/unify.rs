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

use itertools::Itertools;

use crate::error::ErrorClass;
use crate::format::FormatWith;
use crate::kind::{k_effrow, Kind, KindUVar};
use crate::perm::Perm;
use crate::scheme::Scheme;
use crate::scope::Scope;
use crate::span::Span;
use crate::subst::Subst;
use crate::r#type::{HandlerType, Type, TypeView, TypeWhnf, WhnfHead};
use crate::unif::Unif;
use crate::uvar::UVar;

/// An expected unification failure, surfaced to the error channel by the
/// calling phase.
#[derive(Debug, Clone)]
pub enum UnifyError {
    TypeMismatch(Type, Type),
    RowMismatch(Type, Type),
    KindMismatch(Kind, Kind),
    /// An effect kind was required to be non-effect.
    NonEffectKind(Kind),
    /// The variable would be set to a type containing itself.
    Occurs(UVar, Type),
    KindOccurs(KindUVar, Kind),
    /// A rigid variable escaped the scope of the variable being set.
    Escape(crate::tvar::TypeVar),
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UnifyError::*;
        match self {
            TypeMismatch(t1, t2) => write!(f, "cannot unify {t1} with {t2}"),
            RowMismatch(r1, r2) => write!(f, "cannot unify row {r1} with {r2}"),
            KindMismatch(k1, k2) => write!(f, "cannot unify kind {k1} with {k2}"),
            NonEffectKind(k) => write!(f, "effect kind {k} used where a value kind is required"),
            Occurs(u, t) => write!(f, "{u} occurs in {t}"),
            KindOccurs(u, k) => write!(f, "{u} occurs in kind {k}"),
            Escape(v) => write!(f, "rigid variable {v} escapes its scope"),
        }
    }
}

impl Unif {
    /// Structural kind unification with occurs check and the non-effect
    /// constraint.
    pub fn unify_kind(&mut self, k1: &Kind, k2: &Kind) -> Result<(), UnifyError> {
        match (self.kinds.view(k1), self.kinds.view(k2)) {
            (Kind::UVar(a), Kind::UVar(b)) if a == b => Ok(()),
            (Kind::UVar(a), k) => self.bind_kind(a, k),
            (k, Kind::UVar(b)) => self.bind_kind(b, k),
            (Kind::Type, Kind::Type)
            | (Kind::Effect, Kind::Effect)
            | (Kind::EffRow, Kind::EffRow) => Ok(()),
            (Kind::Arrow(a1, a2), Kind::Arrow(b1, b2)) => {
                self.unify_kind(&a1, &b1)?;
                self.unify_kind(&a2, &b2)
            }
            (a, b) => Err(UnifyError::KindMismatch(a, b)),
        }
    }

    fn bind_kind(&mut self, u: KindUVar, kind: Kind) -> Result<(), UnifyError> {
        if self.kinds.contains_uvar(u, &kind) {
            return Err(UnifyError::KindOccurs(u, kind));
        }
        if self.kinds.set(u, kind.clone()) {
            Ok(())
        } else {
            Err(UnifyError::NonEffectKind(kind))
        }
    }

    /// Unify two types. Dispatches on kind first: ground effects and rows
    /// have their own disciplines, everything else is structural.
    pub fn unify_type(&mut self, t1: &Type, t2: &Type) -> Result<(), UnifyError> {
        let k1 = self.kind_of(t1);
        let k2 = self.kind_of(t2);
        self.unify_kind(&k1, &k2)?;
        match self.kinds.view(&k1) {
            Kind::Effect => self.unify_ground_effect(t1, t2),
            Kind::EffRow => self.unify_row(t1, t2),
            _ => self.unify_value_type(t1, t2),
        }
    }

    fn unify_ground_effect(&mut self, t1: &Type, t2: &Type) -> Result<(), UnifyError> {
        use TypeView::*;
        match (self.view(t1), self.view(t2)) {
            (UVar(p1, u1), UVar(p2, u2)) if u1 == u2 => {
                if p1 == p2 {
                    Ok(())
                } else {
                    Err(UnifyError::TypeMismatch(t1.clone(), t2.clone()))
                }
            }
            (UVar(p, u), _) => self.bind_uvar(&p, u, t2),
            (_, UVar(p, u)) => self.bind_uvar(&p, u, t1),
            (Effect(s1), Effect(s2)) => {
                if s1 == s2 {
                    Ok(())
                } else {
                    Err(UnifyError::TypeMismatch(t1.clone(), t2.clone()))
                }
            }
            (Var(v1), Var(v2)) if v1 == v2 => Ok(()),
            (App(f1, a1), App(f2, a2)) => {
                self.unify_type(&f1, &f2)?;
                self.unify_type(&a1, &a2)
            }
            _ => Err(UnifyError::TypeMismatch(t1.clone(), t2.clone())),
        }
    }

    fn unify_value_type(&mut self, t1: &Type, t2: &Type) -> Result<(), UnifyError> {
        use TypeWhnf::*;
        let mismatch = || UnifyError::TypeMismatch(t1.clone(), t2.clone());
        match (self.whnf(t1), self.whnf(t2)) {
            (Neutral(h1, args1), Neutral(h2, args2)) => match (h1, h2) {
                (WhnfHead::UVar(p1, u1), WhnfHead::UVar(p2, u2))
                    if u1 == u2 && args1.is_empty() && args2.is_empty() =>
                {
                    if p1 == p2 {
                        Ok(())
                    } else {
                        Err(mismatch())
                    }
                }
                (WhnfHead::UVar(p1, u1), _) if args1.is_empty() => self.bind_uvar(&p1, u1, t2),
                (_, WhnfHead::UVar(p2, u2)) if args2.is_empty() => self.bind_uvar(&p2, u2, t1),
                (WhnfHead::Var(v1), WhnfHead::Var(v2)) => {
                    if v1 != v2 || args1.len() != args2.len() {
                        return Err(mismatch());
                    }
                    // arguments are in reverse application order on both
                    // sides, so pairwise matching lines up
                    for (a1, a2) in args1.iter().zip(args2.iter()) {
                        self.unify_type(a1, a2)?;
                    }
                    Ok(())
                }
                // a unification variable applied to arguments needs
                // higher-order matching, out of this unifier's fragment
                _ => Err(mismatch()),
            },
            (PureArrow(a1, r1), PureArrow(a2, r2)) => {
                self.unify_scheme(&a1, &a2)?;
                self.unify_type(&r1, &r2)
            }
            (Arrow(a1, r1, e1), Arrow(a2, r2, e2)) => {
                self.unify_scheme(&a1, &a2)?;
                self.unify_type(&r1, &r2)?;
                self.unify_row(&e1, &e2)
            }
            (Handler(h1), Handler(h2)) => self.unify_handler(&h1, &h2),
            (Label(l1), Label(l2)) => {
                self.unify_type(&l1.eff, &l2.eff)?;
                self.unify_type(&l1.delim_ty, &l2.delim_ty)?;
                self.unify_row(&l1.delim_eff, &l2.delim_eff)
            }
            _ => Err(mismatch()),
        }
    }

    fn unify_handler(&mut self, h1: &HandlerType, h2: &HandlerType) -> Result<(), UnifyError> {
        // align the bound effect variables before comparing the components
        // they scope over
        let (cap2, in_ty2, in_eff2) = if h1.eff == h2.eff {
            (h2.cap.clone(), h2.in_ty.clone(), h2.in_eff.clone())
        } else {
            let swap = Perm::swap(h2.eff, h1.eff);
            (
                h2.cap.apply_perm(&swap),
                h2.in_ty.apply_perm(&swap),
                h2.in_eff.apply_perm(&swap),
            )
        };
        self.unify_type(&h1.cap, &cap2)?;
        self.unify_type(&h1.in_ty, &in_ty2)?;
        self.unify_row(&h1.in_eff, &in_eff2)?;
        self.unify_type(&h1.out_ty, &h2.out_ty)?;
        self.unify_row(&h1.out_eff, &h2.out_eff)
    }

    /// Unify two schemes up to alpha-renaming of their bound variables.
    pub fn unify_scheme(&mut self, s1: &Scheme, s2: &Scheme) -> Result<(), UnifyError> {
        if s1.is_monomorphic() && s2.is_monomorphic() {
            return self.unify_type(&s1.body, &s2.body);
        }
        if s1.targs.len() != s2.targs.len() || s1.named.len() != s2.named.len() {
            return Err(UnifyError::TypeMismatch(s1.body.clone(), s2.body.clone()));
        }
        let fresh1 = self.refresh_scheme(s1);
        let mut align = Subst::empty();
        for ((_, v1), (_, v2)) in fresh1.targs.iter().zip_eq(s2.targs.iter()) {
            let k1 = self.tvars.kind(*v1).clone();
            let k2 = self.tvars.kind(*v2).clone();
            self.unify_kind(&k1, &k2)?;
            align.rename_to_fresh(*v2, *v1);
        }
        for ((n1, sch1), (n2, sch2)) in fresh1.named.iter().zip_eq(s2.named.iter()) {
            if n1 != n2 {
                return Err(UnifyError::TypeMismatch(s1.body.clone(), s2.body.clone()));
            }
            let sch2 = self.subst_scheme(&align, sch2);
            self.unify_scheme(sch1, &sch2)?;
        }
        let body2 = self.subst_type(&align, &s2.body);
        self.unify_type(&fresh1.body, &body2)
    }

    /// Unify two effect rows up to permutation of their simple variables:
    /// the sets are compared, never sequences, and open ends absorb the
    /// variables the other side is missing.
    pub fn unify_row(&mut self, r1: &Type, r2: &Type) -> Result<(), UnifyError> {
        let mismatch = || UnifyError::RowMismatch(r1.clone(), r2.clone());
        let (s1, e1) = self.row_parts(r1);
        let (s2, e2) = self.row_parts(r2);
        let d1: BTreeSet<_> = s1.difference(&s2).copied().collect();
        let d2: BTreeSet<_> = s2.difference(&s1).copied().collect();
        match (e1, e2) {
            (None, None) => {
                if d1.is_empty() && d2.is_empty() {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            (Some(e1), None) => {
                if !d1.is_empty() {
                    return Err(mismatch());
                }
                self.bind_row_end(&e1, d2, None)
            }
            (None, Some(e2)) => {
                if !d2.is_empty() {
                    return Err(mismatch());
                }
                self.bind_row_end(&e2, d1, None)
            }
            (Some(e1), Some(e2)) => {
                use TypeView::*;
                match (self.view(&e1), self.view(&e2)) {
                    (UVar(p1, u1), UVar(p2, u2)) if u1 == u2 => {
                        if d1.is_empty() && d2.is_empty() && p1 == p2 {
                            Ok(())
                        } else {
                            Err(mismatch())
                        }
                    }
                    (UVar(p1, u1), UVar(p2, u2)) => {
                        let tail = self.fresh_shared_tail(&p1, u1, &p2, u2);
                        let row1 = self.t_effrow(d2, Some(tail.clone()));
                        self.bind_uvar(&p1, u1, &row1)?;
                        let row2 = self.t_effrow(d1, Some(tail));
                        self.bind_uvar(&p2, u2, &row2)
                    }
                    (UVar(p1, u1), _) => {
                        if !d1.is_empty() {
                            return Err(mismatch());
                        }
                        let row = self.t_effrow(d2, Some(e2));
                        self.bind_uvar(&p1, u1, &row)
                    }
                    (_, UVar(p2, u2)) => {
                        if !d2.is_empty() {
                            return Err(mismatch());
                        }
                        let row = self.t_effrow(d1, Some(e1));
                        self.bind_uvar(&p2, u2, &row)
                    }
                    (Var(v1), Var(v2)) => {
                        if v1 == v2 && d1.is_empty() && d2.is_empty() {
                            Ok(())
                        } else {
                            Err(mismatch())
                        }
                    }
                    (App(f1, a1), App(f2, a2)) => {
                        if !d1.is_empty() || !d2.is_empty() {
                            return Err(mismatch());
                        }
                        self.unify_type(&f1, &f2)?;
                        self.unify_type(&a1, &a2)
                    }
                    _ => Err(mismatch()),
                }
            }
        }
    }

    /// A fresh row tail living in the common scope of two open row ends.
    fn fresh_shared_tail(&mut self, p1: &Perm, u1: UVar, p2: &Perm, u2: UVar) -> Type {
        let eff1 = self.uvars.effective_perm(p1, u1);
        let eff2 = self.uvars.effective_perm(p2, u2);
        let s1 = self.uvars.scope(u1).perm(&eff1);
        let s2 = self.uvars.scope(u2).perm(&eff2);
        let common = if s1.level() <= s2.level() {
            s1.filter(|v, _| s2.mem(v))
        } else {
            s2.filter(|v, _| s1.mem(v))
        };
        let tail = self.uvars.fresh(k_effrow(), common);
        self.t_uvar(Perm::identity(), tail)
    }

    fn bind_row_end(
        &mut self,
        end: &Type,
        vars: BTreeSet<crate::tvar::TypeVar>,
        tail: Option<Type>,
    ) -> Result<(), UnifyError> {
        match self.view(end) {
            TypeView::UVar(p, u) => {
                let row = self.t_effrow(vars, tail);
                self.bind_uvar(&p, u, &row)
            }
            // a rigid or applied end can never equal a closed row
            _ => Err(UnifyError::RowMismatch(end.clone(), self.r_pure())),
        }
    }

    /// Set `u` (mentioned through `delayed`) to `t`: occurs check, one-shot
    /// write, then shrink `t` into the scope returned by the write.
    fn bind_uvar(&mut self, delayed: &Perm, u: UVar, t: &Type) -> Result<(), UnifyError> {
        if let TypeView::UVar(other, v) = self.view(t) {
            if v == u {
                return if *delayed == other {
                    Ok(())
                } else {
                    Err(UnifyError::TypeMismatch(
                        self.t_uvar(delayed.clone(), u),
                        t.clone(),
                    ))
                };
            }
        }
        if self.occurs_check(u, t) {
            return Err(UnifyError::Occurs(u, t.clone()));
        }
        log::trace!("binding {u} := {t}");
        let fit = self.raw_set(delayed, u, t.clone());
        self.try_shrink_scope(&fit, t).map_err(UnifyError::Escape)
    }

    /// Directional check used at call boundaries: open the actual type's
    /// rows upward, the expected type's rows downward, then unify.
    pub fn subsume(&mut self, scope: &Scope, actual: &Type, expected: &Type) -> Result<(), UnifyError> {
        let actual = self.open_up(scope, actual);
        let expected = self.open_down(scope, expected);
        self.unify_type(&actual, &expected)
    }

    /// Surface an expected unification failure on the error channel, with
    /// unification variables resolved in the message.
    pub fn report_unify_error(&mut self, span: Option<Span>, error: &UnifyError) {
        use UnifyError::*;
        let class = match error {
            TypeMismatch(_, _) | RowMismatch(_, _) => ErrorClass::TypeMismatch,
            KindMismatch(_, _) => ErrorClass::KindConflict,
            NonEffectKind(_) => ErrorClass::NonEffectViolation,
            Occurs(_, _) | KindOccurs(_, _) => ErrorClass::OccursCheck,
            Escape(_) => ErrorClass::ScopeEscape,
        };
        let message = error.format_with(self).to_string();
        self.errors.error(span, class, message);
    }
}

/// Session-aware formatting with resolved variables.
impl FormatWith<Unif> for UnifyError {
    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, unif: &Unif) -> fmt::Result {
        use UnifyError::*;
        match self {
            TypeMismatch(t1, t2) => {
                write!(f, "cannot unify ")?;
                t1.fmt_with(f, unif)?;
                write!(f, " with ")?;
                t2.fmt_with(f, unif)
            }
            RowMismatch(r1, r2) => {
                write!(f, "cannot unify row ")?;
                r1.fmt_with(f, unif)?;
                write!(f, " with ")?;
                r2.fmt_with(f, unif)
            }
            KindMismatch(k1, k2) => write!(f, "cannot unify kind {k1} with {k2}"),
            NonEffectKind(k) => write!(f, "effect kind {k} used where a value kind is required"),
            Occurs(u, t) => {
                write!(f, "{u} occurs in ")?;
                t.fmt_with(f, unif)
            }
            KindOccurs(u, k) => write!(f, "{u} occurs in kind {k}"),
            Escape(v) => {
                write!(f, "rigid variable ")?;
                v.fmt_with(f, unif)?;
                write!(f, " escapes its scope")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{k_effect, k_type};
    use ustr::ustr;

    #[test]
    fn rows_unify_up_to_permutation() {
        let mut unif = Unif::new();
        let io = unif.builtins.io;
        let exn = unif.fresh_named_tvar(k_effect(), ustr("Exn"));

        let r1 = unif.t_closed_effrow([io, exn]);
        let r2 = unif.t_closed_effrow([exn, io]);
        assert!(unif.unify_row(&r1, &r2).is_ok());

        let r3 = unif.t_closed_effrow([io]);
        assert!(matches!(
            unif.unify_row(&r1, &r3),
            Err(UnifyError::RowMismatch(_, _))
        ));
    }

    #[test]
    fn open_rows_absorb_missing_variables() {
        let mut unif = Unif::new();
        let io = unif.builtins.io;
        let exn = unif.fresh_named_tvar(k_effect(), ustr("Exn"));
        let scope = unif.initial_scope().add(exn);

        let tail = unif.fresh_uvar(k_effrow(), scope);
        let tail_mention = unif.t_uvar(Perm::identity(), tail);
        let open = unif.t_effrow([io], Some(tail_mention.clone()));
        let closed = unif.t_closed_effrow([io, exn]);
        assert!(unif.unify_row(&open, &closed).is_ok());

        // the tail was bound to the closed residual {Exn}
        let (vars, end) = unif.row_parts(&tail_mention);
        assert!(vars.contains(&exn));
        assert!(end.is_none());
    }

    #[test]
    fn two_open_rows_share_a_fresh_tail() {
        let mut unif = Unif::new();
        let io = unif.builtins.io;
        let exn = unif.fresh_named_tvar(k_effect(), ustr("Exn"));
        let scope = unif.initial_scope().add(exn);

        let u1 = unif.fresh_uvar(k_effrow(), scope.clone());
        let u2 = unif.fresh_uvar(k_effrow(), scope);
        let m1 = unif.t_uvar(Perm::identity(), u1);
        let m2 = unif.t_uvar(Perm::identity(), u2);
        let r1 = unif.t_effrow([io], Some(m1));
        let r2 = unif.t_effrow([exn], Some(m2));
        assert!(unif.unify_row(&r1, &r2).is_ok());

        let (s1, e1) = unif.row_parts(&r1);
        let (s2, e2) = unif.row_parts(&r2);
        assert_eq!(s1, s2);
        assert!(s1.contains(&io) && s1.contains(&exn));
        // both rows now end in the same fresh tail
        match (
            unif.view(&e1.expect("row must stay open")),
            unif.view(&e2.expect("row must stay open")),
        ) {
            (TypeView::UVar(_, w1), TypeView::UVar(_, w2)) => assert_eq!(w1, w2),
            views => panic!("expected open tails, got {views:?}"),
        }
    }

    #[test]
    fn occurs_check_rejects_cyclic_bindings() {
        let mut unif = Unif::new();
        let scope = unif.initial_scope();
        let u = unif.fresh_uvar(k_type(), scope);

        let mention = unif.t_uvar(Perm::identity(), u);
        let unit = unif.t_var(unif.builtins.unit);
        let arrow = unif.t_pure_arrow(Scheme::of_type(unit), mention.clone());
        assert!(matches!(
            unif.unify_type(&mention, &arrow),
            Err(UnifyError::Occurs(v, _)) if v == u
        ));
    }

    #[test]
    fn binding_shrinks_into_the_variable_scope() {
        let mut unif = Unif::new();
        let narrow = unif.initial_scope();
        let u = unif.fresh_uvar(k_type(), narrow.clone());
        let a = unif.fresh_tvar(k_type());

        // a rigid outside the variable's scope cannot flow into it
        let mention = unif.t_uvar(Perm::identity(), u);
        let var_a = unif.t_var(a);
        assert!(matches!(
            unif.unify_type(&mention, &var_a),
            Err(UnifyError::Escape(v)) if v == a
        ));
    }

    #[test]
    fn kind_mismatches_are_rejected_before_structure() {
        let mut unif = Unif::new();
        let unit = unif.t_var(unif.builtins.unit);
        let io_row = unif.r_io();
        assert!(matches!(
            unif.unify_type(&unit, &io_row),
            Err(UnifyError::KindMismatch(_, _))
        ));
    }

    #[test]
    fn non_effect_constraints_propagate_through_unification() {
        let mut unif = Unif::new();
        let constrained = unif.kinds.fresh_uvar(true);
        assert!(matches!(
            unif.unify_kind(&constrained, &Kind::Effect),
            Err(UnifyError::NonEffectKind(_))
        ));
        assert!(unif.unify_kind(&constrained, &Kind::Type).is_ok());
        assert_eq!(unif.kinds.view(&constrained), Kind::Type);
    }

    #[test]
    fn arrows_unify_componentwise() {
        let mut unif = Unif::new();
        let scope = unif.initial_scope();
        let u = unif.fresh_uvar(k_type(), scope);

        let unit = unif.t_var(unif.builtins.unit);
        let int = unif.t_var(unif.builtins.int);
        let mention = unif.t_uvar(Perm::identity(), u);
        let io1 = unif.r_io();
        let io2 = unif.r_io();
        let left = unif.t_arrow(Scheme::of_type(unit.clone()), mention.clone(), io1);
        let right = unif.t_arrow(Scheme::of_type(unit), int.clone(), io2);
        assert!(unif.unify_type(&left, &right).is_ok());
        assert!(matches!(
            unif.view(&mention),
            TypeView::Var(v) if v == unif.builtins.int
        ));

        // pure and impure arrows do not unify
        let pure = unif.t_pure_arrow(Scheme::of_type(int.clone()), int.clone());
        let io3 = unif.r_io();
        let impure = unif.t_arrow(Scheme::of_type(int.clone()), int, io3);
        assert!(unif.unify_type(&pure, &impure).is_err());
    }

    #[test]
    fn subsumption_keeps_impure_code_in_its_row() {
        let mut unif = Unif::new();
        let scope = unif.initial_scope();

        // actual: Unit ->[IO] Unit against expected: Unit ->[IO] Unit
        let unit = unif.t_var(unif.builtins.unit);
        let io1 = unif.r_io();
        let actual = unif.t_arrow(Scheme::of_type(unit.clone()), unit.clone(), io1);
        let io2 = unif.r_io();
        let expected = unif.t_arrow(Scheme::of_type(unit.clone()), unit, io2);
        assert!(unif.subsume(&scope, &actual, &expected).is_ok());
        assert!(unif.errors.assert_no_error().is_ok());
    }

    #[test]
    fn reported_errors_land_in_the_channel() {
        let mut unif = Unif::new();
        let unit = unif.t_var(unif.builtins.unit);
        let int = unif.t_var(unif.builtins.int);
        let error = unif.unify_type(&unit, &int).unwrap_err();
        unif.report_unify_error(None, &error);
        assert!(unif.errors.assert_no_error().is_err());
        assert_eq!(
            unif.errors.entries()[0].class,
            crate::error::ErrorClass::TypeMismatch
        );
    }
}
