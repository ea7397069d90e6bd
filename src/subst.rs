use std::collections::{BTreeSet, HashMap};

use crate::scheme::{CtorDecl, Scheme};
use crate::tvar::TypeVar;
use crate::r#type::{Type, TypeKind};
use crate::unif::Unif;

/// A parallel substitution from rigid type variables to types, including
/// rigid-to-rigid renamings. All bindings are applied atomically: adding a
/// binding never rewrites the previously added ones.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    map: HashMap<TypeVar, Type>,
}

impl Subst {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bind a rigid variable to a fresh rigid. Binding a variable twice is
    /// an invariant violation.
    pub fn rename_to_fresh(&mut self, from: TypeVar, to: TypeVar) {
        self.add_type(from, Type::var(to));
    }

    /// Bind a rigid variable to a type. The substitution is parallel: `t` is
    /// stored as given, never pre-substituted. Binding a variable twice is
    /// an invariant violation.
    pub fn add_type(&mut self, from: TypeVar, t: Type) {
        let previous = self.map.insert(from, t);
        assert!(
            previous.is_none(),
            "variable {from} bound twice in a substitution"
        );
    }

    pub fn get(&self, var: TypeVar) -> Option<&Type> {
        self.map.get(&var)
    }

    pub fn contains(&self, var: TypeVar) -> bool {
        self.map.contains_key(&var)
    }

    pub fn domain(&self) -> impl Iterator<Item = TypeVar> + '_ {
        self.map.keys().copied()
    }
}

impl Unif {
    /// Apply a substitution to a type.
    ///
    /// Unset unification variables are left alone: renamings of rigids
    /// inside their cells go through the delayed-permutation machinery, not
    /// through substitution. Row ends that are substituted rigid row
    /// variables are re-spliced into the row.
    pub fn subst_type(&self, subst: &Subst, t: &Type) -> Type {
        if subst.is_empty() {
            return t.clone();
        }
        use TypeKind::*;
        match t.data() {
            UVar(_, _) => t.clone(),
            Var(v) => subst.get(*v).cloned().unwrap_or_else(|| t.clone()),
            Effect(vars) => {
                let mut out = BTreeSet::new();
                for &v in vars {
                    self.subst_effect_member(subst, v, &mut out);
                }
                Type::new(Effect(out))
            }
            Effrow(vars, end) => {
                let mut out_vars = BTreeSet::new();
                for &v in vars {
                    self.subst_effect_member(subst, v, &mut out_vars);
                }
                enum EndStep {
                    Done(Option<Type>),
                    // a substituted row rigid is re-spliced
                    Splice(BTreeSet<TypeVar>, Option<Type>),
                }
                let mut current = end.clone();
                let out_end = loop {
                    let Some(e) = current else { break None };
                    let step = match e.data() {
                        Var(v) => match subst.get(*v) {
                            None => EndStep::Done(Some(e.clone())),
                            Some(image) => match image.data() {
                                Effrow(more, tail) => {
                                    EndStep::Splice(more.clone(), tail.clone())
                                }
                                Var(_) | UVar(_, _) | App(_, _) => {
                                    EndStep::Done(Some(image.clone()))
                                }
                                _ => panic!("row end substituted with a non-row type"),
                            },
                        },
                        UVar(_, _) => EndStep::Done(Some(e.clone())),
                        App(_, _) => EndStep::Done(Some(self.subst_type(subst, &e))),
                        _ => panic!("malformed row end"),
                    };
                    match step {
                        EndStep::Done(e) => break e,
                        EndStep::Splice(more, tail) => {
                            out_vars.extend(more);
                            current = tail;
                        }
                    }
                };
                Type::new(Effrow(out_vars, out_end))
            }
            PureArrow(arg, ret) => Type::new(PureArrow(
                self.subst_scheme(subst, arg),
                self.subst_type(subst, ret),
            )),
            Arrow(arg, ret, eff) => Type::new(Arrow(
                self.subst_scheme(subst, arg),
                self.subst_type(subst, ret),
                self.subst_type(subst, eff),
            )),
            Handler(h) => {
                debug_assert!(
                    !subst.contains(h.eff),
                    "substitution domain overlaps a handler binder"
                );
                Type::new(Handler(Box::new(crate::r#type::HandlerType {
                    eff: h.eff,
                    cap: self.subst_type(subst, &h.cap),
                    in_ty: self.subst_type(subst, &h.in_ty),
                    in_eff: self.subst_type(subst, &h.in_eff),
                    out_ty: self.subst_type(subst, &h.out_ty),
                    out_eff: self.subst_type(subst, &h.out_eff),
                })))
            }
            Label(l) => Type::new(Label(Box::new(crate::r#type::LabelType {
                eff: self.subst_type(subst, &l.eff),
                delim_ty: self.subst_type(subst, &l.delim_ty),
                delim_eff: self.subst_type(subst, &l.delim_eff),
            }))),
            App(f, a) => Type::new(App(
                self.subst_type(subst, f),
                self.subst_type(subst, a),
            )),
        }
    }

    /// Substitute one member of an effect set, splattering a ground-effect
    /// image into the set.
    fn subst_effect_member(&self, subst: &Subst, v: TypeVar, out: &mut BTreeSet<TypeVar>) {
        match subst.get(v) {
            None => {
                out.insert(v);
            }
            Some(image) => match image.data() {
                TypeKind::Var(v2) => {
                    out.insert(*v2);
                }
                TypeKind::Effect(more) => out.extend(more.iter().copied()),
                _ => panic!("effect member substituted with a non-effect type"),
            },
        }
    }

    /// Apply a substitution to a scheme. Bound variables are globally
    /// unique, so they can never be captured; the domain must not mention
    /// them.
    pub fn subst_scheme(&self, subst: &Subst, scheme: &Scheme) -> Scheme {
        debug_assert!(
            scheme.targs.iter().all(|(_, var)| !subst.contains(*var)),
            "substitution domain overlaps a scheme binder"
        );
        Scheme {
            targs: scheme.targs.clone(),
            named: scheme
                .named
                .iter()
                .map(|(name, sch)| (name.clone(), self.subst_scheme(subst, sch)))
                .collect(),
            body: self.subst_type(subst, &scheme.body),
        }
    }

    /// Apply a substitution to a constructor declaration.
    pub fn subst_ctor(&self, subst: &Subst, ctor: &CtorDecl) -> CtorDecl {
        debug_assert!(
            ctor.targs.iter().all(|(_, var)| !subst.contains(*var)),
            "substitution domain overlaps a constructor binder"
        );
        CtorDecl {
            name: ctor.name,
            targs: ctor.targs.clone(),
            named: ctor
                .named
                .iter()
                .map(|(name, sch)| (name.clone(), self.subst_scheme(subst, sch)))
                .collect(),
            arg_schemes: ctor
                .arg_schemes
                .iter()
                .map(|sch| self.subst_scheme(subst, sch))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{k_effect, k_effrow, k_type};
    use crate::unif::Unif;
    use crate::r#type::TypeView;

    #[test]
    fn bindings_apply_in_parallel() {
        let mut unif = Unif::new();
        let a = unif.fresh_tvar(k_type());
        let b = unif.fresh_tvar(k_type());
        let c = unif.fresh_tvar(k_type());

        // {a -> b, b -> c} must rewrite a to b, not chase through to c,
        // regardless of the order the bindings were added in
        let mut forward = Subst::empty();
        forward.rename_to_fresh(a, b);
        forward.rename_to_fresh(b, c);
        let mut backward = Subst::empty();
        backward.rename_to_fresh(b, c);
        backward.rename_to_fresh(a, b);

        let var_a = unif.t_var(a);
        for subst in [&forward, &backward] {
            let image = unif.subst_type(subst, &var_a);
            assert!(matches!(unif.view(&image), TypeView::Var(v) if v == b));
        }
    }

    #[test]
    #[should_panic(expected = "bound twice")]
    fn rebinding_a_variable_is_rejected() {
        let mut unif = Unif::new();
        let a = unif.fresh_tvar(k_type());
        let b = unif.fresh_tvar(k_type());
        let c = unif.fresh_tvar(k_type());

        let mut subst = Subst::empty();
        subst.rename_to_fresh(a, b);
        subst.rename_to_fresh(a, c);
    }

    #[test]
    fn substituted_row_ends_are_respliced() {
        let mut unif = Unif::new();
        let io = unif.builtins.io;
        let exn = unif.fresh_named_tvar(k_effect(), ustr::ustr("Exn"));
        let tail = unif.fresh_tvar(k_effrow());

        // [IO | tail] with tail -> [Exn] becomes the longer closed row [IO, Exn]
        let var_tail = unif.t_var(tail);
        let row = unif.t_effrow([io], Some(var_tail));
        let image = unif.t_closed_effrow([exn]);
        let mut subst = Subst::empty();
        subst.add_type(tail, image);

        let substituted = unif.subst_type(&subst, &row);
        let (vars, end) = unif.row_parts(&substituted);
        assert!(vars.contains(&io) && vars.contains(&exn));
        assert!(end.is_none());
    }

    #[test]
    fn ground_effects_are_splattered() {
        let mut unif = Unif::new();
        let io = unif.builtins.io;
        let e1 = unif.fresh_tvar(k_effect());
        let e2 = unif.fresh_tvar(k_effect());

        let image = unif.t_effect([io, e2]);
        let mut subst = Subst::empty();
        subst.add_type(e1, image);

        let eff = unif.t_effect([e1]);
        let substituted = unif.subst_type(&subst, &eff);
        match unif.view(&substituted) {
            TypeView::Effect(vars) => {
                assert!(vars.contains(&io) && vars.contains(&e2));
                assert!(!vars.contains(&e1));
            }
            view => panic!("expected a ground effect, got {view:?}"),
        }
    }

    #[test]
    fn unset_variables_are_left_alone() {
        let mut unif = Unif::new();
        let a = unif.fresh_tvar(k_type());
        let scope = unif.initial_scope().add(a);
        let u = unif.fresh_uvar(k_type(), scope);

        let mention = unif.t_uvar(crate::perm::Perm::identity(), u);
        let int = unif.t_var(unif.builtins.int);
        let mut subst = Subst::empty();
        subst.add_type(a, int);

        let substituted = unif.subst_type(&subst, &mention);
        assert_eq!(substituted, mention);
    }
}
