use test_log::test;

use effra::{k_effect, k_type, LabelType, Name, Perm, Scheme, TName, TypeView, Unif, UnifyError};
use ustr::ustr;

/// Instantiating `∀a. a -> a` twice and unifying the copies at different
/// types must not interfere: each refresh gets its own rigids.
#[test]
fn refreshed_instances_are_independent() {
    let mut unif = Unif::new();
    let a = unif.fresh_named_tvar(k_type(), ustr("a"));
    let body = {
        let arg = unif.t_var(a);
        let ret = unif.t_var(a);
        unif.t_pure_arrow(Scheme::of_type(arg), ret)
    };
    let identity = Scheme {
        targs: vec![(TName::Named(ustr("a")), a)],
        named: vec![],
        body,
    };

    let inst1 = unif.refresh_scheme(&identity);
    let inst2 = unif.refresh_scheme(&identity);
    let a1 = inst1.targs[0].1;
    let a2 = inst2.targs[0].1;
    assert_ne!(a1, a2);

    // the two instances do not share variables with each other or the scheme
    match (unif.view(&inst1.body), unif.view(&inst2.body)) {
        (TypeView::PureArrow(arg1, _), TypeView::PureArrow(arg2, _)) => {
            assert!(matches!(unif.view(&arg1.body), TypeView::Var(v) if v == a1));
            assert!(matches!(unif.view(&arg2.body), TypeView::Var(v) if v == a2));
        }
        views => panic!("expected two arrows, got {views:?}"),
    }
}

/// Higher-rank named parameters: a method parameter keeps its own scheme,
/// and unification matches named parameters by name.
#[test]
fn named_parameters_unify_by_name() {
    let mut unif = Unif::new();
    let make = |unif: &mut Unif| {
        let int = unif.t_var(unif.builtins.int);
        let string = unif.t_var(unif.builtins.string);
        let method = Scheme::of_type(unif.t_pure_arrow(Scheme::of_type(int), string));
        let body = unif.t_var(unif.builtins.unit);
        Scheme {
            targs: vec![],
            named: vec![(Name::Method(ustr("show")), method)],
            body,
        }
    };
    let s1 = make(&mut unif);
    let s2 = make(&mut unif);
    assert!(unif.unify_scheme(&s1, &s2).is_ok());

    let mut s3 = make(&mut unif);
    s3.named[0].0 = Name::Implicit(ustr("show"));
    assert!(unif.unify_scheme(&s1, &s3).is_err());
}

/// The distinguished label parameter carries no name of its own: two schemes
/// taking a label for the same effect unify, and a label parameter never
/// matches an ordinary named one.
#[test]
fn label_parameters_are_distinguished() {
    let mut unif = Unif::new();
    let exn = unif.fresh_named_tvar(k_effect(), ustr("Exn"));
    let make = |unif: &mut Unif| {
        let eff = unif.t_effect([exn]);
        let delim_ty = unif.t_var(unif.builtins.unit);
        let delim_eff = unif.r_io();
        let label = unif.t_label(LabelType::new(eff, delim_ty, delim_eff));
        let body = unif.t_var(unif.builtins.unit);
        Scheme {
            targs: vec![],
            named: vec![(Name::Label, Scheme::of_type(label))],
            body,
        }
    };
    let s1 = make(&mut unif);
    let s2 = make(&mut unif);
    assert!(unif.unify_scheme(&s1, &s2).is_ok());

    let mut s3 = make(&mut unif);
    s3.named[0].0 = Name::Var(ustr("lbl"));
    assert!(unif.unify_scheme(&s1, &s3).is_err());
}

/// A unification variable set inside one instantiation must not leak rigids
/// of another: the scope discipline catches the escape.
#[test]
fn instantiation_rigids_do_not_leak_through_uvars() {
    let mut unif = Unif::new();
    let scope = unif.initial_scope();
    let u = unif.fresh_uvar(k_type(), scope);

    let skolem = unif.fresh_named_tvar(k_type(), ustr("sk"));
    let mention = unif.t_uvar(Perm::identity(), u);
    let var_sk = unif.t_var(skolem);
    match unif.unify_type(&mention, &var_sk) {
        Err(UnifyError::Escape(v)) => assert_eq!(v, skolem),
        other => panic!("expected an escape, got {other:?}"),
    }
}
