//! Property tests for the unification core.
//!
//! These stress invariants that must hold for arbitrary inputs, not just
//! hand-picked examples:
//!
//! 1. Substitution is parallel: binding order never changes the result.
//! 2. `view` never exposes a set unification variable.
//! 3. `whnf` is stable on the head it returns.
//! 4. Rows are equal modulo permutation of their simple variables.
//! 5. Scope narrowing never grows a scope; levels are monotone.
//! 6. Setting a variable to a type containing itself fails at any nesting.
//! 7. `refresh` produces pairwise-distinct bound variables.
//! 8. The positivity test is monotone in the non-recursive scope.
//! 9. `try_shrink_scope` answers exactly the free-rigid membership question.

use proptest::prelude::*;

use crate::kind::{k_effect, k_type};
use crate::perm::Perm;
use crate::scheme::{CtorDecl, Scheme, TName};
use crate::scope::Scope;
use crate::subst::Subst;
use crate::tvar::TypeVar;
use crate::r#type::{Type, TypeView, TypeWhnf, WhnfHead};
use crate::unif::Unif;
use crate::unify::UnifyError;
use ustr::ustr;

const VAR_POOL: u8 = 4;
const EFF_POOL: u8 = 3;

/// A session-independent description of a type, interpreted against a fresh
/// session per test case.
#[derive(Clone, Debug)]
enum TyDesc {
    Builtin(u8),
    Var(u8),
    PureArrow(Box<TyDesc>, Box<TyDesc>),
    Arrow(Box<TyDesc>, Box<TyDesc>, Vec<u8>),
}

fn arb_ty() -> BoxedStrategy<TyDesc> {
    let leaf = prop_oneof![
        (0u8..5).prop_map(TyDesc::Builtin),
        (0u8..VAR_POOL).prop_map(TyDesc::Var),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(arg, ret)| TyDesc::PureArrow(Box::new(arg), Box::new(ret))),
            (
                inner.clone(),
                inner,
                proptest::collection::vec(0u8..EFF_POOL, 0..3)
            )
                .prop_map(|(arg, ret, row)| TyDesc::Arrow(Box::new(arg), Box::new(ret), row)),
        ]
    })
    .boxed()
}

struct Session {
    unif: Unif,
    vars: Vec<TypeVar>,
    effs: Vec<TypeVar>,
}

fn session() -> Session {
    let mut unif = Unif::new();
    let vars = (0..VAR_POOL).map(|_| unif.fresh_tvar(k_type())).collect();
    let effs = (0..EFF_POOL).map(|_| unif.fresh_tvar(k_effect())).collect();
    Session { unif, vars, effs }
}

impl Session {
    fn build(&self, desc: &TyDesc) -> Type {
        match desc {
            TyDesc::Builtin(i) => {
                let b = self.unif.builtins;
                let var = [b.int, b.int64, b.string, b.char, b.unit][*i as usize];
                self.unif.t_var(var)
            }
            TyDesc::Var(i) => self.unif.t_var(self.vars[*i as usize]),
            TyDesc::PureArrow(arg, ret) => {
                let arg = self.build(arg);
                let ret = self.build(ret);
                self.unif.t_pure_arrow(Scheme::of_type(arg), ret)
            }
            TyDesc::Arrow(arg, ret, row) => {
                let arg = self.build(arg);
                let ret = self.build(ret);
                let row = self
                    .unif
                    .t_closed_effrow(row.iter().map(|&i| self.effs[i as usize]));
                self.unif.t_arrow(Scheme::of_type(arg), ret, row)
            }
        }
    }

    /// The scope every generated type lives in.
    fn full_scope(&self) -> Scope {
        let mut scope = self.unif.initial_scope();
        for &v in self.vars.iter().chain(self.effs.iter()) {
            scope = scope.add(v);
        }
        scope
    }
}

proptest! {
    // 1. substitution is parallel
    #[test]
    fn subst_binding_order_is_irrelevant(
        desc in arb_ty(),
        target in arb_ty(),
        v1 in 0u8..VAR_POOL,
        v2 in 0u8..VAR_POOL,
    ) {
        prop_assume!(v1 != v2);
        let s = session();
        let t = s.build(&desc);
        let t1 = s.build(&target);
        let t2 = s.build(&TyDesc::Builtin(4));

        let mut forward = Subst::empty();
        forward.add_type(s.vars[v1 as usize], t1.clone());
        forward.add_type(s.vars[v2 as usize], t2.clone());
        let mut backward = Subst::empty();
        backward.add_type(s.vars[v2 as usize], t2);
        backward.add_type(s.vars[v1 as usize], t1);

        prop_assert_eq!(
            s.unif.subst_type(&forward, &t),
            s.unif.subst_type(&backward, &t)
        );
    }

    // 2. view never exposes a set variable
    #[test]
    fn view_never_returns_a_set_uvar(desc in arb_ty()) {
        let mut s = session();
        let t = s.build(&desc);
        let u = s.unif.fresh_uvar(k_type(), s.full_scope());
        let _ = s.unif.raw_set(&Perm::identity(), u, t);

        let mention = s.unif.t_uvar(Perm::identity(), u);
        if let TypeView::UVar(_, w) = s.unif.view(&mention) {
            prop_assert!(!s.unif.uvars.is_set(w));
        }
    }

    // 3. whnf is stable on its head
    #[test]
    fn whnf_is_stable(desc in arb_ty()) {
        let s = session();
        let t = s.build(&desc);
        let first = s.unif.whnf(&t);
        if let TypeWhnf::Neutral(WhnfHead::Var(v), _) = &first {
            let head = s.unif.t_var(*v);
            match s.unif.whnf(&head) {
                TypeWhnf::Neutral(WhnfHead::Var(w), args) => {
                    prop_assert_eq!(*v, w);
                    prop_assert!(args.is_empty());
                }
                whnf => prop_assert!(false, "head stopped being neutral: {whnf:?}"),
            }
        }
        prop_assert_eq!(first, s.unif.whnf(&t));
    }

    // 4. rows are equal modulo permutation of their simple variables
    #[test]
    fn rows_are_permutation_invariant(
        members in proptest::collection::vec(0u8..EFF_POOL, 0..6)
    ) {
        let mut s = session();
        let in_order: Vec<TypeVar> = members.iter().map(|&i| s.effs[i as usize]).collect();
        let reversed: Vec<TypeVar> = in_order.iter().rev().copied().collect();

        let r1 = s.unif.t_closed_effrow(in_order);
        let r2 = s.unif.t_closed_effrow(reversed);
        prop_assert_eq!(s.unif.row_parts(&r1), s.unif.row_parts(&r2));
        prop_assert!(s.unif.unify_row(&r1, &r2).is_ok());
    }

    // 5. narrowing never grows a scope, levels are monotone
    #[test]
    fn scope_narrowing_shrinks_and_levels_grow(
        increments in 0u32..4,
        keep in proptest::collection::vec(any::<bool>(), VAR_POOL as usize),
    ) {
        let mut s = session();
        let mut scope = s.unif.initial_scope();
        let mut last_level = scope.level();
        for _ in 0..increments {
            scope = scope.incr_level();
            prop_assert!(scope.level() >= last_level);
            last_level = scope.level();
        }
        for &v in &s.vars {
            scope = scope.add(v);
        }

        let u = s.unif.fresh_uvar(k_type(), scope);
        let before = s.unif.uvars.scope(u).len();
        let vars = s.vars.clone();
        s.unif.uvars.filter_scope(u, 0, move |v| {
            vars.iter()
                .position(|&w| w == v)
                .map_or(false, |i| keep[i])
        });
        prop_assert!(s.unif.uvars.scope(u).len() <= before);

        // narrowing again with the same predicate is idempotent
        let mid = s.unif.uvars.scope(u).len();
        s.unif.uvars.filter_scope(u, 0, |_| true);
        prop_assert_eq!(s.unif.uvars.scope(u).len(), mid);
    }

    // 6. occurs check fires through any nesting
    #[test]
    fn occurs_is_caught_at_any_depth(desc in arb_ty(), depth in 1u32..4) {
        let mut s = session();
        let u = s.unif.fresh_uvar(k_type(), s.full_scope());
        let mention = s.unif.t_uvar(Perm::identity(), u);

        let mut nested = mention.clone();
        for _ in 0..depth {
            let side = s.build(&desc);
            nested = s.unif.t_pure_arrow(Scheme::of_type(side), nested);
        }
        prop_assert!(s.unif.occurs_check(u, &nested));
        prop_assert!(matches!(
            s.unif.unify_type(&mention, &nested),
            Err(UnifyError::Occurs(_, _))
        ));
    }

    // 7. refresh freshness
    #[test]
    fn refresh_always_freshens(bound in 1usize..4, rounds in 1usize..4) {
        let mut s = session();
        let targs: Vec<(TName, TypeVar)> = (0..bound)
            .map(|i| {
                (
                    TName::Named(ustr(&format!("a{i}"))),
                    s.unif.fresh_tvar(k_type()),
                )
            })
            .collect();
        let body = s.unif.t_var(targs[0].1);
        let scheme = Scheme { targs, named: vec![], body };

        let mut seen: std::collections::BTreeSet<TypeVar> =
            scheme.targs.iter().map(|(_, v)| *v).collect();
        for _ in 0..rounds {
            let refreshed = s.unif.refresh_scheme(&scheme);
            for (_, v) in &refreshed.targs {
                prop_assert!(seen.insert(*v), "bound variable {v} reused");
            }
        }
    }

    // 8. positivity is monotone in the scope
    #[test]
    fn positivity_is_monotone(desc in arb_ty(), split in 0usize..=VAR_POOL as usize) {
        let s = session();
        let t = s.build(&desc);
        let ctor = CtorDecl::new(ustr("C"), vec![], vec![], vec![Scheme::of_type(t)]);

        let mut smaller = s.unif.initial_scope();
        for &e in &s.effs {
            smaller = smaller.add(e);
        }
        for &v in &s.vars[..split] {
            smaller = smaller.add(v);
        }
        let mut larger = smaller.clone();
        for &v in &s.vars[split..] {
            larger = larger.add(v);
        }

        if s.unif.strictly_positive(&smaller, &ctor) {
            prop_assert!(s.unif.strictly_positive(&larger, &ctor));
        }
    }

    // 9. shrink answers the free-rigid membership question
    #[test]
    fn shrink_matches_free_rigids(desc in arb_ty(), split in 0usize..=VAR_POOL as usize) {
        let mut s = session();
        let t = s.build(&desc);
        let mut scope = s.unif.initial_scope();
        for &e in &s.effs {
            scope = scope.add(e);
        }
        for &v in &s.vars[..split] {
            scope = scope.add(v);
        }

        let free = s.unif.free_rigids(&t);
        match s.unif.try_shrink_scope(&scope, &t) {
            Ok(()) => {
                for v in free {
                    prop_assert!(scope.mem(v), "free rigid {v} outside the scope");
                }
            }
            Err(v) => {
                prop_assert!(free.contains(&v));
                prop_assert!(!scope.mem(v));
            }
        }
    }
}
