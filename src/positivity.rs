use crate::scheme::{CtorDecl, Scheme};
use crate::scope::Scope;
use crate::r#type::{Type, TypeView};
use crate::unif::Unif;

impl Unif {
    /// The positivity test enabling pure deconstruction of recursive data.
    ///
    /// Holds iff every rigid in negative position of any parameter scheme of
    /// the constructor, and every scope of a mentioned unification variable,
    /// lies within `nonrec_scope`. Polarity flips under arrow domains, so a
    /// doubly-negated occurrence of the recursive variable is accepted.
    /// Monotone in the scope: enlarging `nonrec_scope` never un-accepts a
    /// constructor.
    pub fn strictly_positive(&self, nonrec_scope: &Scope, ctor: &CtorDecl) -> bool {
        let mut scope = nonrec_scope.clone();
        for (_, var) in &ctor.targs {
            scope = scope.add(*var);
        }
        ctor.named
            .iter()
            .all(|(_, sch)| self.positive_scheme(&scope, sch, true))
            && ctor
                .arg_schemes
                .iter()
                .all(|sch| self.positive_scheme(&scope, sch, true))
    }

    fn positive_scheme(&self, scope: &Scope, scheme: &Scheme, positive: bool) -> bool {
        let mut scope = scope.clone();
        for (_, var) in &scheme.targs {
            scope = scope.add(*var);
        }
        scheme
            .named
            .iter()
            .all(|(_, sch)| self.positive_scheme(&scope, sch, !positive))
            && self.positive_type(&scope, &scheme.body, positive)
    }

    fn positive_type(&self, scope: &Scope, t: &Type, positive: bool) -> bool {
        match self.view(t) {
            TypeView::Var(v) => positive || scope.mem(v),
            TypeView::UVar(delayed, u) => {
                // a uvar may later be set to anything in its scope, so the
                // whole scope must be non-recursive, at either polarity
                let eff = self.uvars.effective_perm(&delayed, u);
                self.uvars
                    .scope(u)
                    .vars()
                    .all(|v| scope.mem(eff.apply(v)))
            }
            TypeView::Effect(vars) => positive || vars.iter().all(|&v| scope.mem(v)),
            TypeView::Effrow(vars, end) => {
                (positive || vars.iter().all(|&v| scope.mem(v)))
                    && end.map_or(true, |e| self.positive_type(scope, &e, positive))
            }
            TypeView::PureArrow(arg, ret) => {
                self.positive_scheme(scope, &arg, !positive)
                    && self.positive_type(scope, &ret, positive)
            }
            TypeView::Arrow(arg, ret, eff) => {
                self.positive_scheme(scope, &arg, !positive)
                    && self.positive_type(scope, &ret, positive)
                    && self.positive_type(scope, &eff, positive)
            }
            TypeView::Handler(h) => {
                let inner = scope.add(h.eff);
                self.positive_type(&inner, &h.cap, !positive)
                    && self.positive_type(&inner, &h.in_ty, !positive)
                    && self.positive_type(&inner, &h.in_eff, !positive)
                    && self.positive_type(scope, &h.out_ty, positive)
                    && self.positive_type(scope, &h.out_eff, positive)
            }
            TypeView::Label(l) => {
                self.positive_type(scope, &l.eff, positive)
                    && self.positive_type(scope, &l.delim_ty, positive)
                    && self.positive_type(scope, &l.delim_eff, positive)
            }
            // the head may recurse positively, arguments must not recurse
            TypeView::App(f, a) => {
                self.positive_type(scope, &f, positive) && self.positive_type(scope, &a, false)
            }
        }
    }
}
