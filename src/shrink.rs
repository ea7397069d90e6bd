use crate::scheme::Scheme;
use crate::scope::Scope;
use crate::tvar::TypeVar;
use crate::r#type::{Type, TypeView};
use crate::unif::Unif;

impl Unif {
    /// Constrain `t` to mention only rigids of `scope`.
    ///
    /// Rigid mentions outside `scope` are escapes and are returned as
    /// `Err(rigid)`. Unification-variable mentions have their cell scope
    /// intersected with `scope` (keeping rigids below the scope's level);
    /// unset variables hold no content, so narrowing them never drops an
    /// occurring rigid.
    pub fn try_shrink_scope(&mut self, scope: &Scope, t: &Type) -> Result<(), TypeVar> {
        match self.view(t) {
            TypeView::Var(v) => {
                if scope.mem(v) {
                    Ok(())
                } else {
                    Err(v)
                }
            }
            TypeView::UVar(delayed, u) => {
                let eff = self.uvars.effective_perm(&delayed, u);
                let target = scope.clone();
                self.uvars
                    .filter_scope(u, scope.level(), move |v| target.mem(eff.apply(v)));
                Ok(())
            }
            TypeView::Effect(vars) => check_vars(scope, vars),
            TypeView::Effrow(vars, end) => {
                check_vars(scope, vars)?;
                match end {
                    Some(e) => self.try_shrink_scope(scope, &e),
                    None => Ok(()),
                }
            }
            TypeView::PureArrow(arg, ret) => {
                self.try_shrink_scheme(scope, &arg)?;
                self.try_shrink_scope(scope, &ret)
            }
            TypeView::Arrow(arg, ret, eff) => {
                self.try_shrink_scheme(scope, &arg)?;
                self.try_shrink_scope(scope, &ret)?;
                self.try_shrink_scope(scope, &eff)
            }
            TypeView::Handler(h) => {
                let inner = scope.add(h.eff);
                self.try_shrink_scope(&inner, &h.cap)?;
                self.try_shrink_scope(&inner, &h.in_ty)?;
                self.try_shrink_scope(&inner, &h.in_eff)?;
                self.try_shrink_scope(scope, &h.out_ty)?;
                self.try_shrink_scope(scope, &h.out_eff)
            }
            TypeView::Label(l) => {
                self.try_shrink_scope(scope, &l.eff)?;
                self.try_shrink_scope(scope, &l.delim_ty)?;
                self.try_shrink_scope(scope, &l.delim_eff)
            }
            TypeView::App(f, a) => {
                self.try_shrink_scope(scope, &f)?;
                self.try_shrink_scope(scope, &a)
            }
        }
    }

    /// Shrink a scheme; its bound variables extend the scope for its parts.
    pub fn try_shrink_scheme(&mut self, scope: &Scope, scheme: &Scheme) -> Result<(), TypeVar> {
        let mut inner = scope.clone();
        for (_, var) in &scheme.targs {
            inner = inner.add(*var);
        }
        for (_, sch) in &scheme.named {
            self.try_shrink_scheme(&inner, sch)?;
        }
        self.try_shrink_scope(&inner, &scheme.body)
    }
}

fn check_vars(
    scope: &Scope,
    vars: impl IntoIterator<Item = TypeVar>,
) -> Result<(), TypeVar> {
    for v in vars {
        if !scope.mem(v) {
            return Err(v);
        }
    }
    Ok(())
}
