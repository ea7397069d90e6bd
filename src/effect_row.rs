// Copyright 2026 Effra Language Developers
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with the License. You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the specific language governing permissions and limitations under the License.
//

use std::collections::BTreeSet;

use enum_as_inner::EnumAsInner;

use crate::kind::{k_effrow, Kind};
use crate::perm::Perm;
use crate::scheme::Scheme;
use crate::scope::Scope;
use crate::tvar::TypeVar;
use crate::r#type::{HandlerType, LabelType, Type, TypeView};
use crate::unif::Unif;
use crate::uvar::UVar;

/// The view of an effect row: pure, open through a unification variable, a
/// rigid row variable or an application, or one simple effect variable
/// consed onto the rest of the row.
///
/// The order of simple effect variables is not semantically significant; a
/// row is a set of variables plus an end, and two rows are equal modulo
/// permutation of their simple variables.
#[derive(Clone, Debug, PartialEq, Eq, EnumAsInner)]
pub enum RowView {
    Pure,
    UVar(Perm, UVar),
    Var(TypeVar),
    App(Type, Type),
    Cons(TypeVar, Type),
}

impl Unif {
    /// The closed empty row.
    pub fn r_pure(&self) -> Type {
        self.t_closed_effrow(std::iter::empty())
    }

    /// The closed row `{IO}`.
    pub fn r_io(&self) -> Type {
        self.t_closed_effrow([self.builtins.io])
    }

    /// Split a row into its full set of simple effect variables and its end,
    /// splicing through set unification variables. A `None` end is closed.
    pub fn row_parts(&self, row: &Type) -> (BTreeSet<TypeVar>, Option<Type>) {
        let mut vars = BTreeSet::new();
        let mut current = row.clone();
        loop {
            match self.view(&current) {
                TypeView::Effrow(more, end) => {
                    vars.extend(more);
                    match end {
                        None => return (vars, None),
                        Some(e) => match self.view(&e) {
                            // an end set to another row is spliced in
                            TypeView::Effrow(_, _) => current = e,
                            _ => return (vars, Some(e)),
                        },
                    }
                }
                TypeView::UVar(_, _) | TypeView::Var(_) | TypeView::App(_, _) => {
                    return (vars, Some(current))
                }
                view => panic!("row expected, got a {}", row_view_kind(&view)),
            }
        }
    }

    /// View a row: either its end when no simple variable is left, or the
    /// first simple variable consed onto the rest.
    pub fn row_view(&self, row: &Type) -> RowView {
        let (vars, end) = self.row_parts(row);
        let mut iter = vars.iter();
        if let Some(&first) = iter.next() {
            let rest: BTreeSet<TypeVar> = iter.copied().collect();
            return RowView::Cons(first, self.t_effrow(rest, end));
        }
        match end {
            None => RowView::Pure,
            Some(e) => match self.view(&e) {
                TypeView::UVar(perm, u) => RowView::UVar(perm, u),
                TypeView::Var(v) => RowView::Var(v),
                TypeView::App(f, a) => RowView::App(f, a),
                _ => unreachable!("row_parts returns open ends only"),
            },
        }
    }

    /// Cons a simple effect variable onto a row. Idempotent: consing an
    /// already-present variable returns the same row.
    pub fn cons(&self, var: TypeVar, row: &Type) -> Type {
        assert!(
            self.kinds_agree(self.tvars.kind(var), &Kind::Effect),
            "consed variable {var} is not an effect variable"
        );
        let (mut vars, end) = self.row_parts(row);
        if !vars.insert(var) {
            return row.clone();
        }
        self.t_effrow(vars, end)
    }

    /// Splatter a ground effect into a row.
    pub fn cons_eff(&self, eff: &Type, row: &Type) -> Type {
        match self.view(eff) {
            TypeView::Effect(vars) => vars.iter().fold(row.clone(), |row, &v| self.cons(v, &row)),
            TypeView::Var(v) => self.cons(v, row),
            _ => panic!("ground effect expected"),
        }
    }

    /// Whether the row is the closed empty row.
    pub fn is_pure(&self, row: &Type) -> bool {
        matches!(self.row_view(row), RowView::Pure)
    }

    /// Open every closed row in positive position by replacing its end with
    /// a fresh row unification variable in the given scope. Used on the
    /// actual side of subsumption.
    pub fn open_up(&mut self, scope: &Scope, t: &Type) -> Type {
        self.open_rows(scope, t, true, true)
    }

    /// Open every closed row in negative position. Used on the expected side
    /// of subsumption.
    pub fn open_down(&mut self, scope: &Scope, t: &Type) -> Type {
        self.open_rows(scope, t, true, false)
    }

    /// Walk a proper type, flipping polarity under arrow domains, and open
    /// the rows sitting at the targeted polarity.
    fn open_rows(&mut self, scope: &Scope, t: &Type, positive: bool, open_positive: bool) -> Type {
        match self.view(t) {
            TypeView::PureArrow(arg, ret) => {
                let arg = self.open_scheme(scope, &arg, !positive, open_positive);
                let ret = self.open_rows(scope, &ret, positive, open_positive);
                self.t_pure_arrow(arg, ret)
            }
            TypeView::Arrow(arg, ret, eff) => {
                let arg = self.open_scheme(scope, &arg, !positive, open_positive);
                let ret = self.open_rows(scope, &ret, positive, open_positive);
                let eff = if positive == open_positive {
                    self.open_row(scope, &eff)
                } else {
                    eff
                };
                self.t_arrow(arg, ret, eff)
            }
            TypeView::Handler(h) => {
                let cap = self.open_rows(scope, &h.cap, !positive, open_positive);
                let in_ty = self.open_rows(scope, &h.in_ty, !positive, open_positive);
                let in_eff = if !positive == open_positive {
                    self.open_row(scope, &h.in_eff)
                } else {
                    h.in_eff.clone()
                };
                let out_ty = self.open_rows(scope, &h.out_ty, positive, open_positive);
                let out_eff = if positive == open_positive {
                    self.open_row(scope, &h.out_eff)
                } else {
                    h.out_eff.clone()
                };
                self.t_handler(HandlerType {
                    eff: h.eff,
                    cap,
                    in_ty,
                    in_eff,
                    out_ty,
                    out_eff,
                })
            }
            TypeView::Label(l) => {
                let delim_ty = self.open_rows(scope, &l.delim_ty, positive, open_positive);
                let delim_eff = if positive == open_positive {
                    self.open_row(scope, &l.delim_eff)
                } else {
                    l.delim_eff.clone()
                };
                self.t_label(LabelType {
                    eff: l.eff.clone(),
                    delim_ty,
                    delim_eff,
                })
            }
            // neutral heads, rigids and unification variables stay as-is
            _ => t.clone(),
        }
    }

    fn open_scheme(
        &mut self,
        scope: &Scope,
        scheme: &Scheme,
        positive: bool,
        open_positive: bool,
    ) -> Scheme {
        Scheme {
            targs: scheme.targs.clone(),
            named: scheme
                .named
                .iter()
                .map(|(name, sch)| {
                    (
                        name.clone(),
                        self.open_scheme(scope, sch, !positive, open_positive),
                    )
                })
                .collect(),
            body: self.open_rows(scope, &scheme.body, positive, open_positive),
        }
    }

    /// Replace a closed row's end with a fresh row unification variable in
    /// the given scope; an already-open row is unchanged.
    fn open_row(&mut self, scope: &Scope, row: &Type) -> Type {
        let (vars, end) = self.row_parts(row);
        match end {
            None => {
                let u = self.uvars.fresh(k_effrow(), scope.clone());
                let tail = self.t_uvar(Perm::identity(), u);
                self.t_effrow(vars, Some(tail))
            }
            Some(e) => self.t_effrow(vars, Some(e)),
        }
    }
}

fn row_view_kind(view: &TypeView) -> &'static str {
    use TypeView::*;
    match view {
        UVar(_, _) => "unification variable",
        Var(_) => "rigid variable",
        Effect(_) => "ground effect",
        Effrow(_, _) => "row",
        PureArrow(_, _) => "pure arrow",
        Arrow(_, _, _) => "arrow",
        Handler(_) => "handler",
        Label(_) => "label",
        App(_, _) => "application",
    }
}
