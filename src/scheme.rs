// Copyright 2026 Effra Language Developers
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with the License. You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the specific language governing permissions and limitations under the License.
//

use std::fmt;

use derive_new::new;
use indexmap::IndexSet;
use ustr::Ustr;

use crate::format::{write_with_separator, FormatWith};
use crate::perm::Perm;
use crate::subst::Subst;
use crate::tvar::TypeVar;
use crate::r#type::{Type, TypeView};
use crate::unif::Unif;
use crate::uvar::UVar;

/// The name of a type parameter: anonymous, the effect associated with the
/// enclosing binder, or a user-written string. Equality is structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TName {
    Anon,
    Effect,
    Named(Ustr),
}

impl fmt::Display for TName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TName::Anon => write!(f, "_"),
            TName::Effect => write!(f, "effect"),
            TName::Named(name) => write!(f, "{name}"),
        }
    }
}

/// The name of a value parameter. Equality is structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Name {
    /// The distinguished label parameter of an effect.
    Label,
    /// A regular named parameter.
    Var(Ustr),
    /// An optional named parameter.
    OptionalVar(Ustr),
    /// An implicit parameter, resolved at call sites.
    Implicit(Ustr),
    /// A method, an implicit parameter with self-directed resolution.
    Method(Ustr),
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Label => write!(f, "label"),
            Name::Var(name) => write!(f, "{name}"),
            Name::OptionalVar(name) => write!(f, "?{name}"),
            Name::Implicit(name) => write!(f, "~{name}"),
            Name::Method(name) => write!(f, "method {name}"),
        }
    }
}

/// A polymorphic type scheme: universally quantified named type variables,
/// named value parameters with their own schemes (higher-rank polymorphism of
/// implicits and methods), and a monomorphic body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scheme {
    pub targs: Vec<(TName, TypeVar)>,
    pub named: Vec<(Name, Scheme)>,
    pub body: Type,
}

impl Scheme {
    /// The monomorphic scheme of a plain type.
    pub fn of_type(body: Type) -> Self {
        Self {
            targs: Vec::new(),
            named: Vec::new(),
            body,
        }
    }

    /// A scheme is monomorphic iff it binds nothing.
    pub fn is_monomorphic(&self) -> bool {
        self.targs.is_empty() && self.named.is_empty()
    }

    pub(crate) fn apply_perm(&self, perm: &Perm) -> Scheme {
        Scheme {
            targs: self
                .targs
                .iter()
                .map(|(name, var)| (name.clone(), perm.apply(*var)))
                .collect(),
            named: self
                .named
                .iter()
                .map(|(name, sch)| (name.clone(), sch.apply_perm(perm)))
                .collect(),
            body: self.body.apply_perm(perm),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.targs.is_empty() {
            write!(f, "∀")?;
            write_with_separator(self.targs.iter().map(|(_, var)| var), " ", f)?;
            write!(f, ". ")?;
        }
        for (name, sch) in &self.named {
            write!(f, "{{{name}: {sch}}} -> ")?;
        }
        write!(f, "{}", self.body)
    }
}

/// Session-aware formatting with resolved variables.
impl FormatWith<Unif> for Scheme {
    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, unif: &Unif) -> fmt::Result {
        if !self.targs.is_empty() {
            write!(f, "∀")?;
            for (i, (_, var)) in self.targs.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                var.fmt_with(f, unif)?;
            }
            write!(f, ". ")?;
        }
        for (name, sch) in &self.named {
            write!(f, "{{{name}: ")?;
            sch.fmt_with(f, unif)?;
            write!(f, "}} -> ")?;
        }
        self.body.fmt_with(f, unif)
    }
}

/// A data constructor declaration: existential named type arguments, named
/// parameters, and regular parameter schemes.
#[derive(Clone, Debug, new)]
pub struct CtorDecl {
    pub name: Ustr,
    pub targs: Vec<(TName, TypeVar)>,
    pub named: Vec<(Name, Scheme)>,
    pub arg_schemes: Vec<Scheme>,
}

impl CtorDecl {
    /// 0-based index of the first constructor with the given name.
    pub fn find_index(ctors: &[CtorDecl], name: Ustr) -> Option<usize> {
        ctors.iter().position(|ctor| ctor.name == name)
    }
}

/// Identity of a term-level variable, owned by the frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, new)]
pub struct VarId(u32);

/// An algebraic data type definition.
#[derive(Clone, Debug)]
pub struct AdtDef {
    /// The computationally irrelevant proof variable for deconstruction.
    pub proof: VarId,
    /// The rigid variable standing for the defined type.
    pub tvar: TypeVar,
    pub args: Vec<(TName, TypeVar)>,
    pub ctors: Vec<CtorDecl>,
    /// Whether the definition passed the positivity test, enabling pure
    /// deconstruction downstream.
    pub strictly_positive: bool,
}

/// A label (first-class delimiter) definition.
#[derive(Clone, Debug)]
pub struct LabelDef {
    /// The rigid effect variable the label delimits.
    pub tvar: TypeVar,
    /// The runtime label variable.
    pub var: VarId,
    pub delim_ty: Type,
    pub delim_eff: Type,
}

/// A data definition: an ADT or a label.
#[derive(Clone, Debug)]
pub enum DataDef {
    Adt(AdtDef),
    Label(LabelDef),
}

impl Unif {
    /// Alpha-rename every bound type variable of the scheme to a fresh rigid
    /// and substitute accordingly. This is the only safe way to instantiate
    /// a scheme.
    pub fn refresh_scheme(&mut self, scheme: &Scheme) -> Scheme {
        let mut subst = Subst::empty();
        let targs: Vec<_> = scheme
            .targs
            .iter()
            .map(|(name, var)| {
                let kind = self.tvars.kind(*var).clone();
                let fresh = match self.tvars.name(*var) {
                    Some(display) => self.tvars.fresh_named(kind, display),
                    None => self.tvars.fresh(kind),
                };
                subst.rename_to_fresh(*var, fresh);
                (name.clone(), fresh)
            })
            .collect();
        let named = scheme
            .named
            .iter()
            .map(|(name, sch)| (name.clone(), self.subst_scheme(&subst, sch)))
            .collect();
        let body = self.subst_type(&subst, &scheme.body);
        Scheme { targs, named, body }
    }

    /// Collect the free (unset) unification variables of a type, reading set
    /// variables through, in first-seen order.
    pub fn collect_uvars(&self, t: &Type, acc: &mut IndexSet<UVar>) {
        match self.view(t) {
            TypeView::UVar(_, u) => {
                acc.insert(u);
            }
            TypeView::Var(_) | TypeView::Effect(_) => {}
            TypeView::Effrow(_, end) => {
                if let Some(e) = end {
                    self.collect_uvars(&e, acc);
                }
            }
            TypeView::PureArrow(arg, ret) => {
                self.collect_scheme_uvars(&arg, acc);
                self.collect_uvars(&ret, acc);
            }
            TypeView::Arrow(arg, ret, eff) => {
                self.collect_scheme_uvars(&arg, acc);
                self.collect_uvars(&ret, acc);
                self.collect_uvars(&eff, acc);
            }
            TypeView::Handler(h) => {
                for t in [&h.cap, &h.in_ty, &h.in_eff, &h.out_ty, &h.out_eff] {
                    self.collect_uvars(t, acc);
                }
            }
            TypeView::Label(l) => {
                for t in [&l.eff, &l.delim_ty, &l.delim_eff] {
                    self.collect_uvars(t, acc);
                }
            }
            TypeView::App(f, a) => {
                self.collect_uvars(&f, acc);
                self.collect_uvars(&a, acc);
            }
        }
    }

    /// Collect the free unification variables of a scheme.
    pub fn collect_scheme_uvars(&self, scheme: &Scheme, acc: &mut IndexSet<UVar>) {
        for (_, sch) in &scheme.named {
            self.collect_scheme_uvars(sch, acc);
        }
        self.collect_uvars(&scheme.body, acc);
    }

    /// The free unification variables of a scheme, in first-seen order.
    pub fn scheme_uvars(&self, scheme: &Scheme) -> IndexSet<UVar> {
        let mut acc = IndexSet::new();
        self.collect_scheme_uvars(scheme, &mut acc);
        acc
    }
}
