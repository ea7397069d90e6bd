// Copyright 2026 Effra Language Developers
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with the License. You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the specific language governing permissions and limitations under the License.
//

//! The type-inference and unification core of the Effra language.
//!
//! Effra is a functional language with algebraic data types, first-class
//! polymorphism, implicit and method parameters, and user-definable algebraic
//! effects with handlers. This crate is the engine underneath its type
//! checker: kinds and kind unification variables, rigid (skolem) variables,
//! scopes with levels, finite partial permutations, type unification
//! variables with delayed permutations, the type term algebra with views and
//! weak head normal forms, capture-avoiding parallel substitution, type
//! schemes with named parameters, the effect-row algebra, scope shrinking and
//! escape detection, the positivity test for recursive data, and the
//! unifier tying it all together.
//!
//! Parsing, elaboration and evaluation are external collaborators; they
//! consume this crate through [`Unif`] and the views it exposes.

pub mod builtins;
mod containers;
pub mod effect_row;
pub mod error;
pub mod format;
mod ident;
pub mod kind;
pub mod perm;
pub mod positivity;
pub mod scheme;
pub mod scope;
pub mod shrink;
pub mod span;
pub mod subst;
pub mod tvar;
pub mod r#type;
pub mod unif;
pub mod unify;
pub mod uvar;

#[cfg(test)]
mod prop_tests;

pub use builtins::BuiltinTypes;
pub use effect_row::RowView;
pub use error::{Diagnostic, ErrorChannel, ErrorClass, FatalAbort, Severity};
pub use kind::{k_effect, k_effrow, k_type, Kind, KindStore, KindUVar};
pub use perm::Perm;
pub use scheme::{AdtDef, CtorDecl, DataDef, LabelDef, Name, Scheme, TName, VarId};
pub use scope::Scope;
pub use span::Span;
pub use subst::Subst;
pub use tvar::{TypeVar, TypeVarRegistry};
pub use r#type::{HandlerType, LabelType, Type, TypeView, TypeWhnf, WhnfHead};
pub use unif::Unif;
pub use unify::UnifyError;
pub use uvar::{UVar, UVarStore};
pub use ustr::{ustr, Ustr};
