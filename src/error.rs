// Copyright 2026 Effra Language Developers
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with the License. You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the specific language governing permissions and limitations under the License.
//

use std::fmt;

use enum_as_inner::EnumAsInner;

use crate::span::Span;

/// How bad a reported diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informative remark attached to another diagnostic.
    Note,
    /// Suspicious but compilable.
    Warning,
    /// Compilation fails at the end of the current phase.
    Error,
    /// Unrecoverable, aborts the session immediately.
    FatalError,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Severity::*;
        match self {
            Note => write!(f, "note"),
            Warning => write!(f, "warning"),
            Error => write!(f, "error"),
            FatalError => write!(f, "fatal error"),
        }
    }
}

/// The kinds of failure the inference core can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumAsInner)]
pub enum ErrorClass {
    /// A kind unification variable was given a disallowed kind, or a type was
    /// applied at mismatching kinds.
    KindConflict,
    /// A rigid variable appeared outside its binding scope.
    ScopeEscape,
    /// An effect kind was used where a value kind is required.
    NonEffectViolation,
    /// A unification variable would be set to a type containing itself.
    OccursCheck,
    /// A recursive data type failed the positivity test in a pure context.
    NonPositiveData,
    /// Two types cannot be unified.
    TypeMismatch,
    /// Corrupted session state.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ErrorClass::*;
        match self {
            KindConflict => write!(f, "kind conflict"),
            ScopeEscape => write!(f, "scope escape"),
            NonEffectViolation => write!(f, "non-effect constraint violation"),
            OccursCheck => write!(f, "occurs check"),
            NonPositiveData => write!(f, "non-positive data type"),
            TypeMismatch => write!(f, "type mismatch"),
            Internal => write!(f, "internal error"),
        }
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub span: Option<Span>,
    pub severity: Severity,
    pub class: ErrorClass,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.class, self.message)?;
        if let Some(span) = &self.span {
            match span.module() {
                Some(module) => write!(f, " at {}..{} in {}", span.start(), span.end(), module)?,
                None => write!(f, " at {}..{}", span.start(), span.end())?,
            }
        }
        Ok(())
    }
}

/// The distinguished abort signal raised by a fatal error. Callers propagate
/// it with `?` up to the session boundary, where the session is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatalAbort;

impl fmt::Display for FatalAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compilation aborted by a fatal error")
    }
}

impl std::error::Error for FatalAbort {}

/// Session-wide diagnostic state with an explicit reset. Reports are kept in
/// FIFO order.
#[derive(Debug, Default)]
pub struct ErrorChannel {
    entries: Vec<Diagnostic>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Returns `Err(FatalAbort)` iff the severity is
    /// `FatalError`; the entry is recorded in both cases.
    pub fn report(
        &mut self,
        span: Option<Span>,
        severity: Severity,
        class: ErrorClass,
        message: impl Into<String>,
    ) -> Result<(), FatalAbort> {
        let diagnostic = Diagnostic {
            span,
            severity,
            class,
            message: message.into(),
        };
        log::debug!("reported: {diagnostic}");
        self.entries.push(diagnostic);
        if severity == Severity::FatalError {
            Err(FatalAbort)
        } else {
            Ok(())
        }
    }

    /// Record a plain error, failing the phase but not aborting it.
    pub fn error(&mut self, span: Option<Span>, class: ErrorClass, message: impl Into<String>) {
        // never aborts below FatalError
        let _ = self.report(span, Severity::Error, class, message);
    }

    pub fn warning(&mut self, span: Option<Span>, class: ErrorClass, message: impl Into<String>) {
        let _ = self.report(span, Severity::Warning, class, message);
    }

    pub fn note(&mut self, span: Option<Span>, message: impl Into<String>) {
        let _ = self.report(span, Severity::Note, ErrorClass::Internal, message);
    }

    /// Record an unrecoverable condition and return the abort signal.
    pub fn fatal(
        &mut self,
        span: Option<Span>,
        class: ErrorClass,
        message: impl Into<String>,
    ) -> FatalAbort {
        let _ = self.report(span, Severity::FatalError, class, message);
        FatalAbort
    }

    /// True iff at least one `Error` or `FatalError` was recorded since the
    /// last reset.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.severity >= Severity::Error)
    }

    /// Phase barrier: abort iff an error was recorded since the last reset.
    pub fn assert_no_error(&self) -> Result<(), FatalAbort> {
        if self.has_errors() {
            Err(FatalAbort)
        } else {
            Ok(())
        }
    }

    /// Recorded diagnostics, oldest first.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Drop all recorded diagnostics.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_fail_the_phase_barrier() {
        let mut channel = ErrorChannel::new();
        assert!(channel.assert_no_error().is_ok());

        channel.note(None, "just a note");
        channel.warning(None, ErrorClass::TypeMismatch, "a warning");
        assert!(channel.assert_no_error().is_ok());

        channel.error(None, ErrorClass::ScopeEscape, "an error");
        assert!(channel.assert_no_error().is_err());
        assert_eq!(channel.entries().len(), 3);

        channel.reset();
        assert!(channel.assert_no_error().is_ok());
        assert!(channel.entries().is_empty());
    }

    #[test]
    fn fatal_raises_immediately() {
        let mut channel = ErrorChannel::new();
        let result = channel.report(
            None,
            Severity::FatalError,
            ErrorClass::Internal,
            "session state corrupted",
        );
        assert_eq!(result, Err(FatalAbort));
        assert!(channel.has_errors());
    }

    #[test]
    fn reports_are_fifo() {
        let mut channel = ErrorChannel::new();
        channel.note(None, "first");
        channel.note(None, "second");
        let messages: Vec<_> = channel
            .entries()
            .iter()
            .map(|entry| entry.message.as_str())
            .collect();
        assert_eq!(messages, ["first", "second"]);
    }
}
