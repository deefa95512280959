//! Diagnostics: check error reporting.
//!
//! Per-declaration problems found while checking a package are collected
//! here and stored on the package. None of them stop the check.

use std::fmt;
use std::sync::Arc;

use crate::base::{FileId, Span, TextRange};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// The file containing this diagnostic.
    pub file: FileId,
    /// Offending range.
    pub range: TextRange,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
    /// Optional related information.
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(span: Span, message: impl Into<Arc<str>>) -> Self {
        Self {
            file: span.file,
            range: span.range,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(span: Span, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(span, message)
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add related information.
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn span(&self) -> Span {
        Span::new(self.file, self.range)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes for check errors.
pub mod codes {
    /// Undeclared name.
    pub const UNDEFINED: &str = "E0001";
    /// Selector names no field or method.
    pub const UNKNOWN_MEMBER: &str = "E0002";
    /// Operand has the wrong mode or type.
    pub const INVALID_OPERAND: &str = "E0003";
    /// Duplicate declaration in one scope.
    pub const DUPLICATE_DECLARATION: &str = "E0004";
    /// An import could not be resolved.
    pub const IMPORT_FAILED: &str = "E0005";
    /// Syntax error reported by the parser.
    pub const SYNTAX: &str = "E0006";
    /// Invalid recursive type or initialization cycle.
    pub const CYCLE: &str = "E0007";

    /// Label defined and not used, or similar.
    pub const UNUSED: &str = "W0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during checking.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(%diagnostic, file = ?diagnostic.file, "check diagnostic");
        self.diagnostics.push(diagnostic);
    }

    pub fn undefined(&mut self, span: Span, name: &str) {
        self.add(
            Diagnostic::error(span, format!("undefined: {name}")).with_code(codes::UNDEFINED),
        );
    }

    pub fn unknown_member(&mut self, span: Span, recv: &str, name: &str) {
        self.add(
            Diagnostic::error(
                span,
                format!("{recv}.{name} undefined (type has no field or method {name})"),
            )
            .with_code(codes::UNKNOWN_MEMBER),
        );
    }

    pub fn invalid_operand(&mut self, span: Span, message: impl Into<Arc<str>>) {
        self.add(Diagnostic::error(span, message).with_code(codes::INVALID_OPERAND));
    }

    pub fn duplicate(&mut self, span: Span, name: &str, previous: Option<Span>) {
        let mut diag = Diagnostic::error(span, format!("{name} redeclared in this block"))
            .with_code(codes::DUPLICATE_DECLARATION);
        if let Some(previous) = previous {
            diag = diag.with_related(RelatedInfo {
                span: previous,
                message: Arc::from(format!("other declaration of {name}")),
            });
        }
        self.add(diag);
    }

    pub fn import_failed(&mut self, span: Span, path: &str, reason: &dyn fmt::Display) {
        self.add(
            Diagnostic::error(span, format!("could not import {path} ({reason})"))
                .with_code(codes::IMPORT_FAILED),
        );
    }

    pub fn cycle(&mut self, span: Span, message: impl Into<Arc<str>>) {
        self.add(Diagnostic::error(span, message).with_code(codes::CYCLE));
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get diagnostics for a specific file.
    pub fn diagnostics_for_file(&self, file: FileId) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.file == file).collect()
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
