use std::fmt;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with code, severity and file attribution.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    /// Source file the diagnostic is attributed to, when known.
    pub file: Option<String>,
    /// Additional notes providing context.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            file: None,
            notes: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    /// Set the main message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attribute the diagnostic to a source file.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Add a note providing additional context.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Check if this is an error (vs warning/note).
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "{}: {} [{}]: {}",
                file, self.severity, self.code, self.message
            )?,
            None => write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?,
        }
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        Ok(())
    }
}

/// Create an "undeclared identifier" diagnostic.
pub fn undeclared_identifier(file: &str, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1001)
        .with_message(format!("undeclared identifier `{name}`"))
        .with_file(file)
}

/// Create a "reserved word declared" diagnostic.
pub fn reserved_declaration(file: &str, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E0001)
        .with_message(format!("cannot declare reserved identifier `{name}`"))
        .with_file(file)
}

/// Create an "import without an exporter" diagnostic. The fault lies with
/// the build, not the importing include, so the message names no culprit.
pub fn unresolved_import(include: &str, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1002)
        .with_message(format!(
            "`{name}` is imported by `{include}` but no include exports it"
        ))
        .with_file(include)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_surface() {
        let diag = Diagnostic::error(ErrorCode::E1001)
            .with_message("undeclared identifier `foo`")
            .with_file("fragment.glsl")
            .with_note("declared imports: bar");

        assert!(diag.is_error());
        assert_eq!(diag.file.as_deref(), Some("fragment.glsl"));
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn display_carries_file_and_code() {
        let diag = undeclared_identifier("vertex.glsl", "foo");
        let text = diag.to_string();
        assert_eq!(text, "vertex.glsl: error [E1001]: undeclared identifier `foo`");
    }

    #[test]
    fn warnings_are_not_errors() {
        let diag = Diagnostic::warning(ErrorCode::E1007).with_message("dead function");
        assert!(!diag.is_error());
    }
}
