//! Build-scoped diagnostic accumulation.
//!
//! Each file's pass pushes into one queue owned by the build context; the
//! driver drains it once at the end. `has_errors` is the single source of
//! truth for the process exit status.

use crate::{Diagnostic, Severity};

/// Ordered collection of diagnostics for one build.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    entries: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.entries.push(diagnostic);
    }

    /// Push every diagnostic from an iterator.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    /// Whether any error-severity entry was pushed.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in push order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Iterate entries of one severity.
    pub fn of_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.severity == severity)
    }
}

impl IntoIterator for DiagnosticQueue {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn tracks_error_count() {
        let mut queue = DiagnosticQueue::new();
        assert!(!queue.has_errors());

        queue.push(Diagnostic::warning(ErrorCode::E1007).with_message("dead"));
        assert!(!queue.has_errors());

        queue.push(Diagnostic::error(ErrorCode::E1001).with_message("undeclared"));
        assert!(queue.has_errors());
        assert_eq!(queue.error_count(), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn severity_filter() {
        let mut queue = DiagnosticQueue::new();
        queue.push(Diagnostic::warning(ErrorCode::E1004).with_message("unused import"));
        queue.push(Diagnostic::error(ErrorCode::E1003).with_message("unused export"));
        assert_eq!(queue.of_severity(Severity::Warning).count(), 1);
        assert_eq!(queue.of_severity(Severity::Error).count(), 1);
    }
}
