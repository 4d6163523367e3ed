//! Receivers for non-fatal parser diagnostics.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use mdcms_core::ValidationErrors;

/// Receives validation failures that were downgraded to warnings.
pub trait DiagnosticSink: Send + Sync {
    fn validation_failed(&self, path: &Path, errors: &ValidationErrors);
}

/// Emits each failure as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn validation_failed(&self, path: &Path, errors: &ValidationErrors) {
        tracing::warn!(
            path = %path.display(),
            errors = %errors,
            "schema validation failed, keeping unvalidated metadata"
        );
    }
}

/// A recorded validation warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub path: PathBuf,
    pub errors: ValidationErrors,
}

/// Keeps warnings in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    warnings: Mutex<Vec<ValidationWarning>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<ValidationWarning> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn validation_failed(&self, path: &Path, errors: &ValidationErrors) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ValidationWarning {
                path: path.to_path_buf(),
                errors: errors.clone(),
            });
    }
}
