use std::ops::{Deref, DerefMut};

use crate::error::DistillError;

/// Accumulated errors from one distillation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<DistillError>,
}

impl Deref for Diagnostics {
    type Target = Vec<DistillError>;
    fn deref(&self) -> &Self::Target {
        &self.errors
    }
}

impl DerefMut for Diagnostics {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.errors
    }
}

impl IntoIterator for Diagnostics {
    type Item = DistillError;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl From<Vec<DistillError>> for Diagnostics {
    fn from(errors: Vec<DistillError>) -> Self {
        Self { errors }
    }
}

impl Diagnostics {
    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(DistillError::is_fatal)
    }

    pub fn fatal(&self) -> Vec<DistillError> {
        self.errors
            .iter()
            .filter(|e| e.is_fatal())
            .cloned()
            .collect()
    }
}

/// Result of a distillation pass: the accumulated diagnostics plus the
/// output, which is absent when a fatal error aborted the run.
#[derive(Debug, Clone)]
pub struct WithDiagnostics<T> {
    pub diagnostics: Diagnostics,
    pub output: Option<T>,
}

impl<T> Default for WithDiagnostics<T> {
    fn default() -> Self {
        Self {
            diagnostics: Diagnostics::default(),
            output: None,
        }
    }
}

impl<T> WithDiagnostics<T> {
    pub fn success(output: T) -> Self {
        Self {
            diagnostics: Diagnostics::default(),
            output: Some(output),
        }
    }

    /// A failed run carrying only the fatal cause.
    pub fn failure(error: DistillError) -> Self {
        Self {
            diagnostics: vec![error].into(),
            output: None,
        }
    }

    pub fn push(&mut self, error: DistillError) {
        self.diagnostics.push(error);
    }

    pub fn extend<I: IntoIterator<Item = DistillError>>(&mut self, errors: I) {
        self.diagnostics.extend(errors);
    }

    /// `true` if the run produced output and no fatal diagnostics.
    pub fn is_success(&self) -> bool {
        self.output.is_some() && !self.diagnostics.has_fatal()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WithDiagnostics<U> {
        WithDiagnostics {
            diagnostics: self.diagnostics,
            output: self.output.map(f),
        }
    }

    /// Strict view: the output only if no errors at all were reported.
    pub fn output_result(mut self) -> Result<T, Diagnostics> {
        match self.output.take() {
            Some(output) if self.diagnostics.is_empty() => Ok(output),
            _ => Err(self.diagnostics),
        }
    }

    pub fn unpack(self) -> (Option<T>, Diagnostics) {
        (self.output, self.diagnostics)
    }
}
