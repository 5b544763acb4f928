//! Pluggable destinations for semantic errors.
//!
//! The checker never stops on an error by itself. It hands each one to an
//! [`ErrorSink`], which decides what to do with it: collect it, log it, or
//! keep only the first and ask the checker to stop.

use wabbit_core::CompilationError;

/// Receives errors from the checker in the order they are found.
pub trait ErrorSink {
    /// Record one error.
    fn report(&mut self, error: CompilationError);

    /// Whether the sink wants no further errors.
    ///
    /// The checker stops descending into new statements once this is true.
    fn is_saturated(&self) -> bool {
        false
    }
}

/// Collects every error.
impl ErrorSink for Vec<CompilationError> {
    fn report(&mut self, error: CompilationError) {
        self.push(error);
    }
}

impl<S: ErrorSink + ?Sized> ErrorSink for &mut S {
    fn report(&mut self, error: CompilationError) {
        (**self).report(error);
    }

    fn is_saturated(&self) -> bool {
        (**self).is_saturated()
    }
}

/// Keeps the first error and saturates.
#[derive(Debug, Default)]
pub struct FirstError(Option<CompilationError>);

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&CompilationError> {
        self.0.as_ref()
    }

    /// `Err` with the recorded error, or `Ok(())` when nothing was reported.
    pub fn into_result(self) -> Result<(), CompilationError> {
        match self.0 {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl ErrorSink for FirstError {
    fn report(&mut self, error: CompilationError) {
        if self.0.is_none() {
            self.0 = Some(error);
        }
    }

    fn is_saturated(&self) -> bool {
        self.0.is_some()
    }
}

/// Emits a `warn` event for every error, then forwards it to `inner`.
#[derive(Debug, Default)]
pub struct TracingSink<S> {
    inner: S,
}

impl<S: ErrorSink> TracingSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ErrorSink> ErrorSink for TracingSink<S> {
    fn report(&mut self, error: CompilationError) {
        let span = error.span().unwrap_or_default();
        tracing::warn!(
            category = error.category().as_str(),
            line = span.line,
            col = span.col,
            "{error}"
        );
        self.inner.report(error);
    }

    fn is_saturated(&self) -> bool {
        self.inner.is_saturated()
    }
}
