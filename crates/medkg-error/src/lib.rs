//! Workspace-wide error type for medkg.
//!
//! Each crate keeps its own `thiserror` enum close to the code that produces it and converts
//! into [`Error`] at crate boundaries. The top-level variants encode how far a failure is
//! allowed to travel:
//! - [`FatalError`]: aborts the whole request (shared prerequisites are gone)
//! - [`WarningError`]: local to one retrieval channel, the request carries on
//! - [`InternalError`]: invariant violations and bookkeeping failures
pub mod fatal;
pub mod internal;
pub mod severity;
pub mod warning;

pub use fatal::FatalError;
pub use internal::InternalError;
pub use severity::Severity;
pub use warning::WarningError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fatal(#[from] FatalError),
    #[error(transparent)]
    Warning(#[from] WarningError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::Warning(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal(_))
    }

    pub fn severity(&self) -> Severity {
        match self {
            Error::Fatal(_) => Severity::Fatal,
            Error::Warning(_) => Severity::Warning,
            Error::Internal(_) => Severity::Error,
        }
    }
}

/// Extension trait for logging an error on its way through a `Result` chain.
///
/// Only does something with the `tracing` feature enabled; without it the calls are no-ops so
/// library crates can use it unconditionally.
pub trait ResultExt<T> {
    /// Log the error at the level matching its [`Severity`].
    fn emit_event(self) -> Self;
}

impl<T> ResultExt<T> for Result<T, Error> {
    fn emit_event(self) -> Self {
        #[cfg(feature = "tracing")]
        if let Err(e) = &self {
            match e.severity() {
                Severity::Warning => tracing::warn!(error = %e, "channel-local failure"),
                Severity::Error => tracing::error!(error = %e, "internal failure"),
                Severity::Fatal => tracing::error!(error = %e, fatal = true, "request aborted"),
            }
        }
        self
    }
}
