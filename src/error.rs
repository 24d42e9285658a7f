//! Error types surfaced by the reconstruction engine.

use thiserror::Error;

/// Errors returned by [`crate::engine::Engine`] operations.
///
/// Only caller mistakes and hard resource failures surface here. A fragment
/// that matches no recorded pattern is not an error; it is the common case
/// for free text and the engine simply returns the fragment unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Reconstruction was requested against a text domain that was never
    /// registered. A misspelled domain name is a caller bug worth surfacing
    /// immediately instead of silently returning the original text.
    #[error("text domain '{0}' is not registered; call Engine::register(\"{0}\", ..) first")]
    UnregisteredDomain(String),

    /// No catalog could be loaded for the given (domain, locale) pair.
    ///
    /// During reconstruction this condition is soft: the engine logs it and
    /// leaves the text unmodified. It is only returned as an error from
    /// explicit availability checks such as [`crate::engine::Engine::ensure_catalog`].
    #[error("no catalog available for domain '{domain}' in locale '{locale}': {reason}")]
    CatalogUnavailable {
        /// Domain whose catalog failed to load.
        domain: String,
        /// Target locale that was requested.
        locale: String,
        /// Loader failure detail.
        reason: String,
    },
}
