//! Error types for PlanCheck.
//!
//! Library crates use [`PlanCheckError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Failures from the reasoning capability and from individual domain analyzers
//! are carried as nested typed causes ([`ReasoningError`], [`AnalyzerFailure`])
//! so callers can tell a transport fault from a malformed response or a timeout.

use std::path::PathBuf;

use crate::types::Domain;

/// Top-level error type for all PlanCheck operations.
#[derive(Debug, thiserror::Error)]
pub enum PlanCheckError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The source document could not be read as input.
    #[error("unreadable document: {message}")]
    Document { message: String },

    /// The fact-extraction capability failed. Fatal to the run.
    #[error("extraction failed: {message}")]
    Extraction {
        message: String,
        #[source]
        cause: Option<ReasoningError>,
    },

    /// A domain analyzer failed. Fatal to the run once it reaches the join.
    #[error("{domain} analyzer failed: {cause}")]
    Analyzer {
        domain: Domain,
        #[source]
        cause: AnalyzerFailure,
    },

    /// Data validation error (invalid option, schema mismatch, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PlanCheckError>;

impl PlanCheckError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a document error from any displayable message.
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
            cause: None,
        }
    }

    /// Wrap a reasoning failure raised while extracting facts.
    pub fn extraction_failed(cause: ReasoningError) -> Self {
        Self::Extraction {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attribute an analyzer failure to its domain.
    pub fn analyzer(domain: Domain, cause: impl Into<AnalyzerFailure>) -> Self {
        Self::Analyzer {
            domain,
            cause: cause.into(),
        }
    }

    /// The domain that failed, if this is an analyzer error.
    pub fn failed_domain(&self) -> Option<Domain> {
        match self {
            Self::Analyzer { domain, .. } => Some(*domain),
            _ => None,
        }
    }
}

/// Failure of a single call to the reasoning capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReasoningError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The request exceeded the client-side timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response body could not be interpreted as a JSON object.
    #[error("malformed response: {0}")]
    ResponseParse(String),
}

/// Cause attached to an [`PlanCheckError::Analyzer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerFailure {
    /// The reasoning call itself failed.
    #[error(transparent)]
    Reasoning(ReasoningError),

    /// The response parsed but does not have the shape of a report at all.
    #[error("response is not a report object: {0}")]
    ResponseParse(String),

    /// The analyzer did not settle before its deadline.
    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// The analyzer task panicked or was cancelled.
    #[error("task aborted: {0}")]
    Aborted(String),
}

impl From<ReasoningError> for AnalyzerFailure {
    fn from(err: ReasoningError) -> Self {
        match err {
            ReasoningError::ResponseParse(msg) => Self::ResponseParse(msg),
            other => Self::Reasoning(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PlanCheckError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = PlanCheckError::validation("unknown join policy 'eager'");
        assert!(err.to_string().contains("eager"));
    }

    #[test]
    fn analyzer_error_names_domain() {
        let cause = AnalyzerFailure::TimedOut { after_ms: 30_000 };
        let err = PlanCheckError::analyzer(Domain::Risk, cause);
        assert_eq!(err.to_string(), "risk analyzer failed: timed out after 30000ms");
        assert_eq!(err.failed_domain(), Some(Domain::Risk));
    }

    #[test]
    fn response_parse_maps_to_parse_failure() {
        let cause: AnalyzerFailure = ReasoningError::ResponseParse("not json".into()).into();
        assert_eq!(cause, AnalyzerFailure::ResponseParse("not json".into()));

        let cause: AnalyzerFailure = ReasoningError::Api {
            status: 429,
            body: "rate limited".into(),
        }
        .into();
        assert!(matches!(
            cause,
            AnalyzerFailure::Reasoning(ReasoningError::Api { status: 429, .. })
        ));
    }

    #[test]
    fn extraction_error_is_not_attributed_to_a_domain() {
        let err = PlanCheckError::extraction("vision model unavailable");
        assert_eq!(err.failed_domain(), None);
        assert!(err.to_string().starts_with("extraction failed"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn extraction_keeps_reasoning_cause() {
        let err = PlanCheckError::extraction_failed(ReasoningError::Timeout { secs: 120 });
        assert_eq!(err.to_string(), "extraction failed: request timed out after 120s");

        let cause = std::error::Error::source(&err)
            .and_then(|s| s.downcast_ref::<ReasoningError>());
        assert_eq!(cause, Some(&ReasoningError::Timeout { secs: 120 }));
    }
}
