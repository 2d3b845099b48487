use std::fmt::Display;

/// Failure taxonomy for the analysis engine. Validation and not-found are
/// resolved at the boundary before any external call; service-unavailable is
/// the retryable class; internal failures are logged in full and surfaced
/// generically.
#[derive(Debug)]
pub enum AnalysisError {
    Validation(String),
    NotFound(String),
    ServiceUnavailable(String),
    Internal(anyhow::Error),
    Canceled,
}

impl AnalysisError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message)
            | Self::NotFound(message)
            | Self::ServiceUnavailable(message) => write!(f, "{message}"),
            Self::Internal(_) => write!(f, "Internal error"),
            Self::Canceled => write!(f, "Analysis canceled"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Internal(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<sqlx::Error> for AnalysisError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

pub fn internal_error(err: anyhow::Error) -> AnalysisError {
    tracing::error!("internal failure: {err:#}");
    AnalysisError::Internal(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn kinds_match_their_variants() {
        assert_eq!(AnalysisError::validation("x").kind(), "validation");
        assert_eq!(AnalysisError::not_found("x").kind(), "not_found");
        assert_eq!(
            AnalysisError::service_unavailable("x").kind(),
            "service_unavailable"
        );
        assert_eq!(AnalysisError::from(anyhow!("boom")).kind(), "internal");
        assert_eq!(AnalysisError::Canceled.kind(), "canceled");
    }

    #[test]
    fn internal_failures_display_without_detail() {
        let err = AnalysisError::from(anyhow!("password=hunter2 leaked"));
        assert_eq!(err.to_string(), "Internal error");
    }

    #[test]
    fn store_errors_become_internal() {
        let err = AnalysisError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn only_service_unavailable_is_retryable() {
        assert!(AnalysisError::service_unavailable("down").is_retryable());
        assert!(!AnalysisError::validation("bad").is_retryable());
        assert!(!AnalysisError::not_found("missing").is_retryable());
        assert!(!AnalysisError::Canceled.is_retryable());
    }
}
