use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors produced while loading key material, sealing or opening a token.
///
/// Everything except [`SealError::Configuration`] and
/// [`SealError::Encryption`] describes a token that must not be trusted. The
/// variants exist for diagnostics only: callers answer all of them the same way.
#[derive(Error, Debug)]
pub enum SealError {
    /// The symmetric key is missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The token is not three dot-separated base64 segments of the right sizes.
    #[error("Invalid token format: {0}")]
    Format(&'static str),

    /// The AES-GCM tag did not verify (tampered token or wrong key).
    #[error("Token authentication failed")]
    Authentication,

    /// Authentic plaintext that is not a payload record.
    ///
    /// Carries a fixed message only; decoder errors quote the plaintext.
    #[error("Invalid token payload: {0}")]
    Payload(&'static str),

    /// Authentic, well-formed token whose expiry has passed.
    #[error("Token expired at {0}")]
    Expired(i64),

    /// The cipher refused to encrypt.
    #[error("Encryption failed")]
    Encryption,
}

impl SealError {
    /// Whether this error means "do not trust the presented token".
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SealError::Format(_)
                | SealError::Authentication
                | SealError::Payload(_)
                | SealError::Expired(_)
        )
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A sealing or opening error.
    #[error(transparent)]
    Seal(#[from] SealError),

    /// The request carried no usable session token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The upstream issuer did not present a valid issuer key.
    #[error("Issuer authentication failed")]
    IssuerRejected,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Seal(ref e) if e.is_rejection() => {
                tracing::warn!("Token rejected: {}", e);
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::Seal(ref e) => {
                tracing::error!("Seal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Unauthorized => {
                tracing::warn!("No valid session token");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::IssuerRejected => {
                tracing::warn!("Issuer authentication failed");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, [(http::header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_grouped() {
        assert!(SealError::Format("segments").is_rejection());
        assert!(SealError::Authentication.is_rejection());
        assert!(SealError::Payload("missing field").is_rejection());
        assert!(SealError::Expired(0).is_rejection());
        assert!(!SealError::Configuration("missing".into()).is_rejection());
        assert!(!SealError::Encryption.is_rejection());
    }

    #[test]
    fn every_rejection_maps_to_the_same_status() {
        let statuses: Vec<StatusCode> = vec![
            AppError::from(SealError::Format("segments")),
            AppError::from(SealError::Authentication),
            AppError::from(SealError::Payload("missing field")),
            AppError::from(SealError::Expired(1)),
            AppError::Unauthorized,
        ]
        .into_iter()
        .map(|e| e.into_response().status())
        .collect();

        assert!(statuses.iter().all(|s| *s == StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn configuration_error_is_a_server_fault() {
        let resp = AppError::from(SealError::Configuration("missing".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
