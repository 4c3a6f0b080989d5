//! Error types shared by the external API clients
//!
//! Classification matters more than structure here: a [`ApiError`] is either
//! transient (retried with bounded backoff before being treated as fatal) or
//! fatal (aborts the run immediately). Per-number rejections are not errors
//! at this level; the clients surface those in their reply types.

use thiserror::Error;

/// The external collaborators this tool talks to, named for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiService {
    Tracking,
    Spreadsheet,
    Dashboard,
    Mail,
}

impl std::fmt::Display for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ApiService::Tracking => "Tracking API",
            ApiService::Spreadsheet => "Spreadsheet API",
            ApiService::Dashboard => "Dashboard API",
            ApiService::Mail => "Mail API",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials rejected. Never retried.
    #[error("{service} rejected the credentials (status {status}): {message}")]
    Auth {
        service: ApiService,
        status: u16,
        message: String,
    },

    /// Account-level quota exhausted. Never retried.
    #[error("{service} quota exhausted: {message}")]
    Quota { service: ApiService, message: String },

    /// Rate limit or server-side hiccup. Retried with backoff.
    #[error("{service} transient failure (status {status:?}): {message}")]
    Transient {
        service: ApiService,
        status: Option<u16>,
        message: String,
    },

    /// Transport-level failure from reqwest
    #[error("{service} request failed: {source}")]
    Network {
        service: ApiService,
        #[source]
        source: reqwest::Error,
    },

    /// Response parsed but did not match the documented contract
    #[error("{service} returned an unexpected payload: {message}")]
    Payload { service: ApiService, message: String },
}

impl ApiError {
    pub fn service(&self) -> ApiService {
        match self {
            ApiError::Auth { service, .. }
            | ApiError::Quota { service, .. }
            | ApiError::Transient { service, .. }
            | ApiError::Network { service, .. }
            | ApiError::Payload { service, .. } => *service,
        }
    }

    /// Whether the retry policy should attempt this operation again
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transient { .. } => true,
            // Timeouts and refused connections tend to clear up; anything
            // else transport-level (TLS, bad URL) will not.
            ApiError::Network { source, .. } => source.is_timeout() || source.is_connect(),
            ApiError::Auth { .. } | ApiError::Quota { .. } | ApiError::Payload { .. } => false,
        }
    }

    pub fn network(service: ApiService, source: reqwest::Error) -> Self {
        ApiError::Network { service, source }
    }

    pub fn payload(service: ApiService, message: impl Into<String>) -> Self {
        ApiError::Payload {
            service,
            message: message.into(),
        }
    }

    /// Classify a non-2xx HTTP response by status code
    pub async fn from_response(service: ApiService, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read response body".to_string());

        match status {
            401 | 403 => ApiError::Auth {
                service,
                status,
                message,
            },
            429 => ApiError::Transient {
                service,
                status: Some(status),
                message,
            },
            s if (500..=599).contains(&s) => ApiError::Transient {
                service,
                status: Some(status),
                message,
            },
            _ => ApiError::Payload {
                service,
                message: format!("status {status}: {message}"),
            },
        }
    }
}
