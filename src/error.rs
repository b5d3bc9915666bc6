use serde::Serialize;
use thiserror::Error;

/// Upstream services the assistant talks to over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    OpenAi,
    SocialImage,
}

impl Service {
    pub fn label(self) -> &'static str {
        match self {
            Service::OpenAi => "openai",
            Service::SocialImage => "social image service",
        }
    }
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("{message}")]
    Configuration {
        code: &'static str,
        message: String,
    },
    #[error("OpenAI API key is missing")]
    MissingCredential,
    #[error("request to {} could not complete: {source}", .service.label())]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },
    #[error("{} request failed with status {status}", .service.label())]
    UpstreamHttp {
        service: Service,
        status: u16,
        body: String,
    },
    #[error("{} response was empty", .service.label())]
    EmptyResponse { service: Service },
    #[error("could not parse OpenAI response")]
    ParseError,
    #[error("{message}")]
    Validation {
        code: &'static str,
        message: String,
    },
    #[error("{message}")]
    Forbidden { message: String },
}

/// Wire shape for endpoint failures, mirrored into command output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl AssistError {
    pub fn code(&self) -> &'static str {
        match self {
            AssistError::Configuration { code, .. } => code,
            AssistError::MissingCredential => "openai_missing_key",
            AssistError::Transport { .. } => "transport_error",
            AssistError::UpstreamHttp {
                service: Service::OpenAi,
                ..
            } => "openai_http_error",
            AssistError::UpstreamHttp {
                service: Service::SocialImage,
                ..
            } => "social_image_http_error",
            AssistError::EmptyResponse {
                service: Service::OpenAi,
            } => "openai_empty",
            AssistError::EmptyResponse {
                service: Service::SocialImage,
            } => "social_image_empty",
            AssistError::ParseError => "openai_parse_error",
            AssistError::Validation { code, .. } => code,
            AssistError::Forbidden { .. } => "forbidden",
        }
    }

    /// HTTP-like status annotation. Upstream failures report the upstream
    /// status so callers can diagnose the remote side directly.
    pub fn status(&self) -> u16 {
        match self {
            AssistError::Configuration { .. } => 400,
            AssistError::MissingCredential => 400,
            AssistError::Transport { .. } => 502,
            AssistError::UpstreamHttp { status, .. } => *status,
            AssistError::EmptyResponse { .. } => 502,
            AssistError::ParseError => 502,
            AssistError::Validation { .. } => 400,
            AssistError::Forbidden { .. } => 403,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            status: self.status(),
        }
    }
}

pub fn invalid_post_id() -> AssistError {
    AssistError::Validation {
        code: "invalid_post_id",
        message: "Post ID is required.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{AssistError, Service};

    #[test]
    fn upstream_http_error_reports_upstream_status() {
        let err = AssistError::UpstreamHttp {
            service: Service::OpenAi,
            status: 500,
            body: "boom".to_string(),
        };
        let body = err.body();
        assert_eq!(body.code, "openai_http_error");
        assert_eq!(body.status, 500);
    }

    #[test]
    fn missing_credential_maps_to_stable_code() {
        let err = AssistError::MissingCredential;
        assert_eq!(err.code(), "openai_missing_key");
        assert_eq!(err.status(), 400);
    }
}
