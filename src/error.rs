use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the inference client.
#[derive(Error, Debug)]
pub enum PredictError {
    /// The endpoint answered with something other than 200. `body` is the
    /// server's response text, untouched.
    #[error("Error: {body}")]
    Rejected { status: StatusCode, body: String },

    /// Connection refused, DNS failure, timeout and friends.
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 200 reply whose body does not carry `outputs[0].data[0]` as a number.
    #[error("malformed inference response: {0}")]
    MalformedResponse(String),

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl PredictError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PredictError::Rejected { status, .. } => Some(*status),
            PredictError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, PredictError::Rejected { .. })
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_displays_raw_body() {
        let err = PredictError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "model not found".to_string(),
        };
        assert_eq!(err.to_string(), "Error: model not found");
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(err.is_rejection());
    }

    #[test]
    fn malformed_response_is_not_a_rejection() {
        let err = PredictError::MalformedResponse("response has no outputs".to_string());
        assert!(!err.is_rejection());
        assert_eq!(err.status(), None);
        assert_eq!(
            err.to_string(),
            "malformed inference response: response has no outputs"
        );
    }
}
