use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure: DNS, connect, timeout, or the body could not be read.
    #[error("No response from venue source: {0}")]
    NoResponse(String),

    /// The server answered but did not report success.
    #[error("Venue source rejected request (code {code}): {detail}")]
    ServerRejected { code: String, detail: String },

    /// The payload was not the JSON document shape we expect.
    #[error("Malformed venue response: {0}")]
    Malformed(String),

    #[error("Fetch cancelled")]
    Cancelled,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        FetchError::ServerRejected {
            code: status.as_u16().to_string(),
            detail: Self::truncate_body(body),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::NoResponse(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_truncates_body() {
        let body = "x".repeat(800);
        let err = FetchError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            FetchError::ServerRejected { code, detail } => {
                assert_eq!(code, "500");
                assert!(detail.starts_with(&"x".repeat(500)));
                assert!(detail.ends_with("(truncated, 800 total bytes)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_status_short_body_kept() {
        let err = FetchError::from_status(reqwest::StatusCode::UNAUTHORIZED, "bad creds");
        assert_eq!(
            err.to_string(),
            "Venue source rejected request (code 401): bad creds"
        );
    }
}
