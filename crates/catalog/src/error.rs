use thiserror::Error;

/// Errors surfaced while talking to the metrics catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configured base URL cannot be parsed or cannot carry path segments.
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
    /// Transport-level failure (DNS, connect, timeout).
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The catalog answered with a non-success status.
    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The body was not the JSON shape we expected.
    #[error("invalid catalog response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code_and_body() {
        let err = CatalogError::Status {
            status: 404,
            body: "no such metric".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("no such metric"));
    }

    #[test]
    fn invalid_url_message() {
        let err = CatalogError::InvalidUrl("not a url".into());
        assert!(err.to_string().contains("invalid catalog url"));
    }
}
