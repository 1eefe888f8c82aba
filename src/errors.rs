use thiserror::Error;

/// Errors raised while talking to a bounty platform or preparing a run.
///
/// Whether an error aborts a scan is decided by where it surfaces: listing
/// requests propagate it, per-program requests turn it into a skip.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid proxy URL {url}: {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("failed to parse JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("data-api-endpoints attribute not found")]
    BriefEndpointMissing,

    #[error("failed to parse data-api-endpoints JSON: {0}")]
    BriefEndpointMalformed(#[source] serde_json::Error),

    #[error("getBriefVersionDocument not found in API endpoints")]
    BriefDocumentMissing,

    #[error("invalid HackerOne URL: {0}")]
    UnmatchedInclude(String),

    #[error("{0} not found in environment variables")]
    MissingCredential(&'static str),

    #[error("{0}")]
    Config(String),

    #[error("failed to write target: {0}")]
    Output(#[source] std::io::Error),
}

impl ScanError {
    pub fn decode(url: &str, source: serde_json::Error) -> Self {
        ScanError::Decode { url: url.to_string(), source }
    }

    /// The output reader went away (`| head`); a clean stop, not a failure.
    pub fn is_closed_output(&self) -> bool {
        matches!(self, ScanError::Output(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_url_and_code() {
        let e = ScanError::UnexpectedStatus { url: "https://bugcrowd.com/x".into(), status: 503 };
        assert_eq!(e.to_string(), "unexpected response from https://bugcrowd.com/x: 503");
    }

    #[test]
    fn missing_credential_message() {
        assert_eq!(
            ScanError::MissingCredential("H1_API_KEY").to_string(),
            "H1_API_KEY not found in environment variables"
        );
    }

    #[test]
    fn only_broken_pipe_counts_as_closed_output() {
        assert!(ScanError::Output(std::io::ErrorKind::BrokenPipe.into()).is_closed_output());
        assert!(!ScanError::Output(std::io::ErrorKind::PermissionDenied.into()).is_closed_output());
        assert!(!ScanError::BriefDocumentMissing.is_closed_output());
    }
}
