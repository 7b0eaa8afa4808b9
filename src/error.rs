use thiserror::Error;

/// Error taxonomy for the extraction pipeline.
///
/// Every variant is fatal to the run; the binary maps each kind onto a
/// distinct process exit code via [`ExtractError::exit_code`] so a
/// misconfigured invocation can be told apart from a backend failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Missing, conflicting, or malformed configuration. Detected before any
    /// network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection could not be established within the retry budget.
    #[error("failed to connect to {url} after {attempts} attempts: {source}")]
    Connect {
        url: String,
        attempts: u32,
        #[source]
        source: elasticsearch::Error,
    },

    /// The cluster reported red health for the target index pattern.
    #[error("cluster health for index pattern '{index}' is {status}, refusing to query")]
    ClusterHealth { index: String, status: String },

    /// The count query matched nothing; pagination never starts.
    #[error("0 results returned, check your query")]
    EmptyResult,

    /// A request outside the scroll loop failed at the transport level.
    #[error("search request failed: {0}")]
    Api(#[from] elasticsearch::Error),

    /// The backend answered with something we cannot interpret.
    #[error("unexpected search response: {0}")]
    Response(String),

    /// A hit payload did not decode into the expected record shape.
    #[error("malformed hit payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// The output file could not be created.
    #[error("failed to create output file '{path}': {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Exit code reported by the binary for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExtractError::Config(_) => 2,
            ExtractError::Connect { .. }
            | ExtractError::ClusterHealth { .. }
            | ExtractError::Api(_)
            | ExtractError::Response(_) => 3,
            ExtractError::EmptyResult
            | ExtractError::Decode(_)
            | ExtractError::Output { .. }
            | ExtractError::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinguish_error_classes() {
        let config = ExtractError::Config("missing required url parameter".into());
        let health = ExtractError::ClusterHealth {
            index: "leak_*".into(),
            status: "red".into(),
        };
        let empty = ExtractError::EmptyResult;

        assert_eq!(config.exit_code(), 2, "configuration errors should exit 2");
        assert_eq!(health.exit_code(), 3, "backend errors should exit 3");
        assert_eq!(empty.exit_code(), 1, "empty result should exit 1");
    }

    #[test]
    fn test_cluster_health_message_names_index_and_status() {
        let err = ExtractError::ClusterHealth {
            index: "leak_*".into(),
            status: "red".into(),
        };
        let message = err.to_string();
        assert!(message.contains("leak_*"), "message should name the index");
        assert!(message.contains("red"), "message should name the status");
    }
}
