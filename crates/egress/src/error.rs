//! Egress errors

/// Errors from drain writers and the connector.
#[derive(Debug, thiserror::Error)]
pub enum EgressError {
    /// The drain URL did not parse
    #[error("invalid drain URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The drain URL scheme is not syslog or syslog-tls
    #[error("unsupported drain scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },

    /// The drain URL has no host or port
    #[error("drain URL {url} is missing a host or port")]
    MissingEndpoint { url: String },

    /// Dialing the drain failed and the writer was cancelled or closed
    #[error("failed to dial {host}: {source}")]
    Dial {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Write failed mid-stream; the connection has been discarded
    #[error("drain write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The configured write deadline expired; the connection has been
    /// discarded
    #[error("drain write timed out")]
    WriteTimeout,

    /// Write was attempted after close
    #[error("writer is closed")]
    WriterClosed,
}
