use thiserror::Error;

/// Boundary error for both hops. `server.rs` maps each variant to a status code.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to decode request: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid or missing api key")]
    Auth,

    #[error("failed to perform http request with protobuf payload: {0}")]
    Forward(#[from] ForwardError),

    #[error("side call failed: {0}")]
    SideCall(#[from] ProbeError),

    #[error("failed to submit message: {0}")]
    PublishSubmit(#[from] SubmitError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("log sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("HTTP server error: {0}")]
    Server(#[from] hyper::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or incomplete inbound payload.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed protobuf: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
}

/// Failure of the auxiliary interval lookup. Never fatal to a request.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to get interval from cache service: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to read cache service response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("could not match time instance from response {0:?}")]
    NoMatch(String),
}

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("transport: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("downstream answered {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to get {uri}: {source}")]
    Transport {
        uri: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Synchronous rejection of a publish submission. The message never entered the send path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("producer is closed")]
    Closed,

    #[error("send queue full after waiting {waited_ms} ms")]
    QueueFull { waited_ms: u64 },
}

/// Failure reported by a log sink while appending. Surfaces only through the drain task.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("broker error: {0}")]
    Broker(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
