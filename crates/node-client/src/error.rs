/// Errors surfaced by the node client.
///
/// Transport faults mid-connection are not in this list on purpose: they
/// reach callers as [`ConnectionClosed`](Self::ConnectionClosed) on their
/// pending requests and as the connection's disconnect callback.
#[derive(Debug, thiserror::Error)]
pub enum NodeClientError {
    #[error("websocket: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("timed out connecting to the node")]
    ConnectTimeout,

    #[error("no node connection")]
    NoConnection,

    #[error("connection closed while waiting for a reply")]
    ConnectionClosed,

    #[error("timed out waiting for a reply to {event}")]
    RequestTimeout { event: String },

    #[error("duplicate message id: {0}")]
    DuplicateMessageId(String),

    #[error("frame: {0}")]
    Frame(#[from] sw_protocol::FrameError),

    #[error("bad reply payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("reply to {event} carried no body")]
    MissingBody { event: String },
}
