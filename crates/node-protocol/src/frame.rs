//! Wire framing: encode/decode between [`Frame`] and the raw text the
//! socket carries. Pure and stateless.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

/// Header key naming the logical channel/topic.
pub const HDR_EVENT: &str = "event";
/// Header key carrying the correlation id.
pub const HDR_MESSAGE_ID: &str = "message-id";
/// Header key governing body decoding.
pub const HDR_CONTENT_TYPE: &str = "content-type";

/// Content type that marks a JSON body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Errors from the codec. Header-level oddities (missing separator, lines
/// without a colon) are tolerated by design; only an undecodable JSON body
/// is an error.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Body of a frame: opaque text, or a decoded value when the frame carries
/// `content-type: application/json`.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(serde_json::Value),
}

impl Body {
    /// Serialize a structured payload into a JSON body.
    pub fn json<T: Serialize>(payload: &T) -> Result<Self, FrameError> {
        Ok(Self::Json(serde_json::to_value(payload)?))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Text(_) => None,
            Self::Json(value) => Some(value),
        }
    }
}

/// One complete unit of exchange on the socket: a header map and a body.
/// Constructed at send time or by [`decode`](Frame::decode); never mutated
/// after that.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: BTreeMap<String, String>,
    pub body: Body,
}

impl Frame {
    /// Build an outbound frame with an opaque text body.
    pub fn text(event: &str, message_id: &str, body: impl Into<String>) -> Self {
        let mut header = BTreeMap::new();
        header.insert(HDR_EVENT.to_string(), event.to_string());
        header.insert(HDR_MESSAGE_ID.to_string(), message_id.to_string());
        Self {
            header,
            body: Body::Text(body.into()),
        }
    }

    /// Build an outbound frame carrying `payload` as JSON.
    pub fn json<T: Serialize>(
        event: &str,
        message_id: &str,
        payload: &T,
    ) -> Result<Self, FrameError> {
        Ok(Self::json_value(event, message_id, serde_json::to_value(payload)?))
    }

    /// Build an outbound frame from an already-built JSON value.
    pub fn json_value(event: &str, message_id: &str, value: serde_json::Value) -> Self {
        let mut header = BTreeMap::new();
        header.insert(HDR_EVENT.to_string(), event.to_string());
        header.insert(HDR_MESSAGE_ID.to_string(), message_id.to_string());
        header.insert(HDR_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        Self {
            header,
            body: Body::Json(value),
        }
    }

    /// Build an outbound frame from a [`Body`].
    pub fn with_body(event: &str, message_id: &str, body: Body) -> Self {
        match body {
            Body::Text(text) => Self::text(event, message_id, text),
            Body::Json(value) => Self::json_value(event, message_id, value),
        }
    }

    /// The logical channel/topic this frame belongs to.
    pub fn event(&self) -> Option<&str> {
        self.header.get(HDR_EVENT).map(String::as_str)
    }

    /// The correlation id, if the frame carries one.
    pub fn message_id(&self) -> Option<&str> {
        self.header.get(HDR_MESSAGE_ID).map(String::as_str)
    }

    /// Encode to wire text. Reserved headers come first in a fixed order,
    /// any other headers after them (sorted); then a blank line and the
    /// body. A JSON body is always stamped `content-type: application/json`
    /// so the peer decodes it back to a value.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let reserved = [HDR_EVENT, HDR_MESSAGE_ID, HDR_CONTENT_TYPE];

        for key in reserved {
            if let Some(value) = self.header.get(key) {
                let _ = writeln!(out, "{key}: {value}");
            }
        }
        if matches!(self.body, Body::Json(_)) && !self.header.contains_key(HDR_CONTENT_TYPE) {
            let _ = writeln!(out, "{HDR_CONTENT_TYPE}: {CONTENT_TYPE_JSON}");
        }
        for (key, value) in &self.header {
            if !reserved.contains(&key.as_str()) {
                let _ = writeln!(out, "{key}: {value}");
            }
        }

        out.push('\n');
        match &self.body {
            Body::Text(text) => out.push_str(text),
            Body::Json(value) => out.push_str(&value.to_string()),
        }
        out
    }

    /// Decode a raw frame.
    ///
    /// The header block ends at the first blank line (LF or CRLF — the node
    /// sends CRLF). A frame with no separator is all headers and an empty
    /// body. Header lines split at the first colon with both sides trimmed;
    /// a line without a colon is skipped. Unknown headers pass through
    /// verbatim. The body is JSON-parsed iff the content type says so.
    pub fn decode(raw: &str) -> Result<Self, FrameError> {
        let (header_block, body_raw) = split_at_blank_line(raw);

        let mut header = BTreeMap::new();
        for line in header_block.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            header.insert(key.trim().to_string(), value.trim().to_string());
        }

        let is_json =
            header.get(HDR_CONTENT_TYPE).map(String::as_str) == Some(CONTENT_TYPE_JSON);
        let body = if is_json {
            Body::Json(serde_json::from_str(body_raw)?)
        } else {
            Body::Text(body_raw.to_string())
        };

        Ok(Self { header, body })
    }
}

/// Split at the first blank line, whichever line-ending convention hits
/// first in the input.
fn split_at_blank_line(raw: &str) -> (&str, &str) {
    match (raw.find("\n\n"), raw.find("\r\n\r\n")) {
        (Some(lf), Some(crlf)) if crlf < lf => (&raw[..crlf], &raw[crlf + 4..]),
        (Some(lf), _) => (&raw[..lf], &raw[lf + 2..]),
        (None, Some(crlf)) => (&raw[..crlf], &raw[crlf + 4..]),
        (None, None) => (raw, ""),
    }
}
