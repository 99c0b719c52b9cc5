//! Binary wire protocol spoken between the suite and the on-device agent.
//!
//! # Packet Structure (Little Endian)
//!
//! ```text
//! [Header: 4 bytes LE u32 len] [OpCode: 1 byte] [Payload: variable]
//! ```
//!
//! The `len` field encodes the total length of the opcode + payload (NOT including
//! the 4-byte header itself).
//!
//! # Field Encoding
//!
//! - Strings are length-prefixed: a `u32` LE byte count followed by UTF-8 bytes.
//! - Selectors are a `u8` kind (`0` = tag, `1` = text) followed by a string.
//! - Optional values use a `u8` presence flag (`0` = None, `1` = Some).
//!
//! # Example
//!
//! ```
//! use muzz_qa_core::driver::Selector;
//! use muzz_qa_core::protocol::{Request, encode_request, decode_request};
//!
//! let req = Request::Click { selector: Selector::tag("login_button") };
//! let wire = encode_request(&req);
//!
//! // Skip the 4-byte length header to decode
//! let decoded = decode_request(&wire[4..]).unwrap();
//! assert_eq!(decoded, req);
//! ```

use thiserror::Error;

use crate::driver::Selector;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during protocol encoding or decoding.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The opcode byte does not correspond to any known operation.
    #[error("invalid opcode: 0x{0:02X}")]
    InvalidOpCode(u8),

    /// The buffer does not contain enough bytes for the expected data.
    #[error("insufficient data in buffer")]
    InsufficientData,

    /// A string field contains invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    Utf8Error,

    /// The payload structure is invalid for the given opcode.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A frame header announces more than [`MAX_FRAME_LEN`] bytes.
    #[error("frame of {0} bytes exceeds the {max}-byte limit", max = MAX_FRAME_LEN)]
    FrameTooLarge(u32),
}

// ---------------------------------------------------------------------------
// OpCode
// ---------------------------------------------------------------------------

/// On-the-wire operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Keep-alive ping (no payload).
    Heartbeat = 0x01,
    /// Click the node matching a selector.
    Click = 0x02,
    /// Append text to the node matching a selector (selector + string).
    TypeText = 0x03,
    /// Clear the text of the node matching a selector.
    ClearText = 0x04,
    /// Block until the UI is idle (u64 timeout in ms).
    WaitForIdle = 0x05,
    /// Request a full semantics tree dump (no payload).
    DumpTree = 0x10,
    /// Find a single node matching a selector.
    FindElement = 0x11,
    /// Relaunch the app under test (no payload).
    Relaunch = 0x12,
    /// Error message from the agent (length-prefixed string).
    Error = 0x99,
    /// Generic response (response-type byte + variable data).
    Response = 0xA0,
}

impl OpCode {
    /// Try to convert a raw byte into an `OpCode`.
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x01 => Ok(OpCode::Heartbeat),
            0x02 => Ok(OpCode::Click),
            0x03 => Ok(OpCode::TypeText),
            0x04 => Ok(OpCode::ClearText),
            0x05 => Ok(OpCode::WaitForIdle),
            0x10 => Ok(OpCode::DumpTree),
            0x11 => Ok(OpCode::FindElement),
            0x12 => Ok(OpCode::Relaunch),
            0x99 => Ok(OpCode::Error),
            0xA0 => Ok(OpCode::Response),
            other => Err(ProtocolError::InvalidOpCode(other)),
        }
    }
}

const SELECTOR_TAG: u8 = 0x00;
const SELECTOR_TEXT: u8 = 0x01;

// ---------------------------------------------------------------------------
// Request / Response enums
// ---------------------------------------------------------------------------

/// A typed request from the suite to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Keep-alive heartbeat.
    Heartbeat,
    /// Click a node.
    Click { selector: Selector },
    /// Append text to an editable node.
    TypeText { selector: Selector, text: String },
    /// Clear an editable node.
    ClearText { selector: Selector },
    /// Wait for the UI to settle.
    WaitForIdle { timeout_ms: u64 },
    /// Request the full semantics tree.
    DumpTree,
    /// Find a single node.
    FindElement { selector: Selector },
    /// Relaunch the app under test.
    Relaunch,
}

impl Request {
    /// Returns a short, static name for this request type suitable for use in
    /// tracing span metadata.
    pub fn opcode_name(&self) -> &'static str {
        match self {
            Request::Heartbeat => "heartbeat",
            Request::Click { .. } => "click",
            Request::TypeText { .. } => "type_text",
            Request::ClearText { .. } => "clear_text",
            Request::WaitForIdle { .. } => "wait_for_idle",
            Request::DumpTree => "dump_tree",
            Request::FindElement { .. } => "find_element",
            Request::Relaunch => "relaunch",
        }
    }
}

/// Response sub-type byte used inside the `Response` opcode payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum ResponseType {
    Ok = 0x00,
    Error = 0x01,
    Tree = 0x02,
    Element = 0x03,
}

impl ResponseType {
    fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x00 => Ok(ResponseType::Ok),
            0x01 => Ok(ResponseType::Error),
            0x02 => Ok(ResponseType::Tree),
            0x03 => Ok(ResponseType::Element),
            other => Err(ProtocolError::InvalidPayload(format!(
                "unknown response type: 0x{other:02X}"
            ))),
        }
    }
}

/// A typed response from the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The operation completed successfully with no additional data.
    Ok,
    /// The operation failed.
    Error { message: String },
    /// A JSON-encoded array of root nodes.
    Tree { json: String },
    /// A JSON-encoded single node, or `None` when nothing matched.
    Element { json: Option<String> },
}

// ---------------------------------------------------------------------------
// Low-level payload helpers
// ---------------------------------------------------------------------------

fn write_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn write_optional_string(buf: &mut Vec<u8>, opt: &Option<String>) {
    match opt {
        None => buf.push(0u8),
        Some(s) => {
            buf.push(1u8);
            write_string(buf, s);
        }
    }
}

fn write_selector(buf: &mut Vec<u8>, selector: &Selector) {
    match selector {
        Selector::Tag(tag) => {
            buf.push(SELECTOR_TAG);
            write_string(buf, tag);
        }
        Selector::Text(text) => {
            buf.push(SELECTOR_TEXT);
            write_string(buf, text);
        }
    }
}

/// A cursor over a byte slice for sequential reads.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::InsufficientData);
        }
        let data = self.data;
        let slice = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let bytes: [u8; 4] = self
            .take(4)?
            .try_into()
            .map_err(|_| ProtocolError::InsufficientData)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        let bytes: [u8; 8] = self
            .take(8)?
            .try_into()
            .map_err(|_| ProtocolError::InsufficientData)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Read a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::Utf8Error)
    }

    fn read_optional_string(&mut self) -> Result<Option<String>, ProtocolError> {
        if self.read_u8()? == 0 {
            Ok(None)
        } else {
            Ok(Some(self.read_string()?))
        }
    }

    fn read_selector(&mut self) -> Result<Selector, ProtocolError> {
        match self.read_u8()? {
            SELECTOR_TAG => Ok(Selector::Tag(self.read_string()?)),
            SELECTOR_TEXT => Ok(Selector::Text(self.read_string()?)),
            other => Err(ProtocolError::InvalidPayload(format!(
                "unknown selector kind: 0x{other:02X}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame helpers
// ---------------------------------------------------------------------------

/// Wrap a payload (opcode + data) with the 4-byte LE length header.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Largest payload accepted from a peer.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Read the payload length from a 4-byte LE header.
pub fn read_frame_length(header: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*header)
}

/// Like [`read_frame_length`], but rejects lengths over [`MAX_FRAME_LEN`]
/// before anything is allocated for the payload.
pub fn checked_frame_length(header: &[u8; 4]) -> Result<usize, ProtocolError> {
    match read_frame_length(header) {
        len if len > MAX_FRAME_LEN => Err(ProtocolError::FrameTooLarge(len)),
        len => Ok(len as usize),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Encode a [`Request`] into wire format including the 4-byte length header.
pub fn encode_request(req: &Request) -> Vec<u8> {
    let mut payload = Vec::new();

    match req {
        Request::Heartbeat => payload.push(OpCode::Heartbeat as u8),
        Request::Click { selector } => {
            payload.push(OpCode::Click as u8);
            write_selector(&mut payload, selector);
        }
        Request::TypeText { selector, text } => {
            payload.push(OpCode::TypeText as u8);
            write_selector(&mut payload, selector);
            write_string(&mut payload, text);
        }
        Request::ClearText { selector } => {
            payload.push(OpCode::ClearText as u8);
            write_selector(&mut payload, selector);
        }
        Request::WaitForIdle { timeout_ms } => {
            payload.push(OpCode::WaitForIdle as u8);
            payload.extend_from_slice(&timeout_ms.to_le_bytes());
        }
        Request::DumpTree => payload.push(OpCode::DumpTree as u8),
        Request::FindElement { selector } => {
            payload.push(OpCode::FindElement as u8);
            write_selector(&mut payload, selector);
        }
        Request::Relaunch => payload.push(OpCode::Relaunch as u8),
    }

    encode_frame(&payload)
}

/// Decode wire bytes (opcode + payload, **after** the 4-byte length header) into
/// a [`Request`].
pub fn decode_request(data: &[u8]) -> Result<Request, ProtocolError> {
    let mut cur = Cursor::new(data);
    let opcode = OpCode::from_u8(cur.read_u8()?)?;

    match opcode {
        OpCode::Heartbeat => Ok(Request::Heartbeat),
        OpCode::Click => Ok(Request::Click {
            selector: cur.read_selector()?,
        }),
        OpCode::TypeText => {
            let selector = cur.read_selector()?;
            let text = cur.read_string()?;
            Ok(Request::TypeText { selector, text })
        }
        OpCode::ClearText => Ok(Request::ClearText {
            selector: cur.read_selector()?,
        }),
        OpCode::WaitForIdle => Ok(Request::WaitForIdle {
            timeout_ms: cur.read_u64()?,
        }),
        OpCode::DumpTree => Ok(Request::DumpTree),
        OpCode::FindElement => Ok(Request::FindElement {
            selector: cur.read_selector()?,
        }),
        OpCode::Relaunch => Ok(Request::Relaunch),
        OpCode::Error | OpCode::Response => Err(ProtocolError::InvalidPayload(format!(
            "opcode 0x{:02X} is not a valid request opcode",
            opcode as u8
        ))),
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Encode a [`Response`] into wire format including the 4-byte length header.
pub fn encode_response(resp: &Response) -> Vec<u8> {
    let mut payload = vec![OpCode::Response as u8];

    match resp {
        Response::Ok => payload.push(ResponseType::Ok as u8),
        Response::Error { message } => {
            payload.push(ResponseType::Error as u8);
            write_string(&mut payload, message);
        }
        Response::Tree { json } => {
            payload.push(ResponseType::Tree as u8);
            write_string(&mut payload, json);
        }
        Response::Element { json } => {
            payload.push(ResponseType::Element as u8);
            write_optional_string(&mut payload, json);
        }
    }

    encode_frame(&payload)
}

/// Decode wire bytes (opcode + payload, **after** the 4-byte length header) into
/// a [`Response`].
pub fn decode_response(data: &[u8]) -> Result<Response, ProtocolError> {
    let mut cur = Cursor::new(data);
    let opcode = OpCode::from_u8(cur.read_u8()?)?;

    match opcode {
        OpCode::Response => match ResponseType::from_u8(cur.read_u8()?)? {
            ResponseType::Ok => Ok(Response::Ok),
            ResponseType::Error => Ok(Response::Error {
                message: cur.read_string()?,
            }),
            ResponseType::Tree => Ok(Response::Tree {
                json: cur.read_string()?,
            }),
            ResponseType::Element => Ok(Response::Element {
                json: cur.read_optional_string()?,
            }),
        },
        // The agent may also send a bare Error opcode.
        OpCode::Error => Ok(Response::Error {
            message: cur.read_string()?,
        }),
        _ => Err(ProtocolError::InvalidPayload(format!(
            "opcode 0x{:02X} is not a valid response opcode",
            opcode as u8
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_request(req: &Request) {
        let wire = encode_request(req);
        let len = read_frame_length(wire[..4].try_into().unwrap()) as usize;
        assert_eq!(len, wire.len() - 4);
        assert_eq!(&decode_request(&wire[4..]).unwrap(), req);
    }

    #[test]
    fn request_type_text_keeps_selector_kind() {
        round_trip_request(&Request::TypeText {
            selector: Selector::tag("username_field"),
            text: "user".into(),
        });
        round_trip_request(&Request::Click {
            selector: Selector::text("You're all caught up!"),
        });
    }

    #[test]
    fn request_wait_for_idle_carries_timeout() {
        round_trip_request(&Request::WaitForIdle { timeout_ms: 5000 });
    }

    #[test]
    fn response_element_absent() {
        let wire = encode_response(&Response::Element { json: None });
        assert_eq!(
            decode_response(&wire[4..]).unwrap(),
            Response::Element { json: None }
        );
    }

    #[test]
    fn decode_request_empty_input() {
        assert_eq!(decode_request(&[]), Err(ProtocolError::InsufficientData));
    }

    #[test]
    fn decode_request_invalid_opcode() {
        assert_eq!(decode_request(&[0xFF]), Err(ProtocolError::InvalidOpCode(0xFF)));
    }

    #[test]
    fn decode_request_truncated_selector() {
        // Tag selector claims 10 bytes but only 2 follow.
        let data = [OpCode::Click as u8, SELECTOR_TAG, 10, 0, 0, 0, b'a', b'b'];
        assert_eq!(decode_request(&data), Err(ProtocolError::InsufficientData));
    }

    #[test]
    fn decode_request_unknown_selector_kind() {
        let data = [OpCode::ClearText as u8, 0x07, 0, 0, 0, 0];
        assert!(matches!(
            decode_request(&data),
            Err(ProtocolError::InvalidPayload(_))
        ));
    }

    #[test]
    fn decode_response_rejects_request_opcode() {
        assert!(decode_response(&[OpCode::Click as u8]).is_err());
    }

    #[test]
    fn decode_response_bare_error_opcode() {
        let mut wire = vec![OpCode::Error as u8];
        let msg = "no node with tag 'button_like'";
        wire.extend_from_slice(&(msg.len() as u32).to_le_bytes());
        wire.extend_from_slice(msg.as_bytes());
        assert_eq!(
            decode_response(&wire).unwrap(),
            Response::Error {
                message: msg.into()
            }
        );
    }

    #[test]
    fn frame_length_is_capped() {
        let at_limit = MAX_FRAME_LEN.to_le_bytes();
        assert_eq!(checked_frame_length(&at_limit), Ok(MAX_FRAME_LEN as usize));

        let huge = u32::MAX.to_le_bytes();
        assert_eq!(
            checked_frame_length(&huge),
            Err(ProtocolError::FrameTooLarge(u32::MAX))
        );
    }

    #[test]
    fn heartbeat_wire_format() {
        assert_eq!(encode_request(&Request::Heartbeat), vec![1, 0, 0, 0, 0x01]);
    }

    #[test]
    fn click_wire_format() {
        let wire = encode_request(&Request::Click {
            selector: Selector::tag("ok"),
        });
        // opcode + kind + u32 len + 2 bytes
        assert_eq!(&wire[..4], &8u32.to_le_bytes());
        assert_eq!(wire[4], OpCode::Click as u8);
        assert_eq!(wire[5], SELECTOR_TAG);
        assert_eq!(&wire[6..10], &2u32.to_le_bytes());
        assert_eq!(&wire[10..], b"ok");
    }

    #[test]
    fn response_ok_wire_format() {
        let wire = encode_response(&Response::Ok);
        assert_eq!(&wire[..4], &2u32.to_le_bytes());
        assert_eq!(wire[4], OpCode::Response as u8);
        assert_eq!(wire[5], ResponseType::Ok as u8);
    }
}
