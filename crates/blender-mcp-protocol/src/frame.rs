//! Length-prefixed JSON framing
//!
//! A frame is a 4-byte big-endian body length followed by that many bytes of
//! UTF-8 JSON. The declared length is checked against a maximum before any
//! buffer is allocated for the body, so a hostile or confused peer cannot make
//! us reserve gigabytes by sending four bytes.

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default upper bound on a frame body (16 MiB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Errors raised while encoding, reading, or decoding a frame
#[derive(Error, Debug)]
pub enum FrameError {
    /// Declared body length exceeds the configured maximum
    #[error("frame too large: {len} bytes (max: {max})")]
    TooLarge { len: usize, max: usize },

    /// The stream ended part-way through a frame
    #[error("incomplete frame: expected {expected} bytes, got {actual}")]
    Incomplete { expected: usize, actual: usize },

    /// The stream ended cleanly on a frame boundary
    #[error("connection closed")]
    Closed,

    /// Body is not valid JSON for the expected message
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Serialize a message into a complete frame (prefix + body)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, FrameError> {
    let body = serde_json::to_vec(message)?;
    let len = u32::try_from(body.len()).map_err(|_| FrameError::TooLarge {
        len: body.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + body.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode a complete frame (prefix + body) held in memory
pub fn decode<T: DeserializeOwned>(frame: &[u8], max_len: usize) -> Result<T, FrameError> {
    let Some((prefix, rest)) = frame.split_first_chunk::<LENGTH_PREFIX_LEN>() else {
        return Err(FrameError::Incomplete {
            expected: LENGTH_PREFIX_LEN,
            actual: frame.len(),
        });
    };

    let len = checked_len(*prefix, max_len)?;
    if rest.len() < len {
        return Err(FrameError::Incomplete {
            expected: len,
            actual: rest.len(),
        });
    }

    decode_body(&rest[..len])
}

/// Decode a frame body (without its prefix)
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, FrameError> {
    Ok(serde_json::from_slice(body)?)
}

fn checked_len(prefix: [u8; LENGTH_PREFIX_LEN], max_len: usize) -> Result<usize, FrameError> {
    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_len {
        return Err(FrameError::TooLarge { len, max: max_len });
    }
    Ok(len)
}

/// Read one frame body from a stream
///
/// Returns [`FrameError::Closed`] if the stream ends before the first byte of
/// the prefix, which is how a peer hangs up between frames.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let mut filled = 0;
    while filled < LENGTH_PREFIX_LEN {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            return Err(if filled == 0 {
                FrameError::Closed
            } else {
                FrameError::Incomplete {
                    expected: LENGTH_PREFIX_LEN,
                    actual: filled,
                }
            });
        }
        filled += n;
    }

    let len = checked_len(prefix, max_len)?;
    let mut body = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let n = reader.read(&mut body[filled..]).await?;
        if n == 0 {
            return Err(FrameError::Incomplete {
                expected: len,
                actual: filled,
            });
        }
        filled += n;
    }

    Ok(body)
}

/// Read and decode one message from a stream
pub async fn read_message<T, R>(reader: &mut R, max_len: usize) -> Result<T, FrameError>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let body = read_frame(reader, max_len).await?;
    decode_body(&body)
}

/// Encode and write one message to a stream
pub async fn write_message<T, W>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let frame = encode(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Command, CommandKind, Response};
    use serde_json::{Map, json};

    fn sample_command() -> Command {
        let mut params = Map::new();
        params.insert("object_type".into(), json!("CUBE"));
        params.insert("location".into(), json!([2.0, 0.0, 1.0]));
        params.insert("name".into(), json!("MyCube"));
        Command::from_kind(CommandKind::CreateObject, params)
    }

    #[test]
    fn test_prefix_is_big_endian_body_length() {
        let frame = encode(&Response::success(json!({"pong": true}))).unwrap();
        let body_len = frame.len() - LENGTH_PREFIX_LEN;
        assert_eq!(&frame[..4], &(body_len as u32).to_be_bytes());
    }

    #[test]
    fn test_round_trip() {
        let command = sample_command();
        let decoded: Command = decode(&encode(&command).unwrap(), DEFAULT_MAX_FRAME_LEN).unwrap();
        assert_eq!(decoded, command);

        let response = Response::success(json!({"name": "MyCube", "location": [2.0, 0.0, 1.0]}));
        let decoded: Response =
            decode(&encode(&response).unwrap(), DEFAULT_MAX_FRAME_LEN).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_decode_rejects_oversized_length() {
        let mut frame = 1_000_000u32.to_be_bytes().to_vec();
        frame.extend_from_slice(b"{}");
        let err = decode::<Response>(&frame, 1024).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { len: 1_000_000, max: 1024 }));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let mut frame = 3u32.to_be_bytes().to_vec();
        frame.extend_from_slice(b"{{{");
        let err = decode::<Command>(&frame, DEFAULT_MAX_FRAME_LEN).unwrap_err();
        assert!(matches!(err, FrameError::Json(_)));
    }

    #[test]
    fn test_decode_short_frame() {
        let err = decode::<Command>(&[0, 0], DEFAULT_MAX_FRAME_LEN).unwrap_err();
        assert!(matches!(err, FrameError::Incomplete { expected: 4, actual: 2 }));
    }

    #[tokio::test]
    async fn test_read_frame_checks_length_before_reading_body() {
        // Only the prefix is present; a reader that tried to fill the body
        // would report Incomplete instead of TooLarge.
        let prefix = u32::MAX.to_be_bytes();
        let mut reader = &prefix[..];
        let err = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_read_frame_clean_close() {
        let mut reader: &[u8] = &[];
        let err = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
        assert!(matches!(err, FrameError::Closed));
    }

    #[tokio::test]
    async fn test_read_frame_truncated_body() {
        let mut bytes = 10u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"{\"a\"");
        let mut reader = &bytes[..];
        let err = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
        assert!(matches!(err, FrameError::Incomplete { expected: 10, actual: 4 }));
    }

    #[tokio::test]
    async fn test_message_over_stream() {
        let command = sample_command();
        let mut buffer = Vec::new();
        write_message(&mut buffer, &command).await.unwrap();
        write_message(&mut buffer, &Command::from_kind(CommandKind::Ping, Map::new()))
            .await
            .unwrap();

        let mut reader = &buffer[..];
        let first: Command = read_message(&mut reader, DEFAULT_MAX_FRAME_LEN).await.unwrap();
        let second: Command = read_message(&mut reader, DEFAULT_MAX_FRAME_LEN).await.unwrap();
        assert_eq!(first, command);
        assert_eq!(second.kind(), Ok(CommandKind::Ping));
        assert!(matches!(
            read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN).await,
            Err(FrameError::Closed)
        ));
    }

    mod properties {
        use super::*;
        use crate::Status;
        use proptest::prelude::*;
        use serde_json::Value;

        /// Any JSON value whose numbers survive a text round trip exactly
        fn json_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::from),
                // Eighths are exact in binary, so they print and parse back unchanged
                (-(1i64 << 40)..(1i64 << 40)).prop_map(|n| Value::from(n as f64 / 8.0)),
                ".{0,16}".prop_map(Value::String),
            ];
            leaf.prop_recursive(3, 32, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                    params_of(inner).prop_map(Value::Object),
                ]
            })
        }

        fn params_of(values: impl Strategy<Value = Value>) -> impl Strategy<Value = Map<String, Value>> {
            prop::collection::btree_map("[a-z_]{1,12}", values, 0..6).prop_map(|m| m.into_iter().collect())
        }

        fn command() -> impl Strategy<Value = Command> {
            ("[a-z_]{1,24}", params_of(json_value())).prop_map(|(name, params)| Command::new(name, params))
        }

        fn response() -> impl Strategy<Value = Response> {
            (
                prop_oneof![Just(Status::Success), Just(Status::Error)],
                json_value(),
                prop::option::of(".{0,32}"),
            )
                .prop_map(|(status, result, message)| Response {
                    status,
                    result,
                    message,
                })
        }

        proptest! {
            #[test]
            fn command_survives_a_frame(command in command()) {
                let frame = encode(&command).unwrap();
                let decoded: Command = decode(&frame, DEFAULT_MAX_FRAME_LEN).unwrap();
                prop_assert_eq!(decoded, command);
            }

            #[test]
            fn response_survives_a_frame(response in response()) {
                let frame = encode(&response).unwrap();
                let decoded: Response = decode(&frame, DEFAULT_MAX_FRAME_LEN).unwrap();
                prop_assert_eq!(decoded, response);
            }

            #[test]
            fn cut_frame_never_decodes(command in command(), cut in any::<prop::sample::Index>()) {
                let frame = encode(&command).unwrap();
                let cut = cut.index(frame.len());
                let result = decode::<Command>(&frame[..cut], DEFAULT_MAX_FRAME_LEN);
                prop_assert!(matches!(result, Err(FrameError::Incomplete { .. })), "{:?}", result);
            }
        }
    }
}
