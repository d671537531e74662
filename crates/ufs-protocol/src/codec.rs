use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{UfsMessage, MAX_MESSAGE_SIZE};

/// Codec for encoding/decoding streaming-transport frames.
pub struct UfsCodec;

impl UfsCodec {
    /// Encode a message with framing: [4 bytes len][1 byte tag][payload]
    pub fn encode(msg: &UfsMessage) -> ProtocolResult<Vec<u8>> {
        let payload = bincode::serialize(msg)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = Vec::with_capacity(4 + 1 + payload.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(msg.type_tag());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode a framed message. Returns (message, bytes_consumed).
    pub fn decode(data: &[u8]) -> ProtocolResult<(UfsMessage, usize)> {
        if data.len() < 5 {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let len = Self::frame_len([data[0], data[1], data[2], data[3]])?;
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete: have {}, need {}", data.len(), total
            )));
        }
        let msg = Self::decode_body(&data[4..total])?;
        Ok((msg, total))
    }

    /// Validate a length prefix; returns the number of bytes that follow it.
    fn frame_len(header: [u8; 4]) -> ProtocolResult<usize> {
        let len = u32::from_be_bytes(header) as usize;
        if len < 1 {
            debug!("rejecting zero-length frame");
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_MESSAGE_SIZE {
            debug!(size = len - 1, max = MAX_MESSAGE_SIZE, "rejecting oversized frame");
            return Err(ProtocolError::MessageTooLarge { size: len - 1, max: MAX_MESSAGE_SIZE });
        }
        Ok(len)
    }

    /// Decode `[tag][payload]` and check the tag against the payload.
    fn decode_body(body: &[u8]) -> ProtocolResult<UfsMessage> {
        let tag = body[0];
        let msg: UfsMessage = bincode::deserialize(&body[1..]).map_err(|e| {
            debug!(tag, len = body.len(), error = %e, "undecodable frame payload");
            ProtocolError::Deserialization(e.to_string())
        })?;
        if msg.type_tag() != tag {
            debug!(tag, payload = msg.type_name(), "frame tag does not match payload");
            return Err(ProtocolError::InvalidMessageType(tag));
        }
        trace!(kind = msg.type_name(), len = body.len(), "frame decoded");
        Ok(msg)
    }
}

/// Write one framed message and flush.
pub async fn write_message<W>(writer: &mut W, msg: &UfsMessage) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = UfsCodec::encode(msg)?;
    trace!(kind = msg.type_name(), len = frame.len(), "writing frame");
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message.
///
/// Returns `Ok(None)` if the peer closed the stream cleanly before a new
/// frame started; a stream closed in the middle of a frame is an error.
pub async fn read_message<R>(reader: &mut R) -> ProtocolResult<Option<UfsMessage>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::FramingError("stream closed inside frame header".into()));
        }
        filled += n;
    }
    let len = UfsCodec::frame_len(header)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            ProtocolError::FramingError("stream closed inside frame body".into())
        }
        _ => ProtocolError::Io(e),
    })?;
    UfsCodec::decode_body(&body).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::*;

    macro_rules! roundtrip_test {
        ($name:ident, $msg:expr) => {
            #[test]
            fn $name() {
                let msg = $msg;
                let encoded = UfsCodec::encode(&msg).unwrap();
                let (decoded, consumed) = UfsCodec::decode(&encoded).unwrap();
                assert_eq!(consumed, encoded.len());
                assert_eq!(decoded, msg);
            }
        };
    }

    roundtrip_test!(stat_request_roundtrip, UfsMessage::StatRequest {
        uuid: "123e4567-e89b-12d3-a456-426614174000".into(),
    });

    roundtrip_test!(read_request_roundtrip, UfsMessage::ReadRequest {
        uuid: "123e4567-e89b-12d3-a456-426614174000".into(),
        chunk_size: -1,
    });

    roundtrip_test!(stat_reply_roundtrip, UfsMessage::StatReply {
        name: "test.txt".into(),
        size: 13,
        mimetype: "text/plain".into(),
        created: WireTimestamp { seconds: 1_705_314_600, nanos: 5 },
        created_text: "2024-01-15T10:30:00.000000005Z".into(),
    });

    roundtrip_test!(chunk_roundtrip, UfsMessage::Chunk { data: b"Hello, world!".to_vec() });

    roundtrip_test!(end_roundtrip, UfsMessage::End);

    roundtrip_test!(status_roundtrip, UfsMessage::Status {
        code: 5,
        message: "File not found".into(),
    });

    #[test]
    fn type_tags_unique() {
        let msgs = [
            UfsMessage::StatRequest { uuid: String::new() },
            UfsMessage::ReadRequest { uuid: String::new(), chunk_size: 0 },
            UfsMessage::StatReply {
                name: String::new(),
                size: 0,
                mimetype: String::new(),
                created: WireTimestamp { seconds: 0, nanos: 0 },
                created_text: String::new(),
            },
            UfsMessage::Chunk { data: vec![] },
            UfsMessage::End,
            UfsMessage::Status { code: 0, message: String::new() },
        ];
        let mut tags: Vec<u8> = msgs.iter().map(|m| m.type_tag()).collect();
        let len = tags.len();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), len, "type tags should be unique");
    }

    #[test]
    fn decode_truncated() {
        let err = UfsCodec::decode(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_zero_length() {
        let data = [0u8, 0, 0, 0, 0];
        let err = UfsCodec::decode(&data).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_oversized_header() {
        let data = [0xFFu8, 0xFF, 0xFF, 0xFF, 1];
        let err = UfsCodec::decode(&data).unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
    }

    #[test]
    fn decode_rejects_mismatched_tag() {
        let mut frame = UfsCodec::encode(&UfsMessage::End).unwrap();
        frame[4] = 4;
        let err = UfsCodec::decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessageType(4)));
    }

    #[tokio::test]
    async fn async_sequence_then_clean_eof() {
        let mut buf = Vec::new();
        write_message(&mut buf, &UfsMessage::Chunk { data: vec![1, 2, 3] }).await.unwrap();
        write_message(&mut buf, &UfsMessage::End).await.unwrap();

        let mut reader = buf.as_slice();
        assert_eq!(
            read_message(&mut reader).await.unwrap(),
            Some(UfsMessage::Chunk { data: vec![1, 2, 3] })
        );
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(UfsMessage::End));
        assert_eq!(read_message(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn async_truncated_body_is_error() {
        let frame = UfsCodec::encode(&UfsMessage::Chunk { data: vec![9; 32] }).unwrap();
        let mut reader = &frame[..frame.len() - 3];
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }
}
