//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! The chat completions endpoint streams one `chat.completion.chunk` object
//! per `data:` frame and ends the stream with `data: [DONE]`. Frames are
//! separated by a blank line; comment lines (starting with `:`) are keep-alives.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::types::ChatCompletionChunk;
use crate::{Error, Result};

const DONE: &str = "[DONE]";

/// One decoded frame.
enum Frame {
    Chunk(Result<ChatCompletionChunk>),
    Done,
    Skip,
}

struct Decoder<S> {
    stream: S,
    buffer: String,
    pending: Vec<u8>,
    finished: bool,
}

/// Process a stream of bytes into a stream of completion chunks.
///
/// The returned stream ends at `data: [DONE]` or when the connection closes.
/// Transport failures are yielded as [`Error::InferenceTransport`].
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    let stream = byte_stream.map(|result| {
        result.map_err(|e| {
            Error::inference_transport(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
        })
    });
    decode(stream)
}

pub(crate) fn decode<S>(stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let decoder = Decoder {
        stream,
        buffer: String::new(),
        pending: Vec::new(),
        finished: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        if decoder.finished {
            return None;
        }
        loop {
            // First check if we have a complete frame in the buffer
            while let Some((frame, remaining)) = extract_frame(&decoder.buffer) {
                decoder.buffer = remaining;
                match frame {
                    Frame::Chunk(chunk) => return Some((chunk, decoder)),
                    Frame::Done => return None,
                    Frame::Skip => continue,
                }
            }

            // Read more data
            match decoder.stream.next().await {
                Some(Ok(bytes)) => {
                    if let Err(err) = decoder.push_bytes(&bytes) {
                        decoder.finished = true;
                        return Some((Err(err), decoder));
                    }
                }
                Some(Err(e)) => {
                    decoder.finished = true;
                    return Some((Err(e), decoder));
                }
                None => {
                    // A final frame may be missing its trailing blank line.
                    decoder.finished = true;
                    let tail = std::mem::take(&mut decoder.buffer);
                    return match parse_frame(tail.trim()) {
                        Frame::Chunk(chunk) => Some((chunk, decoder)),
                        Frame::Done | Frame::Skip => None,
                    };
                }
            }
        }
    })
}

impl<S> Decoder<S> {
    /// Appends bytes, holding back an incomplete trailing UTF-8 sequence.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(Error::serialization(
                    format!("Invalid UTF-8 in stream: {e}"),
                    Some(Box::new(e)),
                ));
            }
        };
        let rest = self.pending.split_off(valid);
        let text = String::from_utf8(std::mem::replace(&mut self.pending, rest))
            .map_err(|e| Error::serialization("Invalid UTF-8 in stream", Some(Box::new(e))))?;
        self.buffer.push_str(&text.replace("\r\n", "\n"));
        Ok(())
    }
}

/// Extract a complete SSE frame from a buffer string.
fn extract_frame(buffer: &str) -> Option<(Frame, String)> {
    let (frame_text, rest) = buffer.split_once("\n\n")?;
    Some((parse_frame(frame_text), rest.to_string()))
}

/// Parse the lines of one frame, joining multiple `data:` lines with newlines.
fn parse_frame(frame_text: &str) -> Frame {
    let mut data: Option<String> = None;
    for line in frame_text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let Some(value) = line.strip_prefix("data:") else {
            // `event:`, `id:` and `retry:` fields carry nothing for this endpoint.
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }

    let Some(data) = data else {
        return Frame::Skip;
    };
    let data = data.trim();
    if data == DONE {
        return Frame::Done;
    }
    if data.is_empty() {
        return Frame::Skip;
    }
    Frame::Chunk(parse_chunk(data))
}

fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| {
        Error::serialization(format!("Malformed SSE frame '{data}': {e}"), Some(Box::new(e)))
    })?;
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("stream error")
            .to_string();
        let error_type = error
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_string);
        return Err(Error::api(500, error_type, message));
    }
    serde_json::from_value(value).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn bytes(data: &'static [u8]) -> Result<Bytes> {
        Ok(Bytes::from(data))
    }

    #[tokio::test]
    async fn parse_content_frame() {
        let data = b"data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n";
        let mut frames = Box::pin(decode(stream::iter(vec![bytes(data)])));

        let chunk = frames.next().await.unwrap().unwrap();
        assert_eq!(chunk.id, "c1");
        assert_eq!(chunk.content(), Some("Hi"));
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn done_ends_the_stream() {
        let data = b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: [DONE]\n\ndata: {\"choices\":[]}\n\n";
        let frames: Vec<_> = decode(stream::iter(vec![bytes(data)])).collect().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().content(), Some("a"));
    }

    #[tokio::test]
    async fn handle_split_frame() {
        let chunks = vec![
            bytes(b"data: {\"choices\":[{\"delta\":"),
            bytes(b"{\"content\":\"split\"}}]}\n"),
            bytes(b"\n"),
        ];
        let mut frames = Box::pin(decode(stream::iter(chunks)));
        let chunk = frames.next().await.unwrap().unwrap();
        assert_eq!(chunk.content(), Some("split"));
    }

    #[tokio::test]
    async fn handle_multibyte_character_split_across_reads() {
        let text = "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9}\"}}]}\n\n".as_bytes();
        let at = text.iter().position(|b| *b == 0xc3).unwrap() + 1;
        let chunks = vec![
            Ok(Bytes::copy_from_slice(&text[..at])),
            Ok(Bytes::copy_from_slice(&text[at..])),
        ];
        let mut frames = Box::pin(decode(stream::iter(chunks)));
        let chunk = frames.next().await.unwrap().unwrap();
        assert_eq!(chunk.content(), Some("caf\u{e9}"));
    }

    #[tokio::test]
    async fn skips_comments_and_crlf() {
        let data = b": keep-alive\r\n\r\ndata: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n\r\n";
        let frames: Vec<_> = decode(stream::iter(vec![bytes(data)])).collect().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().content(), Some("x"));
    }

    #[tokio::test]
    async fn final_frame_without_blank_line() {
        let data = b"data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}";
        let frames: Vec<_> = decode(stream::iter(vec![bytes(data)])).collect().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().finish_reason(), Some("stop"));
    }

    #[tokio::test]
    async fn handle_malformed_frame() {
        let data = b"data: not json\n\n";
        let mut frames = Box::pin(decode(stream::iter(vec![bytes(data)])));
        let frame = frames.next().await.unwrap();
        assert!(frame.is_err());
    }

    #[tokio::test]
    async fn error_frame_becomes_api_error() {
        let data = b"data: {\"error\":{\"message\":\"overloaded\",\"type\":\"server_error\"}}\n\n";
        let mut frames = Box::pin(decode(stream::iter(vec![bytes(data)])));
        let err = frames.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("overloaded"));
        assert_eq!(err.status_code(), Some(500));
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let chunks = vec![
            bytes(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n"),
            Err(Error::inference_transport("connection reset", None)),
            bytes(b"data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n"),
        ];
        let frames: Vec<_> = decode(stream::iter(chunks)).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        assert!(frames[1].is_err());
    }
}
