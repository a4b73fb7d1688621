//! Incremental decoder for `text/event-stream` chat replies.

use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use log::{debug, error};
use std::pin::Pin;

use crate::{endpoints::chat::StreamChunk, error::FreeGptError, raw_reply::ChunkStream};

pub const DATA_PREFIX: &str = "data:";
pub const DONE_MARKER: &str = "[DONE]";

/// Meaning of one line of an event stream.
#[derive(Debug, PartialEq)]
pub enum EventLine {
    Chunk(StreamChunk),
    Done,
    Skip,
}

/// Decodes a single event-stream line.
///
/// Only `data:` lines carry payloads; comments, `event:`/`id:` fields and
/// blank separators are skipped, as are payloads that are not valid JSON.
pub fn decode_line(line: &str) -> EventLine {
    let line = line.trim_end_matches('\r');
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return EventLine::Skip;
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return EventLine::Skip;
    }
    if payload == DONE_MARKER {
        return EventLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => EventLine::Chunk(chunk),
        Err(e) => {
            error!("Skipping undecodable event payload: {e}");
            debug!("Undecodable payload: {payload}");
            EventLine::Skip
        }
    }
}

struct Decoder<S> {
    inner: Pin<Box<S>>,
    buffer: Vec<u8>,
    exhausted: bool,
    done: bool,
}

impl<S> Decoder<S> {
    /// Pops the next complete line. Once the body is exhausted the trailing,
    /// unterminated remainder counts as a line too.
    fn next_line(&mut self) -> Option<String> {
        if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            return Some(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        if self.exhausted && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            return Some(String::from_utf8_lossy(&line).into_owned());
        }
        None
    }
}

/// Turns a raw byte stream into a one-shot stream of reply fragments.
///
/// Transport errors are yielded once and end the stream.
pub fn decode_event_stream<S, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<FreeGptError> + Send + 'static,
{
    let decoder = Decoder {
        inner: Box::pin(bytes),
        buffer: Vec::new(),
        exhausted: false,
        done: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        if decoder.done {
            return None;
        }
        loop {
            while let Some(line) = decoder.next_line() {
                match decode_line(&line) {
                    EventLine::Chunk(chunk) => return Some((Ok(chunk), decoder)),
                    EventLine::Done => return None,
                    EventLine::Skip => {}
                }
            }
            if decoder.exhausted {
                return None;
            }
            match decoder.inner.next().await {
                Some(Ok(bytes)) => decoder.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    decoder.done = true;
                    return Some((Err(e.into()), decoder));
                }
                None => decoder.exhausted = true,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_stream(
        parts: &[&str],
    ) -> impl Stream<Item = Result<Bytes, FreeGptError>> + Send + use<> {
        let parts: Vec<Result<Bytes, FreeGptError>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        stream::iter(parts)
    }

    async fn contents(parts: &[&str]) -> Vec<String> {
        decode_event_stream(byte_stream(parts))
            .map(|item| item.unwrap().content().unwrap_or_default())
            .collect()
            .await
    }

    #[test]
    fn test_decode_line_variants() {
        assert_eq!(decode_line("data: [DONE]"), EventLine::Done);
        assert_eq!(decode_line(": keep-alive"), EventLine::Skip);
        assert_eq!(decode_line("event: message"), EventLine::Skip);
        assert_eq!(decode_line("data: {not json"), EventLine::Skip);
        assert_eq!(
            decode_line("data: {\"content\":\"A\"}\r"),
            EventLine::Chunk(serde_json::from_str("{\"content\":\"A\"}").unwrap())
        );
    }

    #[tokio::test]
    async fn test_decodes_delta_chunks_in_order() {
        let body = [
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"foo\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"bar\"}}]}\n\n",
            "data: [DONE]\n\n",
        ];
        assert_eq!(contents(&body).await, vec!["", "foo", "bar"]);
    }

    #[tokio::test]
    async fn test_line_split_across_network_chunks() {
        let body = ["data: {\"content\":\"Привет", ", мир\"}\n", "data: {\"content\":\"!\"}"];
        assert_eq!(contents(&body).await, vec!["Привет, мир", "!"]);
    }

    #[tokio::test]
    async fn test_stops_at_done_marker() {
        let body = ["data: {\"content\":\"A\"}\ndata: [DONE]\ndata: {\"content\":\"B\"}\n"];
        assert_eq!(contents(&body).await, vec!["A"]);
    }

    #[tokio::test]
    async fn test_skips_malformed_payloads() {
        let body = ["data: {\"content\":\"A\"}\ndata: {oops}\ndata: {\"content\":\"B\"}\n"];
        assert_eq!(contents(&body).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let parts: Vec<Result<Bytes, FreeGptError>> = vec![
            Ok(Bytes::from("data: {\"content\":\"A\"}\n")),
            Err(FreeGptError::EmptyImage),
            Ok(Bytes::from("data: {\"content\":\"B\"}\n")),
        ];
        let items: Vec<_> = decode_event_stream(stream::iter(parts)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
