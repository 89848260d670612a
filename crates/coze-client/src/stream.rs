//! Server-sent event decoding for streamed chats.
//!
//! A chat stream is a sequence of blocks separated by a blank line:
//!
//! ```text
//! event: conversation.message.delta
//! data: {"role":"assistant","type":"answer","content":"Hel"}
//!
//! event: done
//! data: [DONE]
//! ```
//!
//! [`parse_event`] turns one block into a [`ChatEvent`], [`SseDecoder`]
//! reassembles blocks from arbitrarily chunked bytes, and [`ChatEventStream`]
//! drives both from a response body.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};

use crate::error::Result;
use crate::transport::ByteStream;
use crate::types::{decode_object, ChatEvent, ChatEventKind, EventPayload};

/// Separator between two SSE blocks.
const BLOCK_SEPARATOR: &[u8] = b"\n\n";

/// Data value that marks the end of the stream.
const DONE_MARKER: &str = "[DONE]";

// ─────────────────────────────────────────────────────────────────────────────
// Event parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parse one SSE block.
///
/// Returns `None` when the block has neither an event name nor data. Data that
/// is not a JSON object never fails the parse; the event is returned without a
/// payload instead.
pub fn parse_event(block: &str) -> Option<ChatEvent> {
    let mut name = "";
    let mut data = "";

    for line in block.split('\n') {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("event:") {
            name = value.trim();
        } else if let Some(value) = line.strip_prefix("data:") {
            data = value.trim();
        }
    }

    if name.is_empty() && data.is_empty() {
        return None;
    }

    if data == DONE_MARKER || name == "done" {
        return Some(ChatEvent::done());
    }

    let json = decode_data(name, data);
    let kind = ChatEventKind::from_name(name);

    let payload = if kind.is_message() {
        json.as_ref()
            .and_then(decode_object)
            .map(EventPayload::Message)
    } else if kind.is_chat() {
        json.as_ref().and_then(decode_object).map(EventPayload::Chat)
    } else {
        json.map(EventPayload::Raw)
    };

    Some(ChatEvent::new(kind, payload))
}

fn decode_data(name: &str, data: &str) -> Option<serde_json::Value> {
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            tracing::warn!(event = name, data, "Stream event data is not a JSON object");
            None
        }
        Err(e) => {
            tracing::warn!(event = name, data, error = %e, "Failed to parse stream event data");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block reassembly
// ─────────────────────────────────────────────────────────────────────────────

/// Reassembles SSE blocks from chunks of bytes.
///
/// Bytes are buffered undecoded, so a multi-byte character split across two
/// chunks is decoded intact once its block is complete.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    // Prefix of `buffer` already known not to contain a separator.
    scanned: usize,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete block, without its separator.
    pub fn next_block(&mut self) -> Option<String> {
        // A separator may straddle the previous scan boundary.
        let start = self.scanned.saturating_sub(BLOCK_SEPARATOR.len() - 1);
        match memchr::memmem::find(&self.buffer[start..], BLOCK_SEPARATOR) {
            Some(offset) => {
                let end = start + offset;
                let block = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
                self.buffer.drain(..end + BLOCK_SEPARATOR.len());
                self.scanned = 0;
                Some(block)
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Take the next block that parses to an event.
    pub fn next_event(&mut self) -> Option<ChatEvent> {
        while let Some(block) = self.next_block() {
            if let Some(event) = parse_event(&block) {
                return Some(event);
            }
        }
        None
    }

    /// Take whatever remains once the input has ended.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Number of buffered bytes.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event stream
// ─────────────────────────────────────────────────────────────────────────────

type EventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent>> + Send>>;

/// A lazily decoded stream of chat events.
///
/// Ends after a `done` event, at the end of the response body, or after the
/// first transport error. The response body is released as soon as the stream
/// ends, when [`close`](Self::close) is called, or when the stream is dropped.
pub struct ChatEventStream {
    inner: Option<EventStream>,
}

impl ChatEventStream {
    /// Decode events from a byte source.
    pub fn new(source: ByteStream) -> Self {
        Self {
            inner: Some(decode_events(source)),
        }
    }

    /// Stop reading and release the underlying response body.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            tracing::debug!("Chat event stream closed");
        }
    }

    /// Whether the stream has ended or been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Stream for ChatEventStream {
    type Item = Result<ChatEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };
        let next = inner.as_mut().poll_next(cx);
        if let Poll::Ready(None) = next {
            self.inner = None;
        }
        next
    }
}

impl std::fmt::Debug for ChatEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEventStream")
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct DecodeState {
    source: Option<ByteStream>,
    decoder: SseDecoder,
    done: bool,
}

impl DecodeState {
    /// Stop producing events and drop the byte source.
    fn finish(&mut self) {
        self.done = true;
        self.source = None;
    }
}

fn decode_events(source: ByteStream) -> EventStream {
    Box::pin(futures::stream::unfold(
        DecodeState {
            source: Some(source),
            decoder: SseDecoder::new(),
            done: false,
        },
        |mut state| async move {
            if state.done {
                return None;
            }

            loop {
                // Drain complete blocks before reading more.
                if let Some(event) = state.decoder.next_event() {
                    if event.is_done() {
                        state.finish();
                    }
                    return Some((Ok(event), state));
                }

                let next = match state.source.as_mut() {
                    Some(source) => source.next().await,
                    None => return None,
                };
                match next {
                    Some(Ok(bytes)) => state.decoder.push(&bytes),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Chat event stream failed");
                        state.finish();
                        return Some((Err(e), state));
                    }
                    None => {
                        let rest = state.decoder.finish();
                        state.finish();
                        let event = rest.as_deref().and_then(parse_event)?;
                        return Some((Ok(event), state));
                    }
                }
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::ChatStatus;
    use bytes::Bytes;
    use std::sync::Arc;

    const CONVERSATION: &str = concat!(
        "event: conversation.chat.created\n",
        "data: {\"id\":\"c1\",\"conversation_id\":\"v1\",\"bot_id\":\"b1\",\"status\":\"created\"}\n\n",
        "event: conversation.message.delta\n",
        "data: {\"role\":\"assistant\",\"type\":\"answer\",\"content\":\"你好\",\"content_type\":\"text\"}\n\n",
        "event: conversation.message.delta\n",
        "data: {\"role\":\"assistant\",\"type\":\"answer\",\"content\":\"，世界\",\"content_type\":\"text\"}\n\n",
        "event: conversation.chat.completed\n",
        "data: {\"id\":\"c1\",\"conversation_id\":\"v1\",\"bot_id\":\"b1\",\"status\":\"completed\",",
        "\"usage\":{\"token_count\":12,\"input_count\":5,\"output_count\":7}}\n\n",
        "event: done\n",
        "data: [DONE]\n\n",
    );

    fn chunked(body: &str, size: usize) -> ByteStream {
        let chunks: Vec<Result<Bytes>> = body
            .as_bytes()
            .chunks(size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Box::pin(futures::stream::iter(chunks))
    }

    async fn collect(source: ByteStream) -> Vec<ChatEvent> {
        ChatEventStream::new(source)
            .map(|event| event.unwrap())
            .collect()
            .await
    }

    #[test]
    fn test_parse_chat_completed_block() {
        let event = parse_event(
            "event: conversation.chat.completed\ndata: {\"id\":\"c1\",\"conversation_id\":\"v1\",\"bot_id\":\"b1\",\"status\":\"completed\"}",
        )
        .unwrap();

        assert_eq!(event.kind, ChatEventKind::ChatCompleted);
        let chat = event.chat().unwrap();
        assert_eq!(chat.id, "c1");
        assert_eq!(chat.conversation_id, "v1");
        assert_eq!(chat.bot_id, "b1");
        assert_eq!(chat.status, ChatStatus::Completed);
    }

    #[test]
    fn test_parse_done_marker_wins() {
        assert_eq!(parse_event("data: [DONE]"), Some(ChatEvent::done()));
        assert_eq!(
            parse_event("event: conversation.message.delta\ndata: [DONE]"),
            Some(ChatEvent::done())
        );
        assert_eq!(
            parse_event("event: done\ndata: {\"id\":\"x\"}"),
            Some(ChatEvent::done())
        );
        // Case-sensitive marker.
        let event = parse_event("data: [done]").unwrap();
        assert!(!event.is_done());
    }

    #[test]
    fn test_parse_empty_block_yields_nothing() {
        assert_eq!(parse_event(""), None);
        assert_eq!(parse_event("\n\n"), None);
        assert_eq!(parse_event(": keep-alive"), None);
        assert_eq!(parse_event("event:\ndata:"), None);
    }

    #[test]
    fn test_parse_malformed_json_keeps_kind() {
        let event = parse_event("event: conversation.message.delta\ndata: {not json").unwrap();
        assert_eq!(event.kind, ChatEventKind::MessageDelta);
        assert_eq!(event.payload, None);

        let event = parse_event("event: conversation.chat.failed\ndata: [1,2,3]").unwrap();
        assert_eq!(event.kind, ChatEventKind::ChatFailed);
        assert_eq!(event.payload, None);

        let event = parse_event("event: error\ndata: oops").unwrap();
        assert!(event.is_error());
        assert_eq!(event.payload, None);
    }

    #[test]
    fn test_parse_keeps_payload_with_loose_fields() {
        let event = parse_event(
            "event: conversation.message.delta\ndata: {\"role\":\"assistant\",\"type\":\"answer\",\"content\":null,\"reasoning_content\":\"hmm\"}",
        )
        .unwrap();
        let message = event.message().unwrap();
        assert_eq!(message.content, "");
        assert_eq!(message.reasoning_content.as_deref(), Some("hmm"));

        let event = parse_event(
            "event: conversation.chat.completed\ndata: {\"id\":\"c1\",\"status\":\"completed\",\"created_at\":\"1700000000\",\"meta_data\":[]}",
        )
        .unwrap();
        let chat = event.chat().unwrap();
        assert!(chat.is_completed());
        assert_eq!(chat.created_at, Some(1_700_000_000));
    }

    #[test]
    fn test_parse_last_line_wins() {
        let event = parse_event(
            "event: conversation.chat.created\nevent: conversation.chat.in_progress\ndata: {\"id\":\"a\"}\ndata: {\"id\":\"b\"}",
        )
        .unwrap();
        assert_eq!(event.kind, ChatEventKind::ChatInProgress);
        assert_eq!(event.chat().unwrap().id, "b");
    }

    #[test]
    fn test_parse_error_and_unknown_carry_raw_json() {
        let event = parse_event("event: error\ndata: {\"code\":4000,\"msg\":\"bad request\"}").unwrap();
        assert!(event.is_error());
        assert_eq!(event.raw().unwrap()["code"], 4000);

        let event = parse_event("event: conversation.audio.delta\ndata: {\"content\":\"AAAA\"}").unwrap();
        assert_eq!(event.kind, ChatEventKind::AudioDelta);
        assert_eq!(event.raw().unwrap()["content"], "AAAA");

        let event = parse_event("event: ping\ndata: {}").unwrap();
        assert_eq!(event.kind, ChatEventKind::Unknown("ping".to_string()));
        assert!(event.raw().is_some());

        let event = parse_event("data: {\"hello\":1}").unwrap();
        assert_eq!(event.kind, ChatEventKind::Unknown("unknown".to_string()));
        assert_eq!(event.raw().unwrap()["hello"], 1);
    }

    #[test]
    fn test_parse_tolerates_crlf_and_spacing() {
        let event = parse_event("event:conversation.message.delta\r\ndata:   {\"content\":\"hi\"}  \r").unwrap();
        assert_eq!(event.message().unwrap().content, "hi");
    }

    #[test]
    fn test_decoder_splits_blocks() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"event: a\ndata: 1\n");
        assert_eq!(decoder.next_block(), None);
        decoder.push(b"\nevent: b\n");
        assert_eq!(decoder.next_block().as_deref(), Some("event: a\ndata: 1"));
        assert_eq!(decoder.next_block(), None);
        assert_eq!(decoder.finish().as_deref(), Some("event: b\n"));
        assert_eq!(decoder.finish(), None);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_separator_across_pushes() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: x\n");
        assert_eq!(decoder.next_block(), None);
        decoder.push(b"\n");
        assert_eq!(decoder.next_block().as_deref(), Some("data: x"));
    }

    #[tokio::test]
    async fn test_stream_yields_events_in_order() {
        let events = collect(chunked(CONVERSATION, CONVERSATION.len())).await;

        let kinds: Vec<_> = events.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ChatEventKind::ChatCreated,
                ChatEventKind::MessageDelta,
                ChatEventKind::MessageDelta,
                ChatEventKind::ChatCompleted,
                ChatEventKind::Done,
            ]
        );

        let text: String = events
            .iter()
            .filter(|e| e.is_message_delta())
            .filter_map(|e| e.message())
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(text, "你好，世界");
        assert_eq!(events[3].chat().unwrap().usage.unwrap().token_count, 12);
    }

    #[tokio::test]
    async fn test_stream_is_chunk_boundary_invariant() {
        let whole = collect(chunked(CONVERSATION, CONVERSATION.len())).await;
        for size in [1, 2, 3, 7, 64] {
            let split = collect(chunked(CONVERSATION, size)).await;
            assert_eq!(split, whole, "chunk size {}", size);
        }
    }

    #[tokio::test]
    async fn test_stream_stops_at_done() {
        let body = "data: [DONE]\n\nevent: conversation.chat.created\ndata: {\"id\":\"late\"}\n\n";
        let events = collect(chunked(body, body.len())).await;
        assert_eq!(events, vec![ChatEvent::done()]);
    }

    #[tokio::test]
    async fn test_stream_flushes_trailing_block() {
        let body = "event: conversation.chat.created\ndata: {\"id\":\"c1\"}\n\nevent: conversation.chat.completed\ndata: {\"id\":\"c1\",\"status\":\"completed\"}";
        let events = collect(chunked(body, 5)).await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_chat_completed());
    }

    #[tokio::test]
    async fn test_stream_skips_empty_blocks() {
        let body = "\n\n: ping\n\nevent: conversation.chat.in_progress\ndata: {}\n\n\n\n";
        let events = collect(chunked(body, body.len())).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChatEventKind::ChatInProgress);
    }

    #[tokio::test]
    async fn test_stream_surfaces_transport_error_once() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"event: conversation.chat.created\ndata: {}\n\n")),
            Err(Error::Stream("connection reset".to_string())),
            Ok(Bytes::from_static(b"event: conversation.chat.completed\ndata: {}\n\n")),
        ];
        let mut stream = ChatEventStream::new(Box::pin(futures::stream::iter(chunks)));

        assert!(stream.next().await.unwrap().is_ok());
        assert!(matches!(stream.next().await, Some(Err(Error::Stream(_)))));
        assert!(stream.next().await.is_none());
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn test_done_releases_source_without_draining() {
        let marker = Arc::new(());
        let held = Arc::clone(&marker);
        let source = futures::stream::iter(vec![Ok::<_, Error>(Bytes::from_static(b"data: [DONE]\n\n"))])
            .chain(futures::stream::pending())
            .map(move |chunk| {
                let _keep = &held;
                chunk
            });
        let mut stream = ChatEventStream::new(Box::pin(source));

        assert!(stream.next().await.unwrap().unwrap().is_done());
        assert_eq!(Arc::strong_count(&marker), 1);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_close_releases_source() {
        let marker = Arc::new(());
        let held = Arc::clone(&marker);
        let source = futures::stream::iter(vec![Ok::<_, Error>(Bytes::from_static(
            b"event: conversation.chat.created\ndata: {}\n\n",
        ))])
        .chain(futures::stream::pending())
        .map(move |chunk| {
            let _keep = &held;
            chunk
        });
        let mut stream = ChatEventStream::new(Box::pin(source));

        assert!(stream.next().await.unwrap().is_ok());
        assert_eq!(Arc::strong_count(&marker), 2);

        stream.close();
        assert!(stream.is_closed());
        assert_eq!(Arc::strong_count(&marker), 1);
        assert!(stream.next().await.is_none());
    }
}
