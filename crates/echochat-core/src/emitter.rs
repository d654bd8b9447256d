//! Character-by-character echo emitter.
//!
//! The emitter turns an input text into a lazy, finite stream of chunks: one
//! chunk per `char`, each holding that character's UTF-8 bytes and produced
//! after a fixed delay. Nothing runs until the stream is polled, and the
//! stream stops as soon as its cancellation token fires or it is dropped.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio_util::sync::CancellationToken;

/// Produces delayed per-character chunk streams.
#[derive(Debug, Clone, Copy)]
pub struct EchoEmitter {
    delay: Duration,
}

impl Default for EchoEmitter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl EchoEmitter {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Build the chunk stream for `text`.
    ///
    /// Each character is preceded by one delay. An empty text yields a stream
    /// that ends on its first poll.
    pub fn emit(&self, text: impl Into<String>, cancel: CancellationToken) -> EchoStream {
        let text = text.into();
        let delay = self.delay;
        let total = text.chars().count();

        let inner = async_stream::stream! {
            let mut buf = [0u8; 4];
            for (index, ch) in text.chars().enumerate() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(emitted = index, total, "Echo stream cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                yield Bytes::copy_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            tracing::trace!(total, "Echo stream complete");
        };

        EchoStream {
            inner: Box::pin(inner),
            remaining: total,
        }
    }
}

/// Lazy, non-restartable stream of echo chunks.
pub struct EchoStream {
    inner: Pin<Box<dyn Stream<Item = Bytes> + Send>>,
    remaining: usize,
}

impl EchoStream {
    /// Number of chunks not yet produced.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Stream for EchoStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        let polled = self.inner.as_mut().poll_next(cx);
        match &polled {
            Poll::Ready(Some(_)) => self.remaining = self.remaining.saturating_sub(1),
            Poll::Ready(None) => self.remaining = 0,
            Poll::Pending => {}
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn emits_one_chunk_per_character_in_order() {
        let emitter = EchoEmitter::default();
        let start = Instant::now();

        let chunks: Vec<Bytes> = emitter.emit("hi", CancellationToken::new()).collect().await;

        assert_eq!(chunks, vec![Bytes::from_static(b"h"), Bytes::from_static(b"i")]);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_closes_immediately() {
        let emitter = EchoEmitter::default();
        let start = Instant::now();

        let mut stream = emitter.emit("", CancellationToken::new());
        assert_eq!(stream.remaining(), 0);
        assert!(stream.next().await.is_none());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn multibyte_characters_stay_whole() {
        let emitter = EchoEmitter::new(Duration::from_millis(1));
        let chunks: Vec<Bytes> = emitter.emit("é🦀", CancellationToken::new()).collect().await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0][..], "é".as_bytes());
        assert_eq!(&chunks[1][..], "🦀".as_bytes());
    }

    #[tokio::test(start_paused = true)]
    async fn each_chunk_waits_one_delay() {
        let emitter = EchoEmitter::new(Duration::from_millis(100));
        let mut stream = emitter.emit("abc", CancellationToken::new());
        let start = Instant::now();

        stream.next().await;
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        stream.next().await;
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert_eq!(stream.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_stream() {
        let emitter = EchoEmitter::default();
        let cancel = CancellationToken::new();
        let mut stream = emitter.emit("hello", cancel.clone());

        assert_eq!(stream.next().await, Some(Bytes::from_static(b"h")));
        cancel.cancel();
        assert!(stream.next().await.is_none());
    }
}
