//! Bridge between async request bodies and the blocking store.
//!
//! The store reads payloads through [`std::io::Read`] on the blocking pool,
//! while request bodies arrive as async streams. Chunks travel through a
//! bounded channel and end with an explicit [`BodyChunk::End`]. If the
//! request is dropped before `End` is sent, the reader reports an error and
//! the upload is rolled back instead of being committed truncated.

use std::fmt::Display;
use std::io::{self, Read};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use yodo_store::{Metadata, OnceStore};
use yodo_types::BlobId;

use crate::error::{ServerError, ServerResult};

/// Chunks buffered between the request and the blocking writer.
const CHANNEL_DEPTH: usize = 16;

#[derive(Debug)]
enum BodyChunk {
    Data(Bytes),
    Failed(String),
    End,
}

/// Blocking [`Read`] over chunks pushed from an async task.
struct ChannelReader {
    rx: mpsc::Receiver<BodyChunk>,
    current: Bytes,
    finished: bool,
}

impl ChannelReader {
    fn new(rx: mpsc::Receiver<BodyChunk>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
            finished: false,
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if !self.current.is_empty() {
                let n = buf.len().min(self.current.len());
                let chunk = self.current.split_to(n);
                buf[..n].copy_from_slice(&chunk);
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            match self.rx.blocking_recv() {
                Some(BodyChunk::Data(data)) => self.current = data,
                Some(BodyChunk::End) => self.finished = true,
                Some(BodyChunk::Failed(reason)) => return Err(io::Error::other(reason)),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "upload aborted before end of body",
                    ))
                }
            }
        }
    }
}

/// Stream `body` into a new blob.
pub(crate) async fn allocate_from_stream<S, E>(
    store: Arc<dyn OnceStore>,
    body: S,
    metadata: Metadata,
    max_size: u64,
) -> ServerResult<BlobId>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    let writer = tokio::task::spawn_blocking(move || {
        let mut reader = ChannelReader::new(rx);
        store.allocate(&mut reader, metadata, max_size)
    });

    let mut body = std::pin::pin!(body);
    let mut complete = true;
    while let Some(item) = body.next().await {
        let chunk = match item {
            Ok(data) => BodyChunk::Data(data),
            Err(e) => {
                complete = false;
                BodyChunk::Failed(e.to_string())
            }
        };
        // A closed channel means the writer already gave up (size limit or
        // storage failure); its result says why.
        if tx.send(chunk).await.is_err() || !complete {
            complete = false;
            break;
        }
    }
    if complete {
        let _ = tx.send(BodyChunk::End).await;
    }
    drop(tx);

    let id = writer
        .await
        .map_err(|e| ServerError::Internal(format!("upload task failed: {e}")))??;
    Ok(id)
}
