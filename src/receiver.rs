//! Async stream receiver.
//!
//! A reader task pulls fixed-size chunks from any `AsyncRead` (a capture
//! file, stdin, a pipe from `rtl_sdr`) and hands them over a bounded
//! channel to the loop driving the [`Session`]. The loop stops at end of
//! stream or when the stop future completes.

use std::future::Future;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::session::{Session, SessionStats};

/// Bytes requested per read, as in the USB bulk transfer loop.
pub const CHUNK_SIZE: usize = 16384;

/// Chunks buffered between reader and decoder.
pub const CHANNEL_DEPTH: usize = 8;

/// Feed `reader` into `session` until end of stream or `stop`.
///
/// At end of stream the pending page is flushed. Returns the session
/// counters at exit.
pub async fn run<R, S>(reader: R, session: &mut Session, stop: S) -> Result<SessionStats>
where
    R: AsyncRead + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::channel::<Bytes>(CHANNEL_DEPTH);
    let task = tokio::spawn(read_chunks(reader, tx));
    tokio::pin!(stop);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => {
                info!("Stop requested, receiver exiting");
                task.abort();
                let flushed = session.finish();
                if flushed > 0 {
                    debug!("Flushed {} page(s) on stop", flushed);
                }
                return Ok(session.stats());
            }
            chunk = rx.recv() => match chunk {
                Some(chunk) => {
                    session.process(&chunk, chunk.len() as i32)?;
                }
                None => break,
            }
        }
    }

    match task.await {
        Ok(Ok(total)) => debug!("Reader finished after {} bytes", total),
        Ok(Err(e)) => return Err(e.into()),
        Err(e) => return Err(Error::internal(format!("reader task failed: {e}"))),
    }

    let flushed = session.finish();
    if flushed > 0 {
        debug!("Flushed {} page(s) at end of stream", flushed);
    }
    Ok(session.stats())
}

async fn read_chunks<R>(mut reader: R, tx: mpsc::Sender<Bytes>) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut total = 0u64;
    loop {
        let mut buf = BytesMut::zeroed(CHUNK_SIZE);
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Read error: {}", e);
                return Err(e);
            }
        };
        total += n as u64;
        buf.truncate(n);
        if tx.send(buf.freeze()).await.is_err() {
            debug!("Decoder side closed");
            break;
        }
    }
    Ok(total)
}
