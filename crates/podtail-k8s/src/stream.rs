use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::stream::IntoAsyncRead;
use futures::{AsyncRead, AsyncReadExt, SinkExt, TryStreamExt};
use tokio::task::AbortHandle;

/// Bytes read from the API server per forwarded message
const PUMP_READ_SIZE: usize = 8192;

/// Messages buffered between the pump task and the reader
const PUMP_DEPTH: usize = 16;

type ChunkSender = mpsc::Sender<io::Result<Vec<u8>>>;

/// Owned byte stream of a followed pod log.
///
/// A pump task owns the API handle and the HTTP body and forwards what it
/// reads; this side is a plain `AsyncRead`. Read errors from the server
/// surface as errors here, and the end of the body as a zero-length read.
/// Dropping the stream aborts the pump.
pub struct LogStream {
    inner: IntoAsyncRead<mpsc::Receiver<io::Result<Vec<u8>>>>,
    pump: Option<AbortHandle>,
}

impl LogStream {
    pub(crate) fn channel() -> (ChunkSender, Self) {
        let (tx, rx) = mpsc::channel(PUMP_DEPTH);
        let stream = Self {
            inner: rx.into_async_read(),
            pump: None,
        };
        (tx, stream)
    }

    pub(crate) fn attach(&mut self, pump: AbortHandle) {
        self.pump = Some(pump);
    }
}

impl AsyncRead for LogStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// Copy `source` into the channel until it ends, fails, or the reader goes away
pub(crate) async fn pump<S: AsyncRead>(source: S, mut tx: ChunkSender) {
    let mut source = Box::pin(source);
    let mut buf = vec![0u8; PUMP_READ_SIZE];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    struct FailingSource;

    impl AsyncRead for FailingSource {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut [u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset",
            )))
        }
    }

    #[tokio::test]
    async fn test_pump_forwards_all_bytes_then_ends() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let (tx, mut stream) = LogStream::channel();
        let task = tokio::spawn(pump(Cursor::new(payload.clone()), tx));
        stream.attach(task.abort_handle());

        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, payload);
    }

    #[tokio::test]
    async fn test_pump_surfaces_read_error() {
        let (tx, mut stream) = LogStream::channel();
        tokio::spawn(pump(FailingSource, tx));

        let mut buf = [0u8; 64];
        let err = stream.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn test_pump_stops_when_reader_dropped() {
        let (tx, stream) = LogStream::channel();
        drop(stream);
        // Finishes instead of blocking on a full channel.
        pump(Cursor::new(vec![b'x'; PUMP_READ_SIZE * (PUMP_DEPTH + 4)]), tx).await;
    }
}
