//! Bounded pipe between a file reader and an HTTP request body.
//!
//! The reader runs on its own task and pushes fixed-size chunks into a
//! bounded channel; the request body drains the other end as a stream. When
//! the channel is full the reader waits, so at most
//! `capacity × chunk_size` bytes of the file are ever held in memory.

use crate::transport::UploadStream;
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Consumer and producer halves of a running pipe.
pub struct Pipe {
    /// Chunks in file order. A read failure is delivered as a final `Err`.
    pub stream: UploadStream,
    /// Resolves to the number of bytes handed to the consumer.
    ///
    /// If the consumer stops early the producer stops too and reports what
    /// it sent so far; only a read failure is an error.
    pub producer: JoinHandle<io::Result<u64>>,
}

/// Spawn a task that copies `reader` into a bounded chunk stream.
pub fn spawn_reader<R>(mut reader: R, chunk_size: usize, capacity: usize) -> Pipe
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let chunk_size = chunk_size.max(1);

    let producer = tokio::spawn(async move {
        let mut sent = 0u64;
        loop {
            let mut buf = BytesMut::with_capacity(chunk_size);
            let n = match reader.read_buf(&mut buf).await {
                Ok(0) => return Ok(sent),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // The consumer gets a copy so the request body fails
                    // instead of ending early and looking complete.
                    let _ = tx.send(Err(io::Error::new(e.kind(), e.to_string()))).await;
                    return Err(e);
                }
            };
            if tx.send(Ok(buf.freeze())).await.is_err() {
                debug!("Upload body dropped after {} bytes", sent);
                return Ok(sent);
            }
            sent += n as u64;
        }
    });

    Pipe {
        stream: Box::pin(ReceiverStream::new(rx)),
        producer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::ReadBuf;

    #[tokio::test]
    async fn streams_all_bytes_in_order() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let pipe = spawn_reader(Cursor::new(data.clone()), 1024, 2);

        let chunks: Vec<_> = pipe.stream.collect().await;
        let mut received = Vec::new();
        for chunk in chunks {
            let chunk = chunk.unwrap();
            assert!(chunk.len() <= 1024);
            received.extend_from_slice(&chunk);
        }

        assert_eq!(received, data);
        assert_eq!(pipe.producer.await.unwrap().unwrap(), 10_000);
    }

    #[tokio::test]
    async fn producer_waits_for_slow_consumer() {
        let pipe = spawn_reader(Cursor::new(vec![7u8; 64]), 4, 2);
        let Pipe {
            mut stream,
            producer,
        } = pipe;

        // 16 chunks, room for 2: the producer cannot finish on its own.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());

        let mut total = 0;
        while let Some(chunk) = stream.next().await {
            total += chunk.unwrap().len();
        }
        assert_eq!(total, 64);
        assert_eq!(producer.await.unwrap().unwrap(), 64);
    }

    #[tokio::test]
    async fn dropped_consumer_stops_producer() {
        let pipe = spawn_reader(Cursor::new(vec![1u8; 4096]), 16, 1);
        let Pipe {
            mut stream,
            producer,
        } = pipe;

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 16);
        drop(stream);

        let sent = tokio_test::assert_ok!(producer.await.unwrap());
        assert!(sent < 4096, "producer kept going: {sent}");
    }

    struct FailingReader {
        served: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.served {
                Poll::Ready(Err(io::Error::other("disk unplugged")))
            } else {
                self.served = true;
                buf.put_slice(b"%PDF");
                Poll::Ready(Ok(()))
            }
        }
    }

    #[tokio::test]
    async fn read_error_reaches_both_ends() {
        let pipe = spawn_reader(FailingReader { served: false }, 8, 4);
        let items: Vec<_> = pipe.stream.collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(&items[0].as_ref().unwrap()[..], b"%PDF");
        assert!(items[1].is_err());

        let err = pipe.producer.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("disk unplugged"));
    }
}
