//! Splits an object stream into part-sized chunks

use crate::config::validate_part_size;
use crate::Result;
use bytes::Bytes;
use futures::Stream;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Forward-only reader that yields one chunk per multipart part.
///
/// Each chunk is exactly `part_size` bytes except the last, which holds
/// whatever remained. A source that ends on a part boundary yields no extra
/// empty chunk. The source is consumed once and cannot be rewound.
pub struct PartReader<R> {
    source: R,
    part_size: usize,
    bytes_read: u64,
    exhausted: bool,
}

impl<R: AsyncRead + Unpin> PartReader<R> {
    pub fn new(source: R, part_size: usize) -> Result<Self> {
        validate_part_size(part_size)?;
        Ok(Self {
            source,
            part_size,
            bytes_read: 0,
            exhausted: false,
        })
    }

    /// Read the next chunk, or `None` once the source is exhausted.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.part_size];
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]).await {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        self.bytes_read += filled as u64;
        Ok(Some(Bytes::from(fit(buf, filled))))
    }

    /// Total bytes handed out so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn part_size(&self) -> usize {
        self.part_size
    }

    /// The remaining chunks as a stream
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> {
        futures::stream::try_unfold(self, |mut reader| async move {
            let next = reader.next_chunk().await?;
            Ok::<_, io::Error>(next.map(|chunk| (chunk, reader)))
        })
    }
}

/// Cut `buf` to its `filled` prefix, releasing the unused tail
fn fit(mut buf: Vec<u8>, filled: usize) -> Vec<u8> {
    buf.truncate(filled);
    if buf.capacity() > filled {
        buf.shrink_to_fit();
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    async fn chunk_sizes(data: &[u8], part_size: usize) -> Vec<usize> {
        let mut reader = PartReader::new(data, part_size).unwrap();
        let mut sizes = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            sizes.push(chunk.len());
        }
        sizes
    }

    #[tokio::test]
    async fn test_short_final_chunk() {
        let data = vec![7u8; 12];
        assert_eq!(chunk_sizes(&data, 5).await, vec![5, 5, 2]);
    }

    #[test]
    fn test_short_chunk_releases_unused_capacity() {
        let buf = fit(vec![0u8; 64 * 1024], 10);
        assert_eq!(buf.len(), 10);
        assert!(buf.capacity() < 64 * 1024);

        let full = fit(vec![1u8; 16], 16);
        assert_eq!(full.len(), 16);
    }

    #[tokio::test]
    async fn test_exact_boundary_has_no_trailing_chunk() {
        let data = vec![7u8; 10];
        assert_eq!(chunk_sizes(&data, 5).await, vec![5, 5]);
    }

    #[tokio::test]
    async fn test_empty_source_yields_nothing() {
        assert!(chunk_sizes(&[], 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_part_size_rejected() {
        assert!(PartReader::new(&b"abc"[..], 0).is_err());
    }

    /// Hands out at most `step` bytes per read
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl AsyncRead for Trickle {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let end = (self.pos + self.step).min(self.data.len()).min(self.pos + buf.remaining());
            let slice = self.data[self.pos..end].to_vec();
            buf.put_slice(&slice);
            self.pos = end;
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_short_reads_are_coalesced() {
        let data: Vec<u8> = (0..23u8).collect();
        let source = Trickle { data: data.clone(), pos: 0, step: 3 };
        let chunks: Vec<Bytes> = PartReader::new(source, 10)
            .unwrap()
            .into_stream()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![10, 10, 3]);
        assert_eq!(chunks.concat(), data);
    }

    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "source gone")))
        }
    }

    #[tokio::test]
    async fn test_read_error_propagates() {
        let mut reader = PartReader::new(Broken, 4).unwrap();
        let err = reader.next_chunk().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
