use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::Frame;

/// Generate a random seed for the mask key stream.
/// Falls back to system time if getrandom fails.
fn random_mask_seed() -> u32 {
    let mut buf = [0u8; 4];
    if getrandom::getrandom(&mut buf).is_ok() {
        u32::from_le_bytes(buf)
    } else {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u32)
            .unwrap_or(0x12345678)
    }
}

/// Frame-level codec over an async byte stream.
///
/// Reads buffer incoming bytes until a whole frame is available, so the
/// stream may deliver a frame in arbitrarily small chunks. Outgoing frames
/// are always masked with a fresh key, written whole, and flushed.
///
/// `read_frame` is cancellation-safe at frame granularity: bytes read so far
/// stay in the internal buffer and the next call resumes from them.
pub struct FrameCodec<T> {
    io: T,
    read_buf: BytesMut,
    write_buf: BytesMut,
    mask_state: u32,
}

impl<T> FrameCodec<T> {
    /// Create a codec over `io`.
    #[must_use]
    pub fn new(io: T, config: &ClientConfig) -> Self {
        Self::with_leftover(io, config, BytesMut::new())
    }

    /// Create a codec whose read buffer is seeded with `leftover` bytes,
    /// typically frame data received past the handshake terminator.
    #[must_use]
    pub fn with_leftover(io: T, config: &ClientConfig, leftover: BytesMut) -> Self {
        let mut read_buf = leftover;
        read_buf.reserve(config.read_buffer_size);
        Self {
            io,
            read_buf,
            write_buf: BytesMut::with_capacity(config.write_buffer_size),
            mask_state: random_mask_seed().max(1),
        }
    }

    /// Next 32-bit masking key (xorshift stream over a random seed).
    fn next_mask(&mut self) -> [u8; 4] {
        let mut x = self.mask_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.mask_state = x;
        x.to_le_bytes()
    }

    /// Consume the codec, returning the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> FrameCodec<T> {
    /// Read the next frame, waiting for more bytes as needed.
    ///
    /// # Errors
    ///
    /// - `Error::ConnectionClosed` on EOF
    /// - `Error::Io` on transport failure
    /// - frame parse errors (unsupported length, bad opcode)
    pub async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if !self.read_buf.is_empty() {
                match Frame::parse(&self.read_buf) {
                    Ok((frame, consumed)) => {
                        self.read_buf.advance(consumed);
                        return Ok(frame);
                    }
                    Err(Error::IncompleteFrame { .. }) => {}
                    Err(e) => return Err(e),
                }
            }

            self.read_buf.reserve(4096);
            let n = self.io.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed(None));
            }
        }
    }

    /// Mask, write, and flush a frame.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let mask = self.next_mask();
        self.write_buf.clear();
        self.write_buf.resize(frame.wire_size(true), 0);

        let written = frame.write(&mut self.write_buf, Some(mask))?;
        self.io.write_all(&self.write_buf[..written]).await?;
        self.io.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OpCode;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// In-memory stream delivering at most `max_chunk` bytes per read,
    /// to exercise partial-frame delivery.
    struct MockStream {
        read_data: Vec<u8>,
        pos: usize,
        max_chunk: usize,
        write_data: Vec<u8>,
    }

    impl MockStream {
        fn new(data: Vec<u8>) -> Self {
            Self::chunked(data, usize::MAX)
        }

        fn chunked(data: Vec<u8>, max_chunk: usize) -> Self {
            Self {
                read_data: data,
                pos: 0,
                max_chunk,
                write_data: Vec::new(),
            }
        }

        fn written(&self) -> &[u8] {
            &self.write_data
        }
    }

    impl AsyncRead for MockStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.pos >= self.read_data.len() {
                return Poll::Ready(Ok(()));
            }
            let max = self.max_chunk.min(buf.remaining());
            let end = (self.pos + max).min(self.read_data.len());
            let start = self.pos;
            self.pos = end;
            let chunk = self.read_data[start..end].to_vec();
            buf.put_slice(&chunk);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_read_frame() {
        let data = vec![0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f];
        let mut codec = FrameCodec::new(MockStream::new(data), &ClientConfig::default());

        let frame = codec.read_frame().await.unwrap();
        assert_eq!(frame.opcode, OpCode::Text);
        assert_eq!(frame.payload(), b"Hello");
    }

    #[tokio::test]
    async fn test_read_frame_across_partial_reads() {
        // One byte per poll: header and payload arrive in seven chunks.
        let data = vec![0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f];
        let mut codec = FrameCodec::new(MockStream::chunked(data, 1), &ClientConfig::default());

        let frame = codec.read_frame().await.unwrap();
        assert_eq!(frame.payload(), b"Hello");
    }

    #[tokio::test]
    async fn test_read_sequential_frames() {
        let data = vec![
            0x81, 0x02, 0x48, 0x69, // Text "Hi"
            0x88, 0x02, 0x03, 0xe8, // Close 1000
        ];
        let mut codec = FrameCodec::new(MockStream::chunked(data, 3), &ClientConfig::default());

        let first = codec.read_frame().await.unwrap();
        assert_eq!(first.payload(), b"Hi");

        let second = codec.read_frame().await.unwrap();
        assert_eq!(second.opcode, OpCode::Close);
        assert_eq!(second.close_code(), Some(1000));
    }

    #[tokio::test]
    async fn test_leftover_seeds_read_buffer() {
        // The whole first frame arrived with the handshake; the stream only
        // carries the second.
        let mut leftover = BytesMut::new();
        leftover.extend_from_slice(&[0x81, 0x02, 0x48, 0x69]);
        let stream = MockStream::new(vec![0x81, 0x02, 0x79, 0x6f]);
        let mut codec = FrameCodec::with_leftover(stream, &ClientConfig::default(), leftover);

        assert_eq!(codec.read_frame().await.unwrap().payload(), b"Hi");
        assert_eq!(codec.read_frame().await.unwrap().payload(), b"yo");
    }

    #[tokio::test]
    async fn test_read_eof() {
        let mut codec = FrameCodec::new(MockStream::new(vec![]), &ClientConfig::default());
        let result = codec.read_frame().await;
        assert!(matches!(result, Err(Error::ConnectionClosed(None))));
    }

    #[tokio::test]
    async fn test_read_truncated_frame_hits_eof() {
        // Header promises 5 payload bytes, stream ends after 2.
        let data = vec![0x81, 0x05, 0x48, 0x65];
        let mut codec = FrameCodec::new(MockStream::new(data), &ClientConfig::default());
        let result = codec.read_frame().await;
        assert!(matches!(result, Err(Error::ConnectionClosed(None))));
    }

    #[tokio::test]
    async fn test_read_64bit_length_rejected() {
        let mut data = vec![0x81, 0x7f];
        data.extend(65536u64.to_be_bytes());
        let mut codec = FrameCodec::new(MockStream::new(data), &ClientConfig::default());
        let result = codec.read_frame().await;
        assert!(matches!(result, Err(Error::UnsupportedFrameLength(_))));
    }

    #[tokio::test]
    async fn test_write_frame_is_masked() {
        let mut codec = FrameCodec::new(MockStream::new(vec![]), &ClientConfig::default());
        codec.write_frame(&Frame::text(b"Hi".to_vec())).await.unwrap();

        let written = codec.io.written();
        assert_eq!(written[0], 0x81);
        assert_eq!(written[1], 0x82); // mask bit + len=2
        assert_eq!(written.len(), 8);

        // Round-trips through the parser, which unmasks.
        let (frame, _) = Frame::parse(written).unwrap();
        assert_eq!(frame.payload(), b"Hi");
    }

    #[tokio::test]
    async fn test_mask_keys_change_between_frames() {
        let mut codec = FrameCodec::new(MockStream::new(vec![]), &ClientConfig::default());
        codec.write_frame(&Frame::text(b"a".to_vec())).await.unwrap();
        codec.write_frame(&Frame::text(b"a".to_vec())).await.unwrap();

        let written = codec.io.written();
        // Two frames of 7 bytes each; keys at offsets 2..6 and 9..13.
        assert_eq!(written.len(), 14);
        assert_ne!(&written[2..6], &written[9..13]);
    }
}
