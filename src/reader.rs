//! A minimal buffered reader over any `AsyncRead` half.
//!
//! `read_line` accumulates into an internal buffer until a `\n` or EOF.
//! `read_n` issues a single underlying read of up to `max` bytes; it is
//! not a fill-to-`n` loop.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

pub struct BufferedReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> BufferedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(crate::MAXLINE),
        }
    }

    /// Reads up to and including the next `\n`, or whatever is left at
    /// EOF. Returns `Ok(None)` on an immediate EOF with nothing buffered.
    pub async fn read_line(&mut self, max: usize) -> std::io::Result<Option<String>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line = self.buf.split_to(pos + 1);
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            if self.buf.len() >= max {
                let line = self.buf.split_to(max);
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            let mut chunk = [0u8; 4096];
            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let line = self.buf.split_to(self.buf.len());
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Returns up to `max` bytes from a single underlying read. Drains
    /// any bytes already buffered by `read_line` first; an empty
    /// result means EOF.
    pub async fn read_n(&mut self, max: usize) -> std::io::Result<bytes::Bytes> {
        if !self.buf.is_empty() {
            let n = max.min(self.buf.len());
            let chunk = self.buf.split_to(n);
            return Ok(chunk.freeze());
        }
        let mut chunk = BytesMut::zeroed(max);
        let n = self.inner.read(&mut chunk).await?;
        chunk.truncate(n);
        Ok(chunk.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn read_line_splits_on_newline() {
        let data = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n".to_vec();
        let mut reader = BufferedReader::new(Cursor::new(data));

        let line1 = reader.read_line(8192).await.unwrap().unwrap();
        assert_eq!(line1, "GET / HTTP/1.1\r\n");
        let line2 = reader.read_line(8192).await.unwrap().unwrap();
        assert_eq!(line2, "Host: x\r\n");
        let line3 = reader.read_line(8192).await.unwrap().unwrap();
        assert_eq!(line3, "\r\n");
    }

    #[tokio::test]
    async fn read_line_returns_none_on_empty_read() {
        let mut reader = BufferedReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.read_line(8192).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_n_returns_empty_bytes_on_eof() {
        let mut reader = BufferedReader::new(Cursor::new(Vec::<u8>::new()));
        let chunk = reader.read_n(8192).await.unwrap();
        assert!(chunk.is_empty());
    }

    #[tokio::test]
    async fn read_n_drains_buffered_bytes_from_read_line_first() {
        let data = b"abc\ndef".to_vec();
        let mut reader = BufferedReader::new(Cursor::new(data));
        let line = reader.read_line(8192).await.unwrap().unwrap();
        assert_eq!(line, "abc\n");
        let rest = reader.read_n(8192).await.unwrap();
        assert_eq!(&rest[..], b"def");
    }
}
