//! Tabular representation of a Visier Query API result set.
//!
//! Query endpoints return JSON Lines bodies: the first line is an array of
//! column names, every following line is one row. [`ResultTable`] decodes
//! the header eagerly at construction and exposes the rows as a lazy,
//! forward-only stream so large result sets never need to be buffered in
//! full.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::{Error, Result};

/// Type alias for the boxed chunk stream backing a [`LineStream`].
type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Forward-only stream of text lines over a chunked byte source.
///
/// Splits incoming chunks on `\n` (stripping a trailing `\r`), carrying
/// partial lines across chunk boundaries. A final unterminated line is
/// flushed when the source ends. The stream is single-pass: once exhausted
/// it stays exhausted.
pub struct LineStream {
    inner: ChunkStream,
    buffer: Vec<u8>,
    done: bool,
}

impl LineStream {
    fn from_chunk_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Vec<u8>>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Stream the lines of an HTTP response body without buffering it.
    pub fn from_response(response: reqwest::Response) -> Self {
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(Error::from));
        Self::from_chunk_stream(chunks)
    }

    /// Build a stream over an in-memory sequence of lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks: Vec<Result<Vec<u8>>> = lines
            .into_iter()
            .map(|line| {
                let mut line = line.into();
                line.push('\n');
                Ok(line.into_bytes())
            })
            .collect();
        Self::from_chunk_stream(futures_util::stream::iter(chunks))
    }
}

impl Stream for LineStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(pos) = this.buffer.iter().position(|&byte| byte == b'\n') {
                let mut line: Vec<u8> = this.buffer.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Poll::Ready(Some(Ok(String::from_utf8_lossy(&line).into_owned())));
            }

            if this.done {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                let line = std::mem::take(&mut this.buffer);
                return Poll::Ready(Some(Ok(String::from_utf8_lossy(&line).into_owned())));
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.buffer.extend_from_slice(&chunk),
                Poll::Ready(Some(Err(error))) => return Poll::Ready(Some(Err(error))),
                Poll::Ready(None) => this.done = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Tabular result set decoded from a JSON Lines body.
///
/// The header is decoded eagerly at construction; the rows are decoded one
/// line at a time as the [`rows`](Self::rows) stream is consumed. The
/// backing line source can be consumed once: draining the rows a second
/// time yields an empty stream.
///
/// # Example
///
/// ```
/// use futures_util::StreamExt;
/// use visier_rs::table::{LineStream, ResultTable};
///
/// # async fn example() -> visier_rs::Result<()> {
/// let lines = LineStream::from_lines(["[\"a\",\"b\"]", "[1,2]", "[3,4]"]);
/// let mut table = ResultTable::new(lines).await?;
/// assert_eq!(table.header(), ["a", "b"]);
/// while let Some(row) = table.rows().next().await {
///     println!("{:?}", row?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ResultTable {
    header: Vec<String>,
    lines: LineStream,
    line_no: usize,
}

impl ResultTable {
    /// Decode the header line and wrap the remaining lines as rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyResult`] when the source yields no lines at
    /// all, or [`Error::Decode`] when the first line is not a JSON array of
    /// column names.
    pub async fn new(mut lines: LineStream) -> Result<Self> {
        let first = match lines.next().await {
            Some(line) => line?,
            None => return Err(Error::EmptyResult),
        };
        let header = serde_json::from_str(&first).map_err(|error| Error::Decode {
            line: 1,
            message: error.to_string(),
        })?;
        Ok(Self {
            header,
            lines,
            line_no: 1,
        })
    }

    /// Decode a table directly from an HTTP response body.
    pub async fn from_response(response: reqwest::Response) -> Result<Self> {
        Self::new(LineStream::from_response(response)).await
    }

    /// The ordered column names from the header line.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Lazy stream of rows, one parsed JSON value per body line.
    ///
    /// Rows are decoded on demand; a malformed line surfaces as
    /// [`Error::Decode`] carrying the 1-based line position.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            lines: &mut self.lines,
            line_no: &mut self.line_no,
        }
    }
}

/// Row stream borrowed from a [`ResultTable`].
pub struct Rows<'a> {
    lines: &'a mut LineStream,
    line_no: &'a mut usize,
}

impl Stream for Rows<'_> {
    type Item = Result<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match Pin::new(&mut *this.lines).poll_next(cx) {
            Poll::Ready(Some(Ok(line))) => {
                *this.line_no += 1;
                let row = serde_json::from_str(&line).map_err(|error| Error::Decode {
                    line: *this.line_no,
                    message: error.to_string(),
                });
                Poll::Ready(Some(row))
            }
            Poll::Ready(Some(Err(error))) => Poll::Ready(Some(Err(error))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn collect_rows(table: &mut ResultTable) -> Vec<Value> {
        let mut rows = Vec::new();
        let mut stream = table.rows();
        while let Some(row) = stream.next().await {
            rows.push(row.unwrap());
        }
        rows
    }

    #[tokio::test]
    async fn test_header_and_rows_in_order() {
        let lines = LineStream::from_lines(["[\"a\",\"b\"]", "[1,2]", "[3,4]"]);
        let mut table = ResultTable::new(lines).await.unwrap();
        assert_eq!(table.header(), ["a", "b"]);
        assert_eq!(collect_rows(&mut table).await, vec![json!([1, 2]), json!([3, 4])]);
    }

    #[tokio::test]
    async fn test_rows_are_not_restartable() {
        let lines = LineStream::from_lines(["[\"a\"]", "[1]"]);
        let mut table = ResultTable::new(lines).await.unwrap();
        assert_eq!(collect_rows(&mut table).await.len(), 1);
        assert!(collect_rows(&mut table).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_fails_at_construction() {
        let lines = LineStream::from_lines(Vec::<String>::new());
        match ResultTable::new(lines).await {
            Err(Error::EmptyResult) => {}
            other => panic!("expected EmptyResult, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_malformed_row_reports_line_position() {
        let lines = LineStream::from_lines(["[\"a\"]", "[1]", "not json"]);
        let mut table = ResultTable::new(lines).await.unwrap();
        let mut stream = table.rows();
        assert!(stream.next().await.unwrap().is_ok());
        match stream.next().await.unwrap() {
            Err(Error::Decode { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_header_fails_at_construction() {
        let lines = LineStream::from_lines(["not a header"]);
        match ResultTable::new(lines).await {
            Err(Error::Decode { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected Decode error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let chunks = vec![
            Ok(b"[\"a\",\"b\"]\n[1,".to_vec()),
            Ok(b"2]\r\n[3,4]".to_vec()),
        ];
        let lines = LineStream::from_chunk_stream(futures_util::stream::iter(chunks));
        let mut table = ResultTable::new(lines).await.unwrap();
        assert_eq!(table.header(), ["a", "b"]);
        assert_eq!(collect_rows(&mut table).await, vec![json!([1, 2]), json!([3, 4])]);
    }
}
