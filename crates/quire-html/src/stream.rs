//! Pull-based byte sources for [`crate::parse_stream`].
//!
//! Bytes are buffered until enough have arrived to sniff the encoding (or
//! the source ends). From then on each chunk is decoded as it arrives and
//! the raw bytes are dropped; multi-byte sequences split across chunks are
//! carried by the `encoding_rs` decoder.

use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder};
use quire_common::{BudgetMeter, Phase, TraceEvent, TraceLog, Warnings};

use crate::encoding::{self, Sniffed, SniffOptions};
use crate::error::HtmlError;
use crate::options::ParseOptions;
use crate::record_trace;

/// Default read size of [`ReaderSource`].
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A source of byte chunks. `Ok(None)` marks the end of the stream.
pub trait ChunkSource {
    /// Pull the next chunk.
    ///
    /// # Errors
    /// Any read failure of the underlying source.
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        (**self).next_chunk()
    }
}

/// Chunks from any iterator.
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    chunks: I,
}

impl<I: Iterator> IterSource<I> {
    /// Wrap an iterator of chunks.
    pub fn new(chunks: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            chunks: chunks.into_iter(),
        }
    }
}

impl<I, C> ChunkSource for IterSource<I>
where
    I: Iterator<Item = C>,
    C: Into<Vec<u8>>,
{
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.chunks.next().map(Into::into))
    }
}

/// Fixed-size chunks from any [`Read`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: Read> ReaderSource<R> {
    /// Read in [`DEFAULT_CHUNK_SIZE`] chunks.
    pub const fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Read in chunks of `chunk_size` bytes (at least one).
    pub const fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 { 1 } else { chunk_size };
        Self { reader, chunk_size }
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buffer = vec![0; self.chunk_size];
        loop {
            match self.reader.read(&mut buffer) {
                Ok(0) => return Ok(None),
                Ok(read) => {
                    buffer.truncate(read);
                    return Ok(Some(buffer));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }
    }
}

/// Where the driver is: still collecting bytes for the sniffer, or decoding.
enum StreamState {
    Buffering(Vec<u8>),
    Decoding { decoder: Decoder, sniffed: Sniffed },
}

/// Text decoded from a stream, with the encoding that decoded it.
pub(crate) struct DecodedStream {
    pub text: String,
    pub sniffed: Sniffed,
}

/// Pull `source` to the end, sniffing and then decoding incrementally.
///
/// Checkpoints: `maxInputBytes` on every chunk, `maxBufferedBytes` on every
/// chunk received before the encoding is resolved.
pub(crate) fn read_and_decode<S: ChunkSource>(
    mut source: S,
    options: &ParseOptions,
    meter: &BudgetMeter,
    trace: &mut Option<TraceLog>,
    warnings: &mut Warnings,
) -> Result<DecodedStream, HtmlError> {
    // A BOM needs three bytes even when the prescan is disabled.
    let threshold = options.max_prescan_bytes.max(3);
    let mut state = StreamState::Buffering(Vec::new());
    let mut text = String::new();
    let mut total = 0usize;
    let mut chunks = 0usize;

    record_trace(trace, TraceEvent::PhaseStart { phase: Phase::Sniff })?;
    while let Some(chunk) = source.next_chunk().map_err(HtmlError::Stream)? {
        chunks += 1;
        total = total.saturating_add(chunk.len());
        meter.check_input_bytes(total)?;

        let next_state = match &mut state {
            StreamState::Buffering(buffer) => {
                buffer.extend_from_slice(&chunk);
                meter.check_buffered_bytes(buffer.len())?;
                if buffer.len() >= threshold {
                    Some(start_decoding(buffer, &mut text, options, trace, warnings)?)
                } else {
                    None
                }
            }
            StreamState::Decoding { decoder, .. } => {
                decode_into(decoder, &chunk, &mut text, false);
                None
            }
        };
        if let Some(next_state) = next_state {
            state = next_state;
        }
    }

    // The source may end before the threshold: sniff what there is.
    if let StreamState::Buffering(buffer) = &state {
        state = start_decoding(buffer, &mut text, options, trace, warnings)?;
    }
    let StreamState::Decoding {
        mut decoder,
        sniffed,
    } = state
    else {
        return Err(HtmlError::Stream(io::Error::other("stream ended while buffering")));
    };
    decode_into(&mut decoder, &[], &mut text, true);
    record_trace(trace, TraceEvent::PhaseEnd { phase: Phase::Decode })?;
    tracing::debug!(chunks, bytes = total, encoding = sniffed.name(), "stream decoded");
    Ok(DecodedStream { text, sniffed })
}

/// Sniff the buffered prefix, then decode it with a fresh decoder.
fn start_decoding(
    buffer: &[u8],
    text: &mut String,
    options: &ParseOptions,
    trace: &mut Option<TraceLog>,
    warnings: &mut Warnings,
) -> Result<StreamState, HtmlError> {
    let sniffed = encoding::sniff(buffer, SniffOptions::from(options), warnings);
    record_trace(
        trace,
        TraceEvent::EncodingResolved {
            encoding: sniffed.name(),
            source: sniffed.source.into(),
        },
    )?;
    record_trace(trace, TraceEvent::PhaseEnd { phase: Phase::Sniff })?;
    record_trace(trace, TraceEvent::PhaseStart { phase: Phase::Decode })?;

    let mut decoder = sniffed.encoding.new_decoder_without_bom_handling();
    let body = buffer.get(sniffed.bom_length..).unwrap_or_default();
    decode_into(&mut decoder, body, text, false);
    Ok(StreamState::Decoding { decoder, sniffed })
}

/// Decode `bytes` onto the end of `text`, growing it as needed.
fn decode_into(decoder: &mut Decoder, mut bytes: &[u8], text: &mut String, last: bool) {
    loop {
        let needed = decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or_else(|| bytes.len().saturating_mul(3).saturating_add(16));
        text.reserve(needed);
        let (result, read, _had_replacements) = decoder.decode_to_string(bytes, text, last);
        bytes = &bytes[read..];
        match result {
            CoderResult::InputEmpty => return,
            CoderResult::OutputFull => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    impl ChunkSource for FailingSource {
        fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    fn decode(source: impl ChunkSource, options: &ParseOptions) -> Result<DecodedStream, HtmlError> {
        let meter = BudgetMeter::new(options.budgets);
        read_and_decode(source, options, &meter, &mut None, &mut Warnings::new())
    }

    #[test]
    fn test_split_multibyte_sequence() {
        // "é" is C3 A9 in UTF-8; split it across chunks after the sniff.
        let options = ParseOptions {
            max_prescan_bytes: 3,
            transport_encoding_label: Some("utf-8".to_string()),
            ..ParseOptions::default()
        };
        let chunks = vec![b"<p>".to_vec(), vec![0xC3], vec![0xA9], b"</p>".to_vec()];
        let decoded = decode(IterSource::new(chunks), &options).unwrap();
        assert_eq!(decoded.text, "<p>\u{e9}</p>");
    }

    #[test]
    fn test_short_stream_is_sniffed_at_end() {
        let decoded = decode(IterSource::new([&b"\xEF\xBB\xBFhi"[..]]), &ParseOptions::default()).unwrap();
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.sniffed.source, encoding::EncodingSource::Bom);
    }

    #[test]
    fn test_reader_source_chunks() {
        let mut source = ReaderSource::with_chunk_size(&b"abcde"[..], 2);
        assert_eq!(source.next_chunk().unwrap(), Some(b"ab".to_vec()));
        assert_eq!(source.next_chunk().unwrap(), Some(b"cd".to_vec()));
        assert_eq!(source.next_chunk().unwrap(), Some(b"e".to_vec()));
        assert_eq!(source.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_read_failure_is_a_stream_error() {
        let error = decode(FailingSource, &ParseOptions::default()).err().unwrap();
        assert_eq!(error.code(), "STREAM_READ_FAILED");
    }

    #[test]
    fn test_buffered_bytes_ceiling() {
        let options = ParseOptions {
            budgets: quire_common::Budgets::default().with_max_buffered_bytes(4),
            ..ParseOptions::default()
        };
        let chunks = vec![b"<p>".to_vec(), b"<b>".to_vec()];
        let error = decode(IterSource::new(chunks), &options).err().unwrap();
        let exceeded = error.as_budget().unwrap();
        assert_eq!(exceeded.limit, 4);
        assert_eq!(exceeded.actual, 6);
    }
}
