//! Charset detection for subtitle downloads
//!
//! Ktuvit serves subtitle files without a reliable charset declaration.
//! Most are Windows-1255 / ISO-8859-8, some are UTF-8, a few are something
//! else entirely. The bytes are buffered, the encoding is guessed with
//! `chardetng`, and the whole buffer is decoded with `encoding_rs`.
//!
//! With a sample limit set, the guess is made once the running byte count
//! exceeds the limit and then frozen for the rest of the stream. A body that
//! never exceeds the limit is not inspected at all and gets the fallback.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use futures::{pin_mut, Stream, StreamExt};
use tracing::debug;

use crate::error::{KtuvitError, Result};
use crate::models::DecodedText;

/// Fallback used when nothing better is known
pub const DEFAULT_FALLBACK: &str = "UTF-8";

/// Legacy Hebrew charset the site falls back to
pub const HEBREW_FALLBACK: &str = "ISO-8859-8";

/// Resolve an encoding label ("utf-8", "ISO-8859-8", "cp1255", ...)
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| KtuvitError::UnknownEncoding(label.to_string()))
}

/// Guess the encoding of `sample`.
///
/// Returns `None` when the sample carries no evidence (empty or pure ASCII).
/// `complete` tells the detector whether `sample` is the whole body or just a
/// prefix, so a multi-byte sequence cut at the end of a prefix is not held
/// against UTF-8.
pub fn detect(sample: &[u8], complete: bool) -> Option<&'static Encoding> {
    if sample.is_ascii() {
        return None;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, complete);
    Some(detector.guess(None, true))
}

/// Where the detector is in its lifecycle
#[derive(Debug, Clone, Copy)]
enum Detection {
    /// Still sampling (or no limit: detect at the end)
    Pending,
    /// Sample limit crossed; result frozen, possibly "no result"
    Frozen(Option<&'static Encoding>),
}

/// Incremental decoder fed one chunk at a time
///
/// Every chunk is kept; only detection is bounded by the sample limit.
/// One decoder per response, nothing is shared between instances.
#[derive(Debug)]
pub struct StreamDecoder {
    fallback: &'static Encoding,
    sample_limit: Option<usize>,
    buffer: Vec<u8>,
    detection: Detection,
}

impl StreamDecoder {
    /// Create a decoder with a fallback encoding label and optional sample limit.
    ///
    /// A sample limit of zero behaves like no limit.
    pub fn new(fallback: &str, sample_limit: Option<usize>) -> Result<Self> {
        Ok(Self {
            fallback: encoding_for_label(fallback)?,
            sample_limit: sample_limit.filter(|&n| n > 0),
            buffer: Vec::new(),
            detection: Detection::Pending,
        })
    }

    /// Bytes received so far
    pub fn received(&self) -> usize {
        self.buffer.len()
    }

    /// Encoding frozen from the sample, if the limit has been crossed
    pub fn frozen_encoding(&self) -> Option<&'static Encoding> {
        match self.detection {
            Detection::Frozen(enc) => enc,
            Detection::Pending => None,
        }
    }

    /// Append a chunk of the response body
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        if let (Detection::Pending, Some(limit)) = (self.detection, self.sample_limit) {
            if self.buffer.len() > limit {
                let guess = detect(&self.buffer, false);
                debug!(
                    sampled = self.buffer.len(),
                    encoding = guess.map(|e| e.name()),
                    "charset frozen from sample"
                );
                self.detection = Detection::Frozen(guess);
            }
        }
    }

    /// End of stream: pick the final encoding and decode the whole buffer
    pub fn finish(self) -> Result<DecodedText> {
        let detected = match self.detection {
            Detection::Frozen(enc) => enc,
            // Limit set but never exceeded: no sample was taken
            Detection::Pending if self.sample_limit.is_some() => None,
            Detection::Pending => detect(&self.buffer, true),
        };
        let encoding = detected.unwrap_or(self.fallback);

        // `decode` honours a BOM if present, which may switch the encoding
        let (text, used, had_errors) = encoding.decode(&self.buffer);
        debug!(
            bytes = self.buffer.len(),
            encoding = used.name(),
            detected = detected.is_some(),
            "decoded response body"
        );

        if had_errors {
            return Err(KtuvitError::Decode {
                encoding: used.name(),
                partial: text.into_owned(),
            });
        }

        Ok(DecodedText {
            text: text.into_owned(),
            encoding: used.name(),
        })
    }
}

/// Decode a complete buffer.
///
/// With a sample limit the bytes are treated as if they arrived one at a time:
/// the guess uses only the first `limit + 1` bytes, then applies to all of them.
pub fn decode(bytes: &[u8], fallback: &str, sample_limit: Option<usize>) -> Result<DecodedText> {
    let mut decoder = StreamDecoder::new(fallback, sample_limit)?;

    match decoder.sample_limit {
        Some(limit) if bytes.len() > limit => {
            let (head, tail) = bytes.split_at(limit + 1);
            decoder.push(head);
            decoder.push(tail);
        }
        _ => decoder.push(bytes),
    }

    decoder.finish()
}

/// Drain a byte stream (e.g. `reqwest::Response::bytes_stream`) through `decoder`
pub async fn decode_stream<S, B, E>(stream: S, mut decoder: StreamDecoder) -> Result<DecodedText>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<KtuvitError>,
{
    pin_mut!(stream);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        decoder.push(chunk.as_ref());
    }

    decoder.finish()
}
