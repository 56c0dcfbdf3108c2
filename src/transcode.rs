use bytes::{Buf, BytesMut};
use encoding_rs::{Decoder, DecoderResult, Encoding};
use std::io;
use tokio_util::codec::Decoder as FrameDecoder;

/// Incremental transcoder from a declared upload charset to UTF-8.
///
/// Strict: a byte sequence that is not valid in the declared charset is an
/// `InvalidData` I/O error, which the record stream surfaces as a fatal
/// decode failure. Row positions cannot be trusted past a corrupt sequence,
/// so lossy replacement is not an option here.
pub struct CharsetTranscoder {
    decoder: Decoder,
    finished: bool,
}

impl CharsetTranscoder {
    pub fn new(charset: &'static Encoding) -> Self {
        Self {
            decoder: charset.new_decoder(),
            finished: false,
        }
    }

    fn run(&mut self, src: &mut BytesMut, last: bool) -> io::Result<Option<BytesMut>> {
        let cap = self
            .decoder
            .max_utf8_buffer_length_without_replacement(src.len())
            .unwrap_or(src.len() * 4)
            .max(16);
        let mut out = vec![0u8; cap];

        let (result, read, written) =
            self.decoder
                .decode_to_utf8_without_replacement(src, &mut out, last);
        if let DecoderResult::Malformed(..) = result {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "byte sequence is not valid {}",
                    self.decoder.encoding().name()
                ),
            ));
        }

        src.advance(read);
        if written == 0 {
            return Ok(None);
        }
        Ok(Some(BytesMut::from(&out[..written])))
    }
}

impl FrameDecoder for CharsetTranscoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<BytesMut>> {
        if src.is_empty() {
            return Ok(None);
        }
        self.run(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<BytesMut>> {
        // The final call must reach the inner decoder even with an empty
        // buffer: an incomplete multi-byte sequence at end of input only
        // shows up as malformed once `last` is signalled. encoding_rs
        // forbids decoding again after that, hence the latch.
        if self.finished {
            return Ok(None);
        }
        let out = self.run(src, true)?;
        self.finished = true;
        src.clear();
        Ok(out)
    }
}
