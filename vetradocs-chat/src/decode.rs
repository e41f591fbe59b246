//! Incremental UTF-8 decoding of a chunked response body.
//!
//! Chunk boundaries are arbitrary byte offsets, so a multi-byte character
//! may be split across two chunks. The decoder keeps the incomplete tail
//! and emits it once the rest of the character arrives.

use encoding_rs::{CoderResult, Decoder, UTF_8};

pub struct Utf8StreamDecoder {
    decoder: Decoder,
}

impl Default for Utf8StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
        }
    }

    /// Decode one chunk, returning every character it completes.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.decode_inner(chunk, false)
    }

    /// Flush the held-back tail at end of stream. A truncated character
    /// becomes U+FFFD. The decoder is reset for reuse.
    pub fn finish(&mut self) -> String {
        let tail = self.decode_inner(&[], true);
        self.decoder = UTF_8.new_decoder_with_bom_removal();
        tail
    }

    fn decode_inner(&mut self, mut src: &[u8], last: bool) -> String {
        let mut out = String::with_capacity(self.capacity_for(src.len()));
        loop {
            let (result, read, _) = self.decoder.decode_to_string(src, &mut out, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => out.reserve(self.capacity_for(src.len())),
            }
        }
    }

    fn capacity_for(&self, len: usize) -> usize {
        self.decoder
            .max_utf8_buffer_length(len)
            .unwrap_or(len.saturating_mul(3) + 16)
    }
}

impl std::fmt::Debug for Utf8StreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utf8StreamDecoder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Hello, "), "Hello, ");
        assert_eq!(decoder.decode(b"world"), "world");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_multibyte_character_is_held_back() {
        let mut decoder = Utf8StreamDecoder::new();
        let bytes = "café 😀".as_bytes();
        // Split inside "é" (2 bytes) and inside the emoji (4 bytes)
        assert_eq!(decoder.decode(&bytes[..4]), "caf");
        assert_eq!(decoder.decode(&bytes[4..8]), "é ");
        assert_eq!(decoder.decode(&bytes[8..]), "😀");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_one_byte_at_a_time() {
        let text = "Ünïcødé ✓ 日本語";
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for byte in text.as_bytes() {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());
        assert_eq!(out, text);
    }

    #[test]
    fn test_truncated_tail_becomes_replacement_character() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok \xE2\x9C"), "ok ");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        // Reusable after finish
        assert_eq!(decoder.decode(b"again"), "again");
    }

    #[test]
    fn test_leading_bom_is_dropped() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"\xEF\xBB\xBFhi"), "hi");
    }
}
