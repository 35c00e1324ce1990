use crate::error::JpeglsError;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, is_marker_second_byte};

const CACHE_BIT_COUNT: i32 = 64;

fn low_mask(bit_count: i32) -> u64 {
    if bit_count >= CACHE_BIT_COUNT {
        u64::MAX
    } else {
        (1u64 << bit_count) - 1
    }
}

/// MSB-first bit reader over JPEG-LS entropy coded data.
///
/// The reader never consumes a marker: filling stops in front of a 0xFF that
/// is followed by a byte with its high bit set. The byte after any other 0xFF
/// contributes only its 7 low bits.
pub struct BitReader<'a> {
    source: &'a [u8],
    position: usize,
    cache: u64,
    valid_bits: i32,
    previous_was_ff: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(source: &'a [u8], position: usize) -> Self {
        Self {
            source,
            position,
            cache: 0,
            valid_bits: 0,
            previous_was_ff: false,
        }
    }

    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    fn fill(&mut self) {
        while self.valid_bits <= CACHE_BIT_COUNT - 8 {
            let Some(&byte) = self.source.get(self.position) else {
                return;
            };

            if byte == JPEG_MARKER_START_BYTE {
                match self.source.get(self.position + 1) {
                    None => return,
                    Some(&next) if is_marker_second_byte(next) => return,
                    _ => {}
                }
            }

            if self.previous_was_ff {
                self.cache = (self.cache << 7) | (byte & 0x7F) as u64;
                self.valid_bits += 7;
            } else {
                self.cache = (self.cache << 8) | byte as u64;
                self.valid_bits += 8;
            }
            self.previous_was_ff = byte == JPEG_MARKER_START_BYTE;
            self.position += 1;
        }
    }

    fn ensure(&mut self, bit_count: i32) -> Result<(), JpeglsError> {
        if self.valid_bits < bit_count {
            self.fill();
            if self.valid_bits < bit_count {
                return Err(JpeglsError::MalformedStream("entropy coded data is truncated"));
            }
        }
        Ok(())
    }

    fn skip(&mut self, bit_count: i32) {
        debug_assert!(bit_count <= self.valid_bits);
        self.valid_bits -= bit_count;
        self.cache &= low_mask(self.valid_bits);
    }

    /// Reads `bit_count` bits (at most 32) as an unsigned value.
    pub fn read_value(&mut self, bit_count: i32) -> Result<i32, JpeglsError> {
        debug_assert!((0..=32).contains(&bit_count));
        if bit_count == 0 {
            return Ok(0);
        }

        self.ensure(bit_count)?;
        let value = (self.cache >> (self.valid_bits - bit_count)) & low_mask(bit_count);
        self.skip(bit_count);
        Ok(value as i32)
    }

    pub fn read_bit(&mut self) -> Result<bool, JpeglsError> {
        Ok(self.read_value(1)? == 1)
    }

    /// Returns the next 8 bits without consuming them, or `None` when fewer
    /// than 8 bits remain before the end of the data.
    pub fn peek_byte(&mut self) -> Option<u8> {
        if self.valid_bits < 8 {
            self.fill();
            if self.valid_bits < 8 {
                return None;
            }
        }
        Some((self.cache >> (self.valid_bits - 8)) as u8)
    }

    pub fn consume(&mut self, bit_count: i32) {
        self.skip(bit_count);
    }

    /// Counts zero bits up to and including the terminating one bit and
    /// returns the number of zeros. Fails with `DecodeOverrun` once the count
    /// exceeds `maximum_zero_count`.
    pub fn read_unary(&mut self, maximum_zero_count: i32) -> Result<i32, JpeglsError> {
        let mut count = 0;
        loop {
            self.ensure(1)?;
            let aligned = self.cache << (CACHE_BIT_COUNT - self.valid_bits);
            let zeros = (aligned.leading_zeros() as i32).min(self.valid_bits);
            if zeros < self.valid_bits {
                count += zeros;
                if count > maximum_zero_count {
                    return Err(JpeglsError::DecodeOverrun);
                }
                self.skip(zeros + 1);
                return Ok(count);
            }

            count += zeros;
            self.skip(zeros);
            if count > maximum_zero_count {
                return Err(JpeglsError::DecodeOverrun);
            }
        }
    }

    /// Locates the marker that terminates the entropy coded data and returns
    /// its offset. Bits left in the cache are padding and are discarded.
    pub fn end_of_data(&mut self) -> Result<usize, JpeglsError> {
        let mut position = self.position;
        while position + 1 < self.source.len() {
            if self.source[position] == JPEG_MARKER_START_BYTE && is_marker_second_byte(self.source[position + 1]) {
                if position > self.position + 1 {
                    log::debug!("skipping {} bytes after entropy coded data", position - self.position);
                }
                return Ok(position);
            }
            position += 1;
        }

        Err(JpeglsError::MalformedStream("entropy coded data is not terminated by a marker"))
    }

    /// Moves past a restart marker at `position` and starts with an empty bit state.
    pub fn restart(&mut self, position: usize) {
        self.position = position;
        self.cache = 0;
        self.valid_bits = 0;
        self.previous_was_ff = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpegls::bit_writer::BitWriter;

    #[test]
    fn reads_bits_msb_first() {
        let data = [0b1010_0001, 0b1000_0000, 0xFF, 0xD9];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.read_value(3).unwrap(), 0b101);
        assert_eq!(reader.read_value(5).unwrap(), 0b00001);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.end_of_data().unwrap(), 2);
    }

    #[test]
    fn drops_stuffed_bit_after_ff() {
        let data = [0xFF, 0x7F, 0x80, 0xFF, 0xD9];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.read_value(8).unwrap(), 0xFF);
        assert_eq!(reader.read_value(7).unwrap(), 0x7F);
        assert!(reader.read_bit().unwrap());
    }

    #[test]
    fn stops_in_front_of_marker() {
        let data = [0x12, 0xFF, 0xD9];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.read_value(8).unwrap(), 0x12);
        assert_eq!(
            reader.read_value(1),
            Err(JpeglsError::MalformedStream("entropy coded data is truncated"))
        );
    }

    #[test]
    fn unary_prefix_longer_than_limit_is_an_overrun() {
        let data = [0x00, 0x00, 0x00, 0x00, 0xFF, 0xD9];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.read_unary(20), Err(JpeglsError::DecodeOverrun));
    }

    #[test]
    fn unary_counts_zeros_across_bytes() {
        let data = [0x00, 0x04, 0xFF, 0xD9];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.read_unary(31).unwrap(), 13);
        assert_eq!(reader.read_value(2).unwrap(), 0);
    }

    #[test]
    fn reads_back_what_the_writer_wrote() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        let values: Vec<(u32, i32)> = (0..500).map(|i| ((i * 7919) % (1 << (i % 17)), i as i32 % 17)).collect();
        for &(value, bit_count) in &values {
            writer.append(value, bit_count);
        }
        writer.end_scan();
        out.extend_from_slice(&[0xFF, 0xD9]);

        let mut reader = BitReader::new(&out, 0);
        for &(value, bit_count) in &values {
            assert_eq!(reader.read_value(bit_count).unwrap(), value as i32);
        }
        assert_eq!(reader.end_of_data().unwrap(), out.len() - 2);
    }
}
