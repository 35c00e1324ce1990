//! Limited length Golomb-Rice codes (ISO/IEC 14495-1, A.5.3).

use crate::error::JpeglsError;
use crate::jpegls::bit_reader::BitReader;
use crate::jpegls::bit_writer::BitWriter;
use crate::jpegls::golomb_lut::{GOLOMB_LUT, GOLOMB_LUT_K_COUNT};

/// Maps a signed error value onto the non-negative integers:
/// 0, -1, 1, -2, 2, ... become 0, 1, 2, 3, 4, ...
#[inline]
pub const fn map_error_value(error_value: i32) -> i32 {
    if error_value >= 0 {
        2 * error_value
    } else {
        -2 * error_value - 1
    }
}

#[inline]
pub const fn unmap_error_value(mapped_value: i32) -> i32 {
    if mapped_value & 1 == 0 {
        mapped_value >> 1
    } else {
        -((mapped_value + 1) >> 1)
    }
}

/// Writes `mapped_value` with Golomb parameter `k`.
///
/// Values whose unary part would reach `limit - qbpp - 1` are escaped: that
/// many zeros, a one, then `mapped_value - 1` in `qbpp` bits.
pub fn encode_mapped_value(
    writer: &mut BitWriter<'_>,
    k: i32,
    mapped_value: i32,
    limit: i32,
    quantized_bits_per_sample: i32,
) {
    let high_bits = mapped_value >> k;
    let escape_length = limit - quantized_bits_per_sample - 1;

    if high_bits < escape_length {
        writer.append_unary(high_bits);
        writer.append((mapped_value & ((1 << k) - 1)) as u32, k);
        return;
    }

    writer.append_unary(escape_length);
    writer.append(
        ((mapped_value - 1) & ((1 << quantized_bits_per_sample) - 1)) as u32,
        quantized_bits_per_sample,
    );
}

/// Reads a value written by [`encode_mapped_value`].
pub fn decode_mapped_value(
    reader: &mut BitReader<'_>,
    k: i32,
    limit: i32,
    quantized_bits_per_sample: i32,
) -> Result<i32, JpeglsError> {
    let escape_length = limit - quantized_bits_per_sample - 1;

    if (k as usize) < GOLOMB_LUT_K_COUNT {
        if let Some(byte) = reader.peek_byte() {
            let code = GOLOMB_LUT[k as usize][byte as usize];
            if code.bit_count != 0 && ((code.mapped_value as i32) >> k) < escape_length {
                reader.consume(code.bit_count as i32);
                return Ok(code.mapped_value as i32);
            }
        }
    }

    let high_bits = reader.read_unary(escape_length)?;
    if high_bits == escape_length {
        return Ok(reader.read_value(quantized_bits_per_sample)? + 1);
    }

    Ok((high_bits << k) + reader.read_value(k)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_and_unmap_interleave_signs() {
        let mapped: Vec<i32> = [0, -1, 1, -2, 2, -3].iter().map(|&e| map_error_value(e)).collect();
        assert_eq!(mapped, vec![0, 1, 2, 3, 4, 5]);
        for e in -300..300 {
            assert_eq!(unmap_error_value(map_error_value(e)), e);
        }
    }

    #[test]
    fn short_code_layout() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        // k = 2, value 9: unary 2 (001), remainder 01
        encode_mapped_value(&mut writer, 2, 9, 32, 8);
        writer.end_scan();
        assert_eq!(out, vec![0b0010_1000]);
    }

    #[test]
    fn escape_code_layout() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        // LIMIT 32, qbpp 8: 23 zeros, a one, then value - 1 in 8 bits.
        encode_mapped_value(&mut writer, 0, 200, 32, 8);
        writer.end_scan();
        assert_eq!(out, vec![0x00, 0x00, 0x01, 199]);
    }

    #[test]
    fn decodes_short_and_escaped_codes() {
        let cases = [(0, 0), (0, 5), (2, 9), (3, 200), (0, 255), (5, 250), (7, 12)];
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        for &(k, value) in &cases {
            encode_mapped_value(&mut writer, k, value, 32, 8);
        }
        writer.end_scan();
        out.extend_from_slice(&[0xFF, 0xD9]);

        let mut reader = BitReader::new(&out, 0);
        for &(k, value) in &cases {
            assert_eq!(decode_mapped_value(&mut reader, k, 32, 8).unwrap(), value);
        }
    }

    #[test]
    fn long_unary_prefix_is_rejected() {
        let data = [0u8; 8];
        let mut stream = data.to_vec();
        stream.extend_from_slice(&[0xFF, 0xD9]);
        let mut reader = BitReader::new(&stream, 0);
        assert_eq!(decode_mapped_value(&mut reader, 0, 32, 8), Err(JpeglsError::DecodeOverrun));
    }
}
