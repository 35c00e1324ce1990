use crate::jpegls::coding_parameters::{
    compute_limit_parameter, compute_quantized_bits_per_sample, compute_range_parameter,
};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt::Debug;

/// Storage type of a sample in an image buffer.
///
/// Images with 2 to 8 bits per sample use one byte per sample, deeper images
/// use two little-endian bytes per sample. The coding loops always work on
/// `i32` values; this trait moves samples between the two representations.
pub trait JpeglsSample: Copy + Clone + Debug + Default + PartialEq {
    const BYTES: usize;

    /// Reads the sample starting at byte `offset`.
    fn load(source: &[u8], offset: usize) -> i32;
    fn store(destination: &mut [u8], offset: usize, value: i32);
}

impl JpeglsSample for u8 {
    const BYTES: usize = 1;

    #[inline]
    fn load(source: &[u8], offset: usize) -> i32 {
        source[offset] as i32
    }

    #[inline]
    fn store(destination: &mut [u8], offset: usize, value: i32) {
        destination[offset] = value as u8;
    }
}

impl JpeglsSample for u16 {
    const BYTES: usize = 2;

    #[inline]
    fn load(source: &[u8], offset: usize) -> i32 {
        LittleEndian::read_u16(&source[offset..]) as i32
    }

    #[inline]
    fn store(destination: &mut [u8], offset: usize, value: i32) {
        LittleEndian::write_u16(&mut destination[offset..], value as u16);
    }
}

/// Derived coding parameters for one scan and the per-sample arithmetic that
/// depends on them (ISO/IEC 14495-1, A.2.1 and A.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingTraits {
    pub maximum_sample_value: i32,
    pub near_lossless: i32,
    pub range: i32,
    pub quantized_bits_per_sample: i32,
    pub limit: i32,
    pub reset_threshold: i32,
}

impl CodingTraits {
    pub fn new(maximum_sample_value: i32, near_lossless: i32, reset_threshold: i32) -> Self {
        let range = compute_range_parameter(maximum_sample_value, near_lossless);
        Self {
            maximum_sample_value,
            near_lossless,
            range,
            quantized_bits_per_sample: compute_quantized_bits_per_sample(range),
            limit: compute_limit_parameter(maximum_sample_value),
            reset_threshold,
        }
    }

    #[inline]
    pub fn is_near(&self, lhs: i32, rhs: i32) -> bool {
        (lhs - rhs).abs() <= self.near_lossless
    }

    #[inline]
    pub fn correct_prediction(&self, predicted: i32) -> i32 {
        predicted.clamp(0, self.maximum_sample_value)
    }

    /// Quantizes a prediction error and reduces it modulo RANGE.
    #[inline]
    pub fn compute_error_value(&self, error_value: i32) -> i32 {
        self.modulo_range(self.quantize(error_value))
    }

    #[inline]
    pub fn compute_reconstructed_sample(&self, predicted: i32, error_value: i32) -> i32 {
        self.fix_reconstructed_value(predicted + self.dequantize(error_value))
    }

    #[inline]
    fn quantize(&self, error_value: i32) -> i32 {
        if error_value > 0 {
            (error_value + self.near_lossless) / (2 * self.near_lossless + 1)
        } else {
            -(self.near_lossless - error_value) / (2 * self.near_lossless + 1)
        }
    }

    #[inline]
    fn dequantize(&self, error_value: i32) -> i32 {
        error_value * (2 * self.near_lossless + 1)
    }

    #[inline]
    fn modulo_range(&self, error_value: i32) -> i32 {
        let mut error_value = error_value;
        if error_value < 0 {
            error_value += self.range;
        }
        if error_value >= (self.range + 1) / 2 {
            error_value -= self.range;
        }
        error_value
    }

    #[inline]
    fn fix_reconstructed_value(&self, value: i32) -> i32 {
        let value = if value < -self.near_lossless {
            value + self.range * (2 * self.near_lossless + 1)
        } else if value > self.maximum_sample_value + self.near_lossless {
            value - self.range * (2 * self.near_lossless + 1)
        } else {
            value
        };
        self.correct_prediction(value)
    }
}

/// Returns 0 for non-negative values and -1 for negative values.
#[inline]
pub const fn bit_wise_sign(i: i32) -> i32 {
    i >> 31
}

/// Returns 1 for non-negative values and -1 for negative values.
#[inline]
pub const fn sign(n: i32) -> i32 {
    (n >> 31) | 1
}

/// Negates `i` when `sign` is -1 (as produced by [`bit_wise_sign`]), keeps it when 0.
#[inline]
pub const fn apply_sign(i: i32, sign: i32) -> i32 {
    (sign ^ i) - sign
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_helpers() {
        assert_eq!(bit_wise_sign(5), 0);
        assert_eq!(bit_wise_sign(0), 0);
        assert_eq!(bit_wise_sign(-3), -1);
        assert_eq!(sign(0), 1);
        assert_eq!(sign(7), 1);
        assert_eq!(sign(-7), -1);
        assert_eq!(apply_sign(9, 0), 9);
        assert_eq!(apply_sign(9, -1), -9);
        assert_eq!(apply_sign(-4, -1), 4);
    }

    #[test]
    fn lossless_error_values_wrap_modulo_range() {
        let traits = CodingTraits::new(255, 0, 64);
        assert_eq!(traits.range, 256);
        assert_eq!(traits.compute_error_value(-245), 11);
        assert_eq!(traits.compute_error_value(200), -56);
        assert_eq!(traits.compute_reconstructed_sample(250, 11), 5);
        assert_eq!(traits.compute_reconstructed_sample(10, -56), 210);
    }

    #[test]
    fn near_lossless_reconstruction_stays_within_near() {
        let traits = CodingTraits::new(255, 3, 64);
        for predicted in (0..=255).step_by(17) {
            for x in 0..=255 {
                let error_value = traits.compute_error_value(x - predicted);
                let reconstructed = traits.compute_reconstructed_sample(predicted, error_value);
                assert!((reconstructed - x).abs() <= 3, "x={x} predicted={predicted}");
            }
        }
    }

    #[test]
    fn u16_samples_are_little_endian() {
        let mut buffer = [0u8; 4];
        u16::store(&mut buffer, 2, 0x1234);
        assert_eq!(buffer, [0, 0, 0x34, 0x12]);
        assert_eq!(u16::load(&buffer, 2), 0x1234);
    }

    #[test]
    fn u8_samples_load_and_store() {
        let mut buffer = [0u8; 3];
        u8::store(&mut buffer, 2, 200);
        assert_eq!(u8::load(&buffer, 2), 200);
    }
}
