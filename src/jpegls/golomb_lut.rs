/// Decoded Golomb-Rice code found in the first byte of the bit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GolombCodeMatch {
    pub mapped_value: i16,
    /// Total length of the code, 0 when the code does not fit in 8 bits.
    pub bit_count: i8,
}

// A code of length unary + 1 + k only fits in a byte for k < 8.
pub const GOLOMB_LUT_K_COUNT: usize = 8;

const fn countl_zero_u8(mut x: u8) -> i8 {
    if x == 0 {
        return 8;
    }
    let mut count = 0;
    while (x & 0x80) == 0 {
        x <<= 1;
        count += 1;
    }
    count
}

/// Lookup table indexed by `[k][next 8 bits]`.
pub const GOLOMB_LUT: [[GolombCodeMatch; 256]; GOLOMB_LUT_K_COUNT] = {
    let mut lut = [[GolombCodeMatch {
        mapped_value: 0,
        bit_count: 0,
    }; 256]; GOLOMB_LUT_K_COUNT];
    let mut k: usize = 0;
    while k < GOLOMB_LUT_K_COUNT {
        let mut value: usize = 0;
        while value < 256 {
            let unary_length = countl_zero_u8(value as u8);
            let length = unary_length + k as i8 + 1;

            if length <= 8 {
                let shift = 8 - length;
                let remainder = (value >> shift) & ((1 << k) - 1);
                lut[k][value] = GolombCodeMatch {
                    mapped_value: ((unary_length as i16) << k) + remainder as i16,
                    bit_count: length,
                };
            }
            value += 1;
        }
        k += 1;
    }
    lut
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k0_codes_are_pure_unary() {
        assert_eq!(GOLOMB_LUT[0][0b1000_0000], GolombCodeMatch { mapped_value: 0, bit_count: 1 });
        assert_eq!(GOLOMB_LUT[0][0b0001_0000], GolombCodeMatch { mapped_value: 3, bit_count: 4 });
        assert_eq!(GOLOMB_LUT[0][0].bit_count, 0);
    }

    #[test]
    fn remainder_bits_follow_the_unary_prefix() {
        // 01 followed by k = 3 bits 101: (1 << 3) + 5
        assert_eq!(GOLOMB_LUT[3][0b0110_1000], GolombCodeMatch { mapped_value: 13, bit_count: 5 });
        // Too long for one byte.
        assert_eq!(GOLOMB_LUT[7][0b0100_0000].bit_count, 0);
    }
}
