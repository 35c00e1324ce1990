pub const DEFAULT_RESET_THRESHOLD: i32 = 64; // Default RESET value as defined in ISO/IEC 14495-1, table C.2

pub const MINIMUM_COMPONENT_COUNT: i32 = 1;
pub const MAXIMUM_COMPONENT_COUNT: i32 = 255;
pub const MAXIMUM_COMPONENT_COUNT_IN_SCAN: i32 = 4;
pub const MINIMUM_BITS_PER_SAMPLE: i32 = 2;
pub const MAXIMUM_BITS_PER_SAMPLE: i32 = 16;
pub const MAXIMUM_NEAR_LOSSLESS: i32 = 255;
pub const MAXIMUM_DIMENSION: u32 = u16::MAX as u32;

pub const MAX_K_VALUE: i32 = 16; // This is an implementation limit (theoretical limit is 32)

// Number of stored regular mode contexts: (9 * 9 * 9 + 1) / 2, see ISO/IEC 14495-1, A.3.4.
pub const REGULAR_CONTEXT_COUNT: usize = 365;

// Maximum and minimum bias correction values, ISO/IEC 14495-1, A.6.2.
pub const MAX_C: i32 = 127;
pub const MIN_C: i32 = -128;

// Statistics beyond this value can only come from corrupt entropy data.
pub const MAX_CONTEXT_STATISTIC: i32 = 65536 * 256;

// Run length order table as defined in ISO/IEC 14495-1, A.7.1.2.
pub const J: [i32; 32] = [
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];
