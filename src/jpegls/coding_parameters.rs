use crate::InterleaveMode;
use crate::constants::{DEFAULT_RESET_THRESHOLD, MAXIMUM_NEAR_LOSSLESS};
use crate::error::JpeglsError;
use std::cmp::{max, min};

/// Scan level coding parameters, as carried by the SOS and DRI segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingParameters {
    /// NEAR: maximum absolute reconstruction error, 0 means lossless.
    pub near_lossless: i32,
    /// Number of lines between restart markers, 0 disables restart markers.
    pub restart_interval: u32,
    pub interleave_mode: InterleaveMode,
}

impl Default for CodingParameters {
    fn default() -> Self {
        Self {
            near_lossless: 0,
            restart_interval: 0,
            interleave_mode: InterleaveMode::None,
        }
    }
}

/// JPEG-LS preset coding parameters (LSE segment type 1).
///
/// A value of zero means "use the default value" for that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JpeglsPcParameters {
    pub maximum_sample_value: i32,
    pub threshold1: i32,
    pub threshold2: i32,
    pub threshold3: i32,
    pub reset_value: i32,
}

// Clamping function as defined by ISO/IEC 14495-1, Figure C.3
const fn clamp(i: i32, j: i32, maximum_sample_value: i32) -> i32 {
    if i > maximum_sample_value || i < j { j } else { i }
}

pub fn compute_maximum_near_lossless(maximum_sample_value: i32) -> i32 {
    debug_assert!(maximum_sample_value >= 1);
    min(MAXIMUM_NEAR_LOSSLESS, maximum_sample_value / 2)
}

pub fn maximum_sample_value(bits_per_sample: i32) -> i32 {
    (1 << bits_per_sample) - 1
}

// Default coding threshold values as defined by ISO/IEC 14495-1, C.2.4.1.1.1
pub fn compute_default(maximum_sample_value: i32, near_lossless: i32) -> JpeglsPcParameters {
    debug_assert!(maximum_sample_value <= u16::MAX as i32);
    debug_assert!(near_lossless >= 0 && near_lossless <= compute_maximum_near_lossless(maximum_sample_value));

    // Default threshold values for JPEG-LS statistical modeling as defined in ISO/IEC 14495-1, table C.3
    // for the case MAXVAL = 255 and NEAR = 0.
    const DEFAULT_THRESHOLD1: i32 = 3; // BASIC_T1
    const DEFAULT_THRESHOLD2: i32 = 7; // BASIC_T2
    const DEFAULT_THRESHOLD3: i32 = 21; // BASIC_T3

    if maximum_sample_value >= 128 {
        let factor = (min(maximum_sample_value, 4095) + 128) / 256;
        let threshold1 = clamp(
            factor * (DEFAULT_THRESHOLD1 - 2) + 2 + 3 * near_lossless,
            near_lossless + 1,
            maximum_sample_value,
        );
        let threshold2 = clamp(
            factor * (DEFAULT_THRESHOLD2 - 3) + 3 + 5 * near_lossless,
            threshold1,
            maximum_sample_value,
        );

        JpeglsPcParameters {
            maximum_sample_value,
            threshold1,
            threshold2,
            threshold3: clamp(
                factor * (DEFAULT_THRESHOLD3 - 4) + 4 + 7 * near_lossless,
                threshold2,
                maximum_sample_value,
            ),
            reset_value: DEFAULT_RESET_THRESHOLD,
        }
    } else {
        let factor = 256 / (maximum_sample_value + 1);
        let threshold1 = clamp(
            max(2, DEFAULT_THRESHOLD1 / factor + 3 * near_lossless),
            near_lossless + 1,
            maximum_sample_value,
        );
        let threshold2 = clamp(
            max(3, DEFAULT_THRESHOLD2 / factor + 5 * near_lossless),
            threshold1,
            maximum_sample_value,
        );

        JpeglsPcParameters {
            maximum_sample_value,
            threshold1,
            threshold2,
            threshold3: clamp(
                max(4, DEFAULT_THRESHOLD3 / factor + 7 * near_lossless),
                threshold2,
                maximum_sample_value,
            ),
            reset_value: DEFAULT_RESET_THRESHOLD,
        }
    }
}

/// True when writing an LSE segment for these parameters would be redundant.
pub fn is_default(preset_coding_parameters: &JpeglsPcParameters, defaults: &JpeglsPcParameters) -> bool {
    if *preset_coding_parameters == JpeglsPcParameters::default() {
        return true;
    }

    preset_coding_parameters == defaults
}

/// Validates preset coding parameters against the frame and fills in the
/// defaults for all zero fields.
pub fn is_valid(
    pc_parameters: &JpeglsPcParameters,
    maximum_component_value: i32,
    near_lossless: i32,
) -> Result<JpeglsPcParameters, JpeglsError> {
    debug_assert!(maximum_component_value >= 3 && maximum_component_value <= u16::MAX as i32);

    // ISO/IEC 14495-1, C.2.4.1.1, Table C.1 defines the valid JPEG-LS preset coding parameters values.
    if pc_parameters.maximum_sample_value != 0
        && (pc_parameters.maximum_sample_value < 1 || pc_parameters.maximum_sample_value > maximum_component_value)
    {
        return Err(JpeglsError::InvalidPresetParameters);
    }

    let maximum_sample_value = if pc_parameters.maximum_sample_value != 0 {
        pc_parameters.maximum_sample_value
    } else {
        maximum_component_value
    };

    if near_lossless > compute_maximum_near_lossless(maximum_sample_value) {
        return Err(JpeglsError::InvalidNearLossless(near_lossless));
    }

    if pc_parameters.threshold1 != 0
        && (pc_parameters.threshold1 < near_lossless + 1 || pc_parameters.threshold1 > maximum_sample_value)
    {
        return Err(JpeglsError::InvalidPresetParameters);
    }

    let defaults = compute_default(maximum_sample_value, near_lossless);

    let threshold1 = if pc_parameters.threshold1 != 0 {
        pc_parameters.threshold1
    } else {
        defaults.threshold1
    };

    if pc_parameters.threshold2 != 0
        && (pc_parameters.threshold2 < threshold1 || pc_parameters.threshold2 > maximum_sample_value)
    {
        return Err(JpeglsError::InvalidPresetParameters);
    }

    let threshold2 = if pc_parameters.threshold2 != 0 {
        pc_parameters.threshold2
    } else {
        defaults.threshold2
    };

    if pc_parameters.threshold3 != 0
        && (pc_parameters.threshold3 < threshold2 || pc_parameters.threshold3 > maximum_sample_value)
    {
        return Err(JpeglsError::InvalidPresetParameters);
    }

    if pc_parameters.reset_value != 0
        && (pc_parameters.reset_value < 3 || pc_parameters.reset_value > max(255, maximum_sample_value))
    {
        return Err(JpeglsError::InvalidPresetParameters);
    }

    Ok(JpeglsPcParameters {
        maximum_sample_value,
        threshold1,
        threshold2,
        threshold3: if pc_parameters.threshold3 != 0 {
            pc_parameters.threshold3
        } else {
            defaults.threshold3
        },
        reset_value: if pc_parameters.reset_value != 0 {
            pc_parameters.reset_value
        } else {
            defaults.reset_value
        },
    })
}

// LIMIT as defined by ISO/IEC 14495-1, A.2.1, with bpp = max(2, ceil(log2(MAXVAL + 1))).
pub fn compute_limit_parameter(maximum_sample_value: i32) -> i32 {
    let bits_per_sample = max(2, bit_count(maximum_sample_value));
    2 * (bits_per_sample + max(8, bits_per_sample))
}

// RANGE as defined by ISO/IEC 14495-1, A.2.1.
pub fn compute_range_parameter(maximum_sample_value: i32, near_lossless: i32) -> i32 {
    (maximum_sample_value + 2 * near_lossless) / (2 * near_lossless + 1) + 1
}

// qbpp = ceil(log2(RANGE)).
pub fn compute_quantized_bits_per_sample(range: i32) -> i32 {
    bit_count(range - 1)
}

// Number of bits needed to represent `value` (ceil(log2(value + 1))).
fn bit_count(value: i32) -> i32 {
    (32 - (value as u32).leading_zeros()) as i32
}
