use thiserror::Error;

/// Errors reported by the JPEG-LS encoder and decoder.
///
/// Every failure is reported at the point where it is detected; the codec
/// never returns a partially written stream or a partially decoded image.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpeglsError {
    /// Width or height is zero or larger than 65535, or the bits per sample
    /// value is outside 2..=16.
    #[error("Invalid dimensions or bits per sample")]
    InvalidDimensions,

    #[error("Unsupported component count {0}")]
    UnsupportedComponentCount(i32),

    /// The byte stream is not a valid JPEG-LS stream: a marker is missing or
    /// out of order, the data is truncated or a header field is out of range.
    #[error("Malformed stream: {0}")]
    MalformedStream(&'static str),

    /// The stream is well formed but uses a feature this codec does not
    /// implement.
    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(&'static str),

    /// A Golomb-Rice unary prefix was longer than the coding limit allows.
    #[error("Golomb code prefix exceeds the coding limit")]
    DecodeOverrun,

    #[error("Invalid near lossless value {0}")]
    InvalidNearLossless(i32),

    #[error("Invalid JPEG-LS preset coding parameters")]
    InvalidPresetParameters,

    #[error("Invalid buffer size: expected at least {expected} bytes, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    #[error("Invalid stride")]
    InvalidStride,

    /// A sample of the image is larger than the maximum sample value the
    /// stream is encoded with.
    #[error("Sample value {value} exceeds the maximum sample value {maximum}")]
    SampleOutOfRange { value: i32, maximum: i32 },
}
