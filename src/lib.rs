//! Lossless and near-lossless JPEG-LS (ISO/IEC 14495-1 / ITU-T T.87) codec.
//!
//! ```
//! use jpegls_rs::{FrameInfo, Image, InterleaveMode, SampleLayout};
//!
//! let frame_info = FrameInfo { width: 16, height: 16, bits_per_sample: 8, component_count: 1 };
//! let data = (0..256).map(|i| i as u8).collect();
//! let image = Image::new(frame_info, SampleLayout::Planar, data).unwrap();
//!
//! let stream = jpegls_rs::encode(&image, 0, InterleaveMode::None).unwrap();
//! assert_eq!(jpegls_rs::read_header(&stream).unwrap().frame_info, frame_info);
//! assert_eq!(jpegls_rs::decode(&stream).unwrap(), image);
//! ```

pub mod constants;
pub mod error;
pub mod image;
pub mod jpeg_marker_code;
pub mod jpeg_stream_reader;
pub mod jpeg_stream_writer;
pub mod jpegls;

pub use error::JpeglsError;
pub use image::{Image, SampleLayout};
pub use jpegls::{CodingParameters, JpeglsDecoder, JpeglsEncoder, JpeglsPcParameters};

use constants::{
    MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT, MAXIMUM_DIMENSION, MINIMUM_BITS_PER_SAMPLE,
    MINIMUM_COMPONENT_COUNT,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Order in which the components of a multi-component image are coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum InterleaveMode {
    /// One scan per component.
    None = 0,
    /// One scan; each line of every component in turn.
    Line = 1,
    /// One scan; all components of a pixel in turn.
    Sample = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: i32,
    pub component_count: i32,
}

impl FrameInfo {
    pub fn validate(&self) -> Result<(), JpeglsError> {
        if self.width == 0
            || self.height == 0
            || self.width > MAXIMUM_DIMENSION
            || self.height > MAXIMUM_DIMENSION
            || !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&self.bits_per_sample)
        {
            return Err(JpeglsError::InvalidDimensions);
        }
        if !(MINIMUM_COMPONENT_COUNT..=MAXIMUM_COMPONENT_COUNT).contains(&self.component_count) {
            return Err(JpeglsError::UnsupportedComponentCount(self.component_count));
        }
        Ok(())
    }

    /// Bytes used by one sample in an [`Image`] buffer.
    pub fn bytes_per_sample(&self) -> usize {
        if self.bits_per_sample <= 8 { 1 } else { 2 }
    }

    pub fn maximum_sample_value(&self) -> i32 {
        jpegls::coding_parameters::maximum_sample_value(self.bits_per_sample)
    }
}

/// Header fields of a JPEG-LS stream, taken from SOF, LSE, DRI and the first SOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    pub frame_info: FrameInfo,
    pub coding_parameters: CodingParameters,
    /// As stored in the stream; zero fields (or no LSE segment) mean defaults.
    pub preset_coding_parameters: JpeglsPcParameters,
}

/// Encodes `image` with default preset parameters and no restart markers.
pub fn encode(image: &Image, near_lossless: i32, interleave_mode: InterleaveMode) -> Result<Vec<u8>, JpeglsError> {
    let mut encoder = JpeglsEncoder::new();
    encoder.set_near_lossless(near_lossless)?;
    encoder.set_interleave_mode(interleave_mode);
    encoder.encode(image)
}

pub fn decode(stream: &[u8]) -> Result<Image, JpeglsError> {
    JpeglsDecoder::new(stream).decode()
}

pub fn read_header(stream: &[u8]) -> Result<HeaderInfo, JpeglsError> {
    let mut decoder = JpeglsDecoder::new(stream);
    decoder.read_header()?;
    Ok(HeaderInfo {
        frame_info: decoder.frame_info(),
        coding_parameters: decoder.coding_parameters(),
        preset_coding_parameters: decoder.preset_coding_parameters(),
    })
}
