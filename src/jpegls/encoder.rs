use crate::InterleaveMode;
use crate::constants::MAXIMUM_COMPONENT_COUNT_IN_SCAN;
use crate::error::JpeglsError;
use crate::image::Image;
use crate::jpeg_stream_writer::JpegStreamWriter;
use crate::jpegls::coding_parameters::{compute_default, is_default, is_valid, maximum_sample_value};
use crate::jpegls::scan_encoder::ScanEncoder;
use crate::jpegls::{CodingParameters, JpeglsPcParameters};

/// Encodes [`Image`]s into JPEG-LS streams.
///
/// ```
/// use jpegls_rs::{FrameInfo, Image, InterleaveMode, JpeglsEncoder, SampleLayout};
///
/// let frame_info = FrameInfo { width: 4, height: 2, bits_per_sample: 8, component_count: 1 };
/// let image = Image::new(frame_info, SampleLayout::Planar, vec![7; 8]).unwrap();
///
/// let mut encoder = JpeglsEncoder::new();
/// encoder.set_near_lossless(0).unwrap();
/// encoder.set_interleave_mode(InterleaveMode::None);
/// let stream = encoder.encode(&image).unwrap();
/// assert_eq!(&stream[..2], &[0xFF, 0xD8]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JpeglsEncoder {
    coding_parameters: CodingParameters,
    pc_parameters: JpeglsPcParameters,
}

impl JpeglsEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets NEAR. The upper bound depends on the sample depth and is checked
    /// by [`encode`](Self::encode).
    pub fn set_near_lossless(&mut self, near_lossless: i32) -> Result<(), JpeglsError> {
        if near_lossless < 0 || near_lossless > crate::constants::MAXIMUM_NEAR_LOSSLESS {
            return Err(JpeglsError::InvalidNearLossless(near_lossless));
        }
        self.coding_parameters.near_lossless = near_lossless;
        Ok(())
    }

    pub fn set_interleave_mode(&mut self, interleave_mode: InterleaveMode) {
        self.coding_parameters.interleave_mode = interleave_mode;
    }

    /// Number of lines between restart markers; 0 disables them.
    pub fn set_restart_interval(&mut self, restart_interval: u32) -> Result<(), JpeglsError> {
        if restart_interval > u16::MAX as u32 {
            return Err(JpeglsError::UnsupportedParameter("restart interval larger than 65535"));
        }
        self.coding_parameters.restart_interval = restart_interval;
        Ok(())
    }

    /// Zero fields select the default value for that field.
    pub fn set_preset_coding_parameters(&mut self, pc_parameters: JpeglsPcParameters) {
        self.pc_parameters = pc_parameters;
    }

    pub fn encode(&self, image: &Image) -> Result<Vec<u8>, JpeglsError> {
        let frame_info = *image.frame_info();
        frame_info.validate()?;

        let mut coding_parameters = self.coding_parameters;
        if frame_info.component_count == 1 {
            coding_parameters.interleave_mode = InterleaveMode::None;
        }
        if coding_parameters.interleave_mode != InterleaveMode::None
            && frame_info.component_count > MAXIMUM_COMPONENT_COUNT_IN_SCAN
        {
            return Err(JpeglsError::UnsupportedComponentCount(frame_info.component_count));
        }

        let maximum_sample_value = maximum_sample_value(frame_info.bits_per_sample);
        let validated_pc = is_valid(&self.pc_parameters, maximum_sample_value, coding_parameters.near_lossless)?;

        let largest_sample = image.max_sample_value() as i32;
        if largest_sample > validated_pc.maximum_sample_value {
            return Err(JpeglsError::SampleOutOfRange {
                value: largest_sample,
                maximum: validated_pc.maximum_sample_value,
            });
        }

        log::debug!(
            "encoding {}x{}, {} bits, {} components, near {}, {:?}",
            frame_info.width,
            frame_info.height,
            frame_info.bits_per_sample,
            frame_info.component_count,
            coding_parameters.near_lossless,
            coding_parameters.interleave_mode
        );

        let mut writer = JpegStreamWriter::new();
        writer.write_start_of_image();
        writer.write_start_of_frame_jpegls(&frame_info);

        if !is_default(
            &self.pc_parameters,
            &compute_default(maximum_sample_value, coding_parameters.near_lossless),
        ) {
            writer.write_jpegls_preset_parameters_segment(&self.pc_parameters);
        }

        if coding_parameters.restart_interval != 0 {
            writer.write_define_restart_interval(coding_parameters.restart_interval as u16);
        }

        if coding_parameters.interleave_mode == InterleaveMode::None {
            for component in 0..frame_info.component_count as usize {
                writer.write_start_of_scan_segment(
                    component as u8 + 1,
                    1,
                    coding_parameters.near_lossless,
                    InterleaveMode::None,
                );
                ScanEncoder::new(&frame_info, &validated_pc, &coding_parameters, 1, writer.destination_mut())
                    .encode_scan(image, component)?;
            }
        } else {
            let component_count = frame_info.component_count as usize;
            writer.write_start_of_scan_segment(
                1,
                component_count,
                coding_parameters.near_lossless,
                coding_parameters.interleave_mode,
            );
            ScanEncoder::new(
                &frame_info,
                &validated_pc,
                &coding_parameters,
                component_count,
                writer.destination_mut(),
            )
            .encode_scan(image, 0)?;
        }

        writer.write_end_of_image();
        log::debug!("encoded stream: {} bytes", writer.len());
        Ok(writer.into_bytes())
    }
}
