use crate::FrameInfo;
use crate::InterleaveMode;
use crate::constants::MAXIMUM_COMPONENT_COUNT_IN_SCAN;
use crate::error::JpeglsError;
use crate::image::Image;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JPEG_RESTART_MARKER_BASE, JPEG_RESTART_MARKER_RANGE};
use crate::jpegls::bit_reader::BitReader;
use crate::jpegls::coding_parameters::{CodingParameters, JpeglsPcParameters};
use crate::jpegls::golomb::{decode_mapped_value, unmap_error_value};
use crate::jpegls::line_buffer::LineBuffer;
use crate::jpegls::predictor::predict;
use crate::jpegls::run_mode::PixelMode;
use crate::jpegls::scan_context::ScanContext;
use crate::jpegls::traits::{apply_sign, bit_wise_sign, sign};
use std::ops::Range;

/// Decodes the entropy coded segment(s) of one scan; the exact mirror of
/// [`ScanEncoder`](crate::jpegls::scan_encoder::ScanEncoder).
pub struct ScanDecoder<'a> {
    context: ScanContext,
    reader: BitReader<'a>,
    width: usize,
    height: usize,
    lane_count: usize,
    interleave_mode: InterleaveMode,
    restart_interval: u32,
}

impl<'a> ScanDecoder<'a> {
    /// `position` is the offset of the first entropy coded byte in `source`.
    pub fn new(
        frame_info: &FrameInfo,
        pc_parameters: &JpeglsPcParameters,
        coding_parameters: &CodingParameters,
        lane_count: usize,
        source: &'a [u8],
        position: usize,
    ) -> Self {
        debug_assert!(lane_count >= 1 && lane_count <= MAXIMUM_COMPONENT_COUNT_IN_SCAN as usize);
        Self {
            context: ScanContext::new(pc_parameters, coding_parameters.near_lossless, lane_count),
            reader: BitReader::new(source, position),
            width: frame_info.width as usize,
            height: frame_info.height as usize,
            lane_count,
            interleave_mode: coding_parameters.interleave_mode,
            restart_interval: coding_parameters.restart_interval,
        }
    }

    /// Decodes into components `first_component..first_component + lane_count`
    /// of `image` and returns the offset of the marker that ends the scan.
    pub fn decode_scan(&mut self, image: &mut Image, first_component: usize) -> Result<usize, JpeglsError> {
        log::debug!(
            "decoding scan: components {}..{}, {}x{}, near {}, {:?}",
            first_component,
            first_component + self.lane_count,
            self.width,
            self.height,
            self.context.traits.near_lossless,
            self.interleave_mode
        );

        let mut line_buffer = LineBuffer::new(self.width, self.lane_count);
        let lane_stride = line_buffer.lane_stride();
        let mut restart_index = 0;

        for y in 0..self.height {
            if self.restart_interval != 0 && y != 0 && y % self.restart_interval as usize == 0 {
                self.process_restart_marker(restart_index)?;
                restart_index += 1;
                self.context.reset();
                line_buffer.reset();
            }

            line_buffer.start_line();
            let (previous, current) = line_buffer.lines_mut();
            if self.interleave_mode == InterleaveMode::Sample {
                self.decode_lanes(previous, current, lane_stride, 0..self.lane_count, 0)?;
            } else {
                for lane in 0..self.lane_count {
                    self.decode_lanes(previous, current, lane_stride, lane..lane + 1, lane)?;
                }
            }

            for lane in 0..self.lane_count {
                image.write_line(first_component + lane, y, line_buffer.current_samples(lane));
            }
            line_buffer.end_line();
        }

        self.reader.end_of_data()
    }

    fn process_restart_marker(&mut self, restart_index: u32) -> Result<(), JpeglsError> {
        let position = self.reader.end_of_data()?;
        let source = self.reader.source();
        let expected = JPEG_RESTART_MARKER_BASE + (restart_index % JPEG_RESTART_MARKER_RANGE as u32) as u8;
        if source[position] != JPEG_MARKER_START_BYTE || source[position + 1] != expected {
            return Err(JpeglsError::MalformedStream("restart marker missing or out of sequence"));
        }

        log::trace!("restart marker {} at offset {}", expected - JPEG_RESTART_MARKER_BASE, position);
        self.reader.restart(position + 2);
        Ok(())
    }

    fn decode_lanes(
        &mut self,
        previous: &[i32],
        current: &mut [i32],
        lane_stride: usize,
        lanes: Range<usize>,
        run_lane: usize,
    ) -> Result<(), JpeglsError> {
        let mut context_ids = [0; MAXIMUM_COMPONENT_COUNT_IN_SCAN as usize];
        let mut index = 1;

        while index <= self.width {
            let mut mode = PixelMode::Run;
            for (i, lane) in lanes.clone().enumerate() {
                let position = lane * lane_stride + index;
                context_ids[i] = self.context.quantizer.context_id(
                    current[position - 1],
                    previous[position],
                    previous[position - 1],
                    previous[position + 1],
                );
                if PixelMode::for_context_id(context_ids[i]) == PixelMode::Regular {
                    mode = PixelMode::Regular;
                }
            }

            match mode {
                PixelMode::Regular => {
                    for (i, lane) in lanes.clone().enumerate() {
                        let position = lane * lane_stride + index;
                        let predicted = predict(current[position - 1], previous[position], previous[position - 1]);
                        current[position] = self.decode_regular(context_ids[i], predicted)?;
                    }
                    index += 1;
                }
                PixelMode::Run => {
                    index += self.decode_run_mode(previous, current, lane_stride, lanes.clone(), run_lane, index)?;
                }
            }
        }
        Ok(())
    }

    fn decode_regular(&mut self, context_id: i32, predicted: i32) -> Result<i32, JpeglsError> {
        let traits = self.context.traits;
        let sign = bit_wise_sign(context_id);
        let context = &mut self.context.regular_mode_contexts[apply_sign(context_id, sign) as usize];

        let k = context.compute_golomb_coding_parameter()?;
        let predicted_value = traits.correct_prediction(predicted + apply_sign(context.c(), sign));

        let mut error_value = unmap_error_value(decode_mapped_value(
            &mut self.reader,
            k,
            traits.limit,
            traits.quantized_bits_per_sample,
        )?);
        if k == 0 {
            error_value ^= context.get_error_correction(traits.near_lossless);
        }
        context.update_variables_and_bias(error_value, traits.near_lossless, traits.reset_threshold)?;

        Ok(traits.compute_reconstructed_sample(predicted_value, apply_sign(error_value, sign)))
    }

    fn decode_run_mode(
        &mut self,
        previous: &[i32],
        current: &mut [i32],
        lane_stride: usize,
        lanes: Range<usize>,
        run_lane: usize,
        start: usize,
    ) -> Result<usize, JpeglsError> {
        let remaining = self.width + 1 - start;
        let run_length = self.decode_run_pixels(remaining, run_lane)?;

        for lane in lanes.clone() {
            let base = lane * lane_stride + start;
            let ra = current[base - 1];
            current[base..base + run_length].fill(ra);
        }

        if run_length == remaining {
            return Ok(run_length);
        }

        let traits = self.context.traits;
        let index = start + run_length;
        if lanes.len() == 1 {
            let position = lanes.start * lane_stride + index;
            current[position] = self.decode_run_interruption_pixel(
                current[lanes.start * lane_stride + start - 1],
                previous[position],
                run_lane,
            )?;
        } else {
            for lane in lanes {
                let position = lane * lane_stride + index;
                let ra = current[lane * lane_stride + start - 1];
                let rb = previous[position];
                let error_value = self.decode_run_interruption_error(0, run_lane)?;
                current[position] = traits.compute_reconstructed_sample(rb, error_value * sign(rb - ra));
            }
        }

        self.context.run_index[run_lane].decrement();
        Ok(run_length + 1)
    }

    fn decode_run_pixels(&mut self, pixel_count: usize, run_lane: usize) -> Result<usize, JpeglsError> {
        let mut index = 0;
        while self.reader.read_bit()? {
            let run_index = &mut self.context.run_index[run_lane];
            let count = run_index.run_length().min(pixel_count - index);
            index += count;
            if count == run_index.run_length() {
                run_index.increment();
            }
            if index == pixel_count {
                break;
            }
        }

        if index != pixel_count {
            // Interrupted run: the remainder follows the terminating 0 bit.
            index += self.reader.read_value(self.context.run_index[run_lane].j())? as usize;
        }

        if index > pixel_count {
            return Err(JpeglsError::MalformedStream("run length exceeds the line"));
        }
        Ok(index)
    }

    fn decode_run_interruption_pixel(&mut self, ra: i32, rb: i32, run_lane: usize) -> Result<i32, JpeglsError> {
        let traits = self.context.traits;
        if traits.is_near(ra, rb) {
            let error_value = self.decode_run_interruption_error(1, run_lane)?;
            return Ok(traits.compute_reconstructed_sample(ra, error_value));
        }

        let error_value = self.decode_run_interruption_error(0, run_lane)?;
        Ok(traits.compute_reconstructed_sample(rb, error_value * sign(rb - ra)))
    }

    fn decode_run_interruption_error(&mut self, run_interruption_type: usize, run_lane: usize) -> Result<i32, JpeglsError> {
        let traits = self.context.traits;
        let limit = traits.limit - self.context.run_index[run_lane].j() - 1;
        let context = &mut self.context.run_mode_contexts[run_interruption_type];

        let k = context.compute_golomb_coding_parameter()?;
        let e_mapped_error_value =
            decode_mapped_value(&mut self.reader, k, limit, traits.quantized_bits_per_sample)?;
        let error_value =
            context.decode_error_value(e_mapped_error_value + context.run_interruption_type(), k);
        context.update_variables(error_value, e_mapped_error_value, traits.reset_threshold);
        Ok(error_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::SampleLayout;
    use crate::jpegls::coding_parameters::compute_default;
    use crate::jpegls::scan_encoder::ScanEncoder;

    fn round_trip(image: &Image, coding_parameters: CodingParameters) -> Image {
        let frame_info = *image.frame_info();
        let pc_parameters = compute_default(
            (1 << frame_info.bits_per_sample) - 1,
            coding_parameters.near_lossless,
        );
        let lane_count = frame_info.component_count as usize;

        let mut encoded = Vec::new();
        ScanEncoder::new(&frame_info, &pc_parameters, &coding_parameters, lane_count, &mut encoded)
            .encode_scan(image, 0)
            .unwrap();
        let end = encoded.len();
        encoded.extend_from_slice(&[0xFF, 0xD9]);

        let mut decoded = Image::zeroed(frame_info, image.layout()).unwrap();
        let marker = ScanDecoder::new(&frame_info, &pc_parameters, &coding_parameters, lane_count, &encoded, 0)
            .decode_scan(&mut decoded, 0)
            .unwrap();
        assert_eq!(marker, end);
        decoded
    }

    fn test_image(frame_info: FrameInfo) -> Image {
        let mut image = Image::zeroed(frame_info, SampleLayout::Interleaved).unwrap();
        let maximum = (1u32 << frame_info.bits_per_sample) - 1;
        for c in 0..frame_info.component_count as usize {
            for y in 0..frame_info.height as usize {
                for x in 0..frame_info.width as usize {
                    // Smooth areas with flat runs and some texture.
                    let value = if (x / 8 + y / 8) % 3 == 0 {
                        (c * 40) as u32
                    } else {
                        ((x * x + 3 * y + 7 * c) as u32).wrapping_mul(2654435761) >> 7
                    };
                    image.set_sample(c, x, y, (value % (maximum + 1)) as u16);
                }
            }
        }
        image
    }

    #[test]
    fn single_component_lossless() {
        let image = test_image(FrameInfo {
            width: 37,
            height: 19,
            bits_per_sample: 8,
            component_count: 1,
        });
        assert_eq!(round_trip(&image, CodingParameters::default()), image);
    }

    #[test]
    fn sample_interleaved_lossless() {
        let image = test_image(FrameInfo {
            width: 33,
            height: 17,
            bits_per_sample: 8,
            component_count: 3,
        });
        let coding_parameters = CodingParameters {
            interleave_mode: InterleaveMode::Sample,
            ..Default::default()
        };
        assert_eq!(round_trip(&image, coding_parameters), image);
    }

    #[test]
    fn line_interleaved_with_restart_markers() {
        let image = test_image(FrameInfo {
            width: 20,
            height: 23,
            bits_per_sample: 10,
            component_count: 2,
        });
        let coding_parameters = CodingParameters {
            interleave_mode: InterleaveMode::Line,
            restart_interval: 4,
            ..Default::default()
        };
        assert_eq!(round_trip(&image, coding_parameters), image);
    }

    #[test]
    fn near_lossless_stays_within_bound() {
        let image = test_image(FrameInfo {
            width: 40,
            height: 12,
            bits_per_sample: 8,
            component_count: 1,
        });
        let coding_parameters = CodingParameters {
            near_lossless: 3,
            ..Default::default()
        };
        let decoded = round_trip(&image, coding_parameters);
        for y in 0..12 {
            for x in 0..40 {
                let difference = decoded.sample(0, x, y) as i32 - image.sample(0, x, y) as i32;
                assert!(difference.abs() <= 3);
            }
        }
    }
}
