use crate::FrameInfo;
use crate::InterleaveMode;
use crate::constants::MAXIMUM_COMPONENT_COUNT_IN_SCAN;
use crate::error::JpeglsError;
use crate::image::Image;
use crate::jpegls::bit_writer::BitWriter;
use crate::jpegls::coding_parameters::{CodingParameters, JpeglsPcParameters};
use crate::jpegls::golomb::{encode_mapped_value, map_error_value};
use crate::jpegls::line_buffer::LineBuffer;
use crate::jpegls::predictor::predict;
use crate::jpegls::run_mode::PixelMode;
use crate::jpegls::scan_context::ScanContext;
use crate::jpegls::traits::{apply_sign, bit_wise_sign, sign};
use std::ops::Range;

/// Encodes the entropy coded segment(s) of one scan.
///
/// A scan covers one component (interleave mode none) or all components of
/// the frame (line and sample interleave). Restart markers are written
/// between restart intervals.
pub struct ScanEncoder<'a> {
    context: ScanContext,
    writer: BitWriter<'a>,
    width: usize,
    height: usize,
    lane_count: usize,
    interleave_mode: InterleaveMode,
    restart_interval: u32,
}

impl<'a> ScanEncoder<'a> {
    /// `pc_parameters` must be validated; `lane_count` is the number of
    /// components coded in this scan.
    pub fn new(
        frame_info: &FrameInfo,
        pc_parameters: &JpeglsPcParameters,
        coding_parameters: &CodingParameters,
        lane_count: usize,
        destination: &'a mut Vec<u8>,
    ) -> Self {
        debug_assert!(lane_count >= 1 && lane_count <= MAXIMUM_COMPONENT_COUNT_IN_SCAN as usize);
        Self {
            context: ScanContext::new(pc_parameters, coding_parameters.near_lossless, lane_count),
            writer: BitWriter::new(destination),
            width: frame_info.width as usize,
            height: frame_info.height as usize,
            lane_count,
            interleave_mode: coding_parameters.interleave_mode,
            restart_interval: coding_parameters.restart_interval,
        }
    }

    /// Encodes components `first_component..first_component + lane_count`
    /// of `image` and pads the final byte.
    pub fn encode_scan(&mut self, image: &Image, first_component: usize) -> Result<(), JpeglsError> {
        log::debug!(
            "encoding scan: components {}..{}, {}x{}, near {}, {:?}",
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
                log::trace!("restart marker {} before line {}", restart_index % 8, y);
                self.writer.write_restart_marker(restart_index);
                restart_index += 1;
                self.context.reset();
                line_buffer.reset();
            }

            line_buffer.start_line();
            for lane in 0..self.lane_count {
                image.read_line(first_component + lane, y, line_buffer.current_samples_mut(lane));
            }

            let (previous, current) = line_buffer.lines_mut();
            if self.interleave_mode == InterleaveMode::Sample {
                self.encode_lanes(previous, current, lane_stride, 0..self.lane_count, 0)?;
            } else {
                for lane in 0..self.lane_count {
                    self.encode_lanes(previous, current, lane_stride, lane..lane + 1, lane)?;
                }
            }
            line_buffer.end_line();
        }

        self.writer.end_scan();
        Ok(())
    }

    // Codes one line of every lane in `lanes`, pixel by pixel. Slot `index`
    // of a lane holds column `index - 1`.
    fn encode_lanes(
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
                        current[position] = self.encode_regular(context_ids[i], current[position], predicted)?;
                    }
                    index += 1;
                }
                PixelMode::Run => {
                    index += self.encode_run_mode(previous, current, lane_stride, lanes.clone(), run_lane, index)?;
                }
            }
        }
        Ok(())
    }

    fn encode_regular(&mut self, context_id: i32, x: i32, predicted: i32) -> Result<i32, JpeglsError> {
        let traits = self.context.traits;
        let sign = bit_wise_sign(context_id);
        let context = &mut self.context.regular_mode_contexts[apply_sign(context_id, sign) as usize];

        let k = context.compute_golomb_coding_parameter()?;
        let predicted_value = traits.correct_prediction(predicted + apply_sign(context.c(), sign));
        let error_value = traits.compute_error_value(apply_sign(x - predicted_value, sign));

        encode_mapped_value(
            &mut self.writer,
            k,
            map_error_value(context.get_error_correction(k | traits.near_lossless) ^ error_value),
            traits.limit,
            traits.quantized_bits_per_sample,
        );
        context.update_variables_and_bias(error_value, traits.near_lossless, traits.reset_threshold)?;

        let reconstructed = traits.compute_reconstructed_sample(predicted_value, apply_sign(error_value, sign));
        debug_assert!(traits.is_near(reconstructed, x));
        Ok(reconstructed)
    }

    // Returns the number of pixels consumed, including the interruption pixel.
    fn encode_run_mode(
        &mut self,
        previous: &[i32],
        current: &mut [i32],
        lane_stride: usize,
        lanes: Range<usize>,
        run_lane: usize,
        start: usize,
    ) -> Result<usize, JpeglsError> {
        let traits = self.context.traits;
        let remaining = self.width + 1 - start;

        let mut run_length = 0;
        while run_length < remaining
            && lanes.clone().all(|lane| {
                let base = lane * lane_stride + start;
                traits.is_near(current[base + run_length], current[base - 1])
            })
        {
            for lane in lanes.clone() {
                let base = lane * lane_stride + start;
                current[base + run_length] = current[base - 1];
            }
            run_length += 1;
        }

        let end_of_line = run_length == remaining;
        self.encode_run_pixels(run_length, end_of_line, run_lane);
        if end_of_line {
            return Ok(run_length);
        }

        let index = start + run_length;
        if lanes.len() == 1 {
            let position = lanes.start * lane_stride + index;
            current[position] = self.encode_run_interruption_pixel(
                current[position],
                current[lanes.start * lane_stride + start - 1],
                previous[position],
                run_lane,
            )?;
        } else {
            for lane in lanes {
                let position = lane * lane_stride + index;
                let ra = current[lane * lane_stride + start - 1];
                let rb = previous[position];
                let sign = sign(rb - ra);
                let error_value = traits.compute_error_value(sign * (current[position] - rb));
                self.encode_run_interruption_error(0, error_value, run_lane)?;
                current[position] = traits.compute_reconstructed_sample(rb, error_value * sign);
            }
        }

        self.context.run_index[run_lane].decrement();
        Ok(run_length + 1)
    }

    fn encode_run_pixels(&mut self, run_length: usize, end_of_line: bool, run_lane: usize) {
        let mut run_length = run_length;
        let run_index = &mut self.context.run_index[run_lane];

        while run_length >= run_index.run_length() {
            self.writer.append(1, 1);
            run_length -= run_index.run_length();
            run_index.increment();
        }

        if end_of_line {
            if run_length != 0 {
                self.writer.append(1, 1);
            }
        } else {
            // Leading 0 bit followed by the remaining length.
            self.writer.append(run_length as u32, run_index.j() + 1);
        }
    }

    fn encode_run_interruption_pixel(&mut self, x: i32, ra: i32, rb: i32, run_lane: usize) -> Result<i32, JpeglsError> {
        let traits = self.context.traits;
        if traits.is_near(ra, rb) {
            let error_value = traits.compute_error_value(x - ra);
            self.encode_run_interruption_error(1, error_value, run_lane)?;
            return Ok(traits.compute_reconstructed_sample(ra, error_value));
        }

        let sign = sign(rb - ra);
        let error_value = traits.compute_error_value((x - rb) * sign);
        self.encode_run_interruption_error(0, error_value, run_lane)?;
        Ok(traits.compute_reconstructed_sample(rb, error_value * sign))
    }

    fn encode_run_interruption_error(
        &mut self,
        run_interruption_type: usize,
        error_value: i32,
        run_lane: usize,
    ) -> Result<(), JpeglsError> {
        let traits = self.context.traits;
        let limit = traits.limit - self.context.run_index[run_lane].j() - 1;
        let context = &mut self.context.run_mode_contexts[run_interruption_type];

        let k = context.compute_golomb_coding_parameter()?;
        let e_mapped_error_value = context.compute_mapped_error_value(error_value, k);
        encode_mapped_value(
            &mut self.writer,
            k,
            e_mapped_error_value,
            limit,
            traits.quantized_bits_per_sample,
        );
        context.update_variables(error_value, e_mapped_error_value, traits.reset_threshold);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> &ScanContext {
        &self.context
    }
}
