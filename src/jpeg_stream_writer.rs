//! JPEG-LS stream writer.
//!
//! `JpegStreamWriter` emits the marker segments (SOI, SOF55, LSE, DRI, SOS,
//! EOI) around the entropy coded data produced by the scan encoder.

use crate::FrameInfo;
use crate::InterleaveMode;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode};
use crate::jpegls::JpeglsPcParameters;

// LSE segment type for preset coding parameters, ISO/IEC 14495-1, C.2.4.1.
pub const PRESET_CODING_PARAMETERS_ID: u8 = 1;

/// Builds a JPEG-LS stream in an owned byte buffer. All fields are big-endian.
pub struct JpegStreamWriter {
    destination: Vec<u8>,
}

impl Default for JpegStreamWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JpegStreamWriter {
    pub fn new() -> Self {
        Self {
            destination: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.destination.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_empty()
    }

    /// The underlying buffer; entropy coded data is appended to it directly.
    pub fn destination_mut(&mut self) -> &mut Vec<u8> {
        &mut self.destination
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.destination
    }

    pub fn write_byte(&mut self, value: u8) {
        self.destination.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.destination.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_marker(&mut self, marker: JpegMarkerCode) {
        self.write_byte(JPEG_MARKER_START_BYTE);
        self.write_byte(marker.into());
    }

    // Marker, then the segment length (which counts itself but not the marker).
    fn write_segment_header(&mut self, marker: JpegMarkerCode, payload_size: usize) {
        self.write_marker(marker);
        self.write_u16((payload_size + 2) as u16);
    }

    pub fn write_start_of_image(&mut self) {
        self.write_marker(JpegMarkerCode::StartOfImage);
    }

    pub fn write_end_of_image(&mut self) {
        self.write_marker(JpegMarkerCode::EndOfImage);
    }

    pub fn write_start_of_frame_jpegls(&mut self, frame_info: &FrameInfo) {
        self.write_segment_header(
            JpegMarkerCode::StartOfFrameJpegls,
            6 + frame_info.component_count as usize * 3,
        );

        self.write_byte(frame_info.bits_per_sample as u8);
        self.write_u16(frame_info.height as u16);
        self.write_u16(frame_info.width as u16);
        self.write_byte(frame_info.component_count as u8);

        for i in 0..frame_info.component_count {
            self.write_byte((i + 1) as u8); // Component ID
            self.write_byte(0x11); // H=1, V=1
            self.write_byte(0); // Tq
        }
    }

    pub fn write_jpegls_preset_parameters_segment(&mut self, pc: &JpeglsPcParameters) {
        self.write_segment_header(JpegMarkerCode::JpeglsPresetParameters, 1 + 5 * 2);
        self.write_byte(PRESET_CODING_PARAMETERS_ID);

        self.write_u16(pc.maximum_sample_value as u16);
        self.write_u16(pc.threshold1 as u16);
        self.write_u16(pc.threshold2 as u16);
        self.write_u16(pc.threshold3 as u16);
        self.write_u16(pc.reset_value as u16);
    }

    pub fn write_define_restart_interval(&mut self, restart_interval: u16) {
        self.write_segment_header(JpegMarkerCode::DefineRestartInterval, 2);
        self.write_u16(restart_interval);
    }

    /// SOS for the components with ids `first_component_id..first_component_id + component_count`.
    pub fn write_start_of_scan_segment(
        &mut self,
        first_component_id: u8,
        component_count: usize,
        near_lossless: i32,
        interleave_mode: InterleaveMode,
    ) {
        self.write_segment_header(JpegMarkerCode::StartOfScan, 1 + component_count * 2 + 3);

        self.write_byte(component_count as u8);
        for i in 0..component_count {
            self.write_byte(first_component_id + i as u8); // Component selector
            self.write_byte(0); // Mapping table selector
        }

        self.write_byte(near_lossless as u8);
        self.write_byte(interleave_mode.into());
        self.write_byte(0); // Point transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_of_frame_layout() {
        let mut writer = JpegStreamWriter::new();
        writer.write_start_of_frame_jpegls(&FrameInfo {
            width: 300,
            height: 2,
            bits_per_sample: 12,
            component_count: 1,
        });
        assert_eq!(
            writer.into_bytes(),
            vec![0xFF, 0xF7, 0x00, 0x0B, 12, 0x00, 0x02, 0x01, 0x2C, 1, 1, 0x11, 0]
        );
    }

    #[test]
    fn start_of_scan_layout() {
        let mut writer = JpegStreamWriter::new();
        writer.write_start_of_scan_segment(1, 3, 2, InterleaveMode::Sample);
        assert_eq!(
            writer.into_bytes(),
            vec![0xFF, 0xDA, 0x00, 0x0C, 3, 1, 0, 2, 0, 3, 0, 2, 2, 0]
        );
    }

    #[test]
    fn preset_parameters_and_restart_interval_layout() {
        let mut writer = JpegStreamWriter::new();
        writer.write_jpegls_preset_parameters_segment(&JpeglsPcParameters {
            maximum_sample_value: 255,
            threshold1: 4,
            threshold2: 8,
            threshold3: 22,
            reset_value: 32,
        });
        writer.write_define_restart_interval(16);
        assert_eq!(
            writer.into_bytes(),
            vec![
                0xFF, 0xF8, 0x00, 0x0D, 1, 0, 255, 0, 4, 0, 8, 0, 22, 0, 32, // LSE
                0xFF, 0xDD, 0x00, 0x04, 0, 16, // DRI
            ]
        );
    }
}
