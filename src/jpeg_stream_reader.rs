//! JPEG-LS stream reader.
//!
//! `JpegStreamReader` walks the marker segments of a JPEG-LS stream and
//! validates them. It stops in front of the entropy coded data of every scan;
//! the scan decoder reports where that data ends.

use crate::FrameInfo;
use crate::InterleaveMode;
use crate::constants::{MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT_IN_SCAN, MINIMUM_BITS_PER_SAMPLE};
use crate::error::JpeglsError;
use crate::jpeg_marker_code::{
    JPEG_MARKER_START_BYTE, JpegMarkerCode, is_application_data, is_other_start_of_frame, is_restart_marker,
};
use crate::jpeg_stream_writer::PRESET_CODING_PARAMETERS_ID;
use crate::jpegls::coding_parameters::{
    CodingParameters, JpeglsPcParameters, compute_maximum_near_lossless, is_valid, maximum_sample_value,
};

// LSE types 2 to 4 (mapping tables and extended parameters).
const MAPPING_TABLE_SPECIFICATION_ID: u8 = 2;
const EXTENDED_PARAMETERS_ID: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegStreamReaderState {
    BeforeStartOfImage,
    HeaderSection,
    ScanSection,
    EndOfImage,
}

/// Components covered by one scan, as indices into the frame's component list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanHeader {
    pub first_component: usize,
    pub component_count: usize,
}

pub struct JpegStreamReader<'a> {
    source: &'a [u8],
    position: usize,
    state: JpegStreamReaderState,
    frame_info: Option<FrameInfo>,
    component_ids: Vec<u8>,
    parameters: CodingParameters,
    preset_coding_parameters: JpeglsPcParameters,
}

impl<'a> JpegStreamReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
            state: JpegStreamReaderState::BeforeStartOfImage,
            frame_info: None,
            component_ids: Vec::new(),
            parameters: CodingParameters::default(),
            preset_coding_parameters: JpeglsPcParameters::default(),
        }
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.frame_info.unwrap_or_default()
    }

    /// Coding parameters of the most recently read scan.
    pub fn parameters(&self) -> CodingParameters {
        self.parameters
    }

    /// Preset coding parameters as stored in the stream (zero when absent).
    pub fn preset_coding_parameters(&self) -> JpeglsPcParameters {
        self.preset_coding_parameters
    }

    /// Offset of the first entropy coded byte after a start of scan segment.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Continues after the entropy coded data of a scan, at the terminating marker.
    pub fn set_position(&mut self, position: usize) {
        debug_assert!(position <= self.source.len());
        self.position = position;
    }

    /// Reads SOI and all header segments up to and including the first SOS.
    pub fn read_header(&mut self) -> Result<ScanHeader, JpeglsError> {
        if self.read_marker()? != JpegMarkerCode::StartOfImage as u8 {
            return Err(JpeglsError::MalformedStream("stream does not start with SOI"));
        }
        self.state = JpegStreamReaderState::HeaderSection;

        match self.read_next_scan()? {
            Some(scan_header) => Ok(scan_header),
            None => Err(JpeglsError::MalformedStream("no scan before end of image")),
        }
    }

    /// Reads segments up to the next SOS (returning its scan header) or EOI
    /// (returning `None`).
    pub fn read_next_scan(&mut self) -> Result<Option<ScanHeader>, JpeglsError> {
        loop {
            let code = self.read_marker()?;
            let Ok(marker) = JpegMarkerCode::try_from(code) else {
                if is_application_data(code) {
                    self.skip_segment()?;
                    continue;
                }
                if is_other_start_of_frame(code) {
                    return Err(JpeglsError::UnsupportedParameter("JPEG process other than JPEG-LS"));
                }
                if is_restart_marker(code) {
                    return Err(JpeglsError::MalformedStream("unexpected restart marker"));
                }
                return Err(JpeglsError::MalformedStream("unknown marker"));
            };

            match marker {
                JpegMarkerCode::StartOfFrameJpegls => self.read_start_of_frame_segment()?,
                JpegMarkerCode::JpeglsPresetParameters => self.read_jpegls_preset_parameters_segment()?,
                JpegMarkerCode::DefineRestartInterval => self.read_define_restart_interval_segment()?,
                JpegMarkerCode::Comment => self.skip_segment()?,
                JpegMarkerCode::StartOfScan => {
                    let scan_header = self.read_start_of_scan_segment()?;
                    self.state = JpegStreamReaderState::ScanSection;
                    return Ok(Some(scan_header));
                }
                JpegMarkerCode::EndOfImage => {
                    if self.state != JpegStreamReaderState::ScanSection {
                        return Err(JpeglsError::MalformedStream("end of image before any scan"));
                    }
                    self.state = JpegStreamReaderState::EndOfImage;
                    return Ok(None);
                }
                JpegMarkerCode::DefineNumberOfLines => {
                    return Err(JpeglsError::UnsupportedParameter("DNL segment"));
                }
                JpegMarkerCode::StartOfImage => {
                    return Err(JpeglsError::MalformedStream("duplicate SOI"));
                }
            }
        }
    }

    /// Preset parameters for the current scan with all defaults filled in.
    pub fn validated_preset_coding_parameters(&self) -> Result<JpeglsPcParameters, JpeglsError> {
        let frame_info = self.frame_info.ok_or(JpeglsError::MalformedStream("missing SOF"))?;
        is_valid(
            &self.preset_coding_parameters,
            maximum_sample_value(frame_info.bits_per_sample),
            self.parameters.near_lossless,
        )
        .map_err(|_| JpeglsError::MalformedStream("invalid preset coding parameters"))
    }

    fn read_u8(&mut self) -> Result<u8, JpeglsError> {
        let Some(&value) = self.source.get(self.position) else {
            return Err(JpeglsError::MalformedStream("unexpected end of stream"));
        };
        self.position += 1;
        Ok(value)
    }

    fn read_u16(&mut self) -> Result<u16, JpeglsError> {
        let high = self.read_u8()? as u16;
        let low = self.read_u8()? as u16;
        Ok((high << 8) | low)
    }

    fn read_u24(&mut self) -> Result<u32, JpeglsError> {
        let high = self.read_u8()? as u32;
        Ok((high << 16) | self.read_u16()? as u32)
    }

    fn read_u32(&mut self) -> Result<u32, JpeglsError> {
        let high = self.read_u16()? as u32;
        Ok((high << 16) | self.read_u16()? as u32)
    }

    // Returns the second byte of the marker; fill bytes (0xFF) are skipped.
    fn read_marker(&mut self) -> Result<u8, JpeglsError> {
        if self.read_u8()? != JPEG_MARKER_START_BYTE {
            return Err(JpeglsError::MalformedStream("expected a marker"));
        }

        let mut code = self.read_u8()?;
        while code == JPEG_MARKER_START_BYTE {
            code = self.read_u8()?;
        }
        Ok(code)
    }

    // Reads the segment length and returns the payload size.
    fn read_segment_size(&mut self) -> Result<usize, JpeglsError> {
        let length = self.read_u16()? as usize;
        if length < 2 {
            return Err(JpeglsError::MalformedStream("invalid segment length"));
        }
        let size = length - 2;
        if self.position + size > self.source.len() {
            return Err(JpeglsError::MalformedStream("segment extends past the end of the stream"));
        }
        Ok(size)
    }

    fn skip_segment(&mut self) -> Result<(), JpeglsError> {
        let size = self.read_segment_size()?;
        self.position += size;
        Ok(())
    }

    fn read_start_of_frame_segment(&mut self) -> Result<(), JpeglsError> {
        if self.frame_info.is_some() {
            return Err(JpeglsError::MalformedStream("duplicate SOF"));
        }

        let size = self.read_segment_size()?;
        if size < 6 {
            return Err(JpeglsError::MalformedStream("invalid SOF segment length"));
        }

        let bits_per_sample = self.read_u8()? as i32;
        if !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&bits_per_sample) {
            return Err(JpeglsError::MalformedStream("bits per sample out of range"));
        }

        let height = self.read_u16()? as u32;
        let width = self.read_u16()? as u32;
        if height == 0 || width == 0 {
            return Err(JpeglsError::MalformedStream("zero image width or height"));
        }

        let component_count = self.read_u8()? as i32;
        if component_count == 0 {
            return Err(JpeglsError::MalformedStream("zero component count"));
        }
        if size != 6 + component_count as usize * 3 {
            return Err(JpeglsError::MalformedStream("SOF length does not match component count"));
        }

        self.component_ids.clear();
        for _ in 0..component_count {
            let id = self.read_u8()?;
            let sampling_factors = self.read_u8()?;
            let _quantization_table = self.read_u8()?;

            if self.component_ids.contains(&id) {
                return Err(JpeglsError::MalformedStream("duplicate component id"));
            }
            if sampling_factors != 0x11 {
                return Err(JpeglsError::UnsupportedParameter("sampling factors other than 1x1"));
            }
            self.component_ids.push(id);
        }

        self.frame_info = Some(FrameInfo {
            width,
            height,
            bits_per_sample,
            component_count,
        });
        log::debug!("SOF55: {}x{}, {} bits, {} components", width, height, bits_per_sample, component_count);
        Ok(())
    }

    fn read_jpegls_preset_parameters_segment(&mut self) -> Result<(), JpeglsError> {
        let size = self.read_segment_size()?;
        if size < 1 {
            return Err(JpeglsError::MalformedStream("invalid LSE segment length"));
        }

        let id = self.read_u8()?;
        match id {
            PRESET_CODING_PARAMETERS_ID => {
                if size != 11 {
                    return Err(JpeglsError::MalformedStream("invalid LSE segment length"));
                }
                self.preset_coding_parameters = JpeglsPcParameters {
                    maximum_sample_value: self.read_u16()? as i32,
                    threshold1: self.read_u16()? as i32,
                    threshold2: self.read_u16()? as i32,
                    threshold3: self.read_u16()? as i32,
                    reset_value: self.read_u16()? as i32,
                };
                log::trace!("LSE: {:?}", self.preset_coding_parameters);
                Ok(())
            }
            MAPPING_TABLE_SPECIFICATION_ID..=EXTENDED_PARAMETERS_ID => Err(JpeglsError::UnsupportedParameter(
                "mapping tables and extended LSE parameters",
            )),
            _ => Err(JpeglsError::MalformedStream("invalid LSE type")),
        }
    }

    fn read_define_restart_interval_segment(&mut self) -> Result<(), JpeglsError> {
        let size = self.read_segment_size()?;
        self.parameters.restart_interval = match size {
            2 => self.read_u16()? as u32,
            3 => self.read_u24()?,
            4 => self.read_u32()?,
            _ => return Err(JpeglsError::MalformedStream("invalid DRI segment length")),
        };
        log::trace!("DRI: restart interval {}", self.parameters.restart_interval);
        Ok(())
    }

    fn read_start_of_scan_segment(&mut self) -> Result<ScanHeader, JpeglsError> {
        let frame_info = self.frame_info.ok_or(JpeglsError::MalformedStream("SOS before SOF"))?;

        let size = self.read_segment_size()?;
        if size < 1 {
            return Err(JpeglsError::MalformedStream("invalid SOS segment length"));
        }

        let component_count = self.read_u8()? as usize;
        if component_count == 0
            || component_count > MAXIMUM_COMPONENT_COUNT_IN_SCAN as usize
            || component_count > frame_info.component_count as usize
        {
            return Err(JpeglsError::MalformedStream("invalid component count in scan"));
        }
        if size != 1 + component_count * 2 + 3 {
            return Err(JpeglsError::MalformedStream("SOS length does not match component count"));
        }

        let mut component_indices = Vec::with_capacity(component_count);
        for _ in 0..component_count {
            let id = self.read_u8()?;
            let mapping_table_selector = self.read_u8()?;
            let Some(index) = self.component_ids.iter().position(|&c| c == id) else {
                return Err(JpeglsError::MalformedStream("scan refers to an unknown component"));
            };
            if mapping_table_selector != 0 {
                return Err(JpeglsError::UnsupportedParameter("mapping table"));
            }
            component_indices.push(index);
        }

        let near_lossless = self.read_u8()? as i32;
        if near_lossless > compute_maximum_near_lossless(maximum_sample_value(frame_info.bits_per_sample)) {
            return Err(JpeglsError::MalformedStream("near lossless value out of range"));
        }

        let interleave_mode = InterleaveMode::try_from(self.read_u8()?)
            .map_err(|_| JpeglsError::MalformedStream("invalid interleave mode"))?;
        let point_transform = self.read_u8()?;
        if point_transform != 0 {
            return Err(JpeglsError::UnsupportedParameter("point transform"));
        }

        let interleave_mode = if component_count == 1 {
            InterleaveMode::None
        } else if interleave_mode == InterleaveMode::None {
            return Err(JpeglsError::MalformedStream("multiple components in a non-interleaved scan"));
        } else {
            interleave_mode
        };

        if component_count > 1
            && (component_count != frame_info.component_count as usize
                || component_indices.iter().enumerate().any(|(i, &index)| i != index))
        {
            return Err(JpeglsError::UnsupportedParameter("interleaved scan over a subset of the components"));
        }

        self.parameters.near_lossless = near_lossless;
        self.parameters.interleave_mode = interleave_mode;
        log::debug!(
            "SOS: {} component(s), near {}, {:?}",
            component_count,
            near_lossless,
            interleave_mode
        );

        Ok(ScanHeader {
            first_component: component_indices[0],
            component_count,
        })
    }
}
