use num_enum::{IntoPrimitive, TryFromPrimitive};

/// JPEG marker codes used by a JPEG-LS stream (the byte following 0xFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum JpegMarkerCode {
    /// SOI: Marks the start of an image.
    StartOfImage = 0xD8,

    /// EOI: Marks the end of an image.
    EndOfImage = 0xD9,

    /// SOS: Marks the start of scan.
    StartOfScan = 0xDA,

    /// DNL: Defines the number of lines in a scan.
    DefineNumberOfLines = 0xDC,

    /// DRI: Defines the restart interval used in succeeding scans.
    DefineRestartInterval = 0xDD,

    /// COM: Comment block.
    Comment = 0xFE,

    // The following markers are defined in ISO/IEC 14495-1 | ITU T.87. (JPEG-LS standard)
    /// SOF_55: Marks the start of a JPEG-LS encoded frame.
    StartOfFrameJpegls = 0xF7,

    /// LSE: Marks the start of a JPEG-LS preset parameters segment.
    JpeglsPresetParameters = 0xF8,
}

pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;
pub const JPEG_RESTART_MARKER_BASE: u8 = 0xD0;
pub const JPEG_RESTART_MARKER_RANGE: u8 = 8;

const APPLICATION_DATA_FIRST: u8 = 0xE0;
const APPLICATION_DATA_LAST: u8 = 0xEF;

/// APPn segments (JFIF, SPIFF, HP colour info, ...) carry nothing the codec needs.
pub fn is_application_data(code: u8) -> bool {
    (APPLICATION_DATA_FIRST..=APPLICATION_DATA_LAST).contains(&code)
}

pub fn is_restart_marker(code: u8) -> bool {
    (JPEG_RESTART_MARKER_BASE..JPEG_RESTART_MARKER_BASE + JPEG_RESTART_MARKER_RANGE).contains(&code)
}

/// SOF markers of the other JPEG processes (baseline, progressive, lossless, ...).
pub fn is_other_start_of_frame(code: u8) -> bool {
    matches!(code, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF | 0xF9)
}

/// In entropy-coded JPEG-LS data a 0xFF followed by a byte with its high bit
/// set can only be a marker.
pub fn is_marker_second_byte(code: u8) -> bool {
    code & 0x80 != 0
}
