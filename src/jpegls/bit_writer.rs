use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JPEG_RESTART_MARKER_BASE, JPEG_RESTART_MARKER_RANGE};

/// MSB-first bit packer for JPEG-LS entropy coded data.
///
/// After every 0xFF byte the next byte carries only 7 data bits; its most
/// significant bit is a stuffed zero so the decoder can tell data from markers
/// (ISO/IEC 14495-1, A.1).
pub struct BitWriter<'a> {
    destination: &'a mut Vec<u8>,
    bit_buffer: u32,
    free_bit_count: i32,
    is_ff_written: bool,
}

impl<'a> BitWriter<'a> {
    pub fn new(destination: &'a mut Vec<u8>) -> Self {
        Self {
            destination,
            bit_buffer: 0,
            free_bit_count: 32,
            is_ff_written: false,
        }
    }

    /// Appends the `bit_count` least significant bits of `bits`.
    pub fn append(&mut self, bits: u32, bit_count: i32) {
        debug_assert!((0..32).contains(&bit_count));
        debug_assert!((bits >> bit_count) == 0);
        if bit_count == 0 {
            return;
        }

        self.free_bit_count -= bit_count;
        if self.free_bit_count >= 0 {
            self.bit_buffer |= bits << self.free_bit_count;
            return;
        }

        // Put as many bits as fit, flush and repeat; a flush may make less room
        // than expected when 0xFF bytes need a stuffed bit.
        self.bit_buffer |= bits >> -self.free_bit_count;
        self.flush();
        if self.free_bit_count < 0 {
            self.bit_buffer |= bits >> -self.free_bit_count;
            self.flush();
        }
        debug_assert!(self.free_bit_count >= 0 && self.free_bit_count < 32);
        self.bit_buffer |= bits << self.free_bit_count;
    }

    /// Appends `count` zero bits followed by a single one bit.
    pub fn append_unary(&mut self, count: i32) {
        let mut count = count;
        while count >= 31 {
            self.append(0, 31);
            count -= 31;
        }
        self.append(1, count + 1);
    }

    fn flush(&mut self) {
        for _ in 0..4 {
            if self.free_bit_count >= 32 {
                self.free_bit_count = 32;
                break;
            }

            let byte = if self.is_ff_written {
                let byte = (self.bit_buffer >> 25) as u8;
                self.bit_buffer <<= 7;
                self.free_bit_count += 7;
                byte
            } else {
                let byte = (self.bit_buffer >> 24) as u8;
                self.bit_buffer <<= 8;
                self.free_bit_count += 8;
                byte
            };

            self.destination.push(byte);
            self.is_ff_written = byte == JPEG_MARKER_START_BYTE;
        }

        // Four bytes can carry out more than the pending bits; the surplus is zero padding.
        self.free_bit_count = self.free_bit_count.min(32);
    }

    /// Pads the final byte with zero bits and writes out everything buffered.
    /// A trailing 0xFF is followed by a zero byte so a marker can follow.
    pub fn end_scan(&mut self) {
        self.flush();
        let padding = if self.is_ff_written {
            (self.free_bit_count - 1) % 8
        } else {
            self.free_bit_count % 8
        };
        self.append(0, padding);
        self.flush();
        debug_assert_eq!(self.free_bit_count, 32);
    }

    /// Ends the current interval and writes the RSTm marker with
    /// m = `restart_index` mod 8; the bit state starts fresh afterwards.
    pub fn write_restart_marker(&mut self, restart_index: u32) {
        self.end_scan();
        let code = JPEG_RESTART_MARKER_BASE + (restart_index % JPEG_RESTART_MARKER_RANGE as u32) as u8;
        self.destination.push(JPEG_MARKER_START_BYTE);
        self.destination.push(code);
        self.bit_buffer = 0;
        self.free_bit_count = 32;
        self.is_ff_written = false;
    }
}
