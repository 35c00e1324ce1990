use crate::FrameInfo;
use crate::InterleaveMode;
use crate::error::JpeglsError;
use crate::image::{Image, SampleLayout};
use crate::jpeg_stream_reader::{JpegStreamReader, ScanHeader};
use crate::jpegls::scan_decoder::ScanDecoder;
use crate::jpegls::{CodingParameters, JpeglsPcParameters};

/// Decodes a JPEG-LS stream held in memory.
///
/// Images coded with interleave mode none decode into a planar [`Image`],
/// line and sample interleaved images into an interleaved one.
pub struct JpeglsDecoder<'a> {
    source: &'a [u8],
    reader: JpegStreamReader<'a>,
    first_scan: Option<ScanHeader>,
}

impl<'a> JpeglsDecoder<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            reader: JpegStreamReader::new(source),
            first_scan: None,
        }
    }

    /// Parses the header segments and the first SOS without decoding samples.
    pub fn read_header(&mut self) -> Result<(), JpeglsError> {
        if self.first_scan.is_none() {
            self.first_scan = Some(self.reader.read_header()?);
        }
        Ok(())
    }

    /// Frame description; all zero until [`read_header`](Self::read_header) succeeded.
    pub fn frame_info(&self) -> FrameInfo {
        self.reader.frame_info()
    }

    /// NEAR, interleave mode and restart interval of the first scan.
    pub fn coding_parameters(&self) -> CodingParameters {
        self.reader.parameters()
    }

    pub fn preset_coding_parameters(&self) -> JpeglsPcParameters {
        self.reader.preset_coding_parameters()
    }

    pub fn decode(&mut self) -> Result<Image, JpeglsError> {
        self.read_header()?;

        // Every decode starts from the first scan, so decode can be repeated.
        let mut reader = JpegStreamReader::new(self.source);
        let mut scan = reader.read_header()?;

        let frame_info = reader.frame_info();
        let layout = match reader.parameters().interleave_mode {
            InterleaveMode::None => SampleLayout::Planar,
            InterleaveMode::Line | InterleaveMode::Sample => SampleLayout::Interleaved,
        };
        let mut image = Image::zeroed(frame_info, layout)?;
        let mut decoded = vec![false; frame_info.component_count as usize];

        loop {
            for component in scan.first_component..scan.first_component + scan.component_count {
                if decoded[component] {
                    return Err(JpeglsError::MalformedStream("component coded in more than one scan"));
                }
                decoded[component] = true;
            }

            let pc_parameters = reader.validated_preset_coding_parameters()?;
            let end = ScanDecoder::new(
                &frame_info,
                &pc_parameters,
                &reader.parameters(),
                scan.component_count,
                self.source,
                reader.position(),
            )
            .decode_scan(&mut image, scan.first_component)?;
            reader.set_position(end);

            match reader.read_next_scan()? {
                Some(next) => scan = next,
                None => break,
            }
        }

        if decoded.contains(&false) {
            return Err(JpeglsError::MalformedStream("component without a scan"));
        }
        Ok(image)
    }

    /// Decodes into `destination`, whose lines are `stride` bytes apart, in
    /// the layout [`decode`](Self::decode) would produce.
    pub fn decode_into(&mut self, destination: &mut [u8], stride: usize) -> Result<(), JpeglsError> {
        let image = self.decode()?;
        let minimum_stride = Image::minimum_stride(image.frame_info(), image.layout());
        if stride < minimum_stride {
            return Err(JpeglsError::InvalidStride);
        }

        let packed = image.as_bytes();
        let line_count = packed.len() / minimum_stride;
        let expected = stride * (line_count - 1) + minimum_stride;
        if destination.len() < expected {
            return Err(JpeglsError::InvalidBufferSize {
                expected,
                actual: destination.len(),
            });
        }

        for (line, target) in packed.chunks_exact(minimum_stride).zip(destination.chunks_mut(stride)) {
            target[..minimum_stride].copy_from_slice(line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpegls::JpeglsEncoder;

    fn encoded_rgb(interleave_mode: InterleaveMode) -> (Image, Vec<u8>) {
        let frame_info = FrameInfo {
            width: 5,
            height: 3,
            bits_per_sample: 8,
            component_count: 3,
        };
        let data = (0..45).map(|i| (i * 13 % 256) as u8).collect();
        let image = Image::new(frame_info, SampleLayout::Interleaved, data).unwrap();

        let mut encoder = JpeglsEncoder::new();
        encoder.set_interleave_mode(interleave_mode);
        let stream = encoder.encode(&image).unwrap();
        (image, stream)
    }

    #[test]
    fn header_is_available_before_decoding() {
        let (_, stream) = encoded_rgb(InterleaveMode::Line);
        let mut decoder = JpeglsDecoder::new(&stream);
        decoder.read_header().unwrap();
        assert_eq!(decoder.frame_info().component_count, 3);
        assert_eq!(decoder.coding_parameters().interleave_mode, InterleaveMode::Line);
        assert_eq!(decoder.preset_coding_parameters(), JpeglsPcParameters::default());
    }

    #[test]
    fn non_interleaved_streams_decode_to_planar_images() {
        let (image, stream) = encoded_rgb(InterleaveMode::None);
        let decoded = JpeglsDecoder::new(&stream).decode().unwrap();
        assert_eq!(decoded.layout(), SampleLayout::Planar);
        assert_eq!(decoded.to_layout(SampleLayout::Interleaved), image);
    }

    #[test]
    fn decode_can_be_repeated() {
        let (image, stream) = encoded_rgb(InterleaveMode::Sample);
        let mut decoder = JpeglsDecoder::new(&stream);
        assert_eq!(decoder.decode().unwrap(), image);
        assert_eq!(decoder.decode().unwrap(), image);
    }

    #[test]
    fn decode_into_honours_stride() {
        let (image, stream) = encoded_rgb(InterleaveMode::Sample);
        let mut destination = vec![0xAA; 20 * 2 + 15];
        JpeglsDecoder::new(&stream).decode_into(&mut destination, 20).unwrap();

        for y in 0..3 {
            assert_eq!(&destination[y * 20..y * 20 + 15], &image.as_bytes()[y * 15..y * 15 + 15]);
        }
        assert_eq!(destination[15], 0xAA);

        let mut too_small = vec![0; 44];
        assert!(matches!(
            JpeglsDecoder::new(&stream).decode_into(&mut too_small, 15),
            Err(JpeglsError::InvalidBufferSize { expected: 45, actual: 44 })
        ));
        assert_eq!(
            JpeglsDecoder::new(&stream).decode_into(&mut destination, 14),
            Err(JpeglsError::InvalidStride)
        );
    }

    #[test]
    fn missing_component_scan_is_malformed() {
        let (_, stream) = encoded_rgb(InterleaveMode::None);
        // Cut the stream after the first scan and terminate it with EOI.
        let second_sos = stream
            .windows(2)
            .enumerate()
            .filter(|(_, w)| *w == [0xFF, 0xDA])
            .nth(1)
            .map(|(i, _)| i)
            .unwrap();
        let mut truncated = stream[..second_sos].to_vec();
        truncated.extend_from_slice(&[0xFF, 0xD9]);

        assert_eq!(
            JpeglsDecoder::new(&truncated).decode(),
            Err(JpeglsError::MalformedStream("component without a scan"))
        );
    }
}
