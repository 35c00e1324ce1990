// Encode/decode round trips over synthetic images.

use jpegls_rs::{
    FrameInfo, Image, InterleaveMode, JpeglsDecoder, JpeglsEncoder, JpeglsPcParameters, SampleLayout,
};

/// Small deterministic generator for noisy test content.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 8
    }
}

fn frame(width: u32, height: u32, bits_per_sample: i32, component_count: i32) -> FrameInfo {
    FrameInfo {
        width,
        height,
        bits_per_sample,
        component_count,
    }
}

fn create_image(frame_info: FrameInfo, layout: SampleLayout, mut sample: impl FnMut(usize, usize, usize) -> u32) -> Image {
    let maximum = frame_info.maximum_sample_value() as u32;
    let mut image = Image::zeroed(frame_info, layout).unwrap();
    for c in 0..frame_info.component_count as usize {
        for y in 0..frame_info.height as usize {
            for x in 0..frame_info.width as usize {
                image.set_sample(c, x, y, (sample(c, x, y) & maximum) as u16);
            }
        }
    }
    image
}

/// Smooth gradient with noise, different per component.
fn natural_image(frame_info: FrameInfo, layout: SampleLayout, seed: u32) -> Image {
    let mut rng = Lcg(seed);
    let scale = frame_info.maximum_sample_value() as usize / 512 + 1;
    create_image(frame_info, layout, |c, x, y| {
        ((x * 3 + y * 2 + c * 40) * scale) as u32 + rng.next() % (4 * scale as u32)
    })
}

fn assert_round_trip(image: &Image, near_lossless: i32, interleave_mode: InterleaveMode) -> Vec<u8> {
    let stream = jpegls_rs::encode(image, near_lossless, interleave_mode).unwrap();
    let decoded = jpegls_rs::decode(&stream).unwrap();
    assert_eq!(decoded.frame_info(), image.frame_info());
    assert_eq!(decoded.to_layout(image.layout()), image.to_layout(image.layout()));
    stream
}

fn assert_within_near(original: &Image, decoded: &Image, near_lossless: i32) {
    let frame_info = original.frame_info();
    for c in 0..frame_info.component_count as usize {
        for y in 0..frame_info.height as usize {
            for x in 0..frame_info.width as usize {
                let difference = original.sample(c, x, y) as i32 - decoded.sample(c, x, y) as i32;
                assert!(
                    difference.abs() <= near_lossless,
                    "component {} at ({}, {}): {} vs {}",
                    c,
                    x,
                    y,
                    original.sample(c, x, y),
                    decoded.sample(c, x, y)
                );
            }
        }
    }
}

#[test]
fn gray_ramp_256x256_is_lossless_and_compresses() {
    let image = create_image(frame(256, 256, 8, 1), SampleLayout::Planar, |_, x, y| (x + y) as u32);
    let stream = assert_round_trip(&image, 0, InterleaveMode::None);
    assert!(stream.len() < 65536, "stream is {} bytes", stream.len());
}

#[test]
fn rgb_sample_interleaved_is_lossless() {
    let image = natural_image(frame(256, 256, 8, 3), SampleLayout::Interleaved, 7);
    assert_round_trip(&image, 0, InterleaveMode::Sample);
}

#[test]
fn rgb_sample_interleaved_near_lossless_stays_within_bound() {
    let image = natural_image(frame(256, 256, 8, 3), SampleLayout::Interleaved, 7);
    let stream = jpegls_rs::encode(&image, 5, InterleaveMode::Sample).unwrap();
    let lossless = jpegls_rs::encode(&image, 0, InterleaveMode::Sample).unwrap();
    assert!(stream.len() < lossless.len());

    let decoded = jpegls_rs::decode(&stream).unwrap();
    assert_within_near(&image, &decoded, 5);
}

#[test]
fn every_interleave_mode_round_trips() {
    for component_count in [1, 2, 3, 4] {
        let image = natural_image(frame(37, 23, 8, component_count), SampleLayout::Interleaved, 3);
        for interleave_mode in [InterleaveMode::None, InterleaveMode::Line, InterleaveMode::Sample] {
            assert_round_trip(&image, 0, interleave_mode);
        }
    }
}

#[test]
fn line_and_none_interleave_near_lossless() {
    let image = natural_image(frame(64, 48, 10, 3), SampleLayout::Planar, 11);
    for interleave_mode in [InterleaveMode::None, InterleaveMode::Line] {
        for near_lossless in [1, 3, 7] {
            let stream = jpegls_rs::encode(&image, near_lossless, interleave_mode).unwrap();
            let decoded = jpegls_rs::decode(&stream).unwrap();
            assert_within_near(&image, &decoded, near_lossless);
        }
    }
}

#[test]
fn many_components_use_one_scan_each() {
    let image = natural_image(frame(9, 5, 8, 6), SampleLayout::Planar, 5);
    let stream = assert_round_trip(&image, 0, InterleaveMode::None);
    let scan_count = stream.windows(2).filter(|w| *w == [0xFF, 0xDA]).count();
    assert_eq!(scan_count, 6);
}

#[test]
fn bit_depths_from_2_to_16() {
    for bits_per_sample in [2, 3, 5, 8, 9, 12, 15, 16] {
        let image = natural_image(frame(41, 17, bits_per_sample, 1), SampleLayout::Planar, bits_per_sample as u32);
        assert_round_trip(&image, 0, InterleaveMode::None);
    }
}

#[test]
fn scans_ending_at_every_bit_offset() {
    for bits_per_sample in 2..=16 {
        for width in 1..=40 {
            let mut rng = Lcg(width * 31 + bits_per_sample as u32);
            let image = create_image(frame(width, 3, bits_per_sample, 1), SampleLayout::Planar, |_, _, _| rng.next());
            assert_round_trip(&image, 0, InterleaveMode::None);
        }
    }
}

#[test]
fn random_16_bit_samples_are_lossless() {
    let mut rng = Lcg(99);
    let image = create_image(frame(64, 64, 16, 1), SampleLayout::Planar, |_, _, _| rng.next());
    assert_round_trip(&image, 0, InterleaveMode::None);
}

#[test]
fn random_12_bit_rgb_near_lossless() {
    let mut rng = Lcg(1234);
    let image = create_image(frame(50, 30, 12, 3), SampleLayout::Interleaved, |_, _, _| rng.next());
    let stream = jpegls_rs::encode(&image, 2, InterleaveMode::Sample).unwrap();
    assert_within_near(&image, &jpegls_rs::decode(&stream).unwrap(), 2);
}

#[test]
fn restart_markers_cycle_through_all_eight_codes() {
    let image = natural_image(frame(33, 40, 8, 3), SampleLayout::Interleaved, 21);
    for interleave_mode in [InterleaveMode::None, InterleaveMode::Line, InterleaveMode::Sample] {
        let mut encoder = JpeglsEncoder::new();
        encoder.set_interleave_mode(interleave_mode);
        encoder.set_restart_interval(3).unwrap();
        let stream = encoder.encode(&image).unwrap();

        for code in 0xD0..=0xD7u8 {
            assert!(stream.windows(2).any(|w| w == [0xFF, code]), "RST{} missing", code - 0xD0);
        }
        assert_eq!(jpegls_rs::decode(&stream).unwrap().to_layout(SampleLayout::Interleaved), image);
    }
}

#[test]
fn restart_interval_of_one_line_with_near_lossless() {
    let image = natural_image(frame(20, 12, 8, 1), SampleLayout::Planar, 8);
    let mut encoder = JpeglsEncoder::new();
    encoder.set_restart_interval(1).unwrap();
    encoder.set_near_lossless(3).unwrap();
    let stream = encoder.encode(&image).unwrap();

    assert_eq!(jpegls_rs::read_header(&stream).unwrap().coding_parameters.restart_interval, 1);
    assert_within_near(&image, &jpegls_rs::decode(&stream).unwrap(), 3);
}

#[test]
fn padded_lines_are_encoded_like_packed_ones() {
    let packed = natural_image(frame(30, 10, 12, 1), SampleLayout::Planar, 4);
    let stride = 30 * 2 + 6;
    let mut padded_data = vec![0xEE; stride * 9 + 60];
    for (y, line) in packed.as_bytes().chunks_exact(60).enumerate() {
        padded_data[y * stride..y * stride + 60].copy_from_slice(line);
    }
    let padded = Image::with_stride(*packed.frame_info(), SampleLayout::Planar, stride, padded_data).unwrap();

    let stream = jpegls_rs::encode(&padded, 0, InterleaveMode::None).unwrap();
    assert_eq!(stream, jpegls_rs::encode(&packed, 0, InterleaveMode::None).unwrap());
    assert_eq!(jpegls_rs::decode(&stream).unwrap(), packed);
}

#[test]
fn custom_preset_parameters_are_written_and_used() {
    let image = natural_image(frame(40, 40, 8, 1), SampleLayout::Planar, 17);
    let pc = JpeglsPcParameters {
        maximum_sample_value: 255,
        threshold1: 2,
        threshold2: 5,
        threshold3: 12,
        reset_value: 32,
    };
    let mut encoder = JpeglsEncoder::new();
    encoder.set_preset_coding_parameters(pc);
    let stream = encoder.encode(&image).unwrap();

    let header = jpegls_rs::read_header(&stream).unwrap();
    assert_eq!(header.preset_coding_parameters, pc);
    assert_eq!(jpegls_rs::decode(&stream).unwrap(), image);
    assert_ne!(stream, jpegls_rs::encode(&image, 0, InterleaveMode::None).unwrap());
}

#[test]
fn partial_preset_parameters_use_defaults_for_zero_fields() {
    let image = natural_image(frame(40, 40, 12, 1), SampleLayout::Planar, 2);
    let mut encoder = JpeglsEncoder::new();
    encoder.set_preset_coding_parameters(JpeglsPcParameters {
        reset_value: 128,
        ..Default::default()
    });
    let stream = encoder.encode(&image).unwrap();
    assert_eq!(jpegls_rs::read_header(&stream).unwrap().preset_coding_parameters.reset_value, 128);
    assert_eq!(jpegls_rs::decode(&stream).unwrap(), image);
}

#[test]
fn header_reproduces_the_encoded_frame() {
    let image = natural_image(frame(123, 45, 10, 3), SampleLayout::Interleaved, 6);
    for (near_lossless, interleave_mode) in [(0, InterleaveMode::None), (2, InterleaveMode::Line), (4, InterleaveMode::Sample)] {
        let stream = jpegls_rs::encode(&image, near_lossless, interleave_mode).unwrap();
        let header = jpegls_rs::read_header(&stream).unwrap();
        assert_eq!(header.frame_info, *image.frame_info());
        assert_eq!(header.coding_parameters.near_lossless, near_lossless);
        assert_eq!(header.coding_parameters.interleave_mode, interleave_mode);
        assert_eq!(header.coding_parameters.restart_interval, 0);
        assert_eq!(header.preset_coding_parameters, JpeglsPcParameters::default());

        let mut decoder = JpeglsDecoder::new(&stream);
        decoder.read_header().unwrap();
        assert_eq!(decoder.frame_info(), header.frame_info);
    }
}

#[test]
fn repeated_rows_are_coded_as_runs() {
    let image = create_image(frame(512, 64, 8, 1), SampleLayout::Planar, |_, _, _| 77);
    let stream = assert_round_trip(&image, 0, InterleaveMode::None);
    assert!(stream.len() < 400, "stream is {} bytes", stream.len());

    let striped = create_image(frame(512, 64, 8, 1), SampleLayout::Planar, |_, x, _| (x / 128 * 60) as u32);
    assert_round_trip(&striped, 0, InterleaveMode::None);
}

#[test]
fn single_pixel_and_single_column_images() {
    for (width, height) in [(1, 1), (1, 50), (50, 1), (2, 2)] {
        let image = natural_image(frame(width, height, 8, 3), SampleLayout::Interleaved, width + height);
        for interleave_mode in [InterleaveMode::None, InterleaveMode::Sample] {
            assert_round_trip(&image, 0, interleave_mode);
            let stream = jpegls_rs::encode(&image, 1, interleave_mode).unwrap();
            assert_within_near(&image, &jpegls_rs::decode(&stream).unwrap(), 1);
        }
    }
}

#[test]
fn narrowed_16_bit_container_round_trips_as_8_bit() {
    let image = create_image(frame(16, 16, 16, 1), SampleLayout::Planar, |_, x, y| (x * 16 + y) as u32 % 200);
    let narrowed = image.narrow_to_fit();
    assert_eq!(narrowed.frame_info().bits_per_sample, 8);

    let stream = jpegls_rs::encode(&narrowed, 0, InterleaveMode::None).unwrap();
    assert_eq!(jpegls_rs::read_header(&stream).unwrap().frame_info.bits_per_sample, 8);
    let decoded = jpegls_rs::decode(&stream).unwrap();
    for y in 0..16 {
        for x in 0..16 {
            assert_eq!(decoded.sample(0, x, y), image.sample(0, x, y));
        }
    }
}
