//! jpegls CLI - encode, decode and inspect JPEG-LS images.

use anyhow::{Context, Result, anyhow, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use jpegls_rs::{FrameInfo, Image, InterleaveMode, JpeglsDecoder, JpeglsEncoder, JpeglsPcParameters, SampleLayout};
use std::fs;
use std::path::{Path, PathBuf};

/// Lossless and near-lossless JPEG-LS codec
#[derive(Parser)]
#[command(name = "jpegls")]
#[command(version)]
#[command(about = "Encode, decode and inspect JPEG-LS (ISO/IEC 14495-1) images", long_about = None)]
#[command(after_help = "EXAMPLES:
    jpegls encode -i image.pgm -o image.jls
    jpegls encode -i image.ppm -o image.jls --near 2 --interleave line
    jpegls encode -i pixels.raw -o image.jls -w 512 -H 512 -b 12
    jpegls decode -i image.jls -o image.pgm -f pnm
    jpegls info -i image.jls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a PGM/PPM or raw image to JPEG-LS
    ///
    /// Raw input holds pixel interleaved samples, one byte per sample up to
    /// 8 bits and two little-endian bytes above that.
    #[command(visible_alias = "e")]
    Encode {
        #[arg(short, long, help = "Path to the PGM/PPM or raw input file")]
        input: PathBuf,

        #[arg(short, long, help = "Path for the JPEG-LS output file")]
        output: PathBuf,

        /// Image width in pixels (raw input only)
        #[arg(short, long)]
        width: Option<u32>,

        /// Image height in pixels (raw input only)
        #[arg(short = 'H', long)]
        height: Option<u32>,

        /// Number of components (raw input only)
        #[arg(short = 'n', long, default_value = "1")]
        components: i32,

        /// Bits per sample (raw input only)
        #[arg(short, long, default_value = "8")]
        bits: i32,

        /// Maximum reconstruction error, 0 is lossless
        #[arg(long, default_value = "0")]
        near: i32,

        #[arg(long, default_value = "none", value_enum)]
        interleave: InterleaveArg,

        /// Lines between restart markers, 0 disables them
        #[arg(long, default_value = "0")]
        restart: u32,

        /// Store samples with the smallest bit depth that holds them
        #[arg(long)]
        narrow: bool,
    },

    /// Decode a JPEG-LS file to raw samples or PGM/PPM
    #[command(visible_alias = "d")]
    Decode {
        #[arg(short, long, help = "Path to the JPEG-LS input file")]
        input: PathBuf,

        #[arg(short, long, help = "Path for the decoded output file")]
        output: PathBuf,

        #[arg(short, long, default_value = "raw", value_enum)]
        format: OutputFormat,
    },

    /// Display the header fields of a JPEG-LS file
    #[command(visible_alias = "i")]
    Info {
        #[arg(short, long, help = "Path to the JPEG-LS file to inspect")]
        input: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Raw samples, pixel interleaved, 16-bit samples little-endian
    Raw,
    /// Portable GrayMap / PixMap (1 or 3 components)
    Pnm,
}

#[derive(Clone, Copy, ValueEnum)]
enum InterleaveArg {
    None,
    Line,
    Sample,
}

impl From<InterleaveArg> for InterleaveMode {
    fn from(value: InterleaveArg) -> Self {
        match value {
            InterleaveArg::None => InterleaveMode::None,
            InterleaveArg::Line => InterleaveMode::Line,
            InterleaveArg::Sample => InterleaveMode::Sample,
        }
    }
}

struct RawOptions {
    width: Option<u32>,
    height: Option<u32>,
    components: i32,
    bits: i32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Encode {
            input,
            output,
            width,
            height,
            components,
            bits,
            near,
            interleave,
            restart,
            narrow,
        } => {
            let raw = RawOptions {
                width,
                height,
                components,
                bits,
            };
            encode_image(&input, &output, &raw, near, interleave.into(), restart, narrow)
        }
        Commands::Decode { input, output, format } => decode_image(&input, &output, &format),
        Commands::Info { input } => show_info(&input),
    }
}

fn encode_image(
    input: &Path,
    output: &Path,
    raw: &RawOptions,
    near: i32,
    interleave_mode: InterleaveMode,
    restart: u32,
    narrow: bool,
) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let (mut image, pnm_maximum_value) = if data.starts_with(b"P5") || data.starts_with(b"P6") {
        let (image, maximum_value) = read_pnm(&data).with_context(|| format!("parsing {}", input.display()))?;
        (image, Some(maximum_value))
    } else {
        (read_raw(data, raw)?, None)
    };
    if narrow {
        image = image.narrow_to_fit();
    }

    let mut encoder = JpeglsEncoder::new();
    encoder.set_near_lossless(near)?;
    encoder.set_interleave_mode(interleave_mode);
    encoder.set_restart_interval(restart)?;
    if let Some(maximum_value) = pnm_maximum_value {
        encoder.set_preset_coding_parameters(preset_for_pnm(image.frame_info(), maximum_value));
    }
    let encoded = encoder.encode(&image).context("encoding JPEG-LS stream")?;

    fs::write(output, &encoded).with_context(|| format!("writing {}", output.display()))?;

    let frame_info = image.frame_info();
    let raw_size = image.as_bytes().len();
    println!(
        "Encoded {}x{} image ({} components, {} bits) to {:?}: {} bytes, ratio {:.2}",
        frame_info.width,
        frame_info.height,
        frame_info.component_count,
        frame_info.bits_per_sample,
        output,
        encoded.len(),
        raw_size as f64 / encoded.len() as f64
    );
    Ok(())
}

fn decode_image(input: &Path, output: &Path, format: &OutputFormat) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let mut decoder = JpeglsDecoder::new(&data);
    let image = decoder
        .decode()
        .with_context(|| format!("decoding {}", input.display()))?
        .into_layout(SampleLayout::Interleaved);

    let bytes = match format {
        OutputFormat::Raw => image.as_bytes().to_vec(),
        OutputFormat::Pnm => {
            let preset_maximum = decoder.preset_coding_parameters().maximum_sample_value;
            let maximum_value = if preset_maximum != 0 {
                preset_maximum as u32
            } else {
                image.frame_info().maximum_sample_value() as u32
            };
            write_pnm(&image, maximum_value)?
        }
    };
    fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;

    let frame_info = image.frame_info();
    println!(
        "Decoded {}x{} image ({} components, {} bits) to {:?}",
        frame_info.width, frame_info.height, frame_info.component_count, frame_info.bits_per_sample, output
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let header = jpegls_rs::read_header(&data).with_context(|| format!("reading header of {}", input.display()))?;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!();
    println!("Width:             {}", header.frame_info.width);
    println!("Height:            {}", header.frame_info.height);
    println!("Bits per sample:   {}", header.frame_info.bits_per_sample);
    println!("Components:        {}", header.frame_info.component_count);
    println!("Near lossless:     {}", header.coding_parameters.near_lossless);
    println!("Interleave mode:   {:?}", header.coding_parameters.interleave_mode);
    println!("Restart interval:  {}", header.coding_parameters.restart_interval);

    let pc = header.preset_coding_parameters;
    if pc != jpegls_rs::JpeglsPcParameters::default() {
        println!(
            "Preset parameters: MAXVAL {} T1 {} T2 {} T3 {} RESET {}",
            pc.maximum_sample_value, pc.threshold1, pc.threshold2, pc.threshold3, pc.reset_value
        );
    }
    Ok(())
}

fn read_raw(data: Vec<u8>, raw: &RawOptions) -> Result<Image> {
    let (Some(width), Some(height)) = (raw.width, raw.height) else {
        bail!("raw input needs --width and --height");
    };
    let frame_info = FrameInfo {
        width,
        height,
        bits_per_sample: raw.bits,
        component_count: raw.components,
    };
    Ok(Image::new(frame_info, SampleLayout::Interleaved, data)?)
}

// Header token of a binary PNM file; comments run to the end of the line.
fn next_token<'a>(data: &'a [u8], position: &mut usize) -> Result<&'a [u8]> {
    loop {
        while data.get(*position).is_some_and(|b| b.is_ascii_whitespace()) {
            *position += 1;
        }
        if data.get(*position) == Some(&b'#') {
            while data.get(*position).is_some_and(|&b| b != b'\n') {
                *position += 1;
            }
            continue;
        }
        break;
    }

    let start = *position;
    while data.get(*position).is_some_and(|b| !b.is_ascii_whitespace()) {
        *position += 1;
    }
    if start == *position {
        bail!("truncated PNM header");
    }
    Ok(&data[start..*position])
}

fn next_number(data: &[u8], position: &mut usize) -> Result<u32> {
    let token = next_token(data, position)?;
    std::str::from_utf8(token)?
        .parse()
        .map_err(|_| anyhow!("invalid number in PNM header"))
}

// A PNM maximum value below 2^bits - 1 is carried as the MAXVAL of an LSE segment.
fn preset_for_pnm(frame_info: &FrameInfo, maximum_value: u32) -> JpeglsPcParameters {
    let frame_maximum = frame_info.maximum_sample_value() as u32;
    JpeglsPcParameters {
        maximum_sample_value: if maximum_value < frame_maximum { maximum_value as i32 } else { 0 },
        ..Default::default()
    }
}

fn read_pnm(data: &[u8]) -> Result<(Image, u32)> {
    let mut position = 0;
    let component_count = match next_token(data, &mut position)? {
        b"P5" => 1,
        b"P6" => 3,
        _ => bail!("only binary PGM (P5) and PPM (P6) are supported"),
    };
    let width = next_number(data, &mut position)?;
    let height = next_number(data, &mut position)?;
    let maximum_value = next_number(data, &mut position)?;
    if maximum_value == 0 || maximum_value > u16::MAX as u32 {
        bail!("PNM maximum value {} out of range", maximum_value);
    }
    // A single whitespace byte separates the header from the samples.
    position += 1;

    let frame_info = FrameInfo {
        width,
        height,
        bits_per_sample: (u32::BITS - maximum_value.leading_zeros()).max(2) as i32,
        component_count,
    };
    let samples = data.get(position..).unwrap_or_default();
    let sample_count = width as usize * height as usize * component_count as usize;

    let bytes = if maximum_value > 255 {
        let needed = sample_count * 2;
        if samples.len() < needed {
            bail!("PNM data is truncated");
        }
        // PNM stores 16-bit samples big-endian, Image little-endian.
        let mut converted = vec![0; needed];
        for (source, target) in samples[..needed].chunks_exact(2).zip(converted.chunks_exact_mut(2)) {
            LittleEndian::write_u16(target, BigEndian::read_u16(source));
        }
        converted
    } else {
        samples.get(..sample_count).context("PNM data is truncated")?.to_vec()
    };

    log::debug!("read PNM {}x{}, maxval {}, {} components", width, height, maximum_value, component_count);
    Ok((Image::new(frame_info, SampleLayout::Interleaved, bytes)?, maximum_value))
}

fn write_pnm(image: &Image, maximum_value: u32) -> Result<Vec<u8>> {
    let frame_info = image.frame_info();
    let magic = match frame_info.component_count {
        1 => "P5",
        3 => "P6",
        n => bail!("PNM output needs 1 or 3 components, the image has {}", n),
    };

    let mut bytes = format!(
        "{}\n{} {}\n{}\n",
        magic,
        frame_info.width,
        frame_info.height,
        maximum_value
    )
    .into_bytes();

    if frame_info.bytes_per_sample() == 2 {
        let start = bytes.len();
        bytes.extend_from_slice(image.as_bytes());
        for sample in bytes[start..].chunks_exact_mut(2) {
            let value = LittleEndian::read_u16(sample);
            BigEndian::write_u16(sample, value);
        }
    } else {
        bytes.extend_from_slice(image.as_bytes());
    }
    Ok(bytes)
}
