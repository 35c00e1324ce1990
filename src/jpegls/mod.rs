//! JPEG-LS implementation (ISO/IEC 14495-1 / ITU-T T.87)
//!
//! JPEG-LS is a low-complexity lossless and near-lossless image compression
//! standard built on the LOCO-I algorithm: a median edge predictor, 365
//! adaptive regular mode contexts with bias correction, Golomb-Rice coding of
//! the prediction errors and a run mode for flat regions.
//!
//! ## Layout
//!
//! - `JpeglsEncoder` / `JpeglsDecoder`: frame level codec.
//! - `ScanEncoder` / `ScanDecoder`: the per-scan coding loop, for interleave
//!   modes none, line and sample.
//! - `predictor`, `regular_mode_context`, `run_mode_context`, `golomb`:
//!   the modelling and entropy coding building blocks.
//! - `bit_writer` / `bit_reader`: bit packing with the JPEG-LS stuffing rule.
//!
//! ## Supported Image Types
//!
//! | Image Type | Encoding | Decoding |
//! |------------|----------|----------|
//! | 2 to 16 bits per sample | ✅ | ✅ |
//! | 1 to 255 components (interleave mode none) | ✅ | ✅ |
//! | up to 4 components (line / sample interleave) | ✅ | ✅ |
//! | Near-lossless (NEAR > 0) | ✅ | ✅ |
//! | Restart markers | ✅ | ✅ |
//! | Mapping tables, subsampling, point transform | ❌ | ❌ |

pub mod bit_reader;
pub mod bit_writer;
pub mod coding_parameters;
pub mod decoder;
pub mod encoder;
pub mod golomb;
pub mod golomb_lut;
pub mod line_buffer;
pub mod predictor;
pub mod regular_mode_context;
pub mod run_mode;
pub mod run_mode_context;
pub mod scan_context;
pub mod scan_decoder;
pub mod scan_encoder;
pub mod traits;

pub use coding_parameters::{CodingParameters, JpeglsPcParameters};
pub use decoder::JpeglsDecoder;
pub use encoder::JpeglsEncoder;
