use crate::constants::REGULAR_CONTEXT_COUNT;
use crate::jpegls::coding_parameters::JpeglsPcParameters;
use crate::jpegls::predictor::GradientQuantizer;
use crate::jpegls::regular_mode_context::RegularModeContext;
use crate::jpegls::run_mode::RunIndex;
use crate::jpegls::run_mode_context::RunModeContext;
use crate::jpegls::traits::CodingTraits;

/// All adaptive state of one scan: the 365 regular mode contexts, the two
/// run interruption contexts and one run index per lane.
pub struct ScanContext {
    pub traits: CodingTraits,
    pub quantizer: GradientQuantizer,
    pub regular_mode_contexts: Vec<RegularModeContext>,
    pub run_mode_contexts: [RunModeContext; 2],
    pub run_index: Vec<RunIndex>,
}

impl ScanContext {
    /// `pc_parameters` must already be validated (no zero fields).
    pub fn new(pc_parameters: &JpeglsPcParameters, near_lossless: i32, lane_count: usize) -> Self {
        let traits = CodingTraits::new(
            pc_parameters.maximum_sample_value,
            near_lossless,
            pc_parameters.reset_value,
        );
        let range = traits.range;
        Self {
            traits,
            quantizer: GradientQuantizer::new(
                pc_parameters.threshold1,
                pc_parameters.threshold2,
                pc_parameters.threshold3,
                near_lossless,
            ),
            regular_mode_contexts: vec![RegularModeContext::new(range); REGULAR_CONTEXT_COUNT],
            run_mode_contexts: [RunModeContext::new(0, range), RunModeContext::new(1, range)],
            run_index: vec![RunIndex::default(); lane_count],
        }
    }

    /// Restores the initial statistics (scan start and restart markers).
    pub fn reset(&mut self) {
        let range = self.traits.range;
        self.regular_mode_contexts.fill(RegularModeContext::new(range));
        self.run_mode_contexts = [RunModeContext::new(0, range), RunModeContext::new(1, range)];
        self.run_index.fill(RunIndex::default());
    }
}
