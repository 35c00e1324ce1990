//! Context modeling helpers shared by the scan encoder and decoder
//! (ISO/IEC 14495-1, A.3 and A.4).

/// Median edge detecting predictor (code segment A.5).
#[inline]
pub fn predict(ra: i32, rb: i32, rc: i32) -> i32 {
    if rc >= ra.max(rb) {
        ra.min(rb)
    } else if rc <= ra.min(rb) {
        ra.max(rb)
    } else {
        ra + rb - rc
    }
}

/// Maps local gradients onto the nine regions -4..=4 (code segment A.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientQuantizer {
    threshold1: i32,
    threshold2: i32,
    threshold3: i32,
    near_lossless: i32,
}

impl GradientQuantizer {
    pub fn new(threshold1: i32, threshold2: i32, threshold3: i32, near_lossless: i32) -> Self {
        Self {
            threshold1,
            threshold2,
            threshold3,
            near_lossless,
        }
    }

    #[inline]
    pub fn quantize(&self, d: i32) -> i32 {
        if d <= -self.threshold3 {
            -4
        } else if d <= -self.threshold2 {
            -3
        } else if d <= -self.threshold1 {
            -2
        } else if d < -self.near_lossless {
            -1
        } else if d <= self.near_lossless {
            0
        } else if d < self.threshold1 {
            1
        } else if d < self.threshold2 {
            2
        } else if d < self.threshold3 {
            3
        } else {
            4
        }
    }

    /// Signed context id of the gradient triple `(rd - rb, rb - rc, rc - ra)`.
    /// Zero means all gradients are flat and the coder enters run mode.
    #[inline]
    pub fn context_id(&self, ra: i32, rb: i32, rc: i32, rd: i32) -> i32 {
        compute_context_id(self.quantize(rd - rb), self.quantize(rb - rc), self.quantize(rc - ra))
    }
}

#[inline]
pub const fn compute_context_id(q1: i32, q2: i32, q3: i32) -> i32 {
    (q1 * 9 + q2) * 9 + q3
}
