use crate::constants::{MAX_C, MAX_CONTEXT_STATISTIC, MAX_K_VALUE, MIN_C};
use crate::error::JpeglsError;
use crate::jpegls::traits::bit_wise_sign;

/// Adaptive statistics of one regular mode context (ISO/IEC 14495-1, A.3.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularModeContext {
    a: i32,
    b: i32,
    c: i32,
    n: i32,
}

impl RegularModeContext {
    pub fn new(range: i32) -> Self {
        Self {
            a: Self::initialization_value_for_a(range),
            b: 0,
            c: 0,
            n: 1,
        }
    }

    pub fn a(&self) -> i32 {
        self.a
    }

    pub fn b(&self) -> i32 {
        self.b
    }

    pub fn c(&self) -> i32 {
        self.c
    }

    pub fn n(&self) -> i32 {
        self.n
    }

    /// Returns -1 when the error values of this context should be inverted
    /// before mapping, 0 otherwise (only used for k = 0).
    pub fn get_error_correction(&self, k: i32) -> i32 {
        if k != 0 {
            return 0;
        }
        bit_wise_sign(2 * self.b + self.n - 1)
    }

    // Code segments A.12 and A.13
    pub fn update_variables_and_bias(
        &mut self,
        error_value: i32,
        near_lossless: i32,
        reset_threshold: i32,
    ) -> Result<(), JpeglsError> {
        debug_assert!(self.n != 0);

        self.a += error_value.abs();
        self.b += error_value * (2 * near_lossless + 1);

        if self.a >= MAX_CONTEXT_STATISTIC || self.b.abs() >= MAX_CONTEXT_STATISTIC {
            return Err(JpeglsError::MalformedStream("context statistics out of range"));
        }

        if self.n == reset_threshold {
            self.a >>= 1;
            self.b >>= 1;
            self.n >>= 1;
        }

        self.n += 1;
        debug_assert!(self.n != 0);

        if self.b + self.n <= 0 {
            self.b += self.n;
            if self.b <= -self.n {
                self.b = -self.n + 1;
            }
            if self.c > MIN_C {
                self.c -= 1;
            }
        } else if self.b > 0 {
            self.b -= self.n;
            if self.b > 0 {
                self.b = 0;
            }
            if self.c < MAX_C {
                self.c += 1;
            }
        }
        Ok(())
    }

    // Code segment A.10
    pub fn compute_golomb_coding_parameter(&self) -> Result<i32, JpeglsError> {
        let mut k = 0;
        while (self.n << k) < self.a && k < MAX_K_VALUE {
            k += 1;
        }

        if k == MAX_K_VALUE {
            return Err(JpeglsError::MalformedStream("Golomb coding parameter out of range"));
        }
        Ok(k)
    }

    fn initialization_value_for_a(range: i32) -> i32 {
        std::cmp::max(2, (range + 32) / 64)
    }
}
