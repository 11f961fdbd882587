//! Access code generation over the OS CSPRNG.

use crate::models::AccessCode;
use rand::rngs::OsRng;
use rand::RngCore;
use service_core::error::AppError;

/// Source of fresh access codes. The rotation clock owns its source through
/// this seam, so failure paths can be exercised without the OS RNG.
pub trait CodeSource: Send + Sync {
    fn generate(&self) -> Result<AccessCode, AppError>;
}

/// Generates fixed-width numeric codes, uniformly distributed over
/// `10^(digits-1) .. 10^digits`. The lower bound excludes leading zeros,
/// matching the source system's code space.
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    digits: u32,
}

impl CodeGenerator {
    pub fn new(digits: u32) -> Self {
        // 10^19 still fits in a u64; wider would overflow, zero would underflow.
        assert!(
            (1..=19).contains(&digits),
            "code width must be between 1 and 19 digits"
        );
        Self { digits }
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }
}

impl CodeSource for CodeGenerator {
    /// Draw a fresh code. There is no fallback RNG: if the OS entropy source
    /// fails, the error propagates and the rotation cycle fails hard.
    fn generate(&self) -> Result<AccessCode, AppError> {
        let lower = 10u64.pow(self.digits - 1);
        let upper = 10u64.pow(self.digits);
        let value = sample_uniform(lower, upper)?;
        Ok(AccessCode::new(value.to_string()))
    }
}

/// Uniform draw from `lower..upper` by rejection sampling, so the modular
/// reduction introduces no bias.
fn sample_uniform(lower: u64, upper: u64) -> Result<u64, AppError> {
    let span = upper - lower;
    // 2^64 mod span; raw values at or above 2^64 - rem are rejected.
    let rem = (u64::MAX % span).wrapping_add(1) % span;

    loop {
        let mut buf = [0u8; 8];
        OsRng.try_fill_bytes(&mut buf).map_err(|e| {
            AppError::GenerationFailure(anyhow::anyhow!("OS entropy source failed: {e}"))
        })?;
        let raw = u64::from_le_bytes(buf);

        if rem == 0 || raw < u64::MAX - rem + 1 {
            return Ok(lower + raw % span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_fixed_width_numeric_codes() {
        let generator = CodeGenerator::new(6);
        for _ in 0..200 {
            let code = generator.generate().expect("generation failed");
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn never_emits_a_leading_zero() {
        let generator = CodeGenerator::new(6);
        for _ in 0..200 {
            let code = generator.generate().expect("generation failed");
            assert_ne!(code.as_str().as_bytes()[0], b'0');
        }
    }

    #[test]
    fn respects_configured_width() {
        for digits in 4..=9 {
            let generator = CodeGenerator::new(digits);
            let code = generator.generate().expect("generation failed");
            assert_eq!(code.as_str().len(), digits as usize);
        }
    }

    #[test]
    #[should_panic(expected = "code width")]
    fn zero_width_is_rejected_at_construction() {
        CodeGenerator::new(0);
    }

    #[test]
    #[should_panic(expected = "code width")]
    fn overflowing_width_is_rejected_at_construction() {
        CodeGenerator::new(20);
    }

    #[test]
    fn sample_uniform_stays_in_range() {
        for _ in 0..500 {
            let value = sample_uniform(100_000, 1_000_000).expect("sampling failed");
            assert!((100_000..1_000_000).contains(&value));
        }
    }
}
