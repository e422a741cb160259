use tracing::debug;

use crate::options::ExtractOptions;

/// Repairs ages whose leading digit the OCR engine dropped, e.g. `69` read
/// as `9`.
///
/// Any age below `correction_threshold` gets `expected_min_age` added, as
/// long as the result stays within `max_age`. Genuinely young insureds are
/// corrected too; callers expecting such ages should lower the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeCorrector {
    pub expected_min_age: u32,
    pub correction_threshold: u32,
    pub max_age: u32,
}

impl AgeCorrector {
    #[must_use]
    pub const fn new(expected_min_age: u32, correction_threshold: u32, max_age: u32) -> Self {
        Self {
            expected_min_age,
            correction_threshold,
            max_age,
        }
    }

    #[must_use]
    pub fn from_options(options: &ExtractOptions) -> Self {
        Self::new(
            options.expected_min_age,
            options.correction_threshold,
            options.max_age,
        )
    }

    /// Input is a cleaned digit string; anything unparsable comes back as-is.
    #[must_use]
    pub fn correct(&self, digits: &str) -> String {
        let Ok(age) = digits.parse::<u32>() else {
            return digits.to_string();
        };

        if age >= self.correction_threshold {
            return age.to_string();
        }

        let corrected = age.saturating_add(self.expected_min_age);
        if corrected <= self.max_age {
            debug!(original = age, corrected, "restored truncated age");
            corrected.to_string()
        } else {
            age.to_string()
        }
    }
}

impl Default for AgeCorrector {
    fn default() -> Self {
        Self::from_options(&ExtractOptions::default())
    }
}
