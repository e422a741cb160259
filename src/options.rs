use std::str::FromStr;

use crate::error::ExtractError;
use crate::recognition::{RecognitionConfig, RecognitionMode};

pub const DEFAULT_ROW_TOLERANCE: f32 = 0.02;
pub const DEFAULT_HEADER_MARGIN: f32 = 0.02;
pub const DEFAULT_ROW_CAP: usize = 100;
pub const DEFAULT_EXPECTED_MIN_AGE: u32 = 60;
pub const DEFAULT_CORRECTION_THRESHOLD: u32 = 30;
pub const DEFAULT_MAX_AGE: u32 = 120;
pub const FALLBACK_MIN_FIELDS: usize = 4;

/// Caller-selected crop rectangle in absolute pixel coordinates.
///
/// Coordinates may fall partly or fully outside the image; clamping happens
/// when the region is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CropRegion {
    #[must_use]
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamps the region to a `image_width` x `image_height` image and returns
    /// `(x, y, width, height)` or `None` when nothing of it remains.
    #[must_use]
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.x.saturating_add(self.width).min(i64::from(image_width));
        let bottom = self.y.saturating_add(self.height).min(i64::from(image_height));

        if right <= left || bottom <= top {
            return None;
        }

        Some((
            u32::try_from(left).ok()?,
            u32::try_from(top).ok()?,
            u32::try_from(right - left).ok()?,
            u32::try_from(bottom - top).ok()?,
        ))
    }
}

impl FromStr for CropRegion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value.split(',').map(str::trim).collect::<Vec<_>>();
        if parts.len() != 4 {
            return Err(format!(
                "invalid region format '{value}', expected exactly 4 values x,y,width,height"
            ));
        }

        let x: i64 = parts[0]
            .parse()
            .map_err(|_| format!("invalid x coordinate: '{}'", parts[0]))?;
        let y: i64 = parts[1]
            .parse()
            .map_err(|_| format!("invalid y coordinate: '{}'", parts[1]))?;
        let width: i64 = parts[2]
            .parse()
            .map_err(|_| format!("invalid width: '{}'", parts[2]))?;
        let height: i64 = parts[3]
            .parse()
            .map_err(|_| format!("invalid height: '{}'", parts[3]))?;

        if width <= 0 || height <= 0 {
            return Err("region requires width>0 and height>0".to_string());
        }

        Ok(Self::new(x, y, width, height))
    }
}

/// Enhancement applied to a cropped region before recognition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessOptions {
    /// Contrast change in percent, as taken by `image::imageops::contrast`.
    pub contrast_gain: f32,
    pub brightness_lift: i32,
    pub sharpen_sigma: f32,
    pub sharpen_threshold: i32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            contrast_gain: 50.0,
            brightness_lift: 8,
            sharpen_sigma: 1.2,
            sharpen_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub year_keywords: Vec<String>,
    pub age_keywords: Vec<String>,
    pub row_tolerance: f32,
    pub header_margin: f32,
    pub row_cap: usize,
    pub expected_min_age: u32,
    pub correction_threshold: u32,
    pub max_age: u32,
    pub fallback_min_fields: usize,
    pub min_confidence: f32,
    pub recognition_mode: RecognitionMode,
    pub languages: Vec<String>,
    pub preprocess: PreprocessOptions,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            year_keywords: ["policy year", "year", "保單年度", "年度"]
                .map(str::to_string)
                .to_vec(),
            age_keywords: ["insured age", "age", "保險年齡", "年齡"]
                .map(str::to_string)
                .to_vec(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            header_margin: DEFAULT_HEADER_MARGIN,
            row_cap: DEFAULT_ROW_CAP,
            expected_min_age: DEFAULT_EXPECTED_MIN_AGE,
            correction_threshold: DEFAULT_CORRECTION_THRESHOLD,
            max_age: DEFAULT_MAX_AGE,
            fallback_min_fields: FALLBACK_MIN_FIELDS,
            min_confidence: 0.0,
            recognition_mode: RecognitionMode::Accurate,
            languages: ["zh-Hant", "en-US"].map(str::to_string).to_vec(),
            preprocess: PreprocessOptions::default(),
        }
    }
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), ExtractError> {
        if !(self.row_tolerance > 0.0 && self.row_tolerance < 1.0) {
            return Err(ExtractError::InvalidOption(format!(
                "row_tolerance must be within (0, 1), got {}",
                self.row_tolerance
            )));
        }
        if !(0.0..1.0).contains(&self.header_margin) {
            return Err(ExtractError::InvalidOption(format!(
                "header_margin must be within [0, 1), got {}",
                self.header_margin
            )));
        }
        if self.row_cap == 0 {
            return Err(ExtractError::InvalidOption(
                "row_cap must be at least 1".to_string(),
            ));
        }
        if keywords_blank(&self.year_keywords) || keywords_blank(&self.age_keywords) {
            return Err(ExtractError::InvalidOption(
                "header keyword sets cannot be empty".to_string(),
            ));
        }
        if self.expected_min_age > self.max_age {
            return Err(ExtractError::InvalidOption(format!(
                "expected_min_age ({}) cannot exceed max_age ({})",
                self.expected_min_age, self.max_age
            )));
        }
        if self.fallback_min_fields < FALLBACK_MIN_FIELDS {
            return Err(ExtractError::InvalidOption(format!(
                "fallback_min_fields must be at least {FALLBACK_MIN_FIELDS}"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn recognition_config(&self) -> RecognitionConfig {
        RecognitionConfig {
            mode: self.recognition_mode,
            languages: self.languages.clone(),
        }
    }
}

fn keywords_blank(keywords: &[String]) -> bool {
    keywords.iter().all(|keyword| keyword.trim().is_empty())
}
