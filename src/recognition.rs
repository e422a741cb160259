//! Boundary to the external text-recognition engine.
//!
//! The engine itself lives outside this crate. Implementations turn an image
//! into [`RecognizedFragment`]s carrying the top candidate string, its
//! confidence and a normalized bounding box.

use std::path::Path;

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::model::RecognizedFragment;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionMode {
    Fast,
    #[default]
    Accurate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub mode: RecognitionMode,
    /// Language hints in priority order, e.g. `zh-Hant`, `en-US`.
    pub languages: Vec<String>,
}

/// Asynchronous OCR engine.
///
/// Recognition can take seconds. Implementations must not block the calling
/// task while they wait on the engine, and are responsible for bounding their
/// own latency. Returning an empty list is treated the same as a failure by
/// the pipeline.
///
/// # Thread Safety
///
/// Recognizers are shared across concurrent page extractions, hence
/// `Send + Sync`.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(
        &self,
        image: &DynamicImage,
        config: &RecognitionConfig,
    ) -> Result<Vec<RecognizedFragment>, ExtractError>;
}

/// Replays a previously captured recognition pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedRecognizer {
    fragments: Vec<RecognizedFragment>,
}

impl RecordedRecognizer {
    #[must_use]
    pub fn new(fragments: Vec<RecognizedFragment>) -> Self {
        Self { fragments }
    }

    /// Parses a JSON array of fragments.
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let fragments = serde_json::from_str(json)?;
        Ok(Self { fragments })
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn fragments(&self) -> &[RecognizedFragment] {
        &self.fragments
    }
}

#[async_trait]
impl TextRecognizer for RecordedRecognizer {
    async fn recognize(
        &self,
        _image: &DynamicImage,
        _config: &RecognitionConfig,
    ) -> Result<Vec<RecognizedFragment>, ExtractError> {
        Ok(self.fragments.clone())
    }
}
