use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(
        "crop region {x},{y} {width}x{height} is empty after clamping to a {image_width}x{image_height} image"
    )]
    InvalidRegion {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    },

    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("no table rows could be extracted")]
    NoRowsExtracted,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid fragment JSON: {0}")]
    Json(#[from] serde_json::Error),
}
