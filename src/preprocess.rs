use image::DynamicImage;
use tracing::debug;

use crate::error::ExtractError;
use crate::options::{CropRegion, PreprocessOptions};

/// Crops a caller-selected region and enhances it for recognition.
///
/// The source image is never modified; a new image is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionPreprocessor {
    options: PreprocessOptions,
}

impl RegionPreprocessor {
    #[must_use]
    pub const fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    pub fn prepare(
        &self,
        image: &DynamicImage,
        region: &CropRegion,
    ) -> Result<DynamicImage, ExtractError> {
        let (x, y, width, height) = region
            .clamp_to(image.width(), image.height())
            .ok_or(ExtractError::InvalidRegion {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
                image_width: image.width(),
                image_height: image.height(),
            })?;

        debug!(x, y, width, height, "cropping region for recognition");
        let cropped = image.crop_imm(x, y, width, height);
        Ok(self.enhance(&cropped))
    }

    /// Contrast boost with a slight brightness lift, then unsharp masking.
    #[must_use]
    pub fn enhance(&self, image: &DynamicImage) -> DynamicImage {
        image
            .adjust_contrast(self.options.contrast_gain)
            .brighten(self.options.brightness_lift)
            .unsharpen(self.options.sharpen_sigma, self.options.sharpen_threshold)
    }
}
