mod age;
mod cluster;
mod columns;
mod csv_io;
mod error;
mod fallback;
mod header;
mod model;
mod normalize;
mod options;
mod preprocess;
mod recognition;
mod validate;
mod warning;

use std::sync::Arc;

use image::DynamicImage;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cluster::fragments_below_header;
use crate::columns::assign_fields;
use crate::fallback::extract_fallback;
use crate::header::locate_header;
use crate::warning::WarningCode;

pub use age::AgeCorrector;
pub use cluster::{ProximityClusterer, RowClusterer};
pub use columns::{ColumnSet, extract_column, merge_columns};
pub use csv_io::{detect_delimiter, parse_delimited, rows_to_csv_string, write_rows_csv};
pub use error::ExtractError;
pub use model::{BoundingBox, ColumnLabel, RecognizedFragment, RowGroup, TableRow};
pub use normalize::normalize_amount;
pub use options::{
    CropRegion, DEFAULT_CORRECTION_THRESHOLD, DEFAULT_EXPECTED_MIN_AGE, DEFAULT_HEADER_MARGIN,
    DEFAULT_MAX_AGE, DEFAULT_ROW_CAP, DEFAULT_ROW_TOLERANCE, ExtractOptions, FALLBACK_MIN_FIELDS,
    PreprocessOptions,
};
pub use preprocess::RegionPreprocessor;
pub use recognition::{RecognitionConfig, RecognitionMode, RecordedRecognizer, TextRecognizer};
pub use validate::{ValidationReport, accept_row, parse_age, validate_rows};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Rows were read relative to the located header anchors.
    HeaderAnchored,
    /// No usable header; rows come from the degraded positional heuristic.
    Fallback,
}

/// Outcome of one extraction: rows plus everything worth telling the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub rows: Vec<TableRow>,
    pub strategy: ExtractionStrategy,
    pub warnings: Vec<ExtractWarning>,
    pub validation: ValidationReport,
}

impl ExtractionReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows of a successful extraction, or `NoRowsExtracted`.
    pub fn into_rows(self) -> Result<Vec<TableRow>, ExtractError> {
        if self.rows.is_empty() {
            return Err(ExtractError::NoRowsExtracted);
        }
        Ok(self.rows)
    }
}

fn finish(
    rows: Vec<TableRow>,
    strategy: ExtractionStrategy,
    mut warnings: Vec<ExtractWarning>,
) -> ExtractionReport {
    if rows.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoRowsExtracted,
            "no table rows could be read from the recognized text",
        ));
    }
    let validation = validate_rows(&rows);
    debug!(
        rows = rows.len(),
        ?strategy,
        warnings = warnings.len(),
        "extraction finished"
    );

    ExtractionReport {
        rows,
        strategy,
        warnings,
        validation,
    }
}

/// Reconstructs table rows from one recognition pass using a caller-chosen
/// row clustering strategy.
pub fn extract_rows_with(
    fragments: &[RecognizedFragment],
    clusterer: &dyn RowClusterer,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    options.validate()?;
    let mut warnings = Vec::new();

    let confident = fragments
        .iter()
        .filter(|fragment| fragment.confidence >= options.min_confidence)
        .cloned()
        .collect::<Vec<_>>();
    let dropped = fragments.len() - confident.len();
    if dropped > 0 {
        warnings.push(
            ExtractWarning::new(
                WarningCode::LowConfidenceDropped,
                format!("ignored {dropped} fragment(s) below the confidence floor"),
            )
            .with_confidence(options.min_confidence),
        );
    }
    debug!(fragments = confident.len(), dropped, "starting table extraction");

    let Some(anchors) = locate_header(&confident, options, &mut warnings) else {
        let rows = extract_fallback(&confident, clusterer, options, &mut warnings);
        return Ok(finish(rows, ExtractionStrategy::Fallback, warnings));
    };

    let candidates =
        fragments_below_header(&confident, anchors.header_y(), options.header_margin);
    let groups = clusterer.cluster(candidates);
    debug!(groups = groups.len(), "clustered rows under header");
    let rows = assign_fields(&groups, options, &mut warnings);
    if !rows.is_empty() {
        return Ok(finish(rows, ExtractionStrategy::HeaderAnchored, warnings));
    }

    let fallback_rows = extract_fallback(&confident, clusterer, options, &mut warnings);
    if fallback_rows.is_empty() {
        return Ok(finish(rows, ExtractionStrategy::HeaderAnchored, warnings));
    }

    warn!("header-anchored extraction produced no rows; using fallback rows");
    warnings.push(ExtractWarning::new(
        WarningCode::PrimaryPathEmpty,
        "no rows under the located header; retried without header anchoring",
    ));
    Ok(finish(fallback_rows, ExtractionStrategy::Fallback, warnings))
}

/// Reconstructs table rows from one recognition pass.
///
/// Fails only on invalid options; an unreadable table yields an empty report
/// carrying a `NoRowsExtracted` warning.
pub fn extract_rows(
    fragments: &[RecognizedFragment],
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    extract_rows_with(
        fragments,
        &ProximityClusterer::new(options.row_tolerance),
        options,
    )
}

/// Runs recognition on an image, or on an enhanced crop of it, and extracts
/// the table.
pub async fn extract_table<R>(
    recognizer: &R,
    image: &DynamicImage,
    region: Option<&CropRegion>,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError>
where
    R: TextRecognizer + ?Sized,
{
    options.validate()?;

    let prepared;
    let target = match region {
        Some(region) => {
            prepared = RegionPreprocessor::new(options.preprocess).prepare(image, region)?;
            &prepared
        }
        None => image,
    };

    let fragments = recognizer
        .recognize(target, &options.recognition_config())
        .await?;
    if fragments.is_empty() {
        return Err(ExtractError::Recognition(
            "recognizer returned no text".to_string(),
        ));
    }

    extract_rows(&fragments, options)
}

/// One page of a multi-page extraction.
#[derive(Debug, Clone)]
pub struct PageInput {
    pub image: DynamicImage,
    pub region: Option<CropRegion>,
}

/// Extracts every page concurrently; results come back in input order.
///
/// Must be called from within a Tokio runtime.
pub async fn extract_pages(
    recognizer: Arc<dyn TextRecognizer>,
    pages: Vec<PageInput>,
    options: Arc<ExtractOptions>,
) -> Vec<Result<ExtractionReport, ExtractError>> {
    let page_count = pages.len();
    let mut tasks = JoinSet::new();
    for (index, page) in pages.into_iter().enumerate() {
        let recognizer = Arc::clone(&recognizer);
        let options = Arc::clone(&options);
        tasks.spawn(async move {
            let result =
                extract_table(recognizer.as_ref(), &page.image, page.region.as_ref(), &options)
                    .await;
            (index, result)
        });
    }

    let mut slots = (0..page_count).map(|_| None).collect::<Vec<_>>();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(error) => warn!(%error, "page extraction task did not complete"),
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                Err(ExtractError::Recognition(
                    "page extraction task was aborted".to_string(),
                ))
            })
        })
        .collect()
}
