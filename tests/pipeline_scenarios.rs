mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::DynamicImage;
use policy_table_ocr::{
    ColumnLabel, ColumnSet, CropRegion, ExtractError, ExtractOptions, ExtractWarningCode,
    ExtractionStrategy, PageInput, ProximityClusterer, RecognitionConfig, RecognizedFragment,
    RecordedRecognizer, RowClusterer, RowGroup, TableRow, TextRecognizer, extract_column,
    extract_pages, extract_rows, extract_rows_with, extract_table, merge_columns, parse_age,
};
use pretty_assertions::assert_eq;

use common::{fragment, policy_table};

fn row(year: &str, age: &str, cash: &str, death: &str) -> TableRow {
    TableRow {
        policy_year: year.to_string(),
        insurance_age: age.to_string(),
        cash_value: cash.to_string(),
        death_benefit: death.to_string(),
    }
}

#[test]
fn header_anchored_single_row() {
    let fragments = vec![
        fragment("Policy Year", 0.1, 0.9),
        fragment("Insured Age", 0.3, 0.9),
        fragment("65", 0.3, 0.7),
        fragment("120,000", 0.5, 0.7),
        fragment("2,000,000", 0.7, 0.7),
    ];

    let report = extract_rows(&fragments, &ExtractOptions::default()).expect("valid options");

    assert_eq!(report.strategy, ExtractionStrategy::HeaderAnchored);
    assert_eq!(report.rows, vec![row("1", "65", "120000", "2000000")]);
    assert!(report.validation.is_valid);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
}

#[test]
fn policy_years_are_ordinals_in_top_to_bottom_order() {
    let fragments = policy_table(12, 0.03);
    let report = extract_rows(&fragments, &ExtractOptions::default()).expect("valid options");

    let years = report
        .rows
        .iter()
        .map(|row| row.policy_year.clone())
        .collect::<Vec<_>>();
    let expected = (1..=12).map(|year| year.to_string()).collect::<Vec<_>>();
    assert_eq!(years, expected);
    assert_eq!(report.rows[0].insurance_age, "60");
    assert_eq!(report.rows[11].cash_value, "111000");
}

#[test]
fn primary_path_never_exceeds_row_cap() {
    let fragments = policy_table(150, 0.005);
    let options = ExtractOptions {
        row_tolerance: 0.004,
        ..ExtractOptions::default()
    };

    let report = extract_rows(&fragments, &options).expect("valid options");

    assert_eq!(report.row_count(), 100);
    assert_eq!(report.rows[99].policy_year, "100");
    assert!(
        report
            .warnings
            .iter()
            .any(|warning| warning.code == ExtractWarningCode::RowCapReached)
    );
}

#[test]
fn ages_in_results_stay_within_range() {
    let mut fragments = common::header_fragments();
    for (index, age) in ["9", "250", "75", "-", "119", "0"].iter().enumerate() {
        let y = 0.8 - index as f32 * 0.05;
        fragments.push(fragment(age, 0.3, y));
        fragments.push(fragment("1,000", 0.5, y));
    }

    let report = extract_rows(&fragments, &ExtractOptions::default()).expect("valid options");

    let ages = report
        .rows
        .iter()
        .map(|row| row.insurance_age.as_str())
        .collect::<Vec<_>>();
    // "-" never reaches clustering, which leaves its "1,000" to be read as an
    // age of 1000; "0" is corrected to 60.
    assert_eq!(ages, vec!["69", "75", "119", "60"]);
    assert!(
        report
            .rows
            .iter()
            .all(|row| parse_age(&row.insurance_age, 120).is_some())
    );
    let rejected = report
        .warnings
        .iter()
        .filter(|warning| warning.code == ExtractWarningCode::RowRejected)
        .count();
    assert_eq!(rejected, 2);
}

#[test]
fn missing_header_falls_back_to_positional_rows() {
    let fragments = vec![
        fragment("1", 0.1, 0.8),
        fragment("9", 0.3, 0.8),
        fragment("150000", 0.5, 0.8),
        fragment("3000000", 0.7, 0.8),
        fragment("2", 0.1, 0.6),
        fragment("66", 0.3, 0.6),
    ];

    let report = extract_rows(&fragments, &ExtractOptions::default()).expect("valid options");

    assert_eq!(report.strategy, ExtractionStrategy::Fallback);
    assert_eq!(report.rows, vec![row("1", "9", "150000", "3000000")]);
    assert_eq!(report.warnings[0].code, ExtractWarningCode::HeaderNotFound);
}

#[test]
fn reversed_header_order_is_flagged_not_fixed() {
    let fragments = vec![
        fragment("Insured Age", 0.1, 0.9),
        fragment("Policy Year", 0.6, 0.9),
        fragment("70", 0.1, 0.7),
        fragment("5,000", 0.6, 0.7),
    ];

    let report = extract_rows(&fragments, &ExtractOptions::default()).expect("valid options");

    assert_eq!(report.rows, vec![row("1", "70", "5000", "")]);
    assert_eq!(report.warnings[0].code, ExtractWarningCode::HeaderOrderAnomaly);
}

#[test]
fn unreadable_table_reports_no_rows() {
    let fragments = vec![
        fragment("Illustration", 0.5, 0.95),
        fragment("see page 2", 0.5, 0.5),
    ];

    let report = extract_rows(&fragments, &ExtractOptions::default()).expect("valid options");

    assert!(report.is_empty());
    assert!(!report.validation.is_valid);
    assert!(
        report
            .warnings
            .iter()
            .any(|warning| warning.code == ExtractWarningCode::NoRowsExtracted)
    );
    assert!(matches!(
        report.into_rows(),
        Err(ExtractError::NoRowsExtracted)
    ));
}

struct SingleRowClusterer;

impl RowClusterer for SingleRowClusterer {
    fn cluster<'a>(&self, mut fragments: Vec<&'a RecognizedFragment>) -> Vec<RowGroup<'a>> {
        fragments.sort_by(|left, right| left.center_x().total_cmp(&right.center_x()));
        vec![RowGroup { fragments }]
    }
}

#[test]
fn clustering_strategy_is_swappable() {
    let fragments = vec![
        fragment("Policy Year", 0.1, 0.9),
        fragment("Insured Age", 0.3, 0.9),
        fragment("65", 0.3, 0.70),
        fragment("80,000", 0.5, 0.60),
    ];

    let report = extract_rows_with(&fragments, &SingleRowClusterer, &ExtractOptions::default())
        .expect("valid options");
    assert_eq!(report.rows, vec![row("1", "65", "80000", "")]);

    let report = extract_rows_with(
        &fragments,
        &ProximityClusterer::new(0.02),
        &ExtractOptions::default(),
    )
    .expect("valid options");
    assert_eq!(report.rows, vec![row("1", "65", "", "")]);
}

#[test]
fn column_regions_merge_into_rows() {
    let ages = vec![
        fragment("Insured Age", 0.5, 0.95),
        fragment("5", 0.5, 0.8),
        fragment("66", 0.5, 0.7),
    ];
    let cash = vec![fragment("NT$10,000", 0.5, 0.8), fragment("12,500.00", 0.5, 0.7)];
    let clusterer = ProximityClusterer::new(0.02);
    let options = ExtractOptions::default();

    let mut columns = ColumnSet::default();
    columns.insert(
        ColumnLabel::InsuredAge,
        extract_column(&ages, ColumnLabel::InsuredAge, &clusterer, &options),
    );
    columns.insert(
        ColumnLabel::CashValue,
        extract_column(&cash, ColumnLabel::CashValue, &clusterer, &options),
    );

    let rows = merge_columns(&columns, options.row_cap);
    assert_eq!(
        rows,
        vec![row("1", "65", "10000", ""), row("2", "66", "12500", "")]
    );
}

struct CountingRecognizer {
    calls: AtomicUsize,
    fragments: Vec<RecognizedFragment>,
}

#[async_trait]
impl TextRecognizer for CountingRecognizer {
    async fn recognize(
        &self,
        _image: &DynamicImage,
        _config: &RecognitionConfig,
    ) -> Result<Vec<RecognizedFragment>, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fragments.clone())
    }
}

struct FailingRecognizer;

#[async_trait]
impl TextRecognizer for FailingRecognizer {
    async fn recognize(
        &self,
        _image: &DynamicImage,
        _config: &RecognitionConfig,
    ) -> Result<Vec<RecognizedFragment>, ExtractError> {
        Err(ExtractError::Recognition("engine unavailable".to_string()))
    }
}

#[tokio::test]
async fn extracts_table_through_recognizer() {
    let recognizer = RecordedRecognizer::new(policy_table(3, 0.05));
    let image = DynamicImage::new_luma8(120, 90);

    let report = extract_table(&recognizer, &image, None, &ExtractOptions::default())
        .await
        .expect("extraction should succeed");

    assert_eq!(report.row_count(), 3);
    assert_eq!(report.rows[2], row("3", "62", "102000", "2000000"));
}

#[tokio::test]
async fn crops_region_before_recognition() {
    let recognizer = CountingRecognizer {
        calls: AtomicUsize::new(0),
        fragments: policy_table(2, 0.05),
    };
    let image = DynamicImage::new_luma8(120, 90);

    let report = extract_table(
        &recognizer,
        &image,
        Some(&CropRegion::new(10, 10, 50, 40)),
        &ExtractOptions::default(),
    )
    .await
    .expect("extraction should succeed");

    assert_eq!(report.row_count(), 2);
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn region_outside_image_fails_before_recognition() {
    let recognizer = CountingRecognizer {
        calls: AtomicUsize::new(0),
        fragments: policy_table(2, 0.05),
    };
    let image = DynamicImage::new_luma8(120, 90);

    let error = extract_table(
        &recognizer,
        &image,
        Some(&CropRegion::new(500, 500, 40, 40)),
        &ExtractOptions::default(),
    )
    .await
    .expect_err("region does not overlap the image");

    assert!(matches!(error, ExtractError::InvalidRegion { .. }));
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn recognition_failures_propagate() {
    let image = DynamicImage::new_luma8(32, 32);

    let error = extract_table(&FailingRecognizer, &image, None, &ExtractOptions::default())
        .await
        .expect_err("recognizer fails");
    assert!(matches!(error, ExtractError::Recognition(_)));

    let error = extract_table(
        &RecordedRecognizer::default(),
        &image,
        None,
        &ExtractOptions::default(),
    )
    .await
    .expect_err("no text recognized");
    assert!(matches!(error, ExtractError::Recognition(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pages_are_extracted_concurrently_in_input_order() {
    let recognizer: Arc<dyn TextRecognizer> =
        Arc::new(RecordedRecognizer::new(policy_table(4, 0.05)));
    let pages = vec![
        PageInput {
            image: DynamicImage::new_luma8(64, 64),
            region: None,
        },
        PageInput {
            image: DynamicImage::new_luma8(64, 64),
            region: Some(CropRegion::new(100, 100, 10, 10)),
        },
        PageInput {
            image: DynamicImage::new_luma8(64, 64),
            region: Some(CropRegion::new(0, 0, 32, 32)),
        },
    ];

    let results = extract_pages(recognizer, pages, Arc::new(ExtractOptions::default())).await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].as_ref().map(|report| report.row_count()).ok(),
        Some(4)
    );
    assert!(matches!(results[1], Err(ExtractError::InvalidRegion { .. })));
    assert_eq!(
        results[2].as_ref().map(|report| report.row_count()).ok(),
        Some(4)
    );
}
