use tracing::{debug, warn};

use crate::age::AgeCorrector;
use crate::cluster::{RowClusterer, fragments_with_digits};
use crate::model::{ColumnLabel, RecognizedFragment, RowGroup, TableRow};
use crate::normalize::normalize_amount;
use crate::options::ExtractOptions;
use crate::validate::parse_age;
use crate::warning::{ExtractWarning, WarningCode};

/// Turns header-anchored row groups into table rows.
///
/// Leftmost fragment is the insured age, then cash value, then death
/// benefit; anything further right is ignored. `policy_year` is the 1-based
/// position among emitted rows, never OCR text.
pub(crate) fn assign_fields(
    groups: &[RowGroup<'_>],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<TableRow> {
    let corrector = AgeCorrector::from_options(options);
    let mut rows = Vec::new();

    for (index, group) in groups.iter().enumerate() {
        let group_no = index + 1;
        if rows.len() >= options.row_cap {
            warn!(row_cap = options.row_cap, "row cap reached; ignoring remaining rows");
            warnings.push(
                ExtractWarning::new(
                    WarningCode::RowCapReached,
                    format!(
                        "stopped after {} rows; {} row group(s) ignored",
                        options.row_cap,
                        groups.len() - index
                    ),
                )
                .with_row(group_no),
            );
            break;
        }

        let Some(age_fragment) = group.get(0) else {
            debug!(group_no, "skipping empty row group");
            warnings.push(
                ExtractWarning::new(WarningCode::EmptyRowGroup, "row group has no fragments")
                    .with_row(group_no),
            );
            continue;
        };

        let age = corrector.correct(&normalize_amount(&age_fragment.text));
        if parse_age(&age, options.max_age).is_none() {
            warn!(group_no, text = %age_fragment.text, "rejecting row with implausible age");
            warnings.push(
                ExtractWarning::new(
                    WarningCode::RowRejected,
                    format!(
                        "insured age '{}' is not an integer within 0..={}",
                        age_fragment.text, options.max_age
                    ),
                )
                .with_row(group_no)
                .with_confidence(age_fragment.confidence),
            );
            continue;
        }

        rows.push(TableRow {
            policy_year: (rows.len() + 1).to_string(),
            insurance_age: age,
            cash_value: group
                .get(1)
                .map(|fragment| normalize_amount(&fragment.text))
                .unwrap_or_default(),
            death_benefit: group
                .get(2)
                .map(|fragment| normalize_amount(&fragment.text))
                .unwrap_or_default(),
        });
    }

    rows
}

/// Values read from a region the caller says holds a single column, one per
/// visual row, top to bottom.
///
/// An entry is empty when the row's value is unusable, which keeps indices
/// aligned with the other columns of the same table.
pub fn extract_column(
    fragments: &[RecognizedFragment],
    label: ColumnLabel,
    clusterer: &dyn RowClusterer,
    options: &ExtractOptions,
) -> Vec<String> {
    let corrector = AgeCorrector::from_options(options);
    let groups = clusterer.cluster(fragments_with_digits(fragments));
    debug!(%label, groups = groups.len(), "clustered column region");

    groups
        .iter()
        .take(options.row_cap)
        .map(|group| {
            let Some(fragment) = group.get(0) else {
                return String::new();
            };
            let digits = normalize_amount(&fragment.text);
            match label {
                ColumnLabel::InsuredAge => {
                    let age = corrector.correct(&digits);
                    if parse_age(&age, options.max_age).is_some() {
                        age
                    } else {
                        String::new()
                    }
                }
                ColumnLabel::PolicyYear | ColumnLabel::CashValue | ColumnLabel::DeathBenefit => {
                    digits
                }
            }
        })
        .collect()
}

/// Per-column values gathered from separately cropped regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    pub policy_year: Option<Vec<String>>,
    pub insured_age: Vec<String>,
    pub cash_value: Vec<String>,
    pub death_benefit: Vec<String>,
}

impl ColumnSet {
    pub fn insert(&mut self, label: ColumnLabel, values: Vec<String>) {
        match label {
            ColumnLabel::PolicyYear => self.policy_year = Some(values),
            ColumnLabel::InsuredAge => self.insured_age = values,
            ColumnLabel::CashValue => self.cash_value = values,
            ColumnLabel::DeathBenefit => self.death_benefit = values,
        }
    }
}

/// Zips column values into rows by index.
///
/// Rows without an insured age are dropped. Without a policy year column the
/// year is the row's ordinal, as in header-anchored extraction.
#[must_use]
pub fn merge_columns(columns: &ColumnSet, row_cap: usize) -> Vec<TableRow> {
    let value_at = |values: &[String], index: usize| values.get(index).cloned().unwrap_or_default();

    let mut rows = Vec::new();
    for (index, age) in columns.insured_age.iter().enumerate() {
        if rows.len() >= row_cap {
            break;
        }
        if age.is_empty() {
            continue;
        }

        let policy_year = match &columns.policy_year {
            Some(years) => value_at(years, index),
            None => (rows.len() + 1).to_string(),
        };
        if policy_year.is_empty() {
            continue;
        }

        rows.push(TableRow {
            policy_year,
            insurance_age: age.clone(),
            cash_value: value_at(&columns.cash_value, index),
            death_benefit: value_at(&columns.death_benefit, index),
        });
    }

    rows
}
