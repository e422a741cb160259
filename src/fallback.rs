use tracing::debug;

use crate::cluster::{RowClusterer, fragments_with_digits};
use crate::model::{RecognizedFragment, TableRow};
use crate::normalize::normalize_amount;
use crate::options::ExtractOptions;
use crate::validate::accept_row;
use crate::warning::{ExtractWarning, WarningCode};

/// Degraded extraction used when no header anchors were found.
///
/// Every fragment with a digit is clustered, and rows with at least
/// `fallback_min_fields` fragments map positionally to year, age, cash value
/// and death benefit. Year and age are taken as read, with no ordinal
/// substitution and no age correction. Shorter rows are dropped silently.
pub(crate) fn extract_fallback(
    fragments: &[RecognizedFragment],
    clusterer: &dyn RowClusterer,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<TableRow> {
    let groups = clusterer.cluster(fragments_with_digits(fragments));
    debug!(groups = groups.len(), "fallback clustering complete");

    let mut rows = Vec::new();
    for (index, group) in groups.iter().enumerate() {
        if rows.len() >= options.row_cap {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::RowCapReached,
                    format!("stopped after {} fallback rows", options.row_cap),
                )
                .with_row(index + 1),
            );
            break;
        }

        if group.len() < options.fallback_min_fields {
            debug!(
                group_no = index + 1,
                fields = group.len(),
                "dropping short fallback row"
            );
            continue;
        }

        let cell = |position: usize| {
            group
                .get(position)
                .map(|fragment| fragment.text.trim().to_string())
                .unwrap_or_default()
        };
        let row = TableRow {
            policy_year: cell(0),
            insurance_age: cell(1),
            cash_value: normalize_amount(&cell(2)),
            death_benefit: normalize_amount(&cell(3)),
        };

        if !accept_row(&row, options.max_age) {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::RowRejected,
                    format!(
                        "fallback row has implausible insured age '{}'",
                        row.insurance_age
                    ),
                )
                .with_row(index + 1),
            );
            continue;
        }

        rows.push(row);
    }

    rows
}
