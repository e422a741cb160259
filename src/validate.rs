use serde::Serialize;

use crate::model::TableRow;

/// Parses an insured age and checks it lies within `0..=max_age`.
#[must_use]
pub fn parse_age(age: &str, max_age: u32) -> Option<u32> {
    age.trim()
        .parse::<u32>()
        .ok()
        .filter(|value| *value <= max_age)
}

/// Per-row acceptance check applied before a row enters a result.
#[must_use]
pub fn accept_row(row: &TableRow, max_age: u32) -> bool {
    !row.policy_year.trim().is_empty() && parse_age(&row.insurance_age, max_age).is_some()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

fn is_number(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// Checks a finished extraction, one message per violation, rows 1-indexed.
#[must_use]
pub fn validate_rows(rows: &[TableRow]) -> ValidationReport {
    let mut errors = Vec::new();
    if rows.is_empty() {
        errors.push("no rows were extracted".to_string());
    }

    for (index, row) in rows.iter().enumerate() {
        let row_no = index + 1;
        if row.policy_year.trim().is_empty() {
            errors.push(format!("row {row_no}: policy year is empty"));
        }
        if row.insurance_age.trim().is_empty() {
            errors.push(format!("row {row_no}: insured age is empty"));
        }
        if !row.cash_value.is_empty() && !is_number(&row.cash_value) {
            errors.push(format!(
                "row {row_no}: cash value '{}' is not a number",
                row.cash_value
            ));
        }
        if !row.death_benefit.is_empty() && !is_number(&row.death_benefit) {
            errors.push(format!(
                "row {row_no}: death benefit '{}' is not a number",
                row.death_benefit
            ));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}
