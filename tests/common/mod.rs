#![allow(dead_code)]

use std::path::Path;

use policy_table_ocr::{BoundingBox, RecognizedFragment};

/// Fragment of fixed size centred on `(center_x, center_y)`.
pub fn fragment(text: &str, center_x: f32, center_y: f32) -> RecognizedFragment {
    RecognizedFragment::new(
        text,
        0.9,
        BoundingBox::new(center_x - 0.04, center_y - 0.006, 0.08, 0.012),
    )
}

pub fn header_fragments() -> Vec<RecognizedFragment> {
    vec![
        fragment("Policy Year", 0.1, 0.9),
        fragment("Insured Age", 0.3, 0.9),
        fragment("Cash Value", 0.5, 0.9),
        fragment("Death Benefit", 0.7, 0.9),
    ]
}

/// A header plus `rows` data rows `spacing` apart. Data rows carry age, cash
/// value and death benefit; the year column is left unread.
pub fn policy_table(rows: usize, spacing: f32) -> Vec<RecognizedFragment> {
    let mut fragments = header_fragments();
    for index in 0..rows {
        let y = 0.85 - index as f32 * spacing;
        let age = 60 + index % 50;
        fragments.push(fragment(&age.to_string(), 0.3, y));
        fragments.push(fragment(&format!("{},000", 100 + index), 0.5, y));
        fragments.push(fragment("2,000,000", 0.7, y));
    }
    fragments
}

pub fn write_fragments_json(
    path: &Path,
    fragments: &[RecognizedFragment],
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(fragments)?;
    std::fs::write(path, json)?;
    Ok(())
}
