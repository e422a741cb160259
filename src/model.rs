use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in normalized image coordinates.
///
/// The origin sits at the bottom-left corner of the image, so a larger `y`
/// means the box is higher up on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn min_x(&self) -> f32 {
        self.x
    }

    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// One text span returned by a recognition pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedFragment {
    pub text: String,
    pub confidence: f32,
    #[serde(rename = "bbox", alias = "bounding_box")]
    pub bounding_box: BoundingBox,
}

impl RecognizedFragment {
    #[must_use]
    pub fn new(text: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bounding_box,
        }
    }

    #[must_use]
    pub fn min_x(&self) -> f32 {
        self.bounding_box.min_x()
    }

    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.bounding_box.center_x()
    }

    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.bounding_box.center_y()
    }

    #[must_use]
    pub fn has_digit(&self) -> bool {
        self.text.chars().any(|ch| ch.is_ascii_digit())
    }
}

/// Fragments sharing one visual row, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup<'a> {
    pub fragments: Vec<&'a RecognizedFragment>,
}

impl<'a> RowGroup<'a> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a RecognizedFragment> {
        self.fragments.get(index).copied()
    }

    /// Mean `center_y` of the group, used only for diagnostics.
    #[must_use]
    pub fn center_y(&self) -> f32 {
        if self.fragments.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.fragments.iter().map(|fragment| fragment.center_y()).sum();
        sum / self.fragments.len() as f32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub policy_year: String,
    pub insurance_age: String,
    pub cash_value: String,
    pub death_benefit: String,
}

impl TableRow {
    pub const CSV_HEADERS: [&'static str; 4] =
        ["policy_year", "insured_age", "cash_value", "death_benefit"];

    #[must_use]
    pub fn to_record(&self) -> [&str; 4] {
        [
            self.policy_year.as_str(),
            self.insurance_age.as_str(),
            self.cash_value.as_str(),
            self.death_benefit.as_str(),
        ]
    }
}

/// Logical column a caller asserts a cropped region contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLabel {
    PolicyYear,
    InsuredAge,
    CashValue,
    DeathBenefit,
}

impl ColumnLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PolicyYear => "policy_year",
            Self::InsuredAge => "insured_age",
            Self::CashValue => "cash_value",
            Self::DeathBenefit => "death_benefit",
        }
    }
}

impl Display for ColumnLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnLabel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "policy_year" | "year" => Ok(Self::PolicyYear),
            "insured_age" | "age" => Ok(Self::InsuredAge),
            "cash_value" | "cash" => Ok(Self::CashValue),
            "death_benefit" | "death" => Ok(Self::DeathBenefit),
            other => Err(format!(
                "unknown column label '{other}', expected policy_year, insured_age, cash_value or death_benefit"
            )),
        }
    }
}
