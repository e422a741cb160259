use tracing::{debug, warn};

use crate::model::RecognizedFragment;
use crate::options::ExtractOptions;
use crate::warning::{ExtractWarning, WarningCode};

/// Returns the first fragment, in recognition order, whose text contains any
/// of `keywords`. Matching ignores case.
pub(crate) fn locate_anchor<'a>(
    fragments: &'a [RecognizedFragment],
    keywords: &[String],
) -> Option<&'a RecognizedFragment> {
    let keywords = keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect::<Vec<_>>();

    fragments.iter().find(|fragment| {
        let text = fragment.text.to_lowercase();
        keywords.iter().any(|keyword| text.contains(keyword.as_str()))
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HeaderAnchors<'a> {
    pub year: &'a RecognizedFragment,
    pub age: &'a RecognizedFragment,
}

impl HeaderAnchors<'_> {
    /// The year column is expected left of the age column.
    pub(crate) fn is_order_anomalous(&self) -> bool {
        self.year.center_x() > self.age.center_x()
    }

    /// Data rows are measured against the age header.
    pub(crate) fn header_y(&self) -> f32 {
        self.age.center_y()
    }
}

pub(crate) fn locate_header<'a>(
    fragments: &'a [RecognizedFragment],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<HeaderAnchors<'a>> {
    let year = locate_anchor(fragments, &options.year_keywords);
    let age = locate_anchor(fragments, &options.age_keywords);

    let (Some(year), Some(age)) = (year, age) else {
        let missing = match (year.is_some(), age.is_some()) {
            (false, false) => "policy year and insured age headers",
            (false, true) => "policy year header",
            _ => "insured age header",
        };
        warn!(missing, "header anchors not found; using fallback extraction");
        warnings.push(ExtractWarning::new(
            WarningCode::HeaderNotFound,
            format!("could not locate the {missing}; extracted rows without header anchoring"),
        ));
        return None;
    };

    let anchors = HeaderAnchors { year, age };
    debug!(
        year = %year.text,
        age = %age.text,
        header_y = anchors.header_y(),
        "located header anchors"
    );

    if anchors.is_order_anomalous() {
        warn!(
            year_x = year.center_x(),
            age_x = age.center_x(),
            "policy year header sits right of insured age header"
        );
        warnings.push(ExtractWarning::new(
            WarningCode::HeaderOrderAnomaly,
            "policy year header is right of the insured age header; columns were not swapped",
        ));
    }

    Some(anchors)
}
