use crate::model::{RecognizedFragment, RowGroup};

/// Groups fragments into visual table rows.
///
/// Groups come back top of the page first, each sorted left to right. Both
/// the header-anchored and the fallback strategy go through this seam, so a
/// stricter layout model can replace [`ProximityClusterer`] without touching
/// field assignment.
pub trait RowClusterer: Send + Sync {
    fn cluster<'a>(&self, fragments: Vec<&'a RecognizedFragment>) -> Vec<RowGroup<'a>>;
}

/// Greedy vertical-proximity clustering.
///
/// Seeds each row with the topmost unassigned fragment and pulls in every
/// fragment whose `center_y` is within `tolerance` of the seed. Skewed or
/// rotated tables are out of its reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityClusterer {
    pub tolerance: f32,
}

impl ProximityClusterer {
    #[must_use]
    pub const fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }
}

impl RowClusterer for ProximityClusterer {
    fn cluster<'a>(&self, fragments: Vec<&'a RecognizedFragment>) -> Vec<RowGroup<'a>> {
        let mut pool = fragments;
        pool.sort_by(|left, right| right.center_y().total_cmp(&left.center_y()));

        let mut groups = Vec::new();
        while let Some(&seed) = pool.first() {
            let seed_y = seed.center_y();
            let (mut row, rest): (Vec<_>, Vec<_>) = pool
                .into_iter()
                .partition(|fragment| (fragment.center_y() - seed_y).abs() < self.tolerance);
            row.sort_by(|left, right| left.center_x().total_cmp(&right.center_x()));
            groups.push(RowGroup { fragments: row });
            pool = rest;
        }

        groups
    }
}

/// Fragments below the header row by more than `margin` that carry a digit.
pub(crate) fn fragments_below_header(
    fragments: &[RecognizedFragment],
    header_y: f32,
    margin: f32,
) -> Vec<&RecognizedFragment> {
    fragments
        .iter()
        .filter(|fragment| fragment.center_y() < header_y - margin && fragment.has_digit())
        .collect()
}

pub(crate) fn fragments_with_digits(fragments: &[RecognizedFragment]) -> Vec<&RecognizedFragment> {
    fragments.iter().filter(|fragment| fragment.has_digit()).collect()
}
