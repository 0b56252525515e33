use serde::{Deserialize, Serialize};

use crate::world::District;

/// Headline counts shown above the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub affected: usize,
    pub earthquake_active: usize,
    pub flood_active: usize,
    pub total: usize,
}

/// A district in state `both` counts toward both active totals.
pub fn summarize(districts: &[District]) -> Summary {
    districts
        .iter()
        .fold(Summary::default(), |mut summary, district| {
            let kind = district.disaster_type;
            summary.total += 1;
            summary.affected += kind.is_affected() as usize;
            summary.earthquake_active += kind.has_earthquake() as usize;
            summary.flood_active += kind.has_flood() as usize;
            summary
        })
}
