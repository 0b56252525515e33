use crate::zones::{DistrictId, ZoneId};

/// Recoverable failures of the zone pipeline. None of these are fatal: the
/// caller keeps its previous district state and moves on to the next tick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZoneError {
    #[error("unknown zone '{0}'")]
    UnknownZone(ZoneId),

    #[error("unknown district {0}")]
    UnknownDistrict(DistrictId),

    #[error("malformed reading for zone '{zone}': {reason}")]
    MalformedReading { zone: ZoneId, reason: String },
}

impl ZoneError {
    pub fn malformed(zone: &ZoneId, reason: impl Into<String>) -> Self {
        ZoneError::MalformedReading {
            zone: zone.clone(),
            reason: reason.into(),
        }
    }
}
