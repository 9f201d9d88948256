use crate::limits::PER_COMPETITION_CAP;
use crate::model::{Club, Competition};

use super::EngineError;

/// Parse the externally supplied quantity. Text that is not a base-10
/// integer is `InvalidPlaces`; zero or negative is `NonPositivePlaces`.
pub(super) fn parse_places(raw: &str) -> Result<u64, EngineError> {
    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidPlaces(raw.trim().to_string()))?;
    if n <= 0 {
        return Err(EngineError::NonPositivePlaces(n));
    }
    Ok(n as u64)
}

/// Admission rules in fixed order; the first failing rule wins. The
/// structural check (cumulative cap) runs before the cross-record reads
/// (capacity, then points), so a request that is both over-cap and
/// over-capacity always reports the cap violation.
pub(super) fn admit(
    club: &Club,
    competition: &Competition,
    requested: u64,
    already_booked: u32,
) -> Result<u32, EngineError> {
    if requested + u64::from(already_booked) > u64::from(PER_COMPETITION_CAP) {
        return Err(EngineError::CapExceeded {
            requested,
            already_booked,
        });
    }
    // Fits u32 from here on: requested ≤ PER_COMPETITION_CAP.
    let requested = requested as u32;
    if requested > competition.capacity {
        return Err(EngineError::InsufficientCapacity {
            requested,
            available: competition.capacity,
        });
    }
    if requested > club.points {
        return Err(EngineError::InsufficientPoints {
            requested,
            available: club.points,
        });
    }
    Ok(requested)
}

/// Full decision over one booking request: parse, then admit. Pure — no
/// state is read beyond the two records, none is written.
pub fn decide(
    club: &Club,
    competition: &Competition,
    raw_places: &str,
    already_booked: u32,
) -> Result<u32, EngineError> {
    let requested = parse_places(raw_places)?;
    admit(club, competition, requested, already_booked)
}
