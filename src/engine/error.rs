use crate::ledger::LedgerError;

/// Booking errors. Every rejected request yields exactly one kind.
#[derive(Debug)]
pub enum EngineError {
    /// Requested quantity did not parse as a base-10 integer.
    InvalidPlaces(String),
    /// Requested quantity parsed but is zero or negative.
    NonPositivePlaces(i64),
    /// The cumulative per-competition cap would be exceeded.
    CapExceeded { requested: u64, already_booked: u32 },
    /// Not enough places left in the competition.
    InsufficientCapacity { requested: u32, available: u32 },
    /// Not enough points in the club's budget.
    InsufficientPoints { requested: u32, available: u32 },
    UnknownClub(String),
    UnknownCompetition(String),
    /// The post-commit ledger save failed.
    Ledger(LedgerError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidPlaces(raw) => write!(f, "invalid places request: {raw:?}"),
            EngineError::NonPositivePlaces(n) => {
                write!(f, "places must be positive, got {n}")
            }
            EngineError::CapExceeded {
                requested,
                already_booked,
            } => write!(
                f,
                "per-competition cap exceeded: requested {requested} with {already_booked} already booked"
            ),
            EngineError::InsufficientCapacity {
                requested,
                available,
            } => write!(
                f,
                "not enough places: requested {requested}, available {available}"
            ),
            EngineError::InsufficientPoints {
                requested,
                available,
            } => write!(
                f,
                "not enough points: requested {requested}, available {available}"
            ),
            EngineError::UnknownClub(name) => write!(f, "unknown club: {name}"),
            EngineError::UnknownCompetition(name) => write!(f, "unknown competition: {name}"),
            EngineError::Ledger(e) => write!(f, "ledger error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        EngineError::Ledger(e)
    }
}
