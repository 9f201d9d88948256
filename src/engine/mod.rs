mod error;
mod mutations;
mod queries;
mod rules;

pub use error::EngineError;
pub use rules::decide;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};

use crate::ledger::{LedgerError, LedgerStore};
use crate::model::{Club, Competition};

pub type SharedClub = Arc<RwLock<Club>>;
pub type SharedCompetition = Arc<RwLock<Competition>>;

/// Booking authorization and settlement engine.
///
/// Owns the in-memory club/competition registries loaded from the ledger
/// store at startup. Bookings mutate records under per-record write locks;
/// every commit persists both ledgers before returning.
pub struct Engine {
    clubs: DashMap<String, SharedClub>,
    competitions: DashMap<String, SharedCompetition>,
    /// email → club name, lookup only.
    email_index: DashMap<String, String>,
    /// Ledger order, fixed at load; snapshots and the points board iterate these.
    club_order: Vec<String>,
    competition_order: Vec<String>,
    store: LedgerStore,
    /// Serializes snapshot-and-save across concurrent commits.
    persist_lock: Mutex<()>,
}

impl Engine {
    /// Load both ledgers and build the registries. Duplicate unique keys are
    /// ledger corruption — the indexes must stay unambiguous.
    pub fn new(store: LedgerStore) -> Result<Self, LedgerError> {
        let clubs = store.load_clubs()?;
        let competitions = store.load_competitions()?;

        let engine = Self {
            clubs: DashMap::new(),
            competitions: DashMap::new(),
            email_index: DashMap::new(),
            club_order: clubs.iter().map(|c| c.name.clone()).collect(),
            competition_order: competitions.iter().map(|c| c.name.clone()).collect(),
            store,
            persist_lock: Mutex::new(()),
        };

        for club in clubs {
            let name = club.name.clone();
            let email = club.email.clone();
            if engine
                .clubs
                .insert(name.clone(), Arc::new(RwLock::new(club)))
                .is_some()
            {
                return Err(LedgerError::Corrupt {
                    path: engine.store.clubs_path().to_path_buf(),
                    reason: format!("duplicate club name: {name}"),
                });
            }
            if engine.email_index.insert(email.clone(), name).is_some() {
                return Err(LedgerError::Corrupt {
                    path: engine.store.clubs_path().to_path_buf(),
                    reason: format!("duplicate club email: {email}"),
                });
            }
        }

        for competition in competitions {
            let name = competition.name.clone();
            if engine
                .competitions
                .insert(name.clone(), Arc::new(RwLock::new(competition)))
                .is_some()
            {
                return Err(LedgerError::Corrupt {
                    path: engine.store.competitions_path().to_path_buf(),
                    reason: format!("duplicate competition name: {name}"),
                });
            }
        }

        Ok(engine)
    }
}
