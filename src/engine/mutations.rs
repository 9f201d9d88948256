use std::time::Instant;

use tracing::{debug, error, info};

use crate::ledger::LedgerError;
use crate::model::Receipt;
use crate::observability::LEDGER_SAVE_DURATION_SECONDS;

use super::{Engine, EngineError, rules};

impl Engine {
    /// Book places for a club on a competition.
    ///
    /// Both write locks are held across validation AND commit — club first,
    /// competition second, the same order on every path, so concurrent
    /// bookings cannot deadlock and cannot both observe pre-commit state on
    /// either record. Rejections happen strictly before any mutation.
    pub async fn book_places(
        &self,
        club_name: &str,
        competition_name: &str,
        raw_places: &str,
    ) -> Result<Receipt, EngineError> {
        let club = self
            .club(club_name)
            .ok_or_else(|| EngineError::UnknownClub(club_name.to_string()))?;
        let competition = self
            .competition(competition_name)
            .ok_or_else(|| EngineError::UnknownCompetition(competition_name.to_string()))?;

        let mut club_guard = club.write().await;
        let mut competition_guard = competition.write().await;

        let already_booked = competition_guard.booked_by(&club_guard.name);
        let places = rules::decide(&club_guard, &competition_guard, raw_places, already_booked)?;

        club_guard.points -= places;
        competition_guard.capacity -= places;
        *competition_guard
            .bookings
            .entry(club_guard.name.clone())
            .or_insert(0) += places;

        let receipt = Receipt {
            club: club_guard.name.clone(),
            competition: competition_guard.name.clone(),
            places,
            club_points: club_guard.points,
            competition_capacity: competition_guard.capacity,
        };
        drop(competition_guard);
        drop(club_guard);

        if let Err(e) = self.persist().await {
            error!("ledger persist failed after commit: {e}");
            return Err(e.into());
        }

        info!(
            "booked {} places on {:?} for {:?} ({} points left, {} places left)",
            receipt.places,
            receipt.competition,
            receipt.club,
            receipt.club_points,
            receipt.competition_capacity
        );
        Ok(receipt)
    }

    /// Snapshot both registries and overwrite both ledgers. The persist lock
    /// serializes snapshot-and-save, so the last write to reach disk carries
    /// every commit that completed before it.
    async fn persist(&self) -> Result<(), LedgerError> {
        let _guard = self.persist_lock.lock().await;
        let clubs = self.clubs_snapshot().await;
        let competitions = self.competitions_snapshot().await;

        let start = Instant::now();
        self.store.save_clubs(&clubs)?;
        self.store.save_competitions(&competitions)?;
        metrics::histogram!(LEDGER_SAVE_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        debug!(
            "persisted ledgers ({} clubs, {} competitions)",
            clubs.len(),
            competitions.len()
        );
        Ok(())
    }
}
