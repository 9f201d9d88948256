use crate::model::{Club, Competition};

use super::{Engine, SharedClub, SharedCompetition};

impl Engine {
    /// Resolve a club by unique name. A miss is a value, not an error.
    pub fn club(&self, name: &str) -> Option<SharedClub> {
        self.clubs.get(name).map(|e| e.value().clone())
    }

    /// Resolve a club by login email.
    pub fn club_by_email(&self, email: &str) -> Option<SharedClub> {
        let name = self.email_index.get(email)?;
        self.club(name.value())
    }

    /// Resolve a competition by unique name.
    pub fn competition(&self, name: &str) -> Option<SharedCompetition> {
        self.competitions.get(name).map(|e| e.value().clone())
    }

    /// Clone every club, in ledger order.
    pub async fn clubs_snapshot(&self) -> Vec<Club> {
        let mut out = Vec::with_capacity(self.club_order.len());
        for name in &self.club_order {
            if let Some(club) = self.club(name) {
                out.push(club.read().await.clone());
            }
        }
        out
    }

    /// Clone every competition, in ledger order.
    pub async fn competitions_snapshot(&self) -> Vec<Competition> {
        let mut out = Vec::with_capacity(self.competition_order.len());
        for name in &self.competition_order {
            if let Some(competition) = self.competition(name) {
                out.push(competition.read().await.clone());
            }
        }
        out
    }

    /// Public points board: (club name, points) in ledger order.
    pub async fn points_board(&self) -> Vec<(String, u32)> {
        let mut out = Vec::with_capacity(self.club_order.len());
        for name in &self.club_order {
            if let Some(club) = self.club(name) {
                let guard = club.read().await;
                out.push((guard.name.clone(), guard.points));
            }
        }
        out
    }
}
