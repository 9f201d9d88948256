use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A member club with a spendable points budget. One point reserves one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    /// Unique key, immutable.
    pub name: String,
    /// Unique login key.
    pub email: String,
    /// Non-negative budget, decremented only by a booking commit.
    #[serde(deserialize_with = "de_count")]
    pub points: u32,
}

/// An event with a finite number of bookable places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    /// Unique key, immutable.
    pub name: String,
    /// Display-only; never interpreted.
    pub date: String,
    /// Remaining bookable places.
    #[serde(deserialize_with = "de_count")]
    pub capacity: u32,
    /// Club name → cumulative places committed for this competition.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bookings: BTreeMap<String, u32>,
}

impl Competition {
    /// Places `club` has already committed here (0 if none).
    pub fn booked_by(&self, club: &str) -> u32 {
        self.bookings.get(club).copied().unwrap_or(0)
    }
}

/// Settled numbers returned by a successful booking commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub club: String,
    pub competition: String,
    pub places: u32,
    pub club_points: u32,
    pub competition_capacity: u32,
}

/// Older ledger revisions store counts as decimal strings ("13") rather than
/// numbers. Accept both on load; saves always write numbers.
fn de_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accept_numbers_and_strings() {
        let from_number: Club =
            serde_json::from_str(r#"{"name":"A","email":"a@a.io","points":7}"#).unwrap();
        let from_string: Club =
            serde_json::from_str(r#"{"name":"A","email":"a@a.io","points":"7"}"#).unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.points, 7);
    }

    #[test]
    fn negative_or_garbage_counts_are_rejected() {
        assert!(serde_json::from_str::<Club>(r#"{"name":"A","email":"a@a.io","points":-3}"#).is_err());
        assert!(serde_json::from_str::<Club>(r#"{"name":"A","email":"a@a.io","points":"x"}"#).is_err());
    }

    #[test]
    fn bookings_default_to_empty_and_skip_when_empty() {
        let comp: Competition = serde_json::from_str(
            r#"{"name":"Open","date":"2027-03-27 10:00:00","capacity":"20"}"#,
        )
        .unwrap();
        assert!(comp.bookings.is_empty());
        assert_eq!(comp.booked_by("anyone"), 0);

        let out = serde_json::to_string(&comp).unwrap();
        assert!(!out.contains("bookings"));
        // Counts are normalized to numbers on the way back out.
        assert!(out.contains(r#""capacity":20"#));
    }
}
