use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{Club, Competition};

const LOCK_ATTEMPTS: u32 = 50;
const LOCK_RETRY: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub enum LedgerError {
    /// Wrapping key missing, empty collection, or a record that does not parse.
    Corrupt { path: PathBuf, reason: String },
    /// Advisory lock not acquired within the retry window.
    LockTimeout(PathBuf),
    Io(io::Error),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Corrupt { path, reason } => {
                write!(f, "corrupt ledger {}: {reason}", path.display())
            }
            LedgerError::LockTimeout(path) => {
                write!(f, "could not lock ledger {}", path.display())
            }
            LedgerError::Io(e) => write!(f, "ledger I/O error: {e}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<io::Error> for LedgerError {
    fn from(e: io::Error) -> Self {
        LedgerError::Io(e)
    }
}

#[derive(Serialize, Deserialize)]
struct ClubLedger {
    clubs: Vec<Club>,
}

#[derive(Serialize, Deserialize)]
struct CompetitionLedger {
    competitions: Vec<Competition>,
}

/// Flat-file ledger store: two JSON documents, each a wrapping key over an
/// ordered list of records.
///
/// Locking goes through a sidecar `.lock` file per document — shared for
/// readers, exclusive for writers — because the lock must outlive the
/// atomic-rename replacement of the document itself. Writes serialize the
/// whole collection to a sibling temp file, fsync it, then rename it over
/// the destination, so a crash mid-write never exposes a partial collection
/// to the next reader.
pub struct LedgerStore {
    clubs_path: PathBuf,
    competitions_path: PathBuf,
}

impl LedgerStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            clubs_path: dir.join("clubs.json"),
            competitions_path: dir.join("competitions.json"),
        }
    }

    pub fn clubs_path(&self) -> &Path {
        &self.clubs_path
    }

    pub fn competitions_path(&self) -> &Path {
        &self.competitions_path
    }

    pub fn load_clubs(&self) -> Result<Vec<Club>, LedgerError> {
        let ledger: ClubLedger = read_collection(&self.clubs_path)?;
        nonempty(ledger.clubs, &self.clubs_path)
    }

    pub fn load_competitions(&self) -> Result<Vec<Competition>, LedgerError> {
        let ledger: CompetitionLedger = read_collection(&self.competitions_path)?;
        nonempty(ledger.competitions, &self.competitions_path)
    }

    pub fn save_clubs(&self, clubs: &[Club]) -> Result<(), LedgerError> {
        write_collection(&self.clubs_path, &ClubLedger { clubs: clubs.to_vec() })
    }

    pub fn save_competitions(&self, competitions: &[Competition]) -> Result<(), LedgerError> {
        write_collection(
            &self.competitions_path,
            &CompetitionLedger { competitions: competitions.to_vec() },
        )
    }
}

fn nonempty<T>(records: Vec<T>, path: &Path) -> Result<Vec<T>, LedgerError> {
    if records.is_empty() {
        return Err(LedgerError::Corrupt {
            path: path.to_path_buf(),
            reason: "empty collection".into(),
        });
    }
    Ok(records)
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<T, LedgerError> {
    let _lock = acquire_lock(path, LockKind::Shared)?;
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| LedgerError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_collection<T: Serialize>(path: &Path, value: &T) -> Result<(), LedgerError> {
    let _lock = acquire_lock(path, LockKind::Exclusive)?;

    let tmp_path = path.with_extension("json.tmp");
    let tmp = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(tmp);
    if let Err(e) = serde_json::to_writer_pretty(&mut writer, value) {
        let _ = fs::remove_file(&tmp_path);
        return Err(LedgerError::Io(io::Error::new(io::ErrorKind::InvalidData, e)));
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

/// Take the sidecar advisory lock for `path`. The returned handle holds the
/// lock until dropped.
fn acquire_lock(path: &Path, kind: LockKind) -> Result<File, LedgerError> {
    let lock_path = path.with_extension("json.lock");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&lock_path)?;
    for _ in 0..LOCK_ATTEMPTS {
        let attempt = match kind {
            LockKind::Shared => file.try_lock_shared(),
            LockKind::Exclusive => file.try_lock(),
        };
        match attempt {
            Ok(()) => return Ok(file),
            Err(TryLockError::WouldBlock) => std::thread::sleep(LOCK_RETRY),
            Err(TryLockError::Error(e)) => return Err(LedgerError::Io(e)),
        }
    }
    Err(LedgerError::LockTimeout(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("podium_test_ledger").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn club(name: &str, email: &str, points: u32) -> Club {
        Club {
            name: name.into(),
            email: email.into(),
            points,
        }
    }

    fn competition(name: &str, capacity: u32) -> Competition {
        Competition {
            name: name.into(),
            date: "2027-03-27 10:00:00".into(),
            capacity,
            bookings: Default::default(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = test_dir("round_trip");
        let store = LedgerStore::new(&dir);

        let clubs = vec![club("Simply Lift", "john@simplylift.co", 13)];
        let mut comp = competition("Spring Festival", 25);
        comp.bookings.insert("Simply Lift".into(), 3);
        let competitions = vec![comp];

        store.save_clubs(&clubs).unwrap();
        store.save_competitions(&competitions).unwrap();

        assert_eq!(store.load_clubs().unwrap(), clubs);
        assert_eq!(store.load_competitions().unwrap(), competitions);
    }

    #[test]
    fn load_accepts_string_encoded_counts() {
        let dir = test_dir("string_counts");
        fs::write(
            dir.join("clubs.json"),
            r#"{"clubs": [{"name": "Iron Temple", "email": "admin@irontemple.com", "points": "4"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("competitions.json"),
            r#"{"competitions": [{"name": "Fall Classic", "date": "2027-10-22 13:30:00", "capacity": "13"}]}"#,
        )
        .unwrap();

        let store = LedgerStore::new(&dir);
        assert_eq!(store.load_clubs().unwrap()[0].points, 4);
        assert_eq!(store.load_competitions().unwrap()[0].capacity, 13);
    }

    #[test]
    fn save_normalizes_counts_to_numbers() {
        let dir = test_dir("normalize");
        fs::write(
            dir.join("clubs.json"),
            r#"{"clubs": [{"name": "She Lifts", "email": "kate@shelifts.co.uk", "points": "12"}]}"#,
        )
        .unwrap();

        let store = LedgerStore::new(&dir);
        let clubs = store.load_clubs().unwrap();
        store.save_clubs(&clubs).unwrap();

        let raw = fs::read_to_string(dir.join("clubs.json")).unwrap();
        assert!(raw.contains(r#""points": 12"#), "counts should be numbers: {raw}");
    }

    #[test]
    fn missing_wrapping_key_is_corrupt() {
        let dir = test_dir("missing_key");
        fs::write(dir.join("clubs.json"), r#"{"memberships": []}"#).unwrap();

        let result = LedgerStore::new(&dir).load_clubs();
        assert!(matches!(result, Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn empty_collection_is_corrupt() {
        let dir = test_dir("empty");
        fs::write(dir.join("competitions.json"), r#"{"competitions": []}"#).unwrap();

        let result = LedgerStore::new(&dir).load_competitions();
        assert!(matches!(result, Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn negative_count_is_corrupt() {
        let dir = test_dir("negative");
        fs::write(
            dir.join("clubs.json"),
            r#"{"clubs": [{"name": "A", "email": "a@a.io", "points": -5}]}"#,
        )
        .unwrap();

        let result = LedgerStore::new(&dir).load_clubs();
        assert!(matches!(result, Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn malformed_json_is_corrupt() {
        let dir = test_dir("malformed");
        fs::write(dir.join("clubs.json"), r#"{"clubs": ["#).unwrap();

        let result = LedgerStore::new(&dir).load_clubs();
        assert!(matches!(result, Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn missing_file_is_io() {
        let dir = test_dir("missing_file");
        let result = LedgerStore::new(&dir).load_clubs();
        assert!(matches!(result, Err(LedgerError::Io(_))));
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = test_dir("no_temp");
        let store = LedgerStore::new(&dir);

        store.save_clubs(&[club("A", "a@a.io", 1)]).unwrap();
        store.save_clubs(&[club("A", "a@a.io", 2)]).unwrap();

        assert!(!dir.join("clubs.json.tmp").exists());
        assert_eq!(store.load_clubs().unwrap()[0].points, 2);
    }

    #[test]
    fn shared_locks_coexist() {
        let dir = test_dir("shared_locks");
        let store = LedgerStore::new(&dir);
        store.save_clubs(&[club("A", "a@a.io", 1)]).unwrap();

        let reader = File::open(dir.join("clubs.json.lock")).unwrap();
        reader.lock_shared().unwrap();

        // A second shared lock is fine.
        assert_eq!(store.load_clubs().unwrap().len(), 1);
    }

    #[test]
    fn exclusive_lock_blocks_readers() {
        let dir = test_dir("exclusive_lock");
        let store = LedgerStore::new(&dir);
        store.save_clubs(&[club("A", "a@a.io", 1)]).unwrap();

        let writer = OpenOptions::new()
            .read(true)
            .write(true)
            .open(dir.join("clubs.json.lock"))
            .unwrap();
        writer.lock().unwrap();

        let result = store.load_clubs();
        assert!(matches!(result, Err(LedgerError::LockTimeout(_))));
    }

    #[test]
    fn exclusive_lock_blocks_writers() {
        let dir = test_dir("writer_vs_writer");
        let store = LedgerStore::new(&dir);
        store.save_clubs(&[club("A", "a@a.io", 1)]).unwrap();

        let other = OpenOptions::new()
            .read(true)
            .write(true)
            .open(dir.join("clubs.json.lock"))
            .unwrap();
        other.lock().unwrap();

        let result = store.save_clubs(&[club("A", "a@a.io", 9)]);
        assert!(matches!(result, Err(LedgerError::LockTimeout(_))));

        drop(other);
        // The blocked save wrote nothing.
        assert_eq!(store.load_clubs().unwrap()[0].points, 1);
    }
}
