use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 8;
const FILE_NAME: &str = "participant.json";

/// Short random participant identifier, 8 characters of `[0-9a-z]`.
pub fn generate_id<R: Rng>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| ID_ALPHABET.contains(&b))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantFile {
    participant_id: String,
}

/// Keeps the current participant id across restarts until its batch is saved.
pub struct ParticipantStore {
    base_dir: PathBuf,
}

impl ParticipantStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path(&self) -> PathBuf {
        self.base_dir.join(FILE_NAME)
    }

    /// Stored id if there is a readable, well-formed one.
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(self.path()).ok()?;
        let file: ParticipantFile = serde_json::from_str(&content).ok()?;
        is_valid_id(&file.participant_id).then_some(file.participant_id)
    }

    pub fn save(&self, id: &str) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.path();
        let tmp_path = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(&ParticipantFile {
            participant_id: id.to_string(),
        })?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Reuse the stored id or create and persist a new one.
    pub fn load_or_create(&self) -> Result<String> {
        if let Some(id) = self.load() {
            log::info!("resuming participant {id}");
            return Ok(id);
        }
        let id = generate_id(&mut SmallRng::from_entropy());
        self.save(&id)?;
        log::info!("new participant {id}");
        Ok(id)
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_ids_are_well_formed() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            let id = generate_id(&mut rng);
            assert!(is_valid_id(&id), "{id}");
        }
    }

    #[test]
    fn test_is_valid_id_rejects_bad_ids() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("ABCDEFGH"));
        assert!(!is_valid_id("abc"));
        assert!(!is_valid_id("abcdefgh1"));
    }

    #[test]
    fn test_load_or_create_reuses_stored_id() {
        let dir = TempDir::new().unwrap();
        let store = ParticipantStore::new(dir.path());
        let first = store.load_or_create().unwrap();
        let second = store.load_or_create().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_clear_removes_id() {
        let dir = TempDir::new().unwrap();
        let store = ParticipantStore::new(dir.path());
        store.save("abcd1234").unwrap();
        assert_eq!(store.load().as_deref(), Some("abcd1234"));
        store.clear().unwrap();
        assert!(store.load().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FILE_NAME), "not json").unwrap();
        let store = ParticipantStore::new(dir.path());
        assert!(store.load().is_none());
    }
}
