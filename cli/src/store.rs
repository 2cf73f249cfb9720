use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use twenty48_core::{
    Ack, PersistenceGateway, Revision, RevisionGuard, SerializedSession, StorageError,
};

const GAME_STATE_FILE: &str = "game_state.json";
const BEST_SCORE_FILE: &str = "best_score.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BestScoreRecord {
    best_score: u32,
}

/// Gateway keeping the game in a directory as plain JSON files.
#[derive(Debug)]
pub struct FileGateway {
    dir: PathBuf,
    guard: RevisionGuard,
}

impl FileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            guard: RevisionGuard::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(unavailable(&path, err)),
        }
    }

    /// Writes through a temporary file so readers never see half a file.
    fn write(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|err| unavailable(&self.dir, err))?;
        let path = self.path(name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|err| unavailable(&tmp, err))?;
        fs::rename(&tmp, &path).map_err(|err| unavailable(&path, err))
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(unavailable(&path, err)),
        }
    }
}

fn unavailable(path: &Path, err: io::Error) -> StorageError {
    StorageError::Unavailable(format!("{}: {}", path.display(), err))
}

impl PersistenceGateway for FileGateway {
    fn load_game_state(&mut self) -> Result<Option<SerializedSession>, StorageError> {
        let Some(text) = self.read(GAME_STATE_FILE)? else {
            return Ok(None);
        };
        SerializedSession::from_json(&text)
            .map(Some)
            .map_err(|err| StorageError::Corrupt(format!("{}: {}", GAME_STATE_FILE, err)))
    }

    fn save_game_state(
        &mut self,
        revision: Revision,
        session: &SerializedSession,
    ) -> Result<Ack, StorageError> {
        if !self.guard.admit(revision) {
            return Ok(Ack::Superseded);
        }
        let json = session
            .to_json()
            .map_err(|err| StorageError::Rejected(format!("{}: {}", GAME_STATE_FILE, err)))?;
        self.write(GAME_STATE_FILE, &json)?;
        log::debug!("Saved game to {}", self.path(GAME_STATE_FILE).display());
        Ok(Ack::Applied)
    }

    fn clear_game_state(&mut self, revision: Revision) -> Result<Ack, StorageError> {
        if !self.guard.admit(revision) {
            return Ok(Ack::Superseded);
        }
        self.remove(GAME_STATE_FILE)?;
        log::debug!("Cleared {}", self.path(GAME_STATE_FILE).display());
        Ok(Ack::Applied)
    }

    fn best_score(&mut self) -> Result<u32, StorageError> {
        let Some(text) = self.read(BEST_SCORE_FILE)? else {
            return Ok(0);
        };
        serde_json::from_str::<BestScoreRecord>(&text)
            .map(|record| record.best_score)
            .map_err(|err| StorageError::Corrupt(format!("{}: {}", BEST_SCORE_FILE, err)))
    }

    fn set_best_score(&mut self, score: u32) -> Result<Ack, StorageError> {
        let record = BestScoreRecord { best_score: score };
        let json = serde_json::to_string(&record)
            .map_err(|err| StorageError::Rejected(err.to_string()))?;
        self.write(BEST_SCORE_FILE, &json)?;
        Ok(Ack::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twenty48_core::{Direction, GameConfig, GameEngine, MoveOutcome, NoopActuator};

    #[test]
    fn missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = FileGateway::new(dir.path().join("nested"));

        assert_eq!(gateway.load_game_state(), Ok(None));
        assert_eq!(gateway.best_score(), Ok(0));
        assert_eq!(gateway.clear_game_state(Revision(1)), Ok(Ack::Applied));
    }

    #[test]
    fn game_survives_a_new_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::default();

        let mut engine = GameEngine::new(config, FileGateway::new(dir.path()), NoopActuator, 5);
        for direction in [Direction::Left, Direction::Up, Direction::Right] {
            engine.make_move(direction);
        }
        let saved = engine.game().serialize();
        let best = engine.best_score();
        drop(engine);

        let engine = GameEngine::new(config, FileGateway::new(dir.path()), NoopActuator, 6);
        assert_eq!(engine.game().serialize(), saved);
        assert_eq!(engine.best_score(), best);
    }

    #[test]
    fn corrupt_state_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(GAME_STATE_FILE), "{ not json").unwrap();

        let mut gateway = FileGateway::new(dir.path());
        assert!(matches!(
            gateway.load_game_state(),
            Err(StorageError::Corrupt(_))
        ));

        let mut engine = GameEngine::new(GameConfig::default(), gateway, NoopActuator, 1);
        assert_eq!(engine.game().score(), 0);
        assert_eq!(engine.game().grid().tile_count(), 2);
        assert_ne!(engine.move_code(9).outcome(), MoveOutcome::Moved);
    }

    #[test]
    fn stale_write_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = FileGateway::new(dir.path());
        let session = twenty48_core::Game::with_grid(
            twenty48_core::Grid::new(4),
            GameConfig::default(),
        )
        .serialize();

        assert_eq!(gateway.clear_game_state(Revision(2)), Ok(Ack::Applied));
        assert_eq!(
            gateway.save_game_state(Revision(1), &session),
            Ok(Ack::Superseded)
        );
        assert!(!dir.path().join(GAME_STATE_FILE).exists());
    }
}
