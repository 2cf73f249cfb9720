use alloc::string::ToString;

use crate::*;

/// Issue number of a game-state write. Higher means issued later.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// How a store handled a write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ack {
    Applied,
    /// A newer revision already landed, this one was dropped.
    Superseded,
}

/// Storage port used by the engine to keep a game across restarts.
///
/// Implementations may complete writes in any order, but must drop a game-state write once a
/// newer [`Revision`] has been applied. [`RevisionGuard`] does that bookkeeping.
pub trait PersistenceGateway {
    /// `None` when no game is stored.
    fn load_game_state(&mut self) -> core::result::Result<Option<SerializedSession>, StorageError>;

    fn save_game_state(
        &mut self,
        revision: Revision,
        session: &SerializedSession,
    ) -> core::result::Result<Ack, StorageError>;

    fn clear_game_state(&mut self, revision: Revision) -> core::result::Result<Ack, StorageError>;

    fn best_score(&mut self) -> core::result::Result<u32, StorageError>;

    fn set_best_score(&mut self, score: u32) -> core::result::Result<Ack, StorageError>;
}

/// Last-write-wins by issue order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RevisionGuard {
    latest: Option<Revision>,
}

impl RevisionGuard {
    pub const fn new() -> Self {
        Self { latest: None }
    }

    /// Returns whether a write carrying `revision` may be applied, remembering it if so.
    pub fn admit(&mut self, revision: Revision) -> bool {
        match self.latest {
            Some(latest) if revision <= latest => {
                log::debug!(
                    "Dropping write {:?}, {:?} already applied",
                    revision,
                    latest
                );
                false
            }
            _ => {
                self.latest = Some(revision);
                true
            }
        }
    }

    pub fn latest(&self) -> Option<Revision> {
        self.latest
    }
}

/// Gateway keeping everything in memory. Useful for tests and headless play.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryGateway {
    session: Option<SerializedSession>,
    best_score: u32,
    guard: RevisionGuard,
    fail_writes: bool,
    fail_reads: bool,
    writes: usize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that already holds a saved game.
    pub fn with_session(session: SerializedSession) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    pub fn with_best_score(mut self, best_score: u32) -> Self {
        self.best_score = best_score;
        self
    }

    /// Makes every following write fail with [`StorageError::Unavailable`].
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Makes every following read fail with [`StorageError::Unavailable`].
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn session(&self) -> Option<&SerializedSession> {
        self.session.as_ref()
    }

    pub fn stored_best_score(&self) -> u32 {
        self.best_score
    }

    /// Number of game-state writes that were applied.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn check_read(&self) -> core::result::Result<(), StorageError> {
        if self.fail_reads {
            Err(StorageError::Unavailable("reads disabled".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> core::result::Result<(), StorageError> {
        if self.fail_writes {
            Err(StorageError::Unavailable("writes disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load_game_state(&mut self) -> core::result::Result<Option<SerializedSession>, StorageError> {
        self.check_read()?;
        Ok(self.session.clone())
    }

    fn save_game_state(
        &mut self,
        revision: Revision,
        session: &SerializedSession,
    ) -> core::result::Result<Ack, StorageError> {
        self.check_write()?;
        if !self.guard.admit(revision) {
            return Ok(Ack::Superseded);
        }
        self.session = Some(session.clone());
        self.writes += 1;
        Ok(Ack::Applied)
    }

    fn clear_game_state(&mut self, revision: Revision) -> core::result::Result<Ack, StorageError> {
        self.check_write()?;
        if !self.guard.admit(revision) {
            return Ok(Ack::Superseded);
        }
        self.session = None;
        self.writes += 1;
        Ok(Ack::Applied)
    }

    fn best_score(&mut self) -> core::result::Result<u32, StorageError> {
        self.check_read()?;
        Ok(self.best_score)
    }

    fn set_best_score(&mut self, score: u32) -> core::result::Result<Ack, StorageError> {
        self.check_write()?;
        self.best_score = score;
        Ok(Ack::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(score: u32) -> SerializedSession {
        let game = Game::with_grid(Grid::new(2), GameConfig::default());
        SerializedSession {
            score,
            ..game.serialize()
        }
    }

    #[test]
    fn guard_only_admits_newer_revisions() {
        let mut guard = RevisionGuard::new();

        assert!(guard.admit(Revision(1)));
        assert!(guard.admit(Revision(3)));
        assert!(!guard.admit(Revision(2)));
        assert!(!guard.admit(Revision(3)));
        assert_eq!(guard.latest(), Some(Revision(3)));
    }

    #[test]
    fn late_write_does_not_clobber_newer_state() {
        let mut gateway = MemoryGateway::new();
        let first = Revision::default().next();
        let second = first.next();

        // second write completes before the first one
        assert_eq!(gateway.save_game_state(second, &session(8)), Ok(Ack::Applied));
        assert_eq!(gateway.save_game_state(first, &session(4)), Ok(Ack::Superseded));

        assert_eq!(gateway.session().map(|s| s.score), Some(8));
        assert_eq!(gateway.writes(), 1);
    }

    #[test]
    fn late_save_does_not_resurrect_cleared_game() {
        let mut gateway = MemoryGateway::with_session(session(16));

        assert_eq!(gateway.clear_game_state(Revision(5)), Ok(Ack::Applied));
        assert_eq!(gateway.save_game_state(Revision(4), &session(16)), Ok(Ack::Superseded));

        assert_eq!(gateway.load_game_state(), Ok(None));
    }

    #[test]
    fn injected_failures_surface_as_unavailable() {
        let mut gateway = MemoryGateway::new().with_best_score(10);
        gateway.fail_writes(true);

        assert!(matches!(
            gateway.set_best_score(20),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(gateway.best_score(), Ok(10));

        gateway.fail_reads(true);
        assert!(gateway.load_game_state().is_err());
    }
}
