use alloc::vec::Vec;
use rand::prelude::*;
use rand::rngs::SmallRng;

use crate::*;

/// Receiver of the snapshots produced after every visible change.
pub trait Actuator {
    fn actuate(&mut self, snapshot: &Snapshot);

    /// Called when a won/lost message should be dismissed.
    fn continue_game(&mut self) {}
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoopActuator;

impl Actuator for NoopActuator {
    fn actuate(&mut self, _snapshot: &Snapshot) {}
}

/// Keeps every snapshot, oldest first.
impl Actuator for Vec<Snapshot> {
    fn actuate(&mut self, snapshot: &Snapshot) {
        self.push(snapshot.clone());
    }
}

/// Result of a move request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    /// `None` when the request was not a direction at all.
    pub report: Option<MoveReport>,
    /// Whether the resulting state reached storage. Unchanged boards count as saved.
    pub persisted: bool,
}

impl Turn {
    pub fn outcome(&self) -> MoveOutcome {
        self.report
            .as_ref()
            .map_or(MoveOutcome::Ignored, |report| report.outcome)
    }
}

/// Runs one game at a time against a storage port and a presentation sink.
pub struct GameEngine<G, A> {
    config: GameConfig,
    game: Game,
    last_move: MoveAnnotations,
    /// `None` until the stored best score has been read once.
    best_score: Option<u32>,
    revision: Revision,
    rng: SmallRng,
    gateway: G,
    actuator: A,
}

impl<G: PersistenceGateway, A: Actuator> GameEngine<G, A> {
    /// Creates the engine and sets up the first game, restoring a stored one if possible.
    pub fn new(config: GameConfig, gateway: G, actuator: A, seed: u64) -> Self {
        let mut engine = Self {
            config,
            // replaced by setup below
            game: Game::with_grid(Grid::new(config.size), config),
            last_move: MoveAnnotations::new(),
            best_score: None,
            revision: Revision::default(),
            rng: SmallRng::seed_from_u64(seed),
            gateway,
            actuator,
        };
        engine.setup();
        engine
    }

    /// Loads the stored game, or starts a fresh one when there is none or it is unusable.
    pub fn setup(&mut self) -> bool {
        self.game = match self.load_game() {
            Some(game) => {
                log::info!("Restored game with score {}", game.score());
                game
            }
            None => {
                log::info!("Starting a new {}x{} game", self.config.size, self.config.size);
                Game::new(self.config, &mut self.rng)
            }
        };
        self.last_move = MoveAnnotations::new();
        self.best_score = None;
        self.refresh_best_score();
        self.actuate()
    }

    /// Throws the current game away, stored copy included, and starts a fresh one.
    pub fn restart(&mut self) -> bool {
        let revision = self.issue_revision();
        if let Err(err) = self.gateway.clear_game_state(revision) {
            log::warn!("Could not clear stored game: {}", err);
        }
        self.actuator.continue_game();
        self.game = Game::new(self.config, &mut self.rng);
        self.last_move = MoveAnnotations::new();
        log::info!("Restarted");
        self.actuate()
    }

    pub fn keep_playing(&mut self) -> Result<bool> {
        self.game.keep_playing()?;
        self.actuator.continue_game();
        Ok(self.actuate())
    }

    /// Moves for a raw input code; codes that are not directions are ignored.
    pub fn move_code(&mut self, code: i64) -> Turn {
        match Direction::from_code(code) {
            Some(direction) => self.make_move(direction),
            None => {
                log::debug!("Ignoring input code {}", code);
                Turn {
                    report: None,
                    persisted: true,
                }
            }
        }
    }

    pub fn make_move(&mut self, direction: Direction) -> Turn {
        let report = self.game.apply_move(direction, &mut self.rng);
        if !report.outcome.has_update() {
            return Turn {
                report: Some(report),
                persisted: true,
            };
        }

        self.last_move = report.annotations.clone();
        let persisted = self.actuate();
        Turn {
            report: Some(report),
            persisted,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let (over, won, _) = self.game.state().flags();
        Snapshot {
            grid: self.game.grid().serialize(),
            score: self.game.score(),
            best_score: self.best_score(),
            over,
            won,
            terminated: self.game.is_terminated(),
            motions: self.last_move.iter().map(MotionState::from).collect(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.game.is_terminated()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Best score known so far, zero while the stored one could not be read.
    pub fn best_score(&self) -> u32 {
        self.best_score.unwrap_or_default()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    fn load_game(&mut self) -> Option<Game> {
        let session = match self.gateway.load_game_state() {
            Ok(session) => session?,
            Err(err) => {
                log::warn!("Could not load stored game, starting fresh: {}", err);
                return None;
            }
        };
        match Game::from_session(&session, self.config) {
            Ok(game) => Some(game),
            Err(err) => {
                log::warn!("Stored game is unusable, starting fresh: {}", err);
                None
            }
        }
    }

    /// Saves the game, updates the best score and hands a snapshot to the actuator. Returns
    /// whether the game state reached storage.
    fn actuate(&mut self) -> bool {
        let score = self.game.score();
        if self.best_score.is_none() {
            self.refresh_best_score();
        }
        // an unknown stored best may be higher, never overwrite it blindly
        match self.best_score {
            Some(best_score) if score > best_score => {
                self.best_score = Some(score);
                if let Err(err) = self.gateway.set_best_score(score) {
                    log::warn!("Could not save best score {}: {}", score, err);
                }
            }
            Some(_) => {}
            None => log::debug!("Best score unknown, not updating it"),
        }

        let revision = self.issue_revision();
        let written = if self.game.state().is_over() {
            self.gateway.clear_game_state(revision)
        } else {
            self.gateway
                .save_game_state(revision, &self.game.serialize())
        };
        let persisted = match written {
            Ok(ack) => {
                log::trace!("{:?} stored: {:?}", revision, ack);
                true
            }
            Err(err) => {
                log::warn!("Could not store game, progress may be lost: {}", err);
                false
            }
        };

        let snapshot = self.snapshot();
        self.actuator.actuate(&snapshot);
        persisted
    }

    fn refresh_best_score(&mut self) {
        match self.gateway.best_score() {
            Ok(best_score) => self.best_score = Some(best_score),
            Err(err) => log::warn!("Could not read best score: {}", err),
        }
    }

    fn issue_revision(&mut self) -> Revision {
        self.revision = self.revision.next();
        self.revision
    }
}
