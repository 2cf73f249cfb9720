use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use twenty48_core::{Actuator, Direction, GameConfig, GameEngine, Snapshot};

use store::FileGateway;

mod store;

#[derive(Parser, Debug)]
#[command(name = "twenty48", version, about = "Headless 2048 driver", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// TOML file with game settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Board size, overrides the config file
    #[arg(long)]
    size: Option<u8>,

    /// Force a seed instead of one taken from the clock
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where the game and best score are kept
    #[arg(long, env = "TWENTY48_STATE_DIR", default_value = ".twenty48")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current game
    Show,
    /// Apply a key script: wasd or hjkl to move, r to restart, c to keep playing
    Play {
        keys: String,
        /// Print a snapshot after every change instead of only the last one
        #[arg(long)]
        each: bool,
    },
    /// Drop the current game and start over
    Restart,
    /// Continue after reaching the winning tile
    KeepPlaying,
}

/// Prints snapshots as JSON lines when enabled.
struct JsonActuator {
    enabled: bool,
}

impl Actuator for JsonActuator {
    fn actuate(&mut self, snapshot: &Snapshot) {
        if self.enabled {
            print_snapshot(snapshot);
        }
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    match serde_json::to_string(snapshot) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Could not encode snapshot: {}", err),
    }
}

fn load_config(path: Option<&Path>, size: Option<u8>) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<GameConfig>(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(size) = size {
        config.size = size;
    }
    Ok(config.sanitized())
}

fn clock_seed() -> u64 {
    use web_time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn play(engine: &mut GameEngine<FileGateway, JsonActuator>, keys: &str) {
    for key in keys.chars() {
        if let Some(direction) = Direction::from_key(key) {
            let turn = engine.make_move(direction);
            log::debug!("{:?}: {:?}", direction, turn.outcome());
            if !turn.persisted {
                log::warn!("Progress after {:?} was not saved", direction);
            }
            continue;
        }
        match key.to_ascii_lowercase() {
            'r' => {
                engine.restart();
            }
            'c' => {
                if let Err(err) = engine.keep_playing() {
                    log::warn!("{}", err);
                }
            }
            key if key.is_whitespace() => {}
            key => log::debug!("Ignoring key {:?}", key),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = load_config(args.config.as_deref(), args.size)?;
    let seed = args.seed.unwrap_or_else(clock_seed);
    log::debug!("seed: {}, config: {:?}", seed, config);

    let each = matches!(args.command, Command::Play { each: true, .. });
    let gateway = FileGateway::new(&args.state_dir);
    log::debug!("state dir: {}", gateway.dir().display());
    let mut engine = GameEngine::new(config, gateway, JsonActuator { enabled: each }, seed);

    match &args.command {
        Command::Show => {}
        Command::Play { keys, .. } => play(&mut engine, keys),
        Command::Restart => {
            engine.restart();
        }
        Command::KeepPlaying => {
            engine
                .keep_playing()
                .context("cannot keep playing this game")?;
        }
    }

    if !each {
        print_snapshot(&engine.snapshot());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_play_script() {
        let args = Args::try_parse_from(["twenty48", "-s", "3", "--size", "5", "play", "wasd", "--each"])
            .unwrap();

        assert_eq!(args.seed, Some(3));
        assert_eq!(args.size, Some(5));
        assert!(matches!(args.command, Command::Play { ref keys, each: true } if keys == "wasd"));
    }

    #[test]
    fn config_file_is_merged_with_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.toml");
        fs::write(&path, "size = 3\nwinning_value = 1000\n").unwrap();

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.size, 3);
        assert_eq!(config.winning_value, 1024);
        assert_eq!(config.start_tiles, 2);

        let config = load_config(Some(&path), Some(6)).unwrap();
        assert_eq!(config.size, 6);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml")), None).is_err());
    }

    #[test]
    fn restart_key_resets_score() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = GameEngine::new(
            GameConfig::default(),
            FileGateway::new(dir.path()),
            JsonActuator { enabled: false },
            8,
        );

        play(&mut engine, "wasdwasd r");

        assert_eq!(engine.game().score(), 0);
        assert_eq!(engine.game().grid().tile_count(), 2);
    }
}
