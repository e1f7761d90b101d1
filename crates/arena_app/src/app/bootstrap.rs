//! Startup wiring: tracing, environment configuration, and the optional
//! tuning file.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use arena_core::{GameSession, GameTuning, TuningError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::loop_runner::LoopConfig;

pub(crate) const TUNING_ENV_VAR: &str = "ARENA_TUNING";
pub(crate) const DIFFICULTY_ENV_VAR: &str = "ARENA_DIFFICULTY";
pub(crate) const SEED_ENV_VAR: &str = "ARENA_SEED";
pub(crate) const TPS_ENV_VAR: &str = "ARENA_TPS";
pub(crate) const UNPACED_ENV_VAR: &str = "ARENA_UNPACED";
pub(crate) const REPORT_ENV_VAR: &str = "ARENA_REPORT";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    ReadTuning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning file {path} at {json_path}: {source}")]
    ParseTuning {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid tuning in {path}: {source}")]
    InvalidTuning {
        path: PathBuf,
        #[source]
        source: TuningError,
    },
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnvVar { var: &'static str, value: String },
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: GameSession,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Arena Survival Startup ===");

    let tuning = match env::var(TUNING_ENV_VAR) {
        Ok(raw) => load_tuning(PathBuf::from(raw))?,
        Err(_) => GameTuning::default(),
    };
    let difficulty_level = parse_env::<i32>(DIFFICULTY_ENV_VAR)?.unwrap_or(1);
    let seed = parse_env::<u64>(SEED_ENV_VAR)?;
    let target_tps = parse_env::<u32>(TPS_ENV_VAR)?.unwrap_or(60);
    let unpaced = env::var(UNPACED_ENV_VAR)
        .map(|raw| matches!(raw.trim(), "1" | "true"))
        .unwrap_or(false);
    let report_path = env::var(REPORT_ENV_VAR).ok().map(PathBuf::from);

    let config = LoopConfig {
        target_tps,
        unpaced,
        difficulty_level,
        report_path,
        ..LoopConfig::default()
    };
    let mut session = GameSession::new(tuning, seed);
    session.set_difficulty(difficulty_level);

    Ok(AppWiring { config, session })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Loads and validates a tuning file. Absent fields keep their defaults, so
/// a file only has to name what it overrides.
fn load_tuning(path: PathBuf) -> Result<GameTuning, ConfigError> {
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::ReadTuning {
        path: path.clone(),
        source,
    })?;

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let tuning = match serde_path_to_error::deserialize::<_, GameTuning>(&mut deserializer) {
        Ok(tuning) => tuning,
        Err(error) => {
            let json_path = error.path().to_string();
            let json_path = if json_path.is_empty() || json_path == "." {
                "<root>".to_string()
            } else {
                json_path
            };
            return Err(ConfigError::ParseTuning {
                path,
                json_path,
                source: error.into_inner(),
            });
        }
    };

    tuning
        .validate()
        .map_err(|source| ConfigError::InvalidTuning {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), "tuning_loaded");
    Ok(tuning)
}

fn parse_env<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ConfigError::InvalidEnvVar { var, value: raw }),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tuning(json: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tuning.json");
        fs::write(&path, json).expect("write tuning");
        (dir, path)
    }

    #[test]
    fn tuning_file_overrides_merge_with_defaults() {
        let (_dir, path) = write_tuning(
            r#"{"session": {"time_limit_seconds": 90.0}, "player": {"move_speed": 7.5}}"#,
        );
        let tuning = load_tuning(path).expect("load");

        assert_eq!(tuning.session.time_limit_seconds, 90.0);
        assert_eq!(tuning.player.move_speed, 7.5);
        // Untouched sections keep their defaults.
        assert_eq!(tuning.session.spawn_interval_seconds, 3.0);
        assert_eq!(tuning.player.max_health, 100);
    }

    #[test]
    fn malformed_tuning_reports_the_json_path() {
        let (_dir, path) = write_tuning(r#"{"session": {"time_limit_seconds": "soon"}}"#);
        let err = load_tuning(path).expect_err("must fail");

        match err {
            ConfigError::ParseTuning { json_path, .. } => {
                assert!(json_path.contains("session.time_limit_seconds"), "{json_path}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_tuning_is_rejected() {
        let (_dir, path) = write_tuning(r#"{"player": {"move_speed": -1.0}}"#);
        let err = load_tuning(path).expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidTuning { .. }));
    }

    #[test]
    fn missing_tuning_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_tuning(dir.path().join("nope.json")).expect_err("must fail");
        assert!(matches!(err, ConfigError::ReadTuning { .. }));
    }
}
