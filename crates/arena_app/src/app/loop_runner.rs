//! Fixed-timestep driver for a headless session: paced against the wall
//! clock by default, or free-running for batch runs.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use arena_core::{
    present, DisplaySink, GameSession, GameplayEvent, HudPanel, HudSnapshot, InputSnapshot,
    SessionPhase,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::bootstrap::AppWiring;
use super::pilot::Pilot;

#[derive(Debug, Clone)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_frame_delta: Duration,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) metrics_log_interval: Duration,
    pub(crate) unpaced: bool,
    pub(crate) difficulty_level: i32,
    pub(crate) report_path: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            unpaced: false,
            difficulty_level: 1,
            report_path: None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to encode run report: {0}")]
    EncodeReport(#[source] serde_json::Error),
    #[error("failed to write run report to {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn run(wiring: AppWiring) -> Result<(), AppError> {
    let AppWiring { config, mut session } = wiring;

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    let mut pilot = Pilot::default();
    let mut sink = LogDisplaySink;
    let mut last_snapshot: Option<HudSnapshot> = None;

    session.start();
    info!(target_tps, unpaced = config.unpaced, "loop_started");

    if config.unpaced {
        loop {
            let input = pilot.snapshot_for_tick(&session);
            if !advance_one_tick(&mut session, &input, fixed_dt_seconds, config.difficulty_level)
            {
                break;
            }
            present_if_changed(&session, &mut last_snapshot, &mut sink);
        }
    } else {
        let mut accumulator = Duration::ZERO;
        let mut last_frame_instant = Instant::now();
        let mut metrics = MetricsAccumulator::new(metrics_log_interval);

        'outer: loop {
            let now = Instant::now();
            let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;

            let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
            accumulator = accumulator.saturating_add(clamped_frame_dt);

            let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
            for _ in 0..step_plan.ticks_to_run {
                let input = pilot.snapshot_for_tick(&session);
                if !advance_one_tick(
                    &mut session,
                    &input,
                    fixed_dt_seconds,
                    config.difficulty_level,
                ) {
                    break 'outer;
                }
                metrics.record_tick();
            }
            accumulator = step_plan.remaining_accumulator;

            if step_plan.dropped_backlog > Duration::ZERO {
                warn!(
                    dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                    max_ticks_per_frame, "sim_clamp_triggered"
                );
            }

            present_if_changed(&session, &mut last_snapshot, &mut sink);

            if let Some(tps) = metrics.interval_elapsed() {
                info!(tps, "loop_metrics");
            }

            if accumulator < fixed_dt {
                thread::sleep(fixed_dt - accumulator);
            }
        }
    }

    // Final frame so the terminal panel is always shown.
    let final_snapshot = HudSnapshot::capture(&session);
    present(&final_snapshot, &mut sink);
    info!(
        outcome = ?session.phase(),
        score = session.score(),
        score_target = session.score_target(),
        elapsed_seconds = session.elapsed_seconds(),
        enemies_defeated = session.enemies_defeated(),
        items_collected = session.items_collected(),
        "session_summary"
    );

    if let Some(path) = config.report_path {
        let report = RunReport {
            outcome: session.phase(),
            score: session.score(),
            score_target: session.score_target(),
            elapsed_seconds: session.elapsed_seconds(),
            difficulty_level: session.difficulty_level(),
            hud: final_snapshot,
        };
        write_report(&path, &report)?;
    }

    Ok(())
}

/// Applies one tick worth of control input. Returns false when the run
/// should end.
fn advance_one_tick(
    session: &mut GameSession,
    input: &InputSnapshot,
    fixed_dt_seconds: f32,
    difficulty_level: i32,
) -> bool {
    if input.quit_requested() {
        info!("quit_requested");
        return false;
    }
    if input.restart_pressed() && session.phase().is_terminal() {
        session.restart();
        // Restart drops back to level 1; the configured level applies to the
        // fresh run as well.
        session.set_difficulty(difficulty_level);
    }
    session.tick(fixed_dt_seconds, input);
    log_gameplay_events(session);
    true
}

fn log_gameplay_events(session: &mut GameSession) {
    for event in session.drain_events() {
        match event {
            GameplayEvent::EnemySpawned { id, kind } => {
                debug!(id = id.0, ?kind, "enemy_spawned");
            }
            GameplayEvent::EnemyDied { id, score_awarded } => {
                info!(id = id.0, score_awarded, "enemy_defeated");
            }
            GameplayEvent::ItemSpawned { id, kind, value } => {
                debug!(id = id.0, ?kind, value, "item_spawned");
            }
            GameplayEvent::ItemCollected {
                id,
                kind,
                value,
                points_awarded,
            } => {
                info!(id = id.0, ?kind, value, points_awarded, "item_collected");
            }
            GameplayEvent::ItemExpired { id } => {
                debug!(id = id.0, "item_expired");
            }
            GameplayEvent::PlayerDamaged {
                amount,
                health_after,
            } => {
                info!(amount, health_after, "player_damaged");
            }
            GameplayEvent::PlayerHitIgnored { amount } => {
                debug!(amount, "player_hit_ignored");
            }
            GameplayEvent::SessionWon => {
                info!("victory");
            }
            GameplayEvent::SessionLost { reason } => {
                info!(reason = reason.message(), "defeat");
            }
        }
    }
}

fn present_if_changed(
    session: &GameSession,
    last_snapshot: &mut Option<HudSnapshot>,
    sink: &mut LogDisplaySink,
) {
    let snapshot = HudSnapshot::capture(session);
    if last_snapshot.as_ref() != Some(&snapshot) {
        present(&snapshot, sink);
        *last_snapshot = Some(snapshot);
    }
}

/// HUD surface for a headless run; frontends with real widgets implement
/// the same trait.
struct LogDisplaySink;

impl DisplaySink for LogDisplaySink {
    fn set_score_text(&mut self, text: &str) {
        info!(text, "hud_score");
    }
    fn set_health_text(&mut self, text: &str, warning: bool) {
        info!(text, warning, "hud_health");
    }
    fn set_timer_text(&mut self, text: &str, warning: bool) {
        info!(text, warning, "hud_timer");
    }
    fn set_status_line(&mut self, text: Option<&str>) {
        if let Some(text) = text {
            info!(text, "hud_status");
        }
    }
    fn show_panel(&mut self, panel: HudPanel, visible: bool) {
        if visible {
            debug!(?panel, "hud_panel");
        }
    }
}

#[derive(Debug, Serialize)]
struct RunReport {
    outcome: SessionPhase,
    score: i32,
    score_target: i32,
    elapsed_seconds: f32,
    difficulty_level: u8,
    hud: HudSnapshot,
}

fn write_report(path: &PathBuf, report: &RunReport) -> Result<(), AppError> {
    let encoded = serde_json::to_string_pretty(report).map_err(AppError::EncodeReport)?;
    fs::write(path, encoded).map_err(|source| AppError::WriteReport {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "report_written");
    Ok(())
}

struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
}

impl MetricsAccumulator {
    fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            ticks: 0,
        }
    }

    fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    /// Returns the measured tick rate once per interval.
    fn interval_elapsed(&mut self) -> Option<f32> {
        let elapsed = self.interval_start.elapsed();
        if elapsed < self.interval {
            return None;
        }
        let tps = self.ticks as f32 / elapsed.as_secs_f32();
        self.interval_start = Instant::now();
        self.ticks = 0;
        Some(tps)
    }
}

struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::GameTuning;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_keeps_partial_remainder() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(40), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(8));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn normalize_non_zero_duration_falls_back_on_zero() {
        let fallback = Duration::from_secs(1);
        assert_eq!(normalize_non_zero_duration(Duration::ZERO, fallback), fallback);
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn restart_press_on_a_terminal_session_starts_a_fresh_run() {
        let mut tuning = GameTuning::default();
        tuning.session.time_limit_seconds = 0.01;
        let mut session = GameSession::new(tuning, Some(1));
        session.set_difficulty(3);
        session.start();
        session.add_score(5);

        session.tick(1.0 / 60.0, &InputSnapshot::empty());
        assert!(session.phase().is_terminal());
        assert_eq!(session.score(), 5);

        let restart = InputSnapshot::empty().with_restart_pressed(true);
        assert!(advance_one_tick(&mut session, &restart, 1.0 / 60.0, 3));
        // Score banked in the previous run is gone and the configured
        // difficulty is applied to the fresh one.
        assert_eq!(session.score(), 0);
        assert_eq!(session.difficulty_level(), 3);
    }

    #[test]
    fn restart_press_is_ignored_while_running() {
        let mut session = GameSession::new(GameTuning::default(), Some(1));
        session.start();
        session.tick(1.0 / 60.0, &InputSnapshot::empty());
        let elapsed = session.elapsed_seconds();

        let restart = InputSnapshot::empty().with_restart_pressed(true);
        assert!(advance_one_tick(&mut session, &restart, 1.0 / 60.0, 1));
        assert!(session.elapsed_seconds() > elapsed);
    }

    #[test]
    fn quit_request_ends_the_run_without_ticking() {
        let mut session = GameSession::new(GameTuning::default(), Some(1));
        session.start();

        let quit = InputSnapshot::empty().with_quit_requested(true);
        assert!(!advance_one_tick(&mut session, &quit, 1.0 / 60.0, 1));
        assert_eq!(session.elapsed_seconds(), 0.0);
    }

    #[test]
    fn report_is_written_as_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");

        let mut session = GameSession::new(GameTuning::default(), Some(1));
        session.start();
        let report = RunReport {
            outcome: session.phase(),
            score: session.score(),
            score_target: session.score_target(),
            elapsed_seconds: session.elapsed_seconds(),
            difficulty_level: session.difficulty_level(),
            hud: HudSnapshot::capture(&session),
        };
        write_report(&path, &report).expect("write report");

        let raw = fs::read_to_string(&path).expect("read report");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(parsed["outcome"], "running");
        assert_eq!(parsed["score"], 0);
        assert_eq!(parsed["hud"]["score_text"], "Score: 0");
    }
}
