//! Read-only HUD projection of a session, plus the sink trait a frontend
//! implements to display it.

use serde::Serialize;

use crate::session::{GameSession, SessionPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HudPanel {
    StartScreen,
    Hud,
    WinScreen,
    GameOverScreen,
}

impl HudPanel {
    pub const ALL: [HudPanel; 4] = [
        HudPanel::StartScreen,
        HudPanel::Hud,
        HudPanel::WinScreen,
        HudPanel::GameOverScreen,
    ];
}

/// Everything a frontend needs for one frame, captured as plain values so it
/// can be compared, logged, or serialized without touching the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub panel: HudPanel,
    pub score_text: String,
    pub health_text: String,
    pub timer_text: String,
    pub health_warning: bool,
    pub time_warning: bool,
    pub status_line: Option<String>,
    pub score: i32,
    pub score_target: i32,
    pub difficulty_level: u8,
    pub enemy_count: usize,
    pub item_count: usize,
    pub items_collected: u32,
    pub enemies_defeated: u32,
}

impl HudSnapshot {
    pub fn capture(session: &GameSession) -> Self {
        let panel = match session.phase() {
            SessionPhase::Idle => HudPanel::StartScreen,
            SessionPhase::Running => HudPanel::Hud,
            SessionPhase::Won => HudPanel::WinScreen,
            SessionPhase::Lost(_) => HudPanel::GameOverScreen,
        };
        let status_line = match session.phase() {
            SessionPhase::Won => Some("You Win!".to_owned()),
            SessionPhase::Lost(reason) => Some(format!("Game Over: {}", reason.message())),
            SessionPhase::Idle | SessionPhase::Running => None,
        };

        let (health, max_health) = session
            .player()
            .map_or((0, 0), |actor| (actor.health, actor.max_health));
        let health_fraction = if max_health > 0 {
            health as f32 / max_health as f32
        } else {
            0.0
        };

        let limit = session.tuning().session.time_limit_seconds;
        let remaining = session.remaining_seconds();
        let remaining_fraction = if limit > 0.0 { remaining / limit } else { 0.0 };

        Self {
            panel,
            score_text: format!("Score: {}", session.score()),
            health_text: format!("Health: {health} / {max_health}"),
            timer_text: format!("Time: {}", format_clock(remaining)),
            health_warning: health_fraction < 0.3,
            time_warning: remaining_fraction < 0.2,
            status_line,
            score: session.score(),
            score_target: session.score_target(),
            difficulty_level: session.difficulty_level(),
            enemy_count: session.world().enemy_count(),
            item_count: session.world().item_count(),
            items_collected: session.items_collected(),
            enemies_defeated: session.enemies_defeated(),
        }
    }
}

/// Frontend surface. The session never draws; it hands a snapshot to one of
/// these.
pub trait DisplaySink {
    fn set_score_text(&mut self, text: &str);
    fn set_health_text(&mut self, text: &str, warning: bool);
    fn set_timer_text(&mut self, text: &str, warning: bool);
    fn set_status_line(&mut self, text: Option<&str>);
    fn show_panel(&mut self, panel: HudPanel, visible: bool);
}

/// Pushes a snapshot to a sink. Exactly one panel is shown; the others are
/// explicitly hidden so the sink never has to track prior state.
pub fn present(snapshot: &HudSnapshot, sink: &mut dyn DisplaySink) {
    sink.set_score_text(&snapshot.score_text);
    sink.set_health_text(&snapshot.health_text, snapshot.health_warning);
    sink.set_timer_text(&snapshot.timer_text, snapshot.time_warning);
    sink.set_status_line(snapshot.status_line.as_deref());
    for panel in HudPanel::ALL {
        sink.show_panel(panel, panel == snapshot.panel);
    }
}

/// Whole seconds as MM:SS, floored.
pub fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
