//! What each screen shows, as plain shapes and labels.
//!
//! Kept separate from rasterisation so the content can be checked without a
//! window or a font.

use crate::layout::{Area, Layout};
use rand::{Rng, SeedableRng};
use reflex_core::{SessionPhase, TestStatus, average};
use reflex_games::{ResultsSink, Session, Signal, SkillTest};
use reflex_timing::Timer;

pub type Rgba = [u8; 4];

pub const BACKGROUND: Rgba = [18, 18, 24, 255];
pub const TEXT: Rgba = [255, 255, 255, 255];
pub const MUTED: Rgba = [160, 160, 170, 255];
pub const PROMPT: Rgba = [255, 220, 90, 255];
pub const ARENA: Rgba = [34, 34, 46, 255];
pub const ARENA_BORDER: Rgba = [80, 80, 100, 255];
pub const TARGET: Rgba = [230, 60, 60, 255];
pub const HIT: Rgba = [80, 220, 120, 255];
pub const MISS: Rgba = [255, 80, 80, 255];
pub const CLICK_BOX: Rgba = [50, 90, 200, 255];
pub const CLICK_FLASH: Rgba = [110, 160, 255, 255];
pub const WAITING: Rgba = [200, 50, 50, 255];
pub const READY: Rgba = [40, 180, 80, 255];
pub const EARLY: Rgba = [230, 140, 30, 255];
pub const DONE: Rgba = [50, 90, 200, 255];

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { area: Area, color: Rgba },
    Outline { area: Area, color: Rgba, width: f32 },
    Circle { center: (f32, f32), radius: f32, color: Rgba },
    Cross { center: (f32, f32), size: f32, color: Rgba },
}

/// Text centred on `pos`
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub pos: (f32, f32),
    pub size: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub shapes: Vec<Shape>,
    pub labels: Vec<Label>,
}

impl Scene {
    fn label(&mut self, text: impl Into<String>, pos: (f32, f32), size: f32, color: Rgba) {
        self.labels.push(Label {
            text: text.into(),
            pos,
            size,
            color,
        });
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.text.as_str())
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

fn percent_or_dash(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}%", v * 100.0),
        None => "-".to_string(),
    }
}

fn ms_or_dash(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.0}"),
        None => "-".to_string(),
    }
}

pub fn build_scene<T, R, S>(session: &Session<T, R, S>, layout: &Layout) -> Scene
where
    T: Timer,
    R: Rng + SeedableRng,
    S: ResultsSink,
{
    let mut scene = Scene::default();
    match session.phase() {
        SessionPhase::Welcome => welcome(&mut scene, layout),
        SessionPhase::Reaction => reaction(&mut scene, session, layout),
        SessionPhase::Aim => aim(&mut scene, session, layout),
        SessionPhase::Click => click(&mut scene, session, layout),
        SessionPhase::Summary => summary(&mut scene, session, layout),
    }
    if let Some(status) = session.current_status() {
        let prompt = match status {
            TestStatus::Idle => "Click the box or press SPACE to start",
            TestStatus::Running => "",
            TestStatus::Completed if session.phase() == SessionPhase::Click => {
                "Press SPACE to submit results"
            }
            TestStatus::Completed => "Press SPACE to continue",
        };
        if !prompt.is_empty() {
            scene.label(prompt, layout.prompt_pos(), 18.0, PROMPT);
        }
    }
    scene
}

fn welcome(scene: &mut Scene, layout: &Layout) {
    let (cx, cy) = layout.center();
    scene.label("REFLEX TESTS", (cx, cy - 80.0), 40.0, TEXT);
    scene.label("Reaction time, aim and click speed", (cx, cy - 30.0), 20.0, MUTED);
    scene.label("Press SPACE or click to begin", (cx, cy + 30.0), 18.0, PROMPT);
    scene.label("Press ESC to exit", (cx, cy + 60.0), 14.0, MUTED);
}

fn reaction<T, R, S>(scene: &mut Scene, session: &Session<T, R, S>, layout: &Layout)
where
    T: Timer,
    R: Rng + SeedableRng,
    S: ResultsSink,
{
    let test = &session.reaction;
    let state = test.state();
    let arena = layout.arena();
    scene.label("Reaction Time", layout.title_pos(), 28.0, TEXT);

    if test.status() != TestStatus::Idle {
        let last = test.last_time().map(|ms| ms as f64);
        scene.label(
            format!(
                "Attempts: {}/{}   Last: {} ms   Avg: {} ms",
                state.attempts,
                state.max_attempts,
                ms_or_dash(last),
                ms_or_dash(test.average_ms()),
            ),
            layout.stats_pos(),
            18.0,
            MUTED,
        );
    }

    let color = match test.signal() {
        Signal::Idle | Signal::Waiting | Signal::Cooldown => WAITING,
        Signal::Ready => READY,
        Signal::FalseStart => EARLY,
        Signal::Completed => DONE,
    };
    scene.shapes.push(Shape::Rect { area: arena, color });

    let (cx, cy) = arena.center();
    match test.signal() {
        Signal::Idle => scene.label("Click to start, then wait for green", (cx, cy), 26.0, TEXT),
        Signal::Waiting => scene.label("Wait for green...", (cx, cy), 30.0, TEXT),
        Signal::Ready => scene.label("CLICK NOW!", (cx, cy), 40.0, TEXT),
        Signal::FalseStart => scene.label(
            format!("False start! ({} total)", state.false_starts),
            (cx, cy),
            30.0,
            TEXT,
        ),
        Signal::Cooldown => scene.label("Wait...", (cx, cy), 30.0, TEXT),
        Signal::Completed => {
            scene.label("Test complete!", (cx, cy - 40.0), 32.0, TEXT);
            scene.label(
                format!("Average: {} ms", ms_or_dash(test.average_ms())),
                (cx, cy + 10.0),
                24.0,
                TEXT,
            );
            scene.label(
                format!("False starts: {}", state.false_starts),
                (cx, cy + 45.0),
                24.0,
                TEXT,
            );
        }
    }
}

fn aim<T, R, S>(scene: &mut Scene, session: &Session<T, R, S>, layout: &Layout)
where
    T: Timer,
    R: Rng + SeedableRng,
    S: ResultsSink,
{
    let test = &session.aim;
    let state = test.state();
    let arena = layout.arena();
    scene.label("Aim Trainer", layout.title_pos(), 28.0, TEXT);
    scene.label(
        format!(
            "Time: {}   Hits: {}   Misses: {}",
            test.time_left(),
            state.hits,
            state.misses
        ),
        layout.stats_pos(),
        18.0,
        MUTED,
    );

    scene.shapes.push(Shape::Rect {
        area: arena,
        color: ARENA,
    });
    scene.shapes.push(Shape::Outline {
        area: arena,
        color: ARENA_BORDER,
        width: 2.0,
    });

    let (cx, cy) = arena.center();
    match test.status() {
        TestStatus::Idle => scene.label("Click to start", (cx, cy), 26.0, TEXT),
        TestStatus::Running => {
            for flash in test.hit_flashes() {
                scene.shapes.push(Shape::Circle {
                    center: arena.to_window(flash.position),
                    radius: test.config.target_size / 2.0,
                    color: HIT,
                });
            }
            if let Some(target) = test.target() {
                scene.shapes.push(Shape::Circle {
                    center: arena.to_window(target.center()),
                    radius: target.size / 2.0,
                    color: TARGET,
                });
            }
            for miss in test.miss_markers() {
                scene.shapes.push(Shape::Cross {
                    center: arena.to_window(miss.position),
                    size: 16.0,
                    color: MISS,
                });
            }
        }
        TestStatus::Completed => {
            scene.label("Aim test completed!", (cx, cy - 20.0), 32.0, TEXT);
            scene.label(
                format!("Hits: {} | Misses: {}", state.hits, state.misses),
                (cx, cy + 20.0),
                24.0,
                TEXT,
            );
        }
    }
}

fn click<T, R, S>(scene: &mut Scene, session: &Session<T, R, S>, layout: &Layout)
where
    T: Timer,
    R: Rng + SeedableRng,
    S: ResultsSink,
{
    let test = &session.click;
    let state = test.state();
    let arena = layout.arena();
    scene.label("Click Speed", layout.title_pos(), 28.0, TEXT);
    scene.label(
        format!(
            "Time: {}   Clicks: {}   CPM: {}",
            test.time_left(),
            state.clicks,
            test.cpm()
        ),
        layout.stats_pos(),
        18.0,
        MUTED,
    );

    let color = match test.status() {
        TestStatus::Running if test.flashing() => CLICK_FLASH,
        TestStatus::Running => CLICK_BOX,
        TestStatus::Idle => ARENA,
        TestStatus::Completed => DONE,
    };
    scene.shapes.push(Shape::Rect { area: arena, color });

    let (cx, cy) = arena.center();
    match test.status() {
        TestStatus::Idle => scene.label("Click to start", (cx, cy), 26.0, TEXT),
        TestStatus::Running => scene.label("CLICK!", (cx, cy), 48.0, TEXT),
        TestStatus::Completed => {
            scene.label("Test completed!", (cx, cy - 20.0), 32.0, TEXT);
            scene.label(
                format!(
                    "{} clicks in {} seconds",
                    state.clicks, test.config.duration_secs
                ),
                (cx, cy + 20.0),
                24.0,
                TEXT,
            );
        }
    }
}

fn summary<T, R, S>(scene: &mut Scene, session: &Session<T, R, S>, layout: &Layout)
where
    T: Timer,
    R: Rng + SeedableRng,
    S: ResultsSink,
{
    let results = session.results();
    let (cx, cy) = layout.center();
    scene.label("Results", (cx, cy - 120.0), 32.0, TEXT);

    let reaction = match &results.reaction_times {
        Some(times) => format!(
            "Reaction: average {} ms over {} attempts, {} false starts",
            ms_or_dash(average(times)),
            times.len(),
            results.false_starts.unwrap_or_default()
        ),
        None => "Reaction: not completed".to_string(),
    };
    let aim = match &results.aim_results {
        Some(aim) => format!(
            "Aim: {} hits, {} misses, average time to hit {} ms",
            aim.hits,
            aim.misses,
            ms_or_dash(average(&aim.times_to_hit))
        ),
        None => "Aim: not completed".to_string(),
    };
    let click = match &results.click_test {
        Some(click) => format!(
            "Click: {} clicks in {} s, {} errors",
            click.clicks, click.duration, click.errors
        ),
        None => "Click: not completed".to_string(),
    };
    scene.label(reaction, (cx, cy - 50.0), 20.0, TEXT);
    scene.label(aim, (cx, cy - 15.0), 20.0, TEXT);
    scene.label(click, (cx, cy + 20.0), 20.0, TEXT);

    let metrics = results.derived_metrics();
    scene.label(
        format!(
            "Accuracy: {}   Error rate: {}   Total time: {}",
            percent_or_dash(metrics.aim_accuracy),
            percent_or_dash(metrics.error_rate),
            metrics
                .test_duration_s
                .map(|s| format!("{s:.1} s"))
                .unwrap_or_else(|| "-".to_string()),
        ),
        (cx, cy + 50.0),
        16.0,
        MUTED,
    );

    let (status, color) = if session.submitted() {
        ("Results submitted. Thank you!".to_string(), HIT)
    } else if let Some(err) = session.submit_error() {
        (format!("Submission failed: {err} (SPACE to retry)"), MISS)
    } else {
        ("Submitting...".to_string(), MUTED)
    };
    scene.label(status, (cx, cy + 85.0), 18.0, color);
    scene.label("Press ESC to exit", (cx, cy + 115.0), 14.0, MUTED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use reflex_games::{GamesConfig, MemorySink};
    use reflex_timing::ManualTimer;

    fn session() -> (Session<ManualTimer, StdRng, MemorySink>, ManualTimer, Layout) {
        let layout = Layout::new(1280, 720);
        let arena = layout.arena();
        let timer = ManualTimer::new();
        let mut config = GamesConfig::default();
        config.reaction.max_attempts = 1;
        let session = Session::new(
            config,
            timer.clone(),
            StdRng::seed_from_u64(5),
            MemorySink::new(),
            (arena.width, arena.height),
        )
        .unwrap();
        (session, timer, layout)
    }

    fn box_color(scene: &Scene) -> Option<Rgba> {
        scene.shapes.iter().find_map(|s| match s {
            Shape::Rect { color, .. } => Some(*color),
            _ => None,
        })
    }

    #[test]
    fn welcome_has_title_and_no_shapes() {
        let (session, _timer, layout) = session();
        let scene = build_scene(&session, &layout);
        assert!(scene.has_text("REFLEX TESTS"));
        assert!(scene.shapes.is_empty());
    }

    #[test]
    fn reaction_box_follows_the_signal() {
        let (mut session, timer, layout) = session();
        session.advance().unwrap();
        let scene = build_scene(&session, &layout);
        assert_eq!(box_color(&scene), Some(WAITING));
        assert!(scene.has_text("SPACE to start"));
        assert!(!scene.has_text("Attempts"));

        session.handle_click((5.0, 5.0));
        timer.advance_ms(100);
        session.handle_click((5.0, 5.0));
        let scene = build_scene(&session, &layout);
        assert_eq!(box_color(&scene), Some(EARLY));
        assert!(scene.has_text("False start! (1 total)"));
        assert!(scene.has_text("Avg: - ms"));

        timer.advance_ms(1500);
        session.update();
        timer.advance_ms(4000);
        session.update();
        let scene = build_scene(&session, &layout);
        assert_eq!(box_color(&scene), Some(READY));
        assert!(scene.has_text("CLICK NOW!"));

        timer.advance_ms(250);
        session.handle_click((5.0, 5.0));
        let scene = build_scene(&session, &layout);
        assert_eq!(box_color(&scene), Some(DONE));
        assert!(scene.has_text("Average: 250 ms"));
        assert!(scene.has_text("Last: 250 ms"));
        assert!(scene.has_text("Press SPACE to continue"));
    }

    #[test]
    fn aim_target_is_drawn_in_window_coordinates() {
        let (mut session, timer, layout) = session();
        session.advance().unwrap();
        session.handle_click((5.0, 5.0));
        timer.advance_ms(4000);
        session.update();
        timer.advance_ms(100);
        session.handle_click((5.0, 5.0));
        session.advance().unwrap();
        session.advance().unwrap();

        let target = session.aim.target().cloned().unwrap();
        let scene = build_scene(&session, &layout);
        let arena = layout.arena();
        let expected = arena.to_window(target.center());
        assert!(scene.shapes.contains(&Shape::Circle {
            center: expected,
            radius: 25.0,
            color: TARGET,
        }));
        assert!(scene.has_text("Time: 30   Hits: 0   Misses: 0"));
        assert!(!scene.has_text("SPACE"));
    }

    #[test]
    fn summary_shows_every_test_and_submission() {
        let (mut session, timer, layout) = session();
        session.advance().unwrap();
        session.handle_click((5.0, 5.0));
        timer.advance_ms(4000);
        session.update();
        timer.advance_ms(300);
        session.handle_click((5.0, 5.0));

        session.advance().unwrap();
        session.advance().unwrap();
        timer.advance_ms(30_000);
        session.update();
        let scene = build_scene(&session, &layout);
        assert!(scene.has_text("Aim test completed!"));

        session.advance().unwrap();
        session.advance().unwrap();
        timer.advance_ms(200);
        session.handle_click((5.0, 5.0));
        timer.advance_ms(10_000);
        session.update();
        let scene = build_scene(&session, &layout);
        assert!(scene.has_text("1 clicks in 10 seconds"));
        assert!(scene.has_text("Press SPACE to submit results"));

        session.advance().unwrap();
        let scene = build_scene(&session, &layout);
        assert!(scene.has_text("Reaction: average 300 ms over 1 attempts, 0 false starts"));
        assert!(scene.has_text("Aim: 0 hits, 0 misses, average time to hit - ms"));
        assert!(scene.has_text("Click: 1 clicks in 10 s, 0 errors"));
        assert!(scene.has_text("Accuracy: -   Error rate: 0%   Total time: 44.5 s"));
        assert!(scene.has_text("Results submitted. Thank you!"));
        assert!(scene.shapes.is_empty());
    }
}
