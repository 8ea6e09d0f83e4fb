use crate::config::AimConfig;
use crate::countdown::Countdown;
use crate::{SkillTest, TestEvent};
use rand::Rng;
use reflex_core::{AimResults, TestKind, TestStatus, TestSummary};
use reflex_timing::{NANOS_PER_MILLI, NANOS_PER_SEC, Timer, after_ms, ms_to_nanos};
use tracing::{debug, info};

/// A clickable circle; `position` is its top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub position: (f32, f32),
    pub size: f32,
    pub spawned_at: u64,
}

impl Target {
    pub fn center(&self) -> (f32, f32) {
        let r = self.size / 2.0;
        (self.position.0 + r, self.position.1 + r)
    }

    pub fn contains(&self, pos: (f32, f32)) -> bool {
        let (cx, cy) = self.center();
        let r = self.size / 2.0;
        let (dx, dy) = (pos.0 - cx, pos.1 - cy);
        dx * dx + dy * dy <= r * r
    }
}

/// Short-lived visual feedback (hit flash or miss "X")
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: (f32, f32),
    pub expires_at: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AimState {
    pub hits: u32,
    pub misses: u32,
    pub times_to_hit: Vec<u64>,
    pub target_spawn_time: Option<u64>,
    pub active: bool,
    pub test_start_time: Option<u64>,
}

pub struct AimTest<T: Timer, R: Rng> {
    pub config: AimConfig,
    timer: T,
    rng: R,
    arena: (f32, f32),
    status: TestStatus,
    state: AimState,
    countdown: Countdown,
    target: Option<Target>,
    hit_flashes: Vec<Marker>,
    miss_markers: Vec<Marker>,
    test_duration_secs: Option<f64>,
}

impl<T: Timer, R: Rng> AimTest<T, R> {
    pub fn new(config: AimConfig, timer: T, rng: R, arena: (f32, f32)) -> Self {
        let countdown = Countdown::new(config.duration_secs);
        Self {
            config,
            timer,
            rng,
            arena,
            status: TestStatus::Idle,
            state: AimState::default(),
            countdown,
            target: None,
            hit_flashes: Vec::new(),
            miss_markers: Vec::new(),
            test_duration_secs: None,
        }
    }

    /// Area targets spawn in; later spawns use the new size
    pub fn set_arena(&mut self, width: f32, height: f32) {
        self.arena = (width, height);
    }

    pub fn arena(&self) -> (f32, f32) {
        self.arena
    }

    pub fn state(&self) -> &AimState {
        &self.state
    }

    pub fn time_left(&self) -> u32 {
        self.countdown.time_left()
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn hit_flashes(&self) -> &[Marker] {
        &self.hit_flashes
    }

    pub fn miss_markers(&self) -> &[Marker] {
        &self.miss_markers
    }

    pub fn test_duration_secs(&self) -> Option<f64> {
        self.test_duration_secs
    }

    fn spawn_target(&mut self, now: u64) -> Option<TestEvent> {
        if !self.state.active {
            return None;
        }
        let size = self.config.target_size;
        let max_x = self.arena.0 - size;
        let max_y = self.arena.1 - size;
        let x = if max_x > 0.0 {
            self.rng.random_range(0.0..max_x)
        } else {
            0.0
        };
        let y = if max_y > 0.0 {
            self.rng.random_range(0.0..max_y)
        } else {
            0.0
        };

        self.state.target_spawn_time = Some(now);
        self.target = Some(Target {
            position: (x, y),
            size,
            spawned_at: now,
        });
        debug!("Target spawned at ({:.0}, {:.0})", x, y);
        Some(TestEvent::TargetSpawned { position: (x, y) })
    }

    fn end(&mut self, now: u64) {
        self.state.active = false;
        self.status = TestStatus::Completed;
        self.target = None;
        let start = self.state.test_start_time.unwrap_or(now);
        let duration = now.saturating_sub(start) as f64 / NANOS_PER_SEC as f64;
        self.test_duration_secs = Some(duration);
        info!(
            "Aim test completed: {} hits, {} misses in {:.3} s",
            self.state.hits, self.state.misses, duration
        );
    }
}

impl<T: Timer, R: Rng> SkillTest for AimTest<T, R> {
    fn kind(&self) -> TestKind {
        TestKind::Aim
    }

    fn status(&self) -> TestStatus {
        self.status
    }

    fn start(&mut self) {
        let now = self.timer.now();
        self.state = AimState {
            active: true,
            test_start_time: Some(now),
            ..AimState::default()
        };
        self.status = TestStatus::Running;
        self.countdown = Countdown::new(self.config.duration_secs);
        self.countdown.start(now);
        self.hit_flashes.clear();
        self.miss_markers.clear();
        self.test_duration_secs = None;
        info!("Aim test started ({} s)", self.config.duration_secs);
        self.spawn_target(now);
    }

    fn handle_click(&mut self, pos: (f32, f32)) -> Option<TestEvent> {
        match self.status {
            TestStatus::Idle => {
                self.start();
                return Some(TestEvent::Started);
            }
            TestStatus::Completed => return None,
            TestStatus::Running => {}
        }

        let now = self.timer.now();
        let hit = self.target.as_ref().is_some_and(|t| t.contains(pos));
        if hit {
            let Some(target) = self.target.take() else {
                return None;
            };
            let latency_ms = now.saturating_sub(target.spawned_at) / NANOS_PER_MILLI;
            self.state.times_to_hit.push(latency_ms);
            self.state.hits += 1;
            self.hit_flashes.push(Marker {
                position: target.center(),
                expires_at: after_ms(now, self.config.hit_flash_ms),
            });
            debug!("Hit after {} ms", latency_ms);
            self.spawn_target(now);
            Some(TestEvent::Hit { latency_ms })
        } else {
            self.state.misses += 1;
            self.miss_markers.push(Marker {
                position: pos,
                expires_at: after_ms(now, self.config.miss_marker_ms),
            });
            Some(TestEvent::Miss { position: pos })
        }
    }

    fn update(&mut self) -> Vec<TestEvent> {
        let mut events = Vec::new();
        let now = self.timer.now();

        self.hit_flashes.retain(|m| m.expires_at > now);
        self.miss_markers.retain(|m| m.expires_at > now);

        if !self.status.is_running() {
            return events;
        }

        if self.countdown.poll(now) {
            events.push(TestEvent::Tick {
                time_left: self.countdown.time_left(),
            });
            if self.countdown.expired() {
                self.end(now);
                events.push(TestEvent::Completed);
                return events;
            }
        }

        let lifetime = ms_to_nanos(self.config.target_lifetime_ms);
        let expired = self
            .target
            .as_ref()
            .is_some_and(|t| now.saturating_sub(t.spawned_at) >= lifetime);
        if expired {
            self.target = None;
            events.push(TestEvent::TargetExpired);
            events.extend(self.spawn_target(now));
        }

        events
    }

    fn summary(&self) -> Option<TestSummary> {
        if !self.status.is_completed() {
            return None;
        }
        Some(TestSummary::Aim {
            results: AimResults {
                hits: self.state.hits,
                misses: self.state.misses,
                times_to_hit: self.state.times_to_hit.clone(),
                duration: self.config.duration_secs,
            },
            test_duration_secs: self.test_duration_secs.unwrap_or_default(),
        })
    }
}
