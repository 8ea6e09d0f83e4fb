use crate::cli::Cli;
use anyhow::{Context, Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reflex_games::{GamesConfig, JsonFileSink, Session};
use reflex_render::{Layout, SkiaRenderer, load_font};
use reflex_timing::{HighPrecisionTimer, Timer};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

type GameSession = Session<HighPrecisionTimer, StdRng, JsonFileSink>;

const WINDOWED_SIZE: LogicalSize<u32> = LogicalSize::new(1024, 768);

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    session: GameSession,
    frame_timer: HighPrecisionTimer,
    cursor: (f32, f32),
    windowed: bool,
    font_path: Option<std::path::PathBuf>,
    refresh_rate: Option<f64>,

    should_exit: bool,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => GamesConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GamesConfig::default(),
        };
        debug!("Config: {:?}", config);

        let timer = HighPrecisionTimer::new();
        let sink = JsonFileSink::new(cli.output.clone());
        // resized to the real arena once the window exists
        let arena = Layout::new(WINDOWED_SIZE.width, WINDOWED_SIZE.height).arena();
        let session = Session::new(
            config,
            timer.clone(),
            StdRng::from_os_rng(),
            sink,
            (arena.width, arena.height),
        )?;

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            session,
            frame_timer: timer,
            cursor: (0.0, 0.0),
            windowed: cli.windowed,
            font_path: cli.font,
            refresh_rate: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            "Starting on {} ({}), results go to {}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            self.session.sink().path().display()
        );

        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        self.refresh_rate = monitor
            .as_ref()
            .and_then(|m| m.refresh_rate_millihertz())
            .map(|rate| rate as f64 / 1000.0);

        let mut attributes = Window::default_attributes().with_title("Reflex Tests");
        attributes = if self.windowed {
            attributes.with_inner_size(WINDOWED_SIZE).with_resizable(true)
        } else {
            let monitor = monitor.ok_or_else(|| anyhow!("No monitor available"))?;
            attributes
                .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
                .with_resizable(false)
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            "Display: {}x{} @ {:.2}x{}",
            size.width,
            size.height,
            window.scale_factor(),
            self.refresh_rate
                .map(|hz| format!(", {hz:.1} Hz"))
                .unwrap_or_default()
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);

        let font = load_font(self.font_path.as_deref());
        let renderer = SkiaRenderer::new(size.width, size.height, font)?;
        let arena = renderer.layout().arena();
        self.session.set_arena(arena.width, arena.height);
        self.renderer = Some(renderer);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let stats =
            renderer.render_frame(&self.session, pixels.frame_mut(), &mut self.frame_timer)?;
        let t = self.frame_timer.now();
        pixels.render()?;
        let present = self.frame_timer.elapsed(t);

        if stats.total.as_millis() > 8 {
            debug!(
                "slow frame: scene {:.3}ms, draw {:.3}ms, copy {:.3}ms, present {:.3}ms",
                stats.scene.as_secs_f64() * 1e3,
                stats.draw.as_secs_f64() * 1e3,
                stats.copy.as_secs_f64() * 1e3,
                present.as_secs_f64() * 1e3,
            );
        }
        Ok(())
    }

    fn handle_click(&mut self) {
        if self.session.phase().is_welcome() {
            self.advance();
            return;
        }
        let Some(renderer) = &self.renderer else {
            return;
        };
        match renderer.layout().to_arena(self.cursor) {
            Some(pos) => {
                self.session.handle_click(pos);
            }
            None => debug!("Click outside the test area at {:?}", self.cursor),
        }
    }

    fn advance(&mut self) {
        if let Err(e) = self.session.advance() {
            error!("Failed to submit results: {}", e);
        }
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        if let PhysicalKey::Code(k) = key {
            match k {
                KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => self.advance(),
                KeyCode::Escape => self.cleanup_and_exit(event_loop),
                _ => {}
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!("{}", e);
                return;
            }
            let arena = renderer.layout().arena();
            self.session.set_arena(arena.width, arena.height);
        }
        info!("Display resized to {}x{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            return;
        }
        let frames = self.frame_timer.frame_count();
        if frames > 0 {
            let stats = self.frame_timer.frame_stats();
            info!(
                "{} frames: avg {:.3}ms, jitter {:.3}ms, max {:.3}ms, {:.1} fps",
                frames,
                stats.average_frame_time_ns / 1e6,
                stats.jitter_ns / 1e6,
                stats.max_frame_time_ns / 1e6,
                stats.effective_fps,
            );
        }
        if self.session.submitted() {
            info!("Results saved. Thank you!");
        } else {
            warn!("Exiting in {:?} before results were submitted", self.session.phase());
        }

        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("Failed to create window and surface: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.session.update();
                if let Err(e) = self.render() {
                    error!("Render failed: {:#}", e);
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => self.cursor = (x as f32, y as f32),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(),
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
