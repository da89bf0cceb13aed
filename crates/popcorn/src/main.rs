//! Popcorn Battle: two players catch falling popcorn with their hands in
//! front of a webcam.
//!
//! Controls: Space/Enter start, P pause, R reset, F11 fullscreen, Esc quit.

mod hud;
mod orchestrator;
mod pacing;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowId};

use popcorn_core::config::CONFIG_FILE;
use popcorn_core::GameConfig;
use popcorn_game::GameEvent;
use popcorn_render::{Compositor, RenderContext, RenderError, SceneBuilder};

use hud::{HudState, HudView};
use orchestrator::Orchestrator;
use pacing::FrameClock;

struct App {
    config: GameConfig,
    window: Option<Arc<Window>>,
    render_ctx: Option<RenderContext>,
    compositor: Option<Compositor>,
    scene: SceneBuilder,
    // egui
    egui_ctx: egui::Context,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    orchestrator: Option<Orchestrator>,
    hud: HudState,
    clock: FrameClock,
    next_frame: Instant,
    uploaded_generation: u64,
    fullscreen: bool,
    exit_code: i32,
}

impl App {
    fn new(config: GameConfig) -> Self {
        let now = Instant::now();
        Self {
            config,
            window: None,
            render_ctx: None,
            compositor: None,
            scene: SceneBuilder::new(),
            egui_ctx: egui::Context::default(),
            egui_state: None,
            egui_renderer: None,
            orchestrator: None,
            hud: HudState::default(),
            clock: FrameClock::new(now),
            next_frame: now,
            uploaded_generation: 0,
            fullscreen: false,
            exit_code: 0,
        }
    }

    /// Window, GPU, egui, then camera, perception, simulation, and effects.
    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let win = &self.config.window;
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title(win.title.clone())
                        .with_inner_size(winit::dpi::PhysicalSize::new(win.width, win.height)),
                )
                .context("failed to create window")?,
        );

        let ctx = pollster::block_on(RenderContext::new(window.clone()))
            .context("failed to initialise GPU")?;
        let compositor = Compositor::new(&ctx, win.width as f32, win.height as f32);

        let viewport_id = self.egui_ctx.viewport_id();
        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            viewport_id,
            &window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.format(), None, 1, false);

        let orchestrator = Orchestrator::init(&self.config)?;

        self.window = Some(window);
        self.render_ctx = Some(ctx);
        self.compositor = Some(compositor);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        self.orchestrator = Some(orchestrator);

        let now = Instant::now();
        self.clock = FrameClock::new(now);
        self.next_frame = now;
        log::info!("Ready. Show an OK gesture or press Space to start");
        Ok(())
    }

    fn frame(&mut self) {
        let start = Instant::now();
        let dt = self.clock.tick(start);

        let Some(orch) = self.orchestrator.as_mut() else {
            return;
        };
        let events = orch.tick(dt);
        self.hud.update(dt);
        for event in &events {
            self.hud.on_event(event);
        }

        self.render();

        if let Some(fps) = self.clock.frame_done(Instant::now()) {
            let detection = self.orchestrator.as_ref().map_or(0.0, |o| o.detection_ms());
            log::info!("FPS: {:.0} | Detection: {:.1}ms", fps, detection);
        }
        self.next_frame = pacing::next_deadline(start, Instant::now(), pacing::target_frame_time());
    }

    fn render(&mut self) {
        let (Some(window), Some(ctx), Some(compositor), Some(orch), Some(egui_state), Some(egui_renderer)) = (
            self.window.as_ref(),
            self.render_ctx.as_ref(),
            self.compositor.as_mut(),
            self.orchestrator.as_ref(),
            self.egui_state.as_mut(),
            self.egui_renderer.as_mut(),
        ) else {
            return;
        };

        let mut target = match compositor.begin_frame(ctx) {
            Ok(target) => target,
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                ctx.reconfigure();
                return;
            }
            Err(e) => {
                log::warn!("Skipping frame: {e}");
                return;
            }
        };

        if orch.frame_generation() != self.uploaded_generation {
            if let Some(frame) = orch.latest_frame() {
                compositor.update_video_texture(ctx, frame);
            }
            self.uploaded_generation = orch.frame_generation();
        }

        let effects = orch.effects();
        compositor.render_video_background(ctx, &mut target, effects.shake_offset(), effects.flash());
        let scene = self.scene.build(orch.sim(), effects, self.clock.fps());
        compositor.draw_scene(ctx, &mut target, scene);

        // Text overlay
        let egui_input = egui_state.take_egui_input(window);
        self.egui_ctx.begin_pass(egui_input);
        hud::draw_hud(
            &self.egui_ctx,
            &self.hud,
            &HudView {
                sim: orch.sim(),
                effects,
                fps: self.clock.fps(),
                detection_ms: orch.detection_ms(),
            },
        );
        let egui_output = self.egui_ctx.end_pass();
        let egui_prims = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [ctx.config.width, ctx.config.height],
            pixels_per_point: egui_output.pixels_per_point,
        };
        for (id, delta) in &egui_output.textures_delta.set {
            egui_renderer.update_texture(&ctx.device, &ctx.queue, *id, delta);
        }
        let egui_cmd_bufs = egui_renderer.update_buffers(
            &ctx.device,
            &ctx.queue,
            &mut target.encoder,
            &egui_prims,
            &screen,
        );
        {
            let pass = popcorn_render::compositor::load_pass(&mut target.encoder, &target.view, "egui Pass");
            let mut pass = pass.forget_lifetime();
            egui_renderer.render(&mut pass, &egui_prims, &screen);
        }
        for id in &egui_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }
        egui_state.handle_platform_output(window, egui_output.platform_output);

        let output = compositor.end_frame(ctx, target, egui_cmd_bufs);
        window.pre_present_notify();
        output.present();
    }

    fn toggle_fullscreen(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        self.fullscreen = !self.fullscreen;
        window.set_fullscreen(self.fullscreen.then(|| Fullscreen::Borderless(None)));
        log::info!("Fullscreen: {}", if self.fullscreen { "on" } else { "off" });
    }

    fn push_event(&mut self, event: Option<GameEvent>) {
        if let Some(event) = event {
            self.hud.on_event(&event);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_code != 0 {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("Initialization failed: {e:#}");
            self.exit_code = -1;
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle events first
        if let (Some(state), Some(window)) = (&mut self.egui_state, &self.window) {
            let _ = state.on_window_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(ctx) = &mut self.render_ctx {
                    ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => event_loop.exit(),
                Key::Named(NamedKey::F11) => self.toggle_fullscreen(),
                Key::Named(NamedKey::Space | NamedKey::Enter) => {
                    let event = self.orchestrator.as_mut().and_then(|o| o.start());
                    self.push_event(event);
                }
                Key::Character(ref c) if c.eq_ignore_ascii_case("p") => {
                    let event = self.orchestrator.as_mut().and_then(|o| o.toggle_pause());
                    self.push_event(event);
                }
                Key::Character(ref c) if c.eq_ignore_ascii_case("r") => {
                    if let Some(orch) = &mut self.orchestrator {
                        orch.reset();
                    }
                    self.hud = HudState::default();
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if Instant::now() >= self.next_frame {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut orch) = self.orchestrator.take() {
            orch.shutdown();
        }
        self.egui_renderer = None;
        self.egui_state = None;
        self.compositor = None;
        if self.render_ctx.take().is_some() {
            log::info!("GPU resources released");
        }
        if self.window.take().is_some() {
            log::info!("Window closed");
        }
    }
}

fn init_logging() {
    let default = "info,wgpu_hal=off,wgpu_core=off,wgpu=off,naga=off";
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .try_init();
}

fn run() -> anyhow::Result<i32> {
    let config = GameConfig::load(Path::new(CONFIG_FILE));
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("event loop failed")?;
    Ok(app.exit_code)
}

fn main() {
    init_logging();
    log::info!("Popcorn Battle starting");
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            -1
        }
    };
    log::info!("Exiting with code {code}");
    std::process::exit(code);
}
