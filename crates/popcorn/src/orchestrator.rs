//! Non-GPU half of the main loop: camera polling, perception, simulation,
//! and effects, in that order every tick.

use anyhow::Context;

use popcorn_capture::{default_device, FrameSource};
use popcorn_core::{Frame, GameConfig, GestureResult, HandGesture, Person};
use popcorn_effects::Effects;
use popcorn_game::{GameEvent, GameSimulation};
use popcorn_perception::{GestureEstimator, PoseConfig, PoseEstimator};

pub struct Orchestrator {
    frame_source: FrameSource,
    pose: PoseEstimator,
    gesture: GestureEstimator,
    sim: GameSimulation,
    effects: Effects,
    screen: (f32, f32),
    latest_frame: Option<Frame>,
    frame_generation: u64,
    persons: Vec<Person>,
    gesture_result: GestureResult,
}

impl Orchestrator {
    /// Bring up camera, perception, simulation, and effects. A camera that
    /// will not open is fatal; missing models only degrade perception.
    pub fn init(config: &GameConfig) -> anyhow::Result<Self> {
        let cam = &config.camera;
        let device = default_device().context("camera backend")?;
        let frame_source = FrameSource::with_device(device, cam.device_id, cam.width, cam.height, cam.fps)
            .with_context(|| format!("failed to open camera {}", cam.device_id))?;

        let models = &config.models;
        let mut pose = PoseEstimator::new(PoseConfig {
            confidence_threshold: models.confidence_threshold,
            num_threads: models.num_threads,
            ..PoseConfig::movenet_lightning()
        });
        pose.initialize(&models.pose_model);

        let mut gesture = GestureEstimator::new(models.num_threads.clamp(1, 2));
        gesture.initialize(&models.gesture_model);

        let screen = (config.window.width as f32, config.window.height as f32);
        let sim = GameSimulation::new(screen.0, screen.1, config.rules.clone());
        let effects = Effects::new(&config.effects, config.rules.seed);

        Ok(Self::new(frame_source, pose, gesture, sim, effects))
    }

    pub fn new(
        frame_source: FrameSource,
        pose: PoseEstimator,
        gesture: GestureEstimator,
        sim: GameSimulation,
        effects: Effects,
    ) -> Self {
        let screen = sim.size();
        Self {
            frame_source,
            pose,
            gesture,
            sim,
            effects,
            screen,
            latest_frame: None,
            frame_generation: 0,
            persons: Vec::new(),
            gesture_result: GestureResult::default(),
        }
    }

    /// One loop iteration. Detections are refreshed only when the camera
    /// has delivered a new frame; the simulation always advances.
    pub fn tick(&mut self, dt: f32) -> Vec<GameEvent> {
        if let Some(frame) = self.frame_source.get_frame() {
            let fresh = self
                .latest_frame
                .as_ref()
                .map_or(true, |f| f.captured_at != frame.captured_at);
            if fresh {
                self.detect(&frame);
                self.latest_frame = Some(frame);
                self.frame_generation += 1;
            }
        }

        let events = self.sim.update(dt, &self.persons, &self.gesture_result);
        for event in &events {
            log_event(event);
            self.effects.handle_event(event);
        }
        self.effects.update(dt);
        events
    }

    fn detect(&mut self, frame: &Frame) {
        let sx = self.screen.0 / frame.width as f32;
        let sy = self.screen.1 / frame.height as f32;
        self.persons = self
            .pose
            .detect(frame)
            .iter()
            .map(|p| p.scaled(sx, sy))
            .collect();
        self.gesture_result = scale_gesture(self.gesture.detect(frame), sx, sy);
    }

    /// Space/Enter: start from calibration or after a finished game.
    pub fn start(&mut self) -> Option<GameEvent> {
        if self.sim.start_game() {
            self.effects.clear();
            Some(GameEvent::Started)
        } else {
            None
        }
    }

    pub fn toggle_pause(&mut self) -> Option<GameEvent> {
        self.sim.toggle_pause()
    }

    pub fn reset(&mut self) {
        self.sim.reset();
        self.effects.clear();
    }

    pub fn sim(&self) -> &GameSimulation {
        &self.sim
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn latest_frame(&self) -> Option<&Frame> {
        self.latest_frame.as_ref()
    }

    /// Bumped every time a new camera frame is taken in.
    pub fn frame_generation(&self) -> u64 {
        self.frame_generation
    }

    /// Wall time of the last pose plus gesture pass.
    pub fn detection_ms(&self) -> f64 {
        self.pose.last_detection_time_ms() + self.gesture.last_detection_time_ms()
    }

    /// Stop in reverse construction order. The camera thread is joined here.
    pub fn shutdown(&mut self) {
        log::info!("Stopping simulation");
        self.sim.reset();
        self.effects.clear();
        log::info!("Releasing gesture estimator");
        self.gesture = GestureEstimator::default();
        log::info!("Releasing pose estimator");
        self.pose = PoseEstimator::new(PoseConfig::default());
        self.frame_source.shutdown();
    }
}

fn scale_hand(hand: HandGesture, sx: f32, sy: f32) -> HandGesture {
    HandGesture {
        x: hand.x * sx,
        y: hand.y * sy,
        ..hand
    }
}

/// Map gesture positions from frame pixels to screen pixels.
pub fn scale_gesture(g: GestureResult, sx: f32, sy: f32) -> GestureResult {
    GestureResult {
        left: scale_hand(g.left, sx, sy),
        right: scale_hand(g.right, sx, sy),
        ..g
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Started => log::info!("Game started"),
        GameEvent::PhaseChanged { phase } => {
            log::info!("Phase: {}", phase.config().title)
        }
        GameEvent::GameOver { scores, winner } => match winner {
            Some(p) => log::info!("{} wins {} : {}", p.label(), scores[0], scores[1]),
            None => log::info!("Draw {} : {}", scores[0], scores[1]),
        },
        other => log::debug!("{:?}", other),
    }
}
