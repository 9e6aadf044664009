//! Backdrop lifecycle: construct -> animate -> (recover) -> destroy.
//!
//! A [`Backdrop`] owns one scene end-to-end. It never owns the host; every
//! operation borrows it, so the host can keep driving frame callbacks,
//! resize events and typing toggles from its own single-threaded loop.

use backdrop_hal::{FrameHandle, FrameScheduler, ListenerId, ResizeEvents, Surface};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::error::{BackdropError, FieldError, SceneError};
use crate::field::{FieldGenerator, FrameContext, ParticleField};
use crate::render::PointRenderer;
use crate::scene::{viewport, Scene};

/// Everything a backdrop needs from its host environment.
pub trait Host: Surface + FrameScheduler + ResizeEvents {}

impl<T: Surface + FrameScheduler + ResizeEvents> Host for T {}

/// Identifies one backdrop instance over the orchestrator's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// Lifecycle of a backdrop instance. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    /// Scene built, frame loop and resize listener registered.
    Active,
    /// Showing the static fallback. No scene, no registrations.
    Degraded,
    /// Terminal. No scene, no registrations.
    Destroyed,
}

/// Bounds how often a failing frame loop rebuilds itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Full reconstructions allowed over the instance's lifetime.
    pub max_recoveries: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self { max_recoveries: 1 }
    }
}

/// Result of delivering one frame callback.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Mutated and presented.
    Rendered,
    /// Instance not active, or the handle is not the one it is waiting on.
    Ignored,
    /// The step failed and the scene was rebuilt; the next frame is requested.
    Recovered(BackdropError),
    /// The step failed and the instance fell back to its static background.
    Degraded(BackdropError),
}

/// Result of delivering a resize event.
#[derive(Clone, Debug, PartialEq)]
pub enum ResizeOutcome {
    Applied,
    Ignored,
    /// The surface rejected the new size; reported, the loop keeps running.
    Failed(BackdropError),
}

/// Running counters for one instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Successful frame steps.
    pub frames: u64,
    /// Frame callbacks delivered while active, including failed ones.
    pub ticks: u64,
    /// Scene builds, including the initial one.
    pub constructions: u32,
    pub recoveries: u32,
}

pub struct Backdrop {
    id: InstanceId,
    generator: Box<dyn FieldGenerator>,
    policy: RecoveryPolicy,
    state: LifecycleState,
    scene: Option<Scene>,
    renderer: PointRenderer,
    frame: Option<FrameHandle>,
    resize_listener: Option<ListenerId>,
    typing: bool,
    time: f32,
    color_phase: f32,
    rng: Pcg64,
    stats: FrameStats,
    last_failure: Option<BackdropError>,
}

impl core::fmt::Debug for Backdrop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Backdrop")
            .field("id", &self.id)
            .field("generator", &self.generator.name())
            .field("state", &self.state)
            .field("frame", &self.frame)
            .field("typing", &self.typing)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Backdrop {
    /// Create an uninitialized instance. Nothing touches the host until [`Backdrop::start`].
    pub fn new(id: InstanceId, generator: Box<dyn FieldGenerator>, seed: u64) -> Self {
        Self {
            id,
            generator,
            policy: RecoveryPolicy::default(),
            state: LifecycleState::Uninitialized,
            scene: None,
            renderer: PointRenderer::new(),
            frame: None,
            resize_listener: None,
            typing: false,
            time: 0.0,
            color_phase: 0.0,
            rng: Pcg64::seed_from_u64(seed),
            stats: FrameStats::default(),
            last_failure: None,
        }
    }

    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create and start an instance in one call.
    ///
    /// Construction failures do not propagate: the returned instance is
    /// `Degraded` and [`Backdrop::last_failure`] holds the reason.
    pub fn construct<H: Host>(
        host: &mut H,
        id: InstanceId,
        generator: Box<dyn FieldGenerator>,
        seed: u64,
    ) -> Self {
        let mut backdrop = Self::new(id, generator, seed);
        backdrop.start(host);
        backdrop
    }

    /// Build the scene, register the resize listener and request the first frame.
    ///
    /// Only valid from `Uninitialized`; otherwise returns the current state unchanged.
    pub fn start<H: Host>(&mut self, host: &mut H) -> LifecycleState {
        if self.state != LifecycleState::Uninitialized {
            return self.state;
        }
        match self.build(host) {
            Ok(()) => {
                self.state = LifecycleState::Active;
                log::info!(
                    "backdrop {}: {} started ({} particles)",
                    self.id.0,
                    self.generator.name(),
                    self.particle_count()
                );
            }
            Err(e) => self.degrade(host, BackdropError::ConstructionFailure(e)),
        }
        self.state
    }

    /// Deliver a frame callback.
    ///
    /// Callbacks that arrive after `destroy` (or after degrading), and
    /// callbacks for a handle this instance is no longer waiting on, are no-ops.
    pub fn on_frame<H: Host>(&mut self, host: &mut H, handle: FrameHandle) -> FrameOutcome {
        if self.state != LifecycleState::Active || self.frame != Some(handle) {
            return FrameOutcome::Ignored;
        }

        self.stats.ticks += 1;
        self.frame = Some(host.request_frame());

        match self.step(host) {
            Ok(()) => {
                self.stats.frames += 1;
                FrameOutcome::Rendered
            }
            Err(source) => {
                let failure = BackdropError::FrameFailure {
                    frame: self.stats.ticks,
                    source,
                };
                self.recover(host, failure)
            }
        }
    }

    /// Deliver a surface size change.
    pub fn on_resize<H: Host>(&mut self, host: &mut H, width: u32, height: u32) -> ResizeOutcome {
        if self.state != LifecycleState::Active {
            return ResizeOutcome::Ignored;
        }
        let Some(scene) = self.scene.as_mut() else {
            return ResizeOutcome::Ignored;
        };

        let dpr = host.metrics().device_pixel_ratio;
        match viewport::on_resize(scene, host, width, height, dpr) {
            Ok(()) => ResizeOutcome::Applied,
            Err(e) => {
                let failure = BackdropError::FrameFailure {
                    frame: self.stats.ticks,
                    source: e.into(),
                };
                log::warn!("backdrop {}: resize to {width}x{height} failed: {failure}", self.id.0);
                self.last_failure = Some(failure.clone());
                ResizeOutcome::Failed(failure)
            }
        }
    }

    /// Update the typing signal. Read on the next frame step.
    pub fn set_typing(&mut self, typing: bool) {
        self.typing = typing;
    }

    /// Cancel the frame loop, unregister the resize listener, release the
    /// scene and its surface context. Safe to call repeatedly.
    pub fn destroy<H: Host>(&mut self, host: &mut H) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        self.teardown(host);
        self.renderer.release();
        self.state = LifecycleState::Destroyed;
        log::debug!("backdrop {}: destroyed", self.id.0);
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Active or degraded: still bound to the surface.
    pub fn is_live(&self) -> bool {
        matches!(self.state, LifecycleState::Active | LifecycleState::Degraded)
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub fn typing(&self) -> bool {
        self.typing
    }

    /// Typing color phase after the most recent frame step.
    pub fn color_phase(&self) -> f32 {
        self.color_phase
    }

    /// Elapsed-time accumulator after the most recent frame step.
    pub fn elapsed(&self) -> f32 {
        self.time
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn fields(&self) -> &[ParticleField] {
        self.scene.as_ref().map_or(&[], |s| s.fields.as_slice())
    }

    pub fn particle_count(&self) -> usize {
        self.scene.as_ref().map_or(0, Scene::particle_count)
    }

    /// The frame callback this instance is waiting on.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn resize_listener(&self) -> Option<ListenerId> {
        self.resize_listener
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    /// Most recent reported failure, if any.
    pub fn last_failure(&self) -> Option<&BackdropError> {
        self.last_failure.as_ref()
    }

    /// One frame: advance clocks, mutate fields, present.
    fn step<H: Host>(&mut self, host: &mut H) -> Result<(), SceneError> {
        self.time += self.generator.time_step();
        if self.typing {
            self.color_phase += self.generator.hue_step();
        } else {
            self.color_phase = 0.0;
        }

        let Some(scene) = self.scene.as_mut() else {
            return Err(FieldError::LayerMismatch { expected: 1, found: 0 }.into());
        };

        let frame = FrameContext {
            time: self.time,
            color_phase: self.color_phase,
            typing: self.typing,
        };
        self.generator.mutate(&mut scene.fields, &frame)?;
        self.renderer.render(scene, host)?;
        Ok(())
    }

    /// Build fields and scene, then register with the host. Leaves nothing
    /// registered on error.
    fn build<H: Host>(&mut self, host: &mut H) -> Result<(), SceneError> {
        self.stats.constructions += 1;
        let fields = self.generator.initialize(&mut self.rng)?;
        let settings = *self.generator.scene_settings();
        let scene = Scene::build(host, &settings, fields)?;

        self.scene = Some(scene);
        self.resize_listener = Some(host.add_resize_listener());
        self.frame = Some(host.request_frame());
        Ok(())
    }

    /// Release host registrations and the scene, keeping state and counters.
    fn teardown<H: Host>(&mut self, host: &mut H) {
        if let Some(handle) = self.frame.take() {
            host.cancel_frame(handle);
        }
        if let Some(id) = self.resize_listener.take() {
            host.remove_resize_listener(id);
        }
        if self.scene.take().is_some() {
            host.release_context();
        }
    }

    /// Bounded self-recovery: rebuild from scratch while budget remains,
    /// otherwise degrade.
    fn recover<H: Host>(&mut self, host: &mut H, failure: BackdropError) -> FrameOutcome {
        log::warn!("backdrop {}: {failure}", self.id.0);
        self.last_failure = Some(failure.clone());

        if self.stats.recoveries >= self.policy.max_recoveries {
            let source = match &failure {
                BackdropError::FrameFailure { source, .. } => source.clone(),
                _ => return self.degrade_with(host, failure),
            };
            return self.degrade_with(host, BackdropError::RecoveryFailure { source });
        }

        self.stats.recoveries += 1;
        self.teardown(host);
        match self.build(host) {
            Ok(()) => {
                log::info!(
                    "backdrop {}: rebuilt scene (recovery {}/{})",
                    self.id.0,
                    self.stats.recoveries,
                    self.policy.max_recoveries
                );
                FrameOutcome::Recovered(failure)
            }
            Err(source) => self.degrade_with(host, BackdropError::RecoveryFailure { source }),
        }
    }

    fn degrade_with<H: Host>(&mut self, host: &mut H, failure: BackdropError) -> FrameOutcome {
        self.degrade(host, failure.clone());
        FrameOutcome::Degraded(failure)
    }

    /// Terminal fallback: drop everything and show the static background.
    fn degrade<H: Host>(&mut self, host: &mut H, failure: BackdropError) {
        log::error!("backdrop {}: degrading to static background: {failure}", self.id.0);
        self.teardown(host);
        self.renderer.release();
        host.show_fallback(&self.generator.scene_settings().fallback);
        self.state = LifecycleState::Degraded;
        self.last_failure = Some(failure);
    }
}
