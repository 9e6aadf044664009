//! Single-threaded page simulation: poll input, deliver frame callbacks,
//! log throughput every [`PERF_LOG_INTERVAL`] frames.

use backdrop_core::{BackdropError, FrameOutcome, LifecycleState, ResizeOutcome, ThemeOrchestrator};
use backdrop_hal::{InputEvent, InputSource};

use crate::headless::HeadlessHost;
use crate::input::ScriptedInput;

/// Number of frames between performance log outputs.
pub const PERF_LOG_INTERVAL: u64 = 120;

/// Everything a headless run is parameterized by.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Theme to start on; the registry default when `None`.
    pub theme: Option<String>,
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
    pub seed: u64,
    /// Scripted widget events, keyed by frame.
    pub events: Vec<(u64, InputEvent)>,
    /// Fail the nth present call (1-based).
    pub fail_present_at: Option<u64>,
    /// Refuse this many context acquisitions, starting with the first.
    pub refuse_contexts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            theme: None,
            frames: 600,
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
            seed: 0x5eed,
            events: Vec::new(),
            fail_present_at: None,
            refuse_contexts: 0,
        }
    }
}

/// Totals over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionTotals {
    /// Simulated display refreshes.
    pub frames: u64,
    pub rendered: u64,
    pub recovered: u32,
    pub degraded: u32,
    pub switches: u32,
    pub rejected_switches: u32,
    /// Resizes the surface refused; the loop keeps the previous buffer.
    pub failed_resizes: u32,
}

pub struct SessionReport {
    pub host: HeadlessHost,
    pub themes: ThemeOrchestrator,
    pub totals: SessionTotals,
}

impl SessionReport {
    /// State of the live backdrop at the end of the run.
    pub fn final_state(&self) -> Option<LifecycleState> {
        self.themes.active().map(|b| b.state())
    }
}

/// Run a page simulation. The orchestrator is left running so callers can
/// inspect or preview it; call `shutdown` on it when done.
///
/// Only an invalid starting theme is an error. Everything after that is
/// logged and counted.
pub fn run_session(config: &SessionConfig) -> Result<SessionReport, BackdropError> {
    let mut host = HeadlessHost::new(config.width, config.height, config.device_pixel_ratio);
    host.refuse_contexts(config.refuse_contexts);
    if let Some(n) = config.fail_present_at {
        host.fail_present_at(n);
    }

    let mut input = ScriptedInput::new(config.events.clone());
    input.init();

    let mut themes = ThemeOrchestrator::builtin(config.seed);
    match &config.theme {
        Some(id) => themes.switch_theme(&mut host, id)?,
        None => themes.start(&mut host)?,
    };

    let mut totals = SessionTotals::default();
    'frames: for frame in 1..=config.frames {
        input.set_frame(frame);
        while let Some(event) = input.poll() {
            let switched = match event {
                InputEvent::Resize { width, height } => {
                    if host.resize(width, height) {
                        if let ResizeOutcome::Failed(e) = themes.on_resize(&mut host, width, height) {
                            log::warn!("frame {frame}: {e}");
                            totals.failed_resizes += 1;
                        }
                    }
                    continue;
                }
                InputEvent::SetTyping(typing) => {
                    log::info!("frame {frame}: typing={typing}");
                    themes.set_typing(typing);
                    continue;
                }
                InputEvent::SelectTheme(index) => themes.select_index(&mut host, index),
                InputEvent::ToggleTheme => themes.toggle_theme(&mut host),
                InputEvent::Quit => break 'frames,
            };
            match switched {
                Ok(_) => totals.switches += 1,
                Err(e) => {
                    log::warn!("frame {frame}: {e}");
                    totals.rejected_switches += 1;
                }
            }
        }

        for handle in host.take_frames() {
            match themes.on_frame(&mut host, handle) {
                FrameOutcome::Rendered => totals.rendered += 1,
                FrameOutcome::Ignored => {}
                FrameOutcome::Recovered(_) => totals.recovered += 1,
                FrameOutcome::Degraded(_) => totals.degraded += 1,
            }
        }
        totals.frames = frame;

        if frame % PERF_LOG_INTERVAL == 0 {
            if let Some(active) = themes.active() {
                let stats = active.stats();
                let drawn = host.last_frame();
                log::info!(
                    "frame={}, theme={}, state={:?}, rendered={}, points={}/{}, rebuilds={}",
                    frame,
                    themes.current_theme(),
                    active.state(),
                    stats.frames,
                    drawn.drawn,
                    drawn.drawn + drawn.culled,
                    stats.recoveries
                );
            }
        }
    }

    Ok(SessionReport { host, themes, totals })
}
