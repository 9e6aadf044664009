//! Scripted widget input for the headless host.
//!
//! Replays a fixed schedule of events keyed by frame number, standing in
//! for the chat widget's typing indicator, theme button and window resizes.

use backdrop_hal::{InputEvent, InputSource};

/// Replays `(frame, event)` pairs once the clock reaches their frame.
pub struct ScriptedInput {
    schedule: Vec<(u64, InputEvent)>,
    next: usize,
    frame: u64,
}

impl ScriptedInput {
    pub fn new(mut schedule: Vec<(u64, InputEvent)>) -> Self {
        // Stable: events scheduled for the same frame keep their order.
        schedule.sort_by_key(|(frame, _)| *frame);
        Self {
            schedule,
            next: 0,
            frame: 0,
        }
    }

    /// Advance the clock to `frame`. Events up to and including it become pollable.
    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    /// Events not yet delivered.
    pub fn remaining(&self) -> usize {
        self.schedule.len() - self.next
    }
}

impl InputSource for ScriptedInput {
    fn init(&mut self) {
        log::info!("Scripted input initialized ({} events)", self.schedule.len());
    }

    fn poll(&mut self) -> Option<InputEvent> {
        let (frame, event) = *self.schedule.get(self.next)?;
        if frame > self.frame {
            return None;
        }
        self.next += 1;
        Some(event)
    }
}
