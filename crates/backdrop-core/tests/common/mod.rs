//! Recording mock host shared by the integration tests.
//!
//! Captures every registration, draw and style swap, and can be told to
//! fail context creation or specific `present` calls.

#![allow(dead_code)]

use backdrop_core::{Backdrop, FrameOutcome};
use backdrop_hal::{
    ContextDesc, FrameHandle, FrameScheduler, ListenerId, PointBatch, PointMaterial, ResizeEvents,
    StaticBackground, StyleTarget, Surface, SurfaceMetrics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    ContextLost,
    PresentFailed,
    ViewportRejected,
}

/// One `draw_points` call.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub count: usize,
    pub material: PointMaterial,
    pub mvp: [[f32; 4]; 4],
}

pub struct MockHost {
    pub metrics: SurfaceMetrics,
    /// Ordered log of host calls, for ordering assertions.
    pub events: Vec<&'static str>,

    next_handle: u32,
    /// Frame callbacks requested and not (effectively) cancelled.
    pub pending_frames: Vec<FrameHandle>,
    /// When set, `cancel_frame` leaves already-queued callbacks in place.
    pub racy_cancel: bool,

    next_listener: u32,
    pub listeners: Vec<ListenerId>,

    pub context_live: bool,
    pub contexts_created: u32,
    pub contexts_released: u32,
    pub last_context: Option<ContextDesc>,
    /// Number of upcoming `create_context` calls that fail.
    pub fail_create_context: u32,
    pub reject_viewport: bool,

    pub viewports: Vec<(u32, u32, f32)>,
    pub clears: u64,
    pub draws: Vec<DrawRecord>,
    pub present_calls: u64,
    pub presents: u64,
    /// 1-based `present` call numbers that fail.
    pub fail_present_at: Vec<u64>,

    pub fallback: Option<StaticBackground>,
    pub styles: Vec<(String, String)>,
}

impl MockHost {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            metrics: SurfaceMetrics {
                width,
                height,
                device_pixel_ratio,
            },
            events: Vec::new(),
            next_handle: 0,
            pending_frames: Vec::new(),
            racy_cancel: false,
            next_listener: 0,
            listeners: Vec::new(),
            context_live: false,
            contexts_created: 0,
            contexts_released: 0,
            last_context: None,
            fail_create_context: 0,
            reject_viewport: false,
            viewports: Vec::new(),
            clears: 0,
            draws: Vec::new(),
            present_calls: 0,
            presents: 0,
            fail_present_at: Vec::new(),
            fallback: None,
            styles: Vec::new(),
        }
    }

    /// Drain queued frame callbacks (one display refresh).
    pub fn take_frames(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending_frames)
    }

    /// Change the reported surface size, as the page would before firing resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.metrics.width = width;
        self.metrics.height = height;
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}

impl Surface for MockHost {
    type Error = MockError;

    fn metrics(&self) -> SurfaceMetrics {
        self.metrics
    }

    fn create_context(&mut self, desc: &ContextDesc) -> Result<(), Self::Error> {
        self.events.push("create_context");
        if self.fail_create_context > 0 {
            self.fail_create_context -= 1;
            return Err(MockError::ContextLost);
        }
        self.context_live = true;
        self.contexts_created += 1;
        self.last_context = Some(*desc);
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<(), Self::Error> {
        if self.reject_viewport {
            return Err(MockError::ViewportRejected);
        }
        self.viewports.push((width, height, pixel_ratio));
        Ok(())
    }

    fn clear(&mut self, _rgba: [f32; 4]) -> Result<(), Self::Error> {
        self.clears += 1;
        self.draws.clear();
        Ok(())
    }

    fn draw_points(&mut self, batch: &PointBatch<'_>) -> Result<(), Self::Error> {
        self.draws.push(DrawRecord {
            count: batch.vertices.len(),
            material: batch.material,
            mvp: batch.model_view_projection,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.present_calls += 1;
        if self.fail_present_at.contains(&self.present_calls) {
            return Err(MockError::PresentFailed);
        }
        self.presents += 1;
        Ok(())
    }

    fn release_context(&mut self) {
        self.events.push("release_context");
        if self.context_live {
            self.context_live = false;
            self.contexts_released += 1;
        }
    }

    fn show_fallback(&mut self, background: &StaticBackground) {
        self.events.push("show_fallback");
        self.fallback = Some(*background);
    }
}

impl FrameScheduler for MockHost {
    fn request_frame(&mut self) -> FrameHandle {
        self.events.push("request_frame");
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending_frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.events.push("cancel_frame");
        if !self.racy_cancel {
            self.pending_frames.retain(|h| *h != handle);
        }
    }
}

impl ResizeEvents for MockHost {
    fn add_resize_listener(&mut self) -> ListenerId {
        self.events.push("add_resize_listener");
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.events.push("remove_resize_listener");
        self.listeners.retain(|l| *l != id);
    }
}

impl StyleTarget for MockHost {
    fn apply_style(&mut self, source: &str, rules: &str) {
        self.events.push("apply_style");
        self.styles.push((source.to_owned(), rules.to_owned()));
    }
}

/// Deliver every queued callback to `backdrop`, `frames` times.
pub fn run_frames(host: &mut MockHost, backdrop: &mut Backdrop, frames: usize) -> Vec<FrameOutcome> {
    let mut outcomes = Vec::new();
    for _ in 0..frames {
        for handle in host.take_frames() {
            outcomes.push(backdrop.on_frame(host, handle));
        }
    }
    outcomes
}
