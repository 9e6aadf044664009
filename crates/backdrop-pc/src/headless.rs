//! Headless host for the PC build.
//!
//! Stands in for the browser page: a software point rasterizer behind the
//! `Surface` trait, a frame-callback queue drained once per simulated
//! refresh, a resize-listener table and a single style slot.

use backdrop_core::math::color::rgb_from_hex;
use backdrop_core::render::transform::project_point;
use backdrop_hal::{
    ContextDesc, FrameHandle, FrameScheduler, ListenerId, PointBatch, ResizeEvents, StaticBackground, StyleTarget,
    Surface, SurfaceMetrics,
};
use glam::{Mat4, Vec3};

/// Largest sprite radius the rasterizer will splat, in device pixels.
const MAX_SPRITE_RADIUS: f32 = 3.0;

/// Largest drawing buffer the host will allocate, in device pixels.
pub const MAX_BUFFER_PIXELS: u64 = 1 << 25;

/// Characters from dark to bright for the ASCII preview.
const RAMP: &[u8] = b" .:-=+*#%@";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeadlessError {
    #[error("no rendering context")]
    NoContext,
    #[error("context creation refused")]
    ContextRefused,
    #[error("injected failure at present #{0}")]
    InjectedPresent(u64),
    #[error("drawing buffer {width}x{height} exceeds the pixel limit")]
    BufferTooLarge { width: u32, height: u32 },
}

/// RGB drawing buffer in device pixels.
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
}

impl Framebuffer {
    fn new(width: u32, height: u32) -> Result<Self, HeadlessError> {
        let width = width.max(1);
        let height = height.max(1);
        let count = u64::from(width) * u64::from(height);
        if count > MAX_BUFFER_PIXELS {
            return Err(HeadlessError::BufferTooLarge { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![[0.0; 3]; count as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn fill(&mut self, rgb: [f32; 3]) {
        self.pixels.fill(rgb);
    }

    fn plot(&mut self, x: i32, y: i32, rgb: [f32; 3], opacity: f32, additive: bool) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let px = &mut self.pixels[(y as u32 * self.width + x as u32) as usize];
        for c in 0..3 {
            px[c] = if additive {
                (px[c] + rgb[c] * opacity).min(1.0)
            } else {
                px[c] + (rgb[c] - px[c]) * opacity
            };
        }
    }

    /// Rec. 709 luma of one pixel.
    pub fn luminance(&self, x: u32, y: u32) -> f32 {
        let [r, g, b] = self.pixels[(y * self.width + x) as usize];
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }
}

/// Per-frame rasterizer counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawCounters {
    pub batches: u32,
    pub drawn: u64,
    pub culled: u64,
}

pub struct HeadlessHost {
    metrics: SurfaceMetrics,
    context: Option<ContextDesc>,
    framebuffer: Option<Framebuffer>,
    pixel_ratio: f32,

    next_frame: u32,
    queued: Vec<FrameHandle>,

    next_listener: u32,
    listeners: Vec<ListenerId>,

    style: Option<(String, String)>,
    fallback: Option<StaticBackground>,

    refuse_contexts: u32,
    fail_presents: Vec<u64>,
    present_calls: u64,
    counters: DrawCounters,
    last_counters: DrawCounters,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            metrics: SurfaceMetrics {
                width,
                height,
                device_pixel_ratio,
            },
            context: None,
            framebuffer: None,
            pixel_ratio: 1.0,
            next_frame: 0,
            queued: Vec::new(),
            next_listener: 0,
            listeners: Vec::new(),
            style: None,
            fallback: None,
            refuse_contexts: 0,
            fail_presents: Vec::new(),
            present_calls: 0,
            counters: DrawCounters::default(),
            last_counters: DrawCounters::default(),
        }
    }

    /// Fail the next `count` context acquisitions.
    pub fn refuse_contexts(&mut self, count: u32) {
        self.refuse_contexts = count;
    }

    /// Fail the `n`th call to `present` (1-based, counted over the host's lifetime).
    pub fn fail_present_at(&mut self, n: u64) {
        self.fail_presents.push(n);
    }

    /// Drain the callbacks queued for this refresh.
    pub fn take_frames(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.queued)
    }

    /// Change the surface size. Returns true if anyone is listening.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.metrics.width = width;
        self.metrics.height = height;
        !self.listeners.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn queued_frames(&self) -> usize {
        self.queued.len()
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.framebuffer.as_ref()
    }

    /// Effective pixel ratio of the current drawing buffer.
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Stylesheet name of the installed style block.
    pub fn style_source(&self) -> Option<&str> {
        self.style.as_ref().map(|(source, _)| source.as_str())
    }

    pub fn fallback(&self) -> Option<&StaticBackground> {
        self.fallback.as_ref()
    }

    /// Counters for the last presented frame.
    pub fn last_frame(&self) -> DrawCounters {
        self.last_counters
    }

    /// Downsample the drawing buffer (or the fallback gradient) to text.
    pub fn ascii_preview(&self, cols: u32, rows: u32) -> Option<String> {
        if cols == 0 || rows == 0 || u64::from(cols) * u64::from(rows) > MAX_BUFFER_PIXELS {
            return None;
        }
        let cell = |col: u32, row: u32| -> Option<f32> {
            if let Some(fb) = &self.framebuffer {
                let (x0, x1) = cell_span(col, cols, fb.width);
                let (y0, y1) = cell_span(row, rows, fb.height);
                let mut peak = 0.0f32;
                for y in y0..y1 {
                    for x in x0..x1 {
                        peak = peak.max(fb.luminance(x, y));
                    }
                }
                Some(peak)
            } else {
                let fallback = self.fallback.as_ref()?;
                let t = (col as f32 / cols as f32 + row as f32 / rows as f32) * 0.5;
                let from = rgb_from_hex(fallback.from);
                let to = rgb_from_hex(fallback.to);
                let c = from.lerp(to, t);
                Some(0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z)
            }
        };

        let mut out = String::with_capacity((cols as usize + 1) * rows as usize);
        for row in 0..rows {
            for col in 0..cols {
                let lum = cell(col, row)?.clamp(0.0, 1.0);
                let idx = (lum * (RAMP.len() - 1) as f32).round() as usize;
                out.push(RAMP[idx] as char);
            }
            out.push('\n');
        }
        Some(out)
    }

    fn framebuffer_mut(&mut self) -> Result<&mut Framebuffer, HeadlessError> {
        if self.context.is_none() {
            return Err(HeadlessError::NoContext);
        }
        self.framebuffer.as_mut().ok_or(HeadlessError::NoContext)
    }
}

/// Buffer range `[start, end)` covered by preview cell `index` of `cells`.
fn cell_span(index: u32, cells: u32, len: u32) -> (u32, u32) {
    let scale = |i: u32| (u64::from(i) * u64::from(len) / u64::from(cells)) as u32;
    let start = scale(index).min(len.saturating_sub(1));
    let end = scale(index + 1).max(start + 1).min(len);
    (start, end)
}

impl Surface for HeadlessHost {
    type Error = HeadlessError;

    fn metrics(&self) -> SurfaceMetrics {
        self.metrics
    }

    fn create_context(&mut self, desc: &ContextDesc) -> Result<(), Self::Error> {
        if self.refuse_contexts > 0 {
            self.refuse_contexts -= 1;
            return Err(HeadlessError::ContextRefused);
        }
        self.context = Some(*desc);
        self.fallback = None;
        log::debug!("headless: context acquired ({desc:?})");
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<(), Self::Error> {
        if self.context.is_none() {
            return Err(HeadlessError::NoContext);
        }
        let device_w = (width as f32 * pixel_ratio).round() as u32;
        let device_h = (height as f32 * pixel_ratio).round() as u32;
        // On error the previous buffer stays in place.
        self.framebuffer = Some(Framebuffer::new(device_w, device_h)?);
        self.pixel_ratio = pixel_ratio;
        Ok(())
    }

    fn clear(&mut self, rgba: [f32; 4]) -> Result<(), Self::Error> {
        let fb = self.framebuffer_mut()?;
        fb.fill([rgba[0] * rgba[3], rgba[1] * rgba[3], rgba[2] * rgba[3]]);
        self.counters = DrawCounters::default();
        Ok(())
    }

    fn draw_points(&mut self, batch: &PointBatch<'_>) -> Result<(), Self::Error> {
        let fb = self.framebuffer.as_mut().ok_or(HeadlessError::NoContext)?;
        if self.context.is_none() {
            return Err(HeadlessError::NoContext);
        }
        let mvp = Mat4::from_cols_array_2d(&batch.model_view_projection);
        let material = &batch.material;
        let (width, height) = (fb.width, fb.height);
        let half_height = height as f32 * 0.5;

        self.counters.batches += 1;
        for vertex in batch.vertices {
            let Some(p) = project_point(Vec3::from_array(vertex.position), &mvp, width, height) else {
                self.counters.culled += 1;
                continue;
            };
            self.counters.drawn += 1;

            let color = if material.vertex_colors {
                vertex.color
            } else {
                material.color
            };
            let world_size = material.size * vertex.size;
            let radius = if material.size_attenuation {
                world_size * half_height / p.w
            } else {
                world_size
            }
            .clamp(0.0, MAX_SPRITE_RADIUS);

            let r = radius.floor() as i32;
            let (cx, cy) = (p.x as i32, p.y as i32);
            for dy in -r..=r {
                for dx in -r..=r {
                    if (dx * dx + dy * dy) as f32 <= radius * radius + 0.5 {
                        fb.plot(cx + dx, cy + dy, color, material.opacity, material.additive);
                    }
                }
            }
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.present_calls += 1;
        if self.fail_presents.contains(&self.present_calls) {
            return Err(HeadlessError::InjectedPresent(self.present_calls));
        }
        self.framebuffer_mut()?;
        self.last_counters = self.counters;
        Ok(())
    }

    fn release_context(&mut self) {
        if self.context.take().is_some() {
            log::debug!("headless: context released");
        }
        self.framebuffer = None;
    }

    fn show_fallback(&mut self, background: &StaticBackground) {
        log::info!(
            "headless: static background {}deg #{:06x} -> #{:06x}",
            background.angle_deg,
            background.from,
            background.to
        );
        self.fallback = Some(*background);
    }
}

impl FrameScheduler for HeadlessHost {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_frame = self.next_frame.wrapping_add(1);
        let handle = FrameHandle(self.next_frame);
        self.queued.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queued.retain(|h| *h != handle);
    }
}

impl ResizeEvents for HeadlessHost {
    fn add_resize_listener(&mut self) -> ListenerId {
        self.next_listener = self.next_listener.wrapping_add(1);
        let id = ListenerId(self.next_listener);
        self.listeners.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|l| *l != id);
    }
}

impl StyleTarget for HeadlessHost {
    fn apply_style(&mut self, source: &str, rules: &str) {
        log::debug!("headless: style {source} ({} bytes)", rules.len());
        self.style = Some((source.to_owned(), rules.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_hal::{PointMaterial, PointVertex};

    fn material(additive: bool) -> PointMaterial {
        PointMaterial {
            size: 0.0,
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            additive,
            size_attenuation: false,
            vertex_colors: false,
        }
    }

    fn identity() -> [[f32; 4]; 4] {
        Mat4::IDENTITY.to_cols_array_2d()
    }

    fn host_with_context(width: u32, height: u32) -> HeadlessHost {
        let mut host = HeadlessHost::new(width, height, 1.0);
        host.create_context(&ContextDesc::default()).unwrap();
        host.set_viewport(width, height, 1.0).unwrap();
        host
    }

    #[test]
    fn viewport_scales_buffer_by_pixel_ratio() {
        let mut host = HeadlessHost::new(100, 50, 2.0);
        host.create_context(&ContextDesc::default()).unwrap();
        host.set_viewport(100, 50, 2.0).unwrap();
        let fb = host.framebuffer().unwrap();
        assert_eq!((fb.width(), fb.height()), (200, 100));
    }

    #[test]
    fn oversized_viewport_is_rejected_and_keeps_buffer() {
        let mut host = host_with_context(64, 32);
        assert_eq!(
            host.set_viewport(70_000, 70_000, 1.0),
            Err(HeadlessError::BufferTooLarge {
                width: 70_000,
                height: 70_000
            })
        );
        let fb = host.framebuffer().unwrap();
        assert_eq!((fb.width(), fb.height()), (64, 32));
        assert!(host.clear([0.0; 4]).is_ok());
    }

    #[test]
    fn preview_wider_than_buffer_does_not_overflow() {
        let mut host = host_with_context(3, 2);
        host.clear([1.0, 1.0, 1.0, 1.0]).unwrap();
        let text = host.ascii_preview(100_000, 1).unwrap();
        assert_eq!(text.len(), 100_001);
        assert!(host.ascii_preview(u32::MAX, u32::MAX).is_none());
        assert_eq!(cell_span(99_999, 100_000, 3), (2, 3));
        assert_eq!(cell_span(0, 2, u32::MAX), (0, u32::MAX / 2));
    }

    #[test]
    fn drawing_without_context_fails() {
        let mut host = HeadlessHost::new(10, 10, 1.0);
        assert_eq!(host.clear([0.0; 4]), Err(HeadlessError::NoContext));
        assert_eq!(host.set_viewport(10, 10, 1.0), Err(HeadlessError::NoContext));
    }

    #[test]
    fn center_point_lands_mid_buffer() {
        let mut host = host_with_context(9, 9);
        host.clear([0.0, 0.0, 0.0, 1.0]).unwrap();
        let vertices = [PointVertex {
            position: [0.0, 0.0, 0.5],
            size: 1.0,
            color: [0.0; 3],
        }];
        let batch = PointBatch {
            vertices: &vertices,
            model_view_projection: identity(),
            material: material(true),
        };
        host.draw_points(&batch).unwrap();
        host.present().unwrap();

        let fb = host.framebuffer().unwrap();
        assert!(fb.luminance(4, 4) > 0.99);
        assert_eq!(fb.luminance(0, 0), 0.0);
        assert_eq!(host.last_frame().drawn, 1);
    }

    #[test]
    fn off_screen_points_are_culled() {
        let mut host = host_with_context(8, 8);
        host.clear([0.0; 4]).unwrap();
        let vertices = [PointVertex {
            position: [5.0, 0.0, 0.5],
            size: 1.0,
            color: [0.0; 3],
        }];
        let batch = PointBatch {
            vertices: &vertices,
            model_view_projection: identity(),
            material: material(false),
        };
        host.draw_points(&batch).unwrap();
        host.present().unwrap();
        assert_eq!(host.last_frame().culled, 1);
        assert_eq!(host.last_frame().drawn, 0);
    }

    #[test]
    fn injected_present_failure_hits_once() {
        let mut host = host_with_context(4, 4);
        host.fail_present_at(2);
        assert!(host.present().is_ok());
        assert_eq!(host.present(), Err(HeadlessError::InjectedPresent(2)));
        assert!(host.present().is_ok());
    }

    #[test]
    fn refused_context_counts_down() {
        let mut host = HeadlessHost::new(4, 4, 1.0);
        host.refuse_contexts(1);
        assert_eq!(host.create_context(&ContextDesc::default()), Err(HeadlessError::ContextRefused));
        assert!(!host.has_context());
        assert!(host.create_context(&ContextDesc::default()).is_ok());
        assert!(host.has_context());
    }

    #[test]
    fn cancel_removes_queued_frame() {
        let mut host = HeadlessHost::new(4, 4, 1.0);
        let a = host.request_frame();
        let b = host.request_frame();
        host.cancel_frame(a);
        assert_eq!(host.take_frames(), vec![b]);
        assert_eq!(host.queued_frames(), 0);
    }

    #[test]
    fn preview_shows_fallback_gradient() {
        let mut host = HeadlessHost::new(4, 4, 1.0);
        assert!(host.ascii_preview(4, 2).is_none());
        host.show_fallback(&StaticBackground {
            angle_deg: 45.0,
            from: 0xffffff,
            to: 0xffffff,
        });
        assert_eq!(host.ascii_preview(3, 2).unwrap(), "@@@\n@@@\n");
    }

    #[test]
    fn resize_reports_listeners() {
        let mut host = HeadlessHost::new(4, 4, 1.0);
        assert!(!host.resize(8, 8));
        host.add_resize_listener();
        assert!(host.resize(16, 16));
        assert_eq!(host.metrics().width, 16);
    }
}
