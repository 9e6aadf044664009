#![no_std]

/// Pixel dimensions and density of the presentation surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceMetrics {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
}

/// Options for acquiring a rendering context on a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextDesc {
    pub antialias: bool,
    /// Transparent clear (the surface behind shows through).
    pub alpha: bool,
    /// Prefer the discrete GPU when the platform offers a choice.
    pub high_performance: bool,
}

/// Static linear gradient shown when animation is unavailable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticBackground {
    pub angle_deg: f32,
    /// 0xRRGGBB start color.
    pub from: u32,
    /// 0xRRGGBB end color.
    pub to: u32,
}

/// One point sprite as submitted to the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
}

/// Shared draw state for a batch of points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointMaterial {
    /// Base sprite size in scene units; multiplied by the per-vertex size.
    pub size: f32,
    /// Material color, used when `vertex_colors` is false.
    pub color: [f32; 3],
    pub opacity: f32,
    pub additive: bool,
    /// Shrink sprites with distance from the camera.
    pub size_attenuation: bool,
    pub vertex_colors: bool,
}

/// A batch of point sprites plus the column-major clip transform for them.
#[derive(Clone, Copy, Debug)]
pub struct PointBatch<'a> {
    pub vertices: &'a [PointVertex],
    pub model_view_projection: [[f32; 4]; 4],
    pub material: PointMaterial,
}

/// Presentation surface the backdrop draws into.
///
/// Implementations own the platform drawing context. `release_context` must
/// tolerate being called when no context exists.
pub trait Surface {
    type Error: core::fmt::Debug;

    /// Current size and pixel density.
    fn metrics(&self) -> SurfaceMetrics;

    /// Acquire GPU-level resources. Called once per scene construction.
    fn create_context(&mut self, desc: &ContextDesc) -> Result<(), Self::Error>;

    /// Resize the drawing buffer to `width` x `height` CSS pixels at `pixel_ratio`.
    fn set_viewport(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<(), Self::Error>;

    /// Clear the drawing buffer to an RGBA color.
    fn clear(&mut self, rgba: [f32; 4]) -> Result<(), Self::Error>;

    fn draw_points(&mut self, batch: &PointBatch<'_>) -> Result<(), Self::Error>;

    /// Present the finished frame.
    fn present(&mut self) -> Result<(), Self::Error>;

    /// Release GPU-level resources and detach the drawing buffer.
    fn release_context(&mut self);

    /// Replace the animated backdrop with a static gradient.
    fn show_fallback(&mut self, background: &StaticBackground);
}

/// Opaque token for a pending frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

/// Request-next-frame style scheduling primitive.
pub trait FrameScheduler {
    /// Ask for one callback on the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Best-effort cancellation. A callback that is already queued may still fire.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Opaque token for a registered resize listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u32);

/// Registry for surface size-change notifications.
pub trait ResizeEvents {
    fn add_resize_listener(&mut self) -> ListenerId;
    fn remove_resize_listener(&mut self, id: ListenerId);
}

/// The chat UI that receives theme style blocks.
pub trait StyleTarget {
    /// Install `rules`, replacing whatever block was applied before.
    /// `source` names where the rules came from (e.g. a stylesheet name).
    fn apply_style(&mut self, source: &str, rules: &str);
}

/// Abstracts widget input across platforms.
pub trait InputSource {
    /// Initialize the input subsystem.
    fn init(&mut self);

    /// Poll for input events. Non-blocking.
    fn poll(&mut self) -> Option<InputEvent>;
}

/// Platform-agnostic widget events.
///
/// Uses a `u8` theme index rather than a theme type from backdrop-core to
/// keep this crate dependency-free (core depends on hal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The host surface changed size (CSS pixels).
    Resize { width: u32, height: u32 },
    /// Assistant response pending (`true`) or resolved (`false`).
    SetTyping(bool),
    /// Select a theme by registry index (0, 1, ...).
    SelectTheme(u8),
    /// Switch to the other theme.
    ToggleTheme,
    /// Tear down and stop.
    Quit,
}
