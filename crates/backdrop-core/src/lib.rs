//! Themed particle backdrop for the chat widget.
//!
//! Generators build and animate particle fields, the lifecycle manager owns
//! one scene end-to-end, and the theme orchestrator keeps exactly one live
//! manager per surface. All host interaction goes through `backdrop-hal`.

pub mod error;
pub mod field;
pub mod lifecycle;
pub mod math;
pub mod render;
pub mod scene;
pub mod theme;

pub use error::{BackdropError, FieldError, SurfaceFault};
pub use lifecycle::{
    Backdrop, FrameOutcome, FrameStats, Host, InstanceId, LifecycleState, RecoveryPolicy, ResizeOutcome,
};
pub use theme::orchestrator::{ThemeOrchestrator, ThemeSwitch};
pub use theme::{BuiltinStyles, GeneratorKind, StyleLoader, ThemeEntry, ThemeRegistry};
