use crate::field::FieldKind;

/// Errors raised by a particle field generator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// A generator was configured to produce no particles.
    #[error("{kind:?} field configured with zero particles")]
    ZeroCount { kind: FieldKind },

    /// Sampling cube half-width must be finite and positive.
    #[error("{kind:?} field has invalid half-extent {half_extent}")]
    InvalidExtent { kind: FieldKind, half_extent: f32 },

    /// A field reached `mutate` with no particles in it.
    #[error("{kind:?} field is empty")]
    EmptyField { kind: FieldKind },

    /// The scene does not hold the fields this generator built.
    #[error("expected {expected} field(s), found {found}")]
    LayerMismatch { expected: usize, found: usize },

    /// A per-frame value became NaN or infinite.
    #[error("{kind:?} field produced a non-finite value at particle {index}")]
    NonFinite { kind: FieldKind, index: usize },
}

/// A host surface error, flattened to text because the host error type is
/// generic over the platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct SurfaceFault {
    pub operation: &'static str,
    pub message: String,
}

impl SurfaceFault {
    pub fn new<E: core::fmt::Debug>(operation: &'static str, err: E) -> Self {
        Self {
            operation,
            message: format!("{err:?}"),
        }
    }
}

/// Why a scene could not be built or stepped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Surface(#[from] SurfaceFault),
}

/// Failure taxonomy of the backdrop subsystem.
///
/// Every failure is caught where it occurs and converted to one of these;
/// none propagate into the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackdropError {
    /// Scene setup failed. The instance shows its static background.
    #[error("scene construction failed: {0}")]
    ConstructionFailure(#[source] SceneError),

    /// One animation step failed. Triggers the recovery path.
    #[error("frame {frame} failed: {source}")]
    FrameFailure { frame: u64, source: SceneError },

    /// Rebuilding after a frame failure failed, or the recovery budget is spent.
    #[error("recovery failed: {source}")]
    RecoveryFailure { source: SceneError },

    /// Unknown theme id, or no style definition for it. No state changed.
    #[error("invalid theme selection {id:?}: {reason}")]
    InvalidThemeSelection { id: String, reason: &'static str },
}

impl BackdropError {
    pub fn invalid_theme(id: &str, reason: &'static str) -> Self {
        BackdropError::InvalidThemeSelection {
            id: id.to_owned(),
            reason,
        }
    }
}
