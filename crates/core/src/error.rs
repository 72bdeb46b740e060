//! Error types for the skyfx core.

use thiserror::Error;

/// Errors produced by canvas, effect, and host operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero (or their product overflowed) when creating a
    /// canvas or viewport.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// The host was attached without a drawing surface.
    #[error("drawing surface is missing")]
    SurfaceMissing,

    /// Two rasters had incompatible dimensions for a copy or composite.
    #[error("dimension mismatch: ({lhs_w}, {lhs_h}) vs ({rhs_w}, {rhs_h})")]
    DimensionMismatch {
        lhs_w: usize,
        lhs_h: usize,
        rhs_w: usize,
        rhs_h: usize,
    },

    /// A draw call received non-finite coordinates or sizes.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A palette could not be constructed from the given colors.
    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    /// A configuration object could not be applied.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An effect name was not recognized by the registry.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    /// An I/O failure (snapshot writing).
    #[error("i/o error: {0}")]
    Io(String),
}
