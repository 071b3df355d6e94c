use std::path::PathBuf;

use thiserror::Error;

/// Problems with the requested simulation setup. These are caught before
/// any stepping starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("'{0}' is not a valid obstacle shape (expected rectangle, disk or diagonal)")]
    UnknownShape(String),

    #[error("'{0}' is not a valid display field (expected velocity, pressure or smoke)")]
    UnknownField(String),

    #[error("'{0}' is not a valid interface mode (expected video or headless)")]
    UnknownMode(String),

    #[error("grid of {rows}x{cols} has no interior; both sides must be at least 3")]
    GridTooSmall { rows: usize, cols: usize },

    #[error("timestep must be finite and positive, got {0}")]
    InvalidTimestep(f32),

    #[error("simulation time must be finite and positive, got {0}")]
    InvalidSimulationTime(f32),

    #[error("viscosity must be finite and non-negative, got {0}")]
    InvalidViscosity(f32),

    #[error("obstacle size {size} / thickness {thickness} is too large to place on a grid")]
    ObstacleTooLarge { size: usize, thickness: usize },

    #[error("simulation needs {steps} steps of the given timestep; at most {max} are allowed")]
    TooManySteps { steps: f64, max: usize },

    #[error("frames directory {0:?} holds files that are not frames; refusing to clear it")]
    ForeignFrameFiles(PathBuf),

    #[error("inlet band rows {rows:?} cols {cols:?} does not fit inside the grid")]
    InletOutOfBounds {
        rows: (usize, usize),
        cols: (usize, usize),
    },

    #[error("obstacle mask is {found:?} but the grid is {expected:?}")]
    MaskShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("input file {0:?} does not exist or is a directory")]
    MissingInput(PathBuf),

    #[error("failed to parse input file: {0}")]
    InputFile(#[from] serde_json::Error),

    #[error("failed to read obstacle image: {0}")]
    Image(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised while stepping the solver.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("timestep must be finite and positive, got {0}")]
    InvalidTimestep(f32),

    #[error("{field} field became non-finite at step {step}")]
    NonFinite { field: &'static str, step: usize },

    #[error("frame writer stopped at step {0}")]
    FrameWriterClosed(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
