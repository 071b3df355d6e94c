use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::ConfigError,
    preprocessing::serial_mask::SerialMask,
    sim::{
        obstacle::{ObstacleShape, ShapeParams},
        sources::InletBand,
    },
};

/// Upper bound on the number of steps a single run may take
pub const MAX_STEPS: usize = 1_000_000;

pub mod cli;
pub mod image_input;
pub mod serial_mask;

/// Which scalar the renderer shows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayField {
    Velocity,
    Pressure,
    Smoke,
}

impl FromStr for DisplayField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "velocity" => Ok(DisplayField::Velocity),
            "pressure" => Ok(DisplayField::Pressure),
            "smoke" | "density" => Ok(DisplayField::Smoke),
            _ => Err(ConfigError::UnknownField(s.to_owned())),
        }
    }
}

impl fmt::Display for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayField::Velocity => "velocity",
            DisplayField::Pressure => "pressure",
            DisplayField::Smoke => "smoke",
        };
        write!(f, "{name}")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ImageStreamSettings {
    pub frames_dir: PathBuf,
    pub retain_frames: bool,
    pub display_video: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum InterfaceMode {
    /// Render every step to a PNG frame
    ImageStream(ImageStreamSettings),

    /// Only log field statistics
    Headless,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SimulationInput {
    pub mode: InterfaceMode,

    /// Grid dimensions (rows, cols)
    pub grid: (usize, usize),
    pub timestep: f32,
    pub simulation_time: f32,
    pub viscosity: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacle: Option<ObstacleShape>,

    #[serde(default)]
    pub obstacle_params: ShapeParams,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<SerialMask>, // extra solids loaded from a png
    pub inlet: InletBand,
    pub ambient_force: (f32, f32),
    pub display_field: DisplayField,
}

impl SimulationInput {
    /// The default scenario on a `rows x cols` grid: a centered inlet, steps
    /// of 0.5 over 150 time units and ambient forcing along the columns.
    pub fn with_defaults(mode: InterfaceMode, rows: usize, cols: usize) -> Self {
        SimulationInput {
            mode,
            grid: (rows, cols),
            timestep: 0.5,
            simulation_time: 150.,
            viscosity: 0.01,
            obstacle: None,
            obstacle_params: ShapeParams::default(),
            mask: None,
            inlet: InletBand::centered(rows.max(3), cols.max(3)),
            ambient_force: (0., 5.),
            display_field: DisplayField::Smoke,
        }
    }

    /// Reject inputs the solver cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (rows, cols) = self.grid;
        if rows < 3 || cols < 3 {
            return Err(ConfigError::GridTooSmall { rows, cols });
        }
        if !(self.timestep.is_finite() && self.timestep > 0.) {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        if !(self.simulation_time.is_finite() && self.simulation_time > 0.) {
            return Err(ConfigError::InvalidSimulationTime(self.simulation_time));
        }
        if !(self.viscosity.is_finite() && self.viscosity >= 0.) {
            return Err(ConfigError::InvalidViscosity(self.viscosity));
        }

        let steps = self.step_count();
        if !(steps.is_finite() && steps <= MAX_STEPS as f64) {
            return Err(ConfigError::TooManySteps {
                steps,
                max: MAX_STEPS,
            });
        }

        let ShapeParams { size, thickness } = self.obstacle_params;
        if size > isize::MAX as usize || thickness > isize::MAX as usize {
            return Err(ConfigError::ObstacleTooLarge { size, thickness });
        }

        self.inlet.validate(rows, cols)?;

        if let Some(mask) = &self.mask {
            if mask.shape() != self.grid {
                return Err(ConfigError::MaskShape {
                    expected: self.grid,
                    found: mask.shape(),
                });
            }
        }

        Ok(())
    }

    fn step_count(&self) -> f64 {
        (self.simulation_time as f64 / self.timestep as f64).ceil()
    }

    /// Number of steps needed to cover the simulation time. Never more than
    /// [`MAX_STEPS`]; `validate` rejects inputs that would need more.
    pub fn iter_count(&self) -> usize {
        self.step_count().min(MAX_STEPS as f64) as usize
    }

    pub fn log(&self) {
        let obstacle = self
            .obstacle
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_owned());

        info!(
            "Simulation is shown below:\n\n\
        \t grid:       {} x {}\n\
        \t time range: {} ({} steps of {})\n\
        \t viscosity:  {}\n\
        \t obstacle:   {} (size {}, thickness {})\n\
        \t png mask:   {}\n\
        \t inlet:      rows {:?}, cols {:?}, < {}, {} >, source {}\n\
        \t force:      < {}, {} >\n\
        \t display:    {}\n\n\
        ",
            self.grid.0,
            self.grid.1,
            self.simulation_time,
            self.iter_count(),
            self.timestep,
            self.viscosity,
            obstacle,
            self.obstacle_params.size,
            self.obstacle_params.thickness,
            self.mask.is_some(),
            self.inlet.rows,
            self.inlet.cols,
            self.inlet.velocity.0,
            self.inlet.velocity.1,
            self.inlet.source,
            self.ambient_force.0,
            self.ambient_force.1,
            self.display_field,
        );

        if let Ok(mode_str) = serde_json::to_string_pretty(&self.mode) {
            info!("Mode parameters are:\n\n{}", mode_str);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_field() {
        assert_eq!("velocity".parse::<DisplayField>().unwrap(), DisplayField::Velocity);
        assert_eq!("Pressure".parse::<DisplayField>().unwrap(), DisplayField::Pressure);
        assert_eq!("smoke".parse::<DisplayField>().unwrap(), DisplayField::Smoke);
        assert!(matches!(
            "vorticity".parse::<DisplayField>(),
            Err(ConfigError::UnknownField(_))
        ));
    }

    #[test]
    fn test_defaults_are_valid() {
        let input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);

        assert!(input.validate().is_ok());
        assert_eq!(input.iter_count(), 300);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);
        input.timestep = -0.5;
        assert!(matches!(input.validate(), Err(ConfigError::InvalidTimestep(_))));

        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);
        input.viscosity = f32::NAN;
        assert!(matches!(input.validate(), Err(ConfigError::InvalidViscosity(_))));

        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);
        input.grid = (100, 100);
        assert!(matches!(input.validate(), Err(ConfigError::InletOutOfBounds { .. })));

        let input = SimulationInput::with_defaults(InterfaceMode::Headless, 2, 50);
        assert!(matches!(input.validate(), Err(ConfigError::GridTooSmall { .. })));
    }

    #[test]
    fn test_validate_rejects_runaway_step_count() {
        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);
        input.timestep = 1e-30;
        input.simulation_time = 1e30;
        assert!(matches!(input.validate(), Err(ConfigError::TooManySteps { .. })));
        assert_eq!(input.iter_count(), MAX_STEPS);

        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);
        input.timestep = 1e-9;
        assert!(matches!(input.validate(), Err(ConfigError::TooManySteps { .. })));

        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);
        input.simulation_time = MAX_STEPS as f32;
        input.timestep = 1.;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unplaceable_obstacle() {
        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 200, 200);
        input.obstacle = Some(ObstacleShape::Disk);
        input.obstacle_params.size = usize::MAX;
        assert!(matches!(input.validate(), Err(ConfigError::ObstacleTooLarge { .. })));

        // larger than the grid but still placeable: clipped when stamped
        input.obstacle_params.size = 3_100_000_000;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_and_unknown_shape() {
        let mut input = SimulationInput::with_defaults(InterfaceMode::Headless, 50, 50);
        input.obstacle = Some(ObstacleShape::Diagonal);

        let text = serde_json::to_string(&input).unwrap();
        let loaded: SimulationInput = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.obstacle, Some(ObstacleShape::Diagonal));
        assert_eq!(loaded.inlet, input.inlet);

        let bad = text.replace("\"diagonal\"", "\"hexagon\"");
        assert!(serde_json::from_str::<SimulationInput>(&bad).is_err());
    }
}
