use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::LazyLock,
};

use clap::{Parser, command};
use tracing::info;

use crate::{
    error::ConfigError,
    preprocessing::{
        DisplayField, ImageStreamSettings, InterfaceMode, SimulationInput,
        image_input::mask_from_image, serial_mask::SerialMask,
    },
    sim::obstacle::{ObstacleShape, ShapeParams},
};

static DEFAULT_FRAMES_PATH: LazyLock<&Path> = LazyLock::new(|| Path::new("smoke-frames"));

// Raw, CLI input
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    #[arg(
        long,
        help = "Obstacle stamped in the grid center: `rectangle`, `disk` or `diagonal`."
    )]
    shape: Option<String>,

    #[arg(
        long,
        help = "An optional PNG image whose dark pixels are added as solid cells."
    )]
    mask_path: Option<PathBuf>,

    #[arg(long, help = "An input file with pre-loaded parameters.")]
    input_json: Option<PathBuf>,

    #[arg(
        long,
        help = "The mode to run the simulation in: `video` or `headless`",
        default_value = "video"
    )]
    mode: String,

    #[arg(
        long,
        help = "The field to render: `velocity`, `pressure` or `smoke`",
        default_value = "smoke"
    )]
    field: String,

    #[arg(long, help = "Optional path to save the resolved input file to.")]
    input_json_savepath: Option<PathBuf>,

    #[arg(
        long,
        help = "An optional directory pointing to where frames should be saved."
    )]
    frames_dir: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Whether or not frames should be retained after playback.",
        default_value = "false"
    )]
    retain_frames: bool,

    #[arg(
        short,
        long,
        help = "Whether the frame animation should play after solving. Ignored in headless mode."
    )]
    display_video: bool,

    #[arg(long, help = "Number of grid rows.", default_value = "200")]
    rows: usize,

    #[arg(long, help = "Number of grid columns.", default_value = "200")]
    cols: usize,

    #[arg(long, help = "Simulation timestep.", default_value = "0.5")]
    dt: f32,

    #[arg(short, long, default_value = "150", help = "Simulated time span.")]
    simtime: f32,

    #[arg(long, default_value = "0.01", help = "Viscosity used for diffusion")]
    viscosity: f32,

    #[arg(long, help = "Inflow velocity along the columns.", default_value = "20.0")]
    inflow: f32,

    #[arg(long, help = "Smoke source rate in the inlet.", default_value = "1.0")]
    source: f32,

    #[arg(long, help = "Ambient force along the rows.", default_value = "0.0")]
    force_u: f32,

    #[arg(long, help = "Ambient force along the columns.", default_value = "5.0")]
    force_v: f32,

    #[arg(
        long,
        help = "Half side / radius / half length of the obstacle.",
        default_value = "25"
    )]
    obstacle_size: usize,

    #[arg(long, help = "Thickness of the diagonal obstacle.", default_value = "10")]
    obstacle_thickness: usize,
}

impl CliArgs {
    pub fn input_json_savepath(&self) -> Option<&Path> {
        self.input_json_savepath.as_deref()
    }

    /// Resolve the CLI arguments (or the input file they point at) into a
    /// validated `SimulationInput`.
    pub fn create_input(&self) -> Result<SimulationInput, ConfigError> {
        // if the input file is supplied, just use that
        if let Some(input_filepath) = &self.input_json {
            if !input_filepath.is_file() {
                return Err(ConfigError::MissingInput(input_filepath.clone()));
            }

            info!("Using input file {}", input_filepath.display());

            let reader = BufReader::new(File::open(input_filepath)?);
            let mut loaded_input: SimulationInput = serde_json::from_reader(reader)?;

            if loaded_input.mask.is_none() {
                if let Some(mask_path) = &self.mask_path {
                    loaded_input.mask = Some(SerialMask::from_mask(&mask_from_image(mask_path)?));
                }
            }

            loaded_input.validate()?;
            return Ok(loaded_input);
        }

        // otherwise, build the input from the other arguments
        let mode = match self.mode.as_str() {
            "video" => {
                let frames_dir = self
                    .frames_dir
                    .clone()
                    .unwrap_or_else(|| (*DEFAULT_FRAMES_PATH).into());

                InterfaceMode::ImageStream(ImageStreamSettings {
                    frames_dir,
                    retain_frames: self.retain_frames,
                    display_video: self.display_video,
                })
            }
            "headless" => InterfaceMode::Headless,
            _ => return Err(ConfigError::UnknownMode(self.mode.clone())),
        };

        let obstacle = self
            .shape
            .as_deref()
            .map(str::parse::<ObstacleShape>)
            .transpose()?;
        let display_field: DisplayField = self.field.parse()?;

        let mask = match &self.mask_path {
            Some(mask_path) => Some(SerialMask::from_mask(&mask_from_image(mask_path)?)),
            None => None,
        };

        let mut input = SimulationInput::with_defaults(mode, self.rows, self.cols);
        input.timestep = self.dt;
        input.simulation_time = self.simtime;
        input.viscosity = self.viscosity;
        input.obstacle = obstacle;
        input.obstacle_params = ShapeParams {
            size: self.obstacle_size,
            thickness: self.obstacle_thickness,
        };
        input.mask = mask;
        input.inlet.velocity = (0., self.inflow);
        input.inlet.source = self.source;
        input.ambient_force = (self.force_u, self.force_v);
        input.display_field = display_field;

        input.validate()?;
        Ok(input)
    }
}

/// Write the resolved input next to the run so it can be replayed with `--input-json`.
pub fn save_input(input: &SimulationInput, path: &Path) -> Result<(), ConfigError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, input)?;

    info!("Saved input file to {}", path.display());
    Ok(())
}
