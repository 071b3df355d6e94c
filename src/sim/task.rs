//! Task runner for the solver thread

use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::{
    error::SimulationError,
    observers::imgstream::{self, DisplayPacket},
    preprocessing::{ImageStreamSettings, InterfaceMode, SimulationInput},
    sim::navier::Navier,
};

/// How often headless mode reports field statistics
const HEADLESS_LOG_INTERVAL: usize = 10;

pub struct SimulationOutput {
    pub temporal_map: Vec<f32>, // maps idx->timestamp
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    match ProgressStyle::with_template(
        "[Elapsed: {elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} steps (Remaining: {eta_precise})",
    ) {
        Ok(style) => bar.set_style(style.progress_chars("##-")),
        Err(err) => warn!("Falling back to the default progress style: {}", err),
    }
    bar
}

/// The solver thread task to run in ImageStream mode
pub fn imgstream_task(
    settings: &ImageStreamSettings,
    mut sim: Navier,
    simulation_input: &SimulationInput,
) -> Result<SimulationOutput, SimulationError> {
    // fail before stepping if the frames directory is not ours to clear
    imgstream::clear_frames(&settings.frames_dir)?;

    let iter_count = simulation_input.iter_count();
    let bar = progress_bar(iter_count);

    let (sender, receiver) = mpsc::channel();

    // spawn image io thread
    let frames_dir = settings.frames_dir.clone();
    let mask = sim.mask().to_matrix();
    let io_thread = thread::spawn(move || {
        if let Err(err) = imgstream::image_io_loop(receiver, mask, &frames_dir) {
            error!("Frame writer failed: {}", err);
        }
    });

    let mut temporal_map: Vec<f32> = Vec::new();
    for i in 0..iter_count {
        sim.step(simulation_input.timestep)?;

        sender
            .send(DisplayPacket {
                field: sim.snapshot(simulation_input.display_field),
                i,
            })
            .map_err(|_| SimulationError::FrameWriterClosed(i))?;

        temporal_map.push(sim.t);
        bar.inc(1);
    }
    bar.finish();

    // hang up so the writer drains the queue and exits
    drop(sender);
    if io_thread.join().is_err() {
        warn!("Frame writer thread panicked");
    }

    Ok(SimulationOutput { temporal_map })
}

/// The solver thread task to run in Headless mode. Nothing is rendered;
/// field statistics are logged periodically instead.
pub fn headless_task(
    mut sim: Navier,
    simulation_input: &SimulationInput,
) -> Result<SimulationOutput, SimulationError> {
    let iter_count = simulation_input.iter_count();
    let bar = progress_bar(iter_count);

    let mut temporal_map: Vec<f32> = Vec::new();
    for i in 0..iter_count {
        sim.step(simulation_input.timestep)?;
        temporal_map.push(sim.t);
        bar.inc(1);

        if (i + 1) % HEADLESS_LOG_INTERVAL == 0 || i + 1 == iter_count {
            let stats = sim.stats();
            bar.suspend(|| {
                info!(
                    step = sim.iteration(),
                    t = sim.t,
                    max_velocity = stats.max_velocity,
                    total_density = stats.total_density,
                    mean_abs_divergence = stats.mean_abs_divergence,
                    "field stats"
                )
            });
        }
    }
    bar.finish();

    Ok(SimulationOutput { temporal_map })
}

/// Build the solver described by the input, obstacles included.
pub fn build_sim(simulation_input: &SimulationInput) -> Result<Navier, SimulationError> {
    simulation_input.validate()?;

    let (rows, cols) = simulation_input.grid;
    let mut sim = Navier::new(
        rows,
        cols,
        simulation_input.viscosity,
        &simulation_input.inlet,
        simulation_input.ambient_force,
    )?;

    if let Some(shape) = simulation_input.obstacle {
        sim.configure_obstacle(shape, simulation_input.obstacle_params);
    }
    if let Some(mask) = &simulation_input.mask {
        sim.stamp_mask(&mask.to_mask())?;
    }

    Ok(sim)
}

/// Spawns the simulation thread and starts the corresponding task
pub fn spawn_sim_thread(
    simulation_input: SimulationInput,
) -> JoinHandle<Result<SimulationOutput, SimulationError>> {
    thread::spawn(move || {
        let sim = build_sim(&simulation_input)?;

        match &simulation_input.mode {
            InterfaceMode::ImageStream(settings) => {
                imgstream_task(settings, sim, &simulation_input)
            }
            InterfaceMode::Headless => headless_task(sim, &simulation_input),
        }
    })
}
