// Contains post-processers for analyzing simulation results

pub mod display;

use crate::{
    observers::imgstream::clear_frames,
    preprocessing::{InterfaceMode, SimulationInput},
    sim::task::SimulationOutput,
};
use tracing::{error, info, warn};

/// Playback rate of the frame animation
const VIDEO_FPS: usize = 60;

pub fn postprocess(sim_input: SimulationInput, sim_output: SimulationOutput) {
    match sim_input.mode {
        InterfaceMode::ImageStream(settings) => {
            if settings.display_video {
                let elapsed_time = sim_output
                    .temporal_map
                    .last()
                    .copied()
                    .unwrap_or(sim_input.simulation_time);

                if let Err(err) = display::play_video(
                    elapsed_time,
                    VIDEO_FPS,
                    &sim_output.temporal_map,
                    &settings.frames_dir,
                ) {
                    error!("Video playback failed: {}", err);
                }
            }

            if settings.retain_frames {
                info!("Frames retained in {}", settings.frames_dir.display());
            } else {
                _ = clear_frames(&settings.frames_dir)
                    .inspect_err(|err| warn!("Unable to cleanup frames output: {}", err));
            }
        }
        InterfaceMode::Headless => {
            info!("Finished {} steps", sim_output.temporal_map.len());
        }
    }
}
