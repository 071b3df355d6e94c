extern crate nalgebra as na;

mod error;
mod observers;
mod postprocessing;
mod preprocessing;
mod sim;

use clap::Parser;
use postprocessing::postprocess;
use preprocessing::cli::{CliArgs, save_input};
use sim::task::spawn_sim_thread;
use tracing::{error, info};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = CliArgs::parse();

    let input = match args.create_input() {
        Ok(input) => input,
        Err(err) => {
            error!("Invalid simulation input: {}", err);
            std::process::exit(1);
        }
    };
    input.log();

    if let Some(savepath) = args.input_json_savepath() {
        if let Err(err) = save_input(&input, savepath) {
            error!("Failed to save input file: {}", err);
            std::process::exit(1);
        }
    }

    let output = match spawn_sim_thread(input.clone()).join() {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            error!("Simulation failed: {}", err);
            std::process::exit(1);
        }
        Err(_) => {
            error!("Simulation thread panicked");
            std::process::exit(1);
        }
    };
    info!("Solved {} steps", output.temporal_map.len());

    postprocess(input, output);
}
