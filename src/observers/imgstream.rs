use na::DMatrix;
use plotters::prelude::*;
use std::{error::Error, fs, path::Path, sync::mpsc};
use tracing::debug;

use crate::{
    error::ConfigError,
    observers::colormap::{get_color, normalize},
};

/// One rendered step sent from the solver thread to the image thread.
#[derive(Clone)]
pub struct DisplayPacket {
    /// Snapshot of the displayed scalar field
    pub field: DMatrix<f32>,
    pub i: usize,
}

/// Render a scalar field through the jet colormap and save it as a PNG.
/// Obstacle cells are drawn black.
pub fn image_save(
    bitmap: &DMatrix<f32>,
    mask: &DMatrix<bool>,
    filename: &str,
    frames_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let (rows, cols) = bitmap.shape();

    let filename = frames_dir.join(filename);

    let root = BitMapBackend::new(&filename, (cols as u32, rows as u32)).into_drawing_area();
    root.fill(&WHITE)?;

    let bitmap = normalize(bitmap);

    for i in 0..rows {
        for j in 0..cols {
            let solid = mask.get((i, j)).ok_or("Pixel not on obstacle mask")?;
            let pixel_color = if *solid {
                BLACK
            } else {
                let pixel_mag = bitmap.get((i, j)).ok_or("Pixel not on field")?;
                let [r, g, b] = get_color(*pixel_mag);
                RGBColor(r, g, b)
            };

            root.draw_pixel((j as i32, i as i32), &pixel_color)?;
        }
    }
    root.present()?;

    Ok(())
}

fn is_frame(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|e| e == "png")
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.parse::<usize>().is_ok())
}

/// Delete the numbered PNG frames in `frames_dir` and then the directory.
/// Nothing is deleted if the directory holds anything other than frames.
pub fn clear_frames(frames_dir: &Path) -> Result<(), ConfigError> {
    if !frames_dir.exists() {
        return Ok(());
    }

    let entries = fs::read_dir(frames_dir)?.collect::<Result<Vec<_>, _>>()?;
    if !entries.iter().all(|entry| is_frame(&entry.path())) {
        return Err(ConfigError::ForeignFrameFiles(frames_dir.to_path_buf()));
    }

    for entry in entries {
        fs::remove_file(entry.path())?;
    }
    fs::remove_dir(frames_dir)?;

    Ok(())
}

/// Receive packets and write them as numbered frames until the sender hangs up.
pub fn image_io_loop(
    inbound_bitmaps: mpsc::Receiver<DisplayPacket>,
    mask: DMatrix<bool>,
    frames_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    clear_frames(frames_dir)?;
    fs::create_dir_all(frames_dir)?;

    while let Ok(inbound) = inbound_bitmaps.recv() {
        image_save(
            &inbound.field,
            &mask,
            format!("{}.png", inbound.i).as_str(),
            frames_dir,
        )?;
        debug!("Saved frame {}", inbound.i);
    }

    Ok(())
}
