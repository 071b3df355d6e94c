//! Handles video playback post-solve

use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use minifb::{Key, Window, WindowOptions};
use ndarray::Array1;
use screen_size::get_primary_screen_size as get_screen_size;

/// Fallback window width when the screen size is unavailable
const DEFAULT_WINDOW_WIDTH: usize = 800;

/// Pick the frame indices to show so that `fps` video frames cover
/// `elapsed_time` of simulation. Each sample takes the first frame whose
/// timestamp reaches it, or the last frame once the map runs out.
pub fn sample_frames(elapsed_time: f32, fps: usize, temporal_map: &[f32]) -> Vec<usize> {
    let Some(last) = temporal_map.len().checked_sub(1) else {
        return Vec::new();
    };

    let total_frames = ((elapsed_time * (fps as f32)).floor() as usize).max(1);

    let mut desired_frames: Vec<usize> = Array1::linspace(0., elapsed_time, total_frames)
        .iter()
        .map(|t| temporal_map.iter().position(|f| f >= t).unwrap_or(last))
        .collect();
    desired_frames.dedup();

    desired_frames
}

fn frame_index(path: &Path) -> Option<usize> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|f| f.parse::<usize>().ok())
}

/// Collect the PNG frames in `frames_dir` whose index is in `desired_frames`,
/// in index order.
fn frame_paths(frames_dir: &Path, desired_frames: &[usize]) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(frames_dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
        .filter(|p| frame_index(p).is_some_and(|idx| desired_frames.contains(&idx)))
        .collect();

    paths.sort_by_key(|p| frame_index(p).unwrap_or(0));

    Ok(paths)
}

/// Open a window and play the simulation solution in realtime. Samples
/// simulation frames (png images) in such a way that the video plays
/// at true speed.
///
/// Parameters
/// - `elapsed_time` - The time domain of the simulation
/// - `fps` - The desired *video* frames per second
/// - `temporal_map` - A vector with indices pointing to the time-value in that iteration
/// - `frames_dir` - The directory that contains the frames (png images) to animate.
pub fn play_video(
    elapsed_time: f32,
    fps: usize,
    temporal_map: &[f32],
    frames_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let desired_frames = sample_frames(elapsed_time, fps, temporal_map);
    let paths = frame_paths(frames_dir, &desired_frames)?;
    if paths.is_empty() {
        return Err("no PNG frames found".into());
    }

    // load all frames as DynamicImage
    let originals: Vec<DynamicImage> = paths.iter().map(image::open).collect::<Result<_, _>>()?;

    // determine base dimensions
    let (w, h) = originals[0].dimensions();
    let init_w = get_screen_size()
        .map(|(screen_w, _)| screen_w as usize / 2)
        .unwrap_or(DEFAULT_WINDOW_WIDTH);
    let init_h = (init_w as f32 * (h as f32 / w as f32)) as usize;

    // create window
    let mut window = Window::new(
        "Smoke 2D",
        init_w,
        init_h,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;

    let frame_time = Duration::from_secs_f64(1.0 / fps as f64);
    let start = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        // get current window size
        let (win_w, win_h) = window.get_size();
        // current frame index
        let elapsed = Instant::now().duration_since(start);
        let idx = ((elapsed.as_secs_f64() * fps as f64) as usize) % originals.len();

        // resize & convert to RGBA buffer
        let img = originals[idx]
            .resize_exact(win_w as u32, win_h as u32, FilterType::Nearest)
            .to_rgba8();

        let buffer: Vec<u32> = img
            .pixels()
            .map(|px| {
                ((px[3] as u32) << 24)
                    | ((px[0] as u32) << 16)
                    | ((px[1] as u32) << 8)
                    | (px[2] as u32)
            })
            .collect();

        window.update_with_buffer(&buffer, win_w, win_h)?;

        // throttle to fps
        let next = start + frame_time * (idx + 1) as u32;
        if let Some(d) = next.checked_duration_since(Instant::now()) {
            std::thread::sleep(d);
        }
    }

    Ok(())
}
