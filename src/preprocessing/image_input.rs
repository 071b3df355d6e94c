//! Handles PNG obstacle input

use image::{GenericImageView, ImageReader, Pixel};
use std::path::Path;

use crate::{error::ConfigError, sim::obstacle::ObstacleMask};

const THRESHOLD_LUMA: u8 = 127;

/// Load an obstacle mask from a PNG image: dark pixels (luma below the
/// threshold) are solid. Image row `y` maps to grid row `y`.
///
/// Parameters
/// - `image` - The path to the image to process
///
/// Returns
/// - The obstacle mask as a Result
pub fn mask_from_image(image: &Path) -> Result<ObstacleMask, ConfigError> {
    let image = ImageReader::open(image)?.decode()?;

    let (nrows, ncols) = (image.height() as usize, image.width() as usize);

    let mut mask = ObstacleMask::new(nrows, ncols);

    // load mask
    image.pixels().for_each(|(x, y, color)| {
        if color.to_luma().0[0] < THRESHOLD_LUMA {
            mask.set_solid(y as usize, x as usize);
        }
    });

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use std::env;

    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn test_dark_pixels_are_solid() {
        let mut img = RgbImage::from_pixel(6, 4, Rgb([255, 255, 255]));
        img.put_pixel(2, 1, Rgb([0, 0, 0]));
        img.put_pixel(5, 3, Rgb([40, 40, 40]));

        let path = env::temp_dir().join(format!("smoke-2d-mask-{}.png", std::process::id()));
        img.save(&path).unwrap();

        let mask = mask_from_image(&path).unwrap();
        _ = std::fs::remove_file(&path);

        assert_eq!(mask.shape(), (4, 6));
        assert_eq!(mask.solid_count(), 2);
        assert!(mask.is_solid(1, 2));
        assert!(mask.is_solid(3, 5));
    }

    #[test]
    fn test_missing_file() {
        let err = mask_from_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_) | ConfigError::Image(_)));
    }
}
