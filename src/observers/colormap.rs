// Jet colormap for scalar fields

use na::DMatrix;

/// Control points of the jet map: position and RGB color.
const JET: [(f32, [u8; 3]); 5] = [
    (0.0, [0, 0, 255]),
    (0.35, [0, 255, 255]),
    (0.5, [0, 255, 0]),
    (0.65, [255, 255, 0]),
    (1.0, [255, 0, 0]),
];

fn interpolate_color(t: f32, a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    let channel = |i: usize| {
        let (a, b) = (a[i] as f32, b[i] as f32);
        (a + t * (b - a)).floor().clamp(0., 255.) as u8
    };
    [channel(0), channel(1), channel(2)]
}

/// Map a value in `[0, 1]` to a jet color. Values outside the range are
/// clamped and NaN maps to the low end. A value sitting exactly on a
/// control point belongs to the lower segment.
pub fn get_color(normalized: f32) -> [u8; 3] {
    let value = if normalized.is_nan() {
        0.
    } else {
        normalized.clamp(0., 1.)
    };

    for pair in JET.windows(2) {
        let ((p0, c0), (p1, c1)) = (pair[0], pair[1]);
        if value >= p0 && value <= p1 {
            let t = (value - p0) / (p1 - p0);
            return interpolate_color(t, c0, c1);
        }
    }

    JET[JET.len() - 1].1
}

/// Scale a field by its maximum so the peak maps to 1.
///
/// The maximum starts at zero, so an all-negative field has no signal. A
/// zero or non-finite maximum yields an all-zero field instead of dividing
/// by it. Results are clamped into `[0, 1]`.
pub fn normalize(field: &DMatrix<f32>) -> DMatrix<f32> {
    let max = field.iter().copied().fold(0f32, f32::max);

    if !max.is_finite() || max <= 0. {
        return DMatrix::zeros(field.nrows(), field.ncols());
    }

    field.map(|x| {
        let n = x / max;
        if n.is_nan() { 0. } else { n.clamp(0., 1.) }
    })
}
