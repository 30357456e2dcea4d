use image::Rgb;

/// Samples of the viridis colour map at equal spacing from 0 to 1.
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 144, 141],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

/// Colour for `t` in [0, 1], linearly interpolated between the viridis samples. Values outside are clamped.
pub fn viridis(t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let fraction = scaled - lower as f64;
    let (from, to) = (VIRIDIS[lower], VIRIDIS[lower + 1]);
    let channel = |i: usize| {
        (from[i] as f64 + (to[i] as f64 - from[i] as f64) * fraction).round() as u8
    };
    Rgb([channel(0), channel(1), channel(2)])
}

#[cfg(test)]
mod tests {
    use image::Rgb;
    use rstest::rstest;

    use super::viridis;

    #[rstest]
    #[case(0.0, Rgb([68, 1, 84]))]
    #[case(0.5, Rgb([33, 144, 141]))]
    #[case(1.0, Rgb([253, 231, 37]))]
    #[case(-3.0, Rgb([68, 1, 84]))]
    #[case(7.0, Rgb([253, 231, 37]))]
    #[case(f64::NAN, Rgb([68, 1, 84]))]
    fn test_viridis_samples(#[case] t: f64, #[case] expected: Rgb<u8>) {
        assert_eq!(expected, viridis(t));
    }

    #[test]
    fn test_viridis_interpolates_between_samples() {
        // Halfway between the first two samples.
        assert_eq!(Rgb([70, 23, 103]), viridis(0.0625));
    }
}
