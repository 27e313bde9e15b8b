use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

/// Plain 8-bit RGB triple, shared by the PNG renderer and the UI.
pub type Rgb8 = [u8; 3];

pub const NAN_GRAY: Rgb8 = [200, 200, 200];

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_rgb8(rgb)
        })
        .collect()
}

fn to_rgb8(rgb: Srgb) -> Rgb8 {
    let c: Srgb<u8> = rgb.into_format();
    [c.red, c.green, c.blue]
}

// ---------------------------------------------------------------------------
// Diverging scale for correlation heatmaps
// ---------------------------------------------------------------------------

/// Blue → light gray → red, for values in `[-1, 1]`.  Values outside the
/// range are clamped; NaN maps to [`NAN_GRAY`].
pub fn diverging(value: f64) -> Rgb8 {
    if value.is_nan() {
        return NAN_GRAY;
    }
    let cold: LinSrgb = Srgb::<f32>::new(0.23, 0.30, 0.75).into_linear();
    let mid: LinSrgb = Srgb::<f32>::new(0.87, 0.87, 0.87).into_linear();
    let warm: LinSrgb = Srgb::<f32>::new(0.71, 0.02, 0.15).into_linear();

    let v = value.clamp(-1.0, 1.0) as f32;
    let mixed = if v < 0.0 {
        mid.mix(cold, -v)
    } else {
        mid.mix(warm, v)
    };
    to_rgb8(Srgb::from_linear(mixed))
}

/// Black or white, whichever reads better on `bg`.
pub fn contrast_text(bg: Rgb8) -> Rgb8 {
    let [r, g, b] = bg.map(f32::from);
    let luma = 0.299 * r + 0.587 * g + 0.114 * b;
    if luma > 140.0 {
        [0, 0, 0]
    } else {
        [255, 255, 255]
    }
}

/// `#rrggbb` for HTML output.
pub fn hex(c: Rgb8) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        assert_ne!(p[0], p[1]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn diverging_ends_are_blue_and_red() {
        let [r, _, b] = diverging(-1.0);
        assert!(b > r);
        let [r, _, b] = diverging(1.0);
        assert!(r > b);
        assert_eq!(diverging(f64::NAN), NAN_GRAY);
        assert_eq!(diverging(5.0), diverging(1.0));
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(hex([255, 0, 16]), "#ff0010");
        assert_eq!(contrast_text([250, 250, 250]), [0, 0, 0]);
    }
}
