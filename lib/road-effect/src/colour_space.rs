//! RGB <-> HSV conversion for 8-bit pixels.
//!
//! Hue is in degrees `[0, 360)`, saturation in `[0, 1]` and value keeps the
//! 8-bit scale `[0, 255]` so brightness can be scaled directly.

/// Convert an RGB pixel to `[h, s, v]`.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [f32; 3] {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    if hue < 0.0 {
        hue += 360.0;
    }

    [hue, saturation, max]
}

/// Convert `[h, s, v]` back to an RGB pixel, rounding each channel.
pub fn hsv_to_rgb(hsv: [f32; 3]) -> [u8; 3] {
    let [hue, saturation, value] = hsv;
    let value = value.clamp(0.0, 255.0);
    let saturation = saturation.clamp(0.0, 1.0);

    let c = value * saturation;
    let h = (hue.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = if h < 1.0 {
        (c, x, 0.0)
    } else if h < 2.0 {
        (x, c, 0.0)
    } else if h < 3.0 {
        (0.0, c, x)
    } else if h < 4.0 {
        (0.0, x, c)
    } else if h < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        crate::blend::saturate(r + m),
        crate::blend::saturate(g + m),
        crate::blend::saturate(b + m),
    ]
}

/// Scale the value channel of a pixel, truncating the new value to an
/// integer level before converting back.
pub fn scale_value(rgb: [u8; 3], factor: f32) -> [u8; 3] {
    let [h, s, v] = rgb_to_hsv(rgb);
    hsv_to_rgb([h, s, (v * factor).clamp(0.0, 255.0).trunc()])
}
