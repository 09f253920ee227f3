//! Colour helpers for hex colours given in configuration.
//!
//! Configuration colours are sRGB hex values (`0xaaaaaa`). Lighting and the
//! clear colour are computed in linear space, so everything passes through
//! [`linear_from_hex`] before it reaches the GPU.

/// Split a `0xRRGGBB` value into sRGB components in `[0, 1]`.
pub fn srgb_from_hex(hex: u32) -> [f32; 3] {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    [r, g, b]
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_from_hex(hex: u32) -> [f32; 3] {
    srgb_from_hex(hex).map(srgb_to_linear)
}

/// Clear colour for a render pass. The surface is sRGB so the linear value is passed on.
pub fn clear_colour(hex: u32) -> wgpu::Color {
    let [r, g, b] = linear_from_hex(hex);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}
