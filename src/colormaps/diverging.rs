//! Diverging colormaps (two-hue progression with center).
//!
//! These colormaps suit signed differences such as the travel-time benefit
//! of one hospital over another, where zero sits at the neutral midpoint.

use colorgrad::{CustomGradient, Gradient};

/// Diverging colormap names, in the normalized form used for lookup
pub const NAMES: &[&str] = &[
    "rdbu", "brbg", "puor", "piyg", "prgn", "rdylbu", "rdylgn", "rdgy", "spectral", "coolwarm",
    "seismic",
];

/// Coolwarm anchors: dark blue, neutral grey, dark red
const COOLWARM: &[&str] = &["#3b4cc0", "#dddddd", "#b40426"];

/// Seismic anchors: dark blue, blue, white, red, dark red
const SEISMIC: &[&str] = &["#00004c", "#0000ff", "#ffffff", "#ff0000", "#800000"];

/// Look up a diverging gradient by normalized name
pub fn gradient(key: &str) -> Option<Gradient> {
    let gradient = match key {
        "rdbu" => colorgrad::rd_bu(),
        "brbg" => colorgrad::br_bg(),
        "puor" => colorgrad::pu_or(),
        "piyg" => colorgrad::pi_yg(),
        "prgn" => colorgrad::pr_gn(),
        "rdylbu" => colorgrad::rd_yl_bu(),
        "rdylgn" => colorgrad::rd_yl_gn(),
        "rdgy" => colorgrad::rd_gy(),
        "spectral" => colorgrad::spectral(),
        "coolwarm" => return anchored(COOLWARM),
        "seismic" => return anchored(SEISMIC),
        _ => return None,
    };
    Some(gradient)
}

fn anchored(colors: &[&str]) -> Option<Gradient> {
    CustomGradient::new().html_colors(colors).build().ok()
}
