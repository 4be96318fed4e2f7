//! Sequential colormaps (single-hue or perceptual progression).
//!
//! These colormaps suit data that progresses from low to high, such as
//! travel times or outcome values.

use colorgrad::Gradient;

/// Sequential colormap names, in the normalized form used for lookup
pub const NAMES: &[&str] = &[
    "viridis", "inferno", "magma", "plasma", "cividis", "turbo", "warm", "cool", "cubehelix",
    "blues", "greens", "greys", "oranges", "purples", "reds", "ylorrd", "ylgnbu", "ylorbr",
    "bupu", "pubu",
];

/// Look up a sequential gradient by normalized name
pub fn gradient(key: &str) -> Option<Gradient> {
    let gradient = match key {
        "viridis" => colorgrad::viridis(),
        "inferno" => colorgrad::inferno(),
        "magma" => colorgrad::magma(),
        "plasma" => colorgrad::plasma(),
        "cividis" => colorgrad::cividis(),
        "turbo" => colorgrad::turbo(),
        "warm" => colorgrad::warm(),
        "cool" => colorgrad::cool(),
        "cubehelix" => colorgrad::cubehelix_default(),
        "blues" => colorgrad::blues(),
        "greens" => colorgrad::greens(),
        "greys" | "grays" => colorgrad::greys(),
        "oranges" => colorgrad::oranges(),
        "purples" => colorgrad::purples(),
        "reds" => colorgrad::reds(),
        "ylorrd" => colorgrad::yl_or_rd(),
        "ylgnbu" => colorgrad::yl_gn_bu(),
        "ylorbr" => colorgrad::yl_or_br(),
        "bupu" => colorgrad::bu_pu(),
        "pubu" => colorgrad::pu_bu(),
        _ => return None,
    };
    Some(gradient)
}
