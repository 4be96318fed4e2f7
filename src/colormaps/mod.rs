//! Colormap implementations for band colours and raster images.
//!
//! This module provides matplotlib-style named colormaps and the mapping
//! from band labels to colours.

pub mod colormap;
pub mod diverging;
pub mod scale;
pub mod sequential;

pub use colormap::{available_colormaps, get_colormap, Colour, Colormap, SampledColormap};
pub use scale::{
    colour_scale, colourbar_swatches, make_colour_map, ColourEntry, ColourMap, ColourScale,
    ColourStop,
};
