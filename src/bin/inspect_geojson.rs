//! Print a summary of a boundary GeoJSON file as the server would load it.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use bandmap::data_loader::load_boundaries;
use bandmap::schema::RegionType;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect a boundary GeoJSON file")]
struct Args {
    /// Path to the GeoJSON FeatureCollection
    file: PathBuf,

    /// Region schema the features follow
    #[arg(short, long, value_enum, default_value = "lsoa")]
    region_type: RegionType,

    /// Number of areas to list
    #[arg(short, long, default_value_t = 5)]
    sample: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Inspecting boundaries: {}", args.file.display());

    let layer = load_boundaries(&args.file, args.region_type)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    println!("\n=== LAYER ===");
    println!("  region type : {}", layer.region_type);
    println!("  name field  : {}", layer.properties.name);
    println!("  code field  : {}", layer.properties.code);
    println!("  crs         : {}", layer.crs);
    println!("  areas       : {}", layer.len());
    println!("  skipped     : {}", layer.skipped);

    if let Some(bounds) = layer.bounds() {
        println!(
            "  bounds      : [{:.3}, {:.3}, {:.3}, {:.3}]",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );
    }

    if !layer.crs.is_projected() {
        let projected = layer.to_bng().context("failed to reproject to EPSG:27700")?;
        if let Some(bounds) = projected.bounds() {
            println!(
                "  bng bounds  : [{:.1}, {:.1}, {:.1}, {:.1}]",
                bounds.min().x,
                bounds.min().y,
                bounds.max().x,
                bounds.max().y
            );
        }
        print_sample(&projected, args.sample);
    } else {
        print_sample(&layer, args.sample);
    }

    Ok(())
}

fn print_sample(layer: &bandmap::data_loader::BoundaryLayer, count: usize) {
    println!("\n=== AREAS ===");
    for area in layer.areas.iter().take(count) {
        let rings: usize = area
            .geometry
            .0
            .iter()
            .map(|polygon| 1 + polygon.interiors().len())
            .sum();
        println!(
            "  {} {} ({} parts, {} rings)",
            area.code,
            area.name,
            area.geometry.0.len(),
            rings
        );
    }
}
