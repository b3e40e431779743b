//! CLI logic for the Trailmap layout tool.
//!
//! Reads an event document, computes its layout and writes the layout JSON,
//! plus an SVG preview when asked for one.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
};

use log::info;

use trailmap::{LayoutBuilder, TrailmapError};

/// Run the Trailmap CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `TrailmapError` for:
/// - File I/O errors
/// - Configuration loading or validation errors
/// - Malformed event documents
/// - Export errors
pub fn run(args: &Args) -> Result<(), TrailmapError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing timeline"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let builder = LayoutBuilder::try_new(app_config)?;

    let source = fs::read_to_string(&args.input)?;
    let events = builder.parse_events(&source)?;
    let layout = builder.layout(&events);

    let mut output = BufWriter::new(File::create(&args.output)?);
    builder.write_json(&layout, &mut output)?;
    output.flush()?;
    info!(output_file = args.output; "Layout exported successfully");

    if let Some(svg_path) = &args.svg {
        let svg = builder.render_svg(&layout, &events)?;
        fs::write(svg_path, svg)?;
        info!(svg_file = svg_path; "SVG exported successfully");
    }

    Ok(())
}
