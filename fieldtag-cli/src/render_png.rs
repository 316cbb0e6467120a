//! PNG encoding for rendered field maps.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use fieldtag::render::Raster;

/// Write an RGB raster as a PNG file.
pub fn write_raster_png(raster: &Raster, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let w = &mut BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, raster.width as u32, raster.height as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .with_context(|| format!("failed to write PNG header for {}", path.display()))?;
    writer
        .write_image_data(&raster.pixels)
        .with_context(|| format!("failed to write PNG data for {}", path.display()))?;

    Ok(())
}
