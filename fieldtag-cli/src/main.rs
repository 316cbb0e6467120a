use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use fieldtag::config::SetupConfig;
use fieldtag::detection::DetectionFrame;
use fieldtag::locate::TagPosition;
use fieldtag::render::{render_field, RenderOptions};

mod render_png;

/// Tag-to-field localization CLI
#[derive(Parser)]
#[command(name = "fieldtag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate detected tags on the field
    Locate {
        /// Detection frame JSON file ("-" for stdin)
        detections: String,

        /// Rig setup TOML
        #[arg(short, long)]
        config: PathBuf,

        /// Localization strategy
        #[arg(long, default_value = "ray")]
        strategy: Strategy,

        /// Tag edge length in mm (required for the pose strategy)
        #[arg(long)]
        tag_size: Option<f64>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Suppress non-JSON output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Render a field map to PNG
    Map {
        /// Rig setup TOML
        #[arg(short, long)]
        config: PathBuf,

        /// Field map JSON, overriding the field preset in the setup
        #[arg(long)]
        field_json: Option<PathBuf>,

        /// Locate output JSON to overlay on the map
        #[arg(long)]
        positions: Option<PathBuf>,

        /// Millimeters per pixel
        #[arg(long, default_value_t = 5.0)]
        scale: f64,

        /// Blank margin around the field, mm
        #[arg(long, default_value_t = 100.0)]
        margin: f64,

        /// Output file
        #[arg(short, long, default_value = "field.png")]
        output: PathBuf,
    },
    /// Check whether a field point is inside the camera's horizontal FOV
    Fov {
        /// Rig setup TOML
        #[arg(short, long)]
        config: PathBuf,

        /// Horizontal field of view, degrees
        #[arg(long, default_value_t = 120.0)]
        fov: f64,

        /// Target X on the field, mm
        x: f64,

        /// Target Y on the field, mm
        y: f64,
    },
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum Strategy {
    /// Intersect the detection center's sight ray with the tag plane
    Ray,
    /// Transform the estimated tag pose into the field frame
    Pose,
}

#[derive(Serialize, Deserialize)]
struct LocateOutput {
    source: String,
    strategy: String,
    positions: Vec<TagPosition>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Locate {
            detections,
            config,
            strategy,
            tag_size,
            pretty,
            quiet,
        } => cmd_locate(&detections, &config, strategy, tag_size, pretty, quiet),
        Command::Map {
            config,
            field_json,
            positions,
            scale,
            margin,
            output,
        } => cmd_map(
            &config,
            field_json.as_deref(),
            positions.as_deref(),
            scale,
            margin,
            &output,
        ),
        Command::Fov { config, fov, x, y } => cmd_fov(&config, fov, x, y),
    }
}

fn read_frame(source: &str) -> Result<DetectionFrame> {
    let data = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read detections from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read detections: {source}"))?
    };
    serde_json::from_str(&data).with_context(|| format!("invalid detection frame JSON: {source}"))
}

fn cmd_locate(
    detections: &str,
    config: &Path,
    strategy: Strategy,
    tag_size: Option<f64>,
    pretty: bool,
    quiet: bool,
) -> Result<()> {
    let setup = SetupConfig::load(config)
        .with_context(|| format!("failed to load setup: {}", config.display()))?;
    let locator = setup.build_locator()?;
    let frame = read_frame(detections)?;

    if !quiet {
        eprintln!(
            "locating {} detections on {} ({} x {} mm)",
            frame.detections.len(),
            locator.field.name,
            locator.field.width,
            locator.field.height,
        );
    }

    let (positions, strategy_name) = match strategy {
        Strategy::Ray => (locator.locate_frame(&frame), "ray"),
        Strategy::Pose => {
            let tag_size =
                tag_size.context("--tag-size is required for the pose strategy")?;
            (locator.locate_frame_by_pose(&frame, tag_size), "pose")
        }
    };

    if !quiet {
        let out_of_bounds = positions.iter().filter(|p| !p.point.in_bounds).count();
        eprintln!(
            "  located {} tags ({out_of_bounds} out of bounds)",
            positions.len()
        );
    }

    let output = LocateOutput {
        source: detections.to_string(),
        strategy: strategy_name.to_string(),
        positions,
    };

    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");

    Ok(())
}

fn cmd_map(
    config: &Path,
    field_json: Option<&Path>,
    positions: Option<&Path>,
    scale: f64,
    margin: f64,
    output: &Path,
) -> Result<()> {
    let setup = SetupConfig::load(config)
        .with_context(|| format!("failed to load setup: {}", config.display()))?;
    let field = match field_json {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read field map: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("invalid field map JSON: {}", path.display()))?
        }
        None => setup.field()?,
    };
    let mount = setup.mount();

    let overlay: Vec<TagPosition> = match positions {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read positions: {}", path.display()))?;
            let parsed: LocateOutput = serde_json::from_str(&data)
                .with_context(|| format!("invalid locate output JSON: {}", path.display()))?;
            parsed.positions
        }
        None => Vec::new(),
    };

    let raster = render_field(
        &field,
        &overlay,
        Some([mount.position.x, mount.position.y]),
        RenderOptions { scale, margin },
    );
    render_png::write_raster_png(&raster, output)?;

    eprintln!(
        "wrote {} ({} x {} px, {} tags)",
        output.display(),
        raster.width,
        raster.height,
        overlay.len()
    );
    Ok(())
}

fn cmd_fov(config: &Path, fov: f64, x: f64, y: f64) -> Result<()> {
    let setup = SetupConfig::load(config)
        .with_context(|| format!("failed to load setup: {}", config.display()))?;
    let locator = setup.build_locator()?;

    let vis = locator.visibility(fov, [x, y]);
    let json = serde_json::to_string_pretty(&vis)?;
    println!("{json}");
    Ok(())
}
