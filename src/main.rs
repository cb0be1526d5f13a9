use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use snapmark::{Compositor, CompositorConfig, MarkerShape, MarkerStyle, Point, RasterImage, build_path};

/// snapmark - burn click markers and annotations into screenshots
#[derive(Parser, Debug)]
#[command(
    name = "snapmark",
    about = "Annotated screenshot compositing and journey capture",
    after_help = "ENVIRONMENT VARIABLES:\n\
        RUST_LOG    Log filter for degrade diagnostics (e.g. snapmark=debug)"
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Composite a marker (and optional annotation bubble) onto a PNG
    Annotate {
        /// Input PNG file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Click x coordinate in CSS pixels
        #[arg(short)]
        x: f64,

        /// Click y coordinate in CSS pixels
        #[arg(short)]
        y: f64,

        /// Marker color as #rrggbb
        #[arg(long, default_value = "#3b82f6")]
        color: String,

        /// Marker diameter in pixels
        #[arg(long, default_value = "24")]
        size: f64,

        /// Marker opacity (0.0 to 1.0)
        #[arg(long, default_value = "1.0")]
        opacity: f64,

        /// Border style: solid, dashed, or dotted
        #[arg(long, default_value = "solid")]
        style: String,

        /// Annotation text for the speech bubble
        #[arg(short, long)]
        text: Option<String>,

        /// Device pixel ratio the coordinates were reported at
        #[arg(long, default_value = "1.0")]
        dpr: f64,
    },

    /// Print the derived save path for a URL
    Path {
        /// Source page URL
        url: String,

        /// Timestamp in milliseconds since the epoch (default: now)
        #[arg(long)]
        timestamp: Option<i64>,

        /// Journey sequence number (omit for a single capture)
        #[arg(long)]
        sequence: Option<u32>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Annotate {
            input,
            output,
            x,
            y,
            color,
            size,
            opacity,
            style,
            text,
            dpr,
        } => {
            let raw = RasterImage::from_png_bytes(std::fs::read(&input)?)?;
            let marker_style = MarkerStyle {
                color,
                opacity,
                size,
                style: match style.as_str() {
                    "dashed" => MarkerShape::Dashed,
                    "dotted" => MarkerShape::Dotted,
                    _ => MarkerShape::Solid,
                },
            };
            let compositor = Compositor::new(CompositorConfig::default());
            let result = compositor.compose(
                &raw,
                Point::new(x, y),
                &marker_style,
                text.as_deref(),
                dpr,
                None,
            );
            std::fs::write(&output, &result.image.data)?;
            println!(
                "wrote {} (marker: {}, annotation: {})",
                output.display(),
                result.marker_drawn,
                result.annotation_drawn
            );
        }

        Commands::Path {
            url,
            timestamp,
            sequence,
        } => {
            let timestamp =
                timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            let path = build_path(&url, timestamp, sequence);
            println!("{}", path.joined());
        }
    }

    Ok(())
}
