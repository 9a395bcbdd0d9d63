// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan: scan a document image from the command line.
//
// Serves an image file through the still-image camera and runs the same
// session a live preview would: detection ticks or manual corners, capture,
// finalize, and the resulting PNG attachments written to disk.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use docscan_bridge::StillCamera;
use docscan_core::error::{Result, ScanError};
use docscan_core::{CaptureKind, CornerMode, EdgeSensitivity, EnhancementLevel, PercentPoint, ScanConfig, notice_for};
use docscan_scan::{DetectionTicker, ScanController};
use docscan_vision::image::load_frame;
use docscan_vision::{DocumentDetector, ImageprocBackend, VisionBackend, VisionRuntime};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "docscan", version, about = "Detect and straighten documents in photos")]
struct Cli {
    /// JSON settings file; missing fields take defaults
    #[arg(long, global = true, value_name = "FILE", env = "DOCSCAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected document outline as JSON
    Detect {
        image: PathBuf,

        /// Edge sensitivity, 30-100
        #[arg(long)]
        sensitivity: Option<u32>,
    },
    /// Capture the image as a scan (or photo) and write the attachment
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    image: PathBuf,

    /// Four corners in percent of the image, e.g. "10,10 90,12 88,90 8,88"
    #[arg(long, value_name = "POINTS")]
    corners: Option<String>,

    /// Enhancement level: 1 none, 2 binarized, 3 denoised + binarized
    #[arg(long, value_name = "LEVEL")]
    enhance: Option<u8>,

    /// Edge sensitivity, 30-100
    #[arg(long)]
    sensitivity: Option<u32>,

    /// Keep the image as a plain photo
    #[arg(long, conflicts_with = "corners")]
    plain: bool,

    /// Detection ticks to run before capturing in auto mode
    #[arg(long, default_value_t = 3)]
    ticks: u32,

    /// Output directory for the attachments
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let notice = notice_for(&err);
            eprintln!("error: {}", notice.message);
            eprintln!("  {}", notice.suggestion);
            eprintln!("  ({err})");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };

    match cli.command {
        Command::Detect { image, sensitivity } => detect(&image, sensitivity, &config),
        Command::Scan(args) => scan(args, config).await,
    }
}

fn detect(image: &Path, sensitivity: Option<u32>, config: &ScanConfig) -> Result<()> {
    let frame = load_frame(image)?;
    let sensitivity = match sensitivity {
        Some(value) => EdgeSensitivity::try_from(value)?,
        None => config.edge_sensitivity,
    };
    let result = DocumentDetector::new(sensitivity).detect(&ImageprocBackend::new(), &frame)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn scan(args: ScanArgs, mut config: ScanConfig) -> Result<()> {
    if let Some(level) = args.enhance {
        config.enhancement_level = EnhancementLevel::try_from(level)?;
    }
    if let Some(value) = args.sensitivity {
        config.edge_sensitivity = EdgeSensitivity::try_from(value)?;
    }
    let corners = args.corners.as_deref().map(parse_corners).transpose()?;
    config.auto_detect = corners.is_none();
    config.validate()?;

    let frame = load_frame(&args.image)?;
    let camera = StillCamera::new(frame.into_rgba());

    let runtime = VisionRuntime::new();
    runtime
        .load(builtin_backend(), builtin_backend, config.fallback_load_timeout())
        .await;

    let tick_interval = config.tick_interval();
    let controller = Arc::new(Mutex::new(ScanController::new(
        Box::new(camera),
        Arc::new(runtime),
        config,
    )));

    let kind = if args.plain {
        CaptureKind::PlainPhoto
    } else {
        CaptureKind::DocumentScan
    };
    controller.lock().await.open(kind)?;

    if let Some(points) = corners {
        let mut c = controller.lock().await;
        c.set_corner_mode(CornerMode::ManualSelect)?;
        for point in points {
            c.place_corner(point)?;
        }
    } else if kind == CaptureKind::DocumentScan {
        let wait = detection_window(tick_interval, args.ticks)?;
        let ticker = DetectionTicker::spawn(Arc::clone(&controller), tick_interval);
        tokio::time::sleep(wait).await;
        ticker.shutdown().await;
        if let Some(detection) = controller.lock().await.last_detection() {
            info!(found = detection.is_found(), "Detection before capture");
        }
    }

    let mut c = controller.lock().await;
    let outcome = c.capture()?;
    if let Some(notice) = &outcome.notice {
        eprintln!("warning: {}", notice.message);
        eprintln!("  {}", notice.suggestion);
    }

    let attachments = c.finalize()?;
    std::fs::create_dir_all(&args.out)?;
    for attachment in &attachments {
        let path = args.out.join(&attachment.file_name);
        std::fs::write(&path, &attachment.bytes)?;
        println!("{}", path.display());
    }
    Ok(())
}

async fn builtin_backend() -> Result<Arc<dyn VisionBackend>> {
    Ok(Arc::new(ImageprocBackend::new()))
}

/// Time to let the ticker run: `ticks` periods plus half a period of slack.
fn detection_window(tick_interval: Duration, ticks: u32) -> Result<Duration> {
    tick_interval
        .checked_mul(ticks)
        .and_then(|window| window.checked_add(tick_interval / 2))
        .ok_or_else(|| ScanError::InvalidConfig(format!("{ticks} detection ticks is too long a wait")))
}

/// Parse `"x,y x,y x,y x,y"` into four percentage-space points.
fn parse_corners(raw: &str) -> Result<[PercentPoint; 4]> {
    let points = raw
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| ScanError::InvalidConfig(format!("corner {pair:?} is not x,y")))?;
            let parse = |v: &str| {
                v.trim()
                    .parse::<f32>()
                    .map_err(|_| ScanError::InvalidConfig(format!("corner {pair:?} is not numeric")))
            };
            Ok(PercentPoint::new(parse(x)?, parse(y)?))
        })
        .collect::<Result<Vec<_>>>()?;

    <[PercentPoint; 4]>::try_from(points).map_err(|points| {
        ScanError::InvalidConfig(format!("expected 4 corners, got {}", points.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_parse_in_order() {
        let corners = parse_corners("10,10 90,12  88,90 8,88").expect("parse");
        assert_eq!(corners[1], PercentPoint::new(90.0, 12.0));
        assert_eq!(corners[3], PercentPoint::new(8.0, 88.0));
    }

    #[test]
    fn malformed_corners_are_config_errors() {
        assert!(matches!(parse_corners("10,10 90,12"), Err(ScanError::InvalidConfig(_))));
        assert!(matches!(parse_corners("10;10 1,1 2,2 3,3"), Err(ScanError::InvalidConfig(_))));
        assert!(matches!(parse_corners("a,b 1,1 2,2 3,3"), Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn detection_window_covers_the_ticks() {
        let window = detection_window(Duration::from_millis(100), 3).expect("window");
        assert_eq!(window, Duration::from_millis(350));
    }

    #[test]
    fn huge_tick_counts_are_rejected_not_overflowed() {
        let err = detection_window(Duration::from_secs(u64::MAX / 2), u32::MAX).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
