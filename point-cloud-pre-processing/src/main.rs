/// Out-of-core octree file generator entry point
use clap::Parser;
use point_cloud_pre_processing::{ConversionConfig, PointCloudConverter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ooc-file-gen",
    about = "Convert a LAS/LAZ point cloud into an out-of-core octree"
)]
struct Args {
    /// LAS or LAZ file to convert
    source: PathBuf,

    /// Output directory for meta.json, octree.hierarchy and Octants/
    destination: PathBuf,

    /// Maximum number of points stored in a leaf bucket
    #[arg(allow_negative_numbers = true)]
    max_points_per_bucket: i64,

    /// Point type: 0 Pos64, 1 Pos64Col32IShort, 2 Pos64IShort, 3 Pos64Col32,
    /// 4 Pos64Label8, 5 Pos64Nor32Col32IShort, 6 Pos32
    #[arg(allow_negative_numbers = true)]
    point_type: i64,

    /// Exchange the Y and Z axes of every source point
    #[arg(long)]
    exchange_yz: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Args::parse();

    let config = match ConversionConfig::new(
        &args.source,
        &args.destination,
        args.max_points_per_bucket,
        args.point_type,
        args.exchange_yz,
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(2);
        }
    };

    match PointCloudConverter::new(config).convert() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Conversion failed: {e}");
            ExitCode::FAILURE
        }
    }
}
