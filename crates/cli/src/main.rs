//! RSGIS CLI - unsupervised classification and cleanup of raster images

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rsgis_algorithms::classification::{
    ClusteringSummary, InitMethod, IsodataClassifier, IsodataParams, KMeansClassifier,
    KMeansParams,
};
use rsgis_algorithms::filter::{Connectivity, SinglePixelEliminator};
use rsgis_core::io::{read_band_stack, read_geotiff, write_geotiff, GeoTiffOptions};
use rsgis_core::{MultiBandRaster, Raster, RasterDataset};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rsgis")]
#[command(author, version, about = "Unsupervised classification of remote sensing imagery", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// K-means clustering of one or more images
    Kmeans {
        #[command(flatten)]
        cluster: ClusterArgs,
    },
    /// ISODATA clustering (discards, merges and splits clusters)
    Isodata {
        #[command(flatten)]
        cluster: ClusterArgs,
        /// Discard clusters with fewer pixels than this
        #[arg(long, default_value = "10")]
        min_points: usize,
        /// Merge clusters whose centres are closer than this
        #[arg(long, default_value = "5.0")]
        min_distance: f64,
        /// Split clusters with a band standard deviation above this
        #[arg(long, default_value = "10.0")]
        max_std_dev: f64,
        /// Split clusters whose average distance exceeds this multiple of the mean
        #[arg(long, default_value = "2.0")]
        proportion_avg_distance: f64,
    },
    /// Replace isolated pixels of a classified raster by their neighbours' majority value
    Eliminate {
        /// Input classified raster
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Neighbourhood: 4 or 8
        #[arg(short, long, default_value = "8")]
        connectivity: u8,
        /// No-data label (defaults to the raster's own no-data value)
        #[arg(short, long)]
        nodata: Option<u32>,
    },
}

/// Arguments shared by the clustering commands
#[derive(Args)]
struct ClusterArgs {
    /// Input image(s); the bands of every file are stacked in order
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,
    /// Output label raster
    #[arg(short, long)]
    output: PathBuf,
    /// Number of (initial) clusters
    #[arg(short = 'k', long, default_value = "8")]
    clusters: usize,
    /// Centre initialization: random, kpp
    #[arg(long, default_value = "random")]
    init: String,
    /// Stop when the mean centre movement falls below this
    #[arg(long, default_value = "0.0025")]
    move_threshold: f64,
    /// Maximum number of iterations
    #[arg(long, default_value = "100")]
    max_iterations: usize,
    /// Seed for centre initialization
    #[arg(long, default_value = "42")]
    seed: u64,
    /// Write the final cluster centres to this CSV file
    #[arg(long)]
    centres: Option<PathBuf>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_image(paths: &[PathBuf]) -> Result<MultiBandRaster<f32>> {
    let pb = spinner("Reading input...");
    let image = read_band_stack(paths).context("Failed to read input images")?;
    pb.finish_and_clear();
    info!(
        "Input: {} x {}, {} band(s)",
        image.width(),
        image.height(),
        image.band_count()
    );
    Ok(image)
}

fn read_labels(path: &Path) -> Result<Raster<u32>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<u32> = read_geotiff(path, None).context("Failed to read raster")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_labels(raster: &Raster<u32>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn report(summary: &ClusteringSummary) {
    println!(
        "  Iterations: {} ({})",
        summary.iterations,
        if summary.converged { "converged" } else { "iteration limit reached" }
    );
    println!("  Final movement: {:.6}", summary.movement);
    println!("  Clusters: {}", summary.num_clusters);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn info_command(input: &Path) -> Result<()> {
    let image = read_image(&[input.to_path_buf()])?;
    let first = image.band(0).context("Failed to read band 1")?;
    let bounds = first.bounds();

    println!("File: {}", input.display());
    println!(
        "Dimensions: {} x {} ({} cells), {} band(s)",
        image.width(),
        image.height(),
        first.len(),
        image.band_count()
    );
    println!("Cell size: {}", first.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = image.crs() {
        println!("CRS: {}", crs);
    }
    for b in 0..image.band_count() {
        let stats = image.band(b)?.statistics();
        println!("\nBand {}:", b + 1);
        if let Some(nodata) = image.band_nodata(b) {
            println!("  NoData: {}", nodata);
        }
        if let (Some(min), Some(max)) = (stats.min, stats.max) {
            println!("  Min: {:.4}", min);
            println!("  Max: {:.4}", max);
        }
        if let Some(mean) = stats.mean {
            println!("  Mean: {:.4}", mean);
        }
        println!(
            "  Valid cells: {} ({:.1}%)",
            stats.valid_count,
            100.0 * stats.valid_count as f64 / first.len() as f64
        );
    }
    Ok(())
}

fn kmeans_command(args: &ClusterArgs) -> Result<()> {
    let image = read_image(&args.inputs)?;
    let method: InitMethod = args.init.parse()?;
    let params = KMeansParams {
        move_threshold: args.move_threshold,
        max_iterations: args.max_iterations,
    };

    let start = Instant::now();
    let pb = spinner("Clustering (k-means)...");
    let mut kmeans = KMeansClassifier::new(&image)?;
    kmeans
        .init_cluster_centres(args.clusters, method, args.seed)
        .context("Failed to initialise cluster centres")?;
    let summary = kmeans.calc_cluster_centres(&params).context("K-means failed")?;
    let labels = kmeans.generate_output_image().context("Failed to label image")?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    write_labels(&labels, &args.output)?;
    if let Some(path) = &args.centres {
        kmeans
            .save_centres(path)
            .with_context(|| format!("Failed to write centres to {}", path.display()))?;
    }
    done("K-means classification", &args.output, elapsed);
    report(&summary);
    Ok(())
}

fn isodata_command(args: &ClusterArgs, params: IsodataParams) -> Result<()> {
    let image = read_image(&args.inputs)?;
    let method: InitMethod = args.init.parse()?;

    let start = Instant::now();
    let pb = spinner("Clustering (ISODATA)...");
    let mut iso = IsodataClassifier::new(&image)?;
    iso.init_cluster_centres(args.clusters, method, args.seed)
        .context("Failed to initialise cluster centres")?;
    let summary = iso.calc_cluster_centres(&params).context("ISODATA failed")?;
    let labels = iso.generate_output_image().context("Failed to label image")?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    write_labels(&labels, &args.output)?;
    if let Some(path) = &args.centres {
        iso.save_centres(path)
            .with_context(|| format!("Failed to write centres to {}", path.display()))?;
    }
    done("ISODATA classification", &args.output, elapsed);
    report(&summary);
    Ok(())
}

fn eliminate_command(input: &Path, output: &Path, connectivity: u8, nodata: Option<u32>) -> Result<()> {
    let connectivity = Connectivity::try_from(connectivity)?;
    let mut raster = read_labels(input)?;

    let mut eliminator = SinglePixelEliminator::new(connectivity);
    if let Some(nd) = nodata.or(raster.nodata()) {
        eliminator = eliminator.with_nodata(nd);
    }

    let start = Instant::now();
    let pb = spinner("Eliminating single pixels...");
    let summary = eliminator
        .eliminate_in_memory(&mut raster)
        .context("Single pixel elimination failed")?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    write_labels(&raster, output)?;
    done("Cleaned raster", output, elapsed);
    println!("  Passes: {}", summary.iterations);
    println!("  Pixels replaced: {}", summary.pixels_replaced);
    println!("  Isolated pixels left: {}", summary.remaining_isolated);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => info_command(&input),
        Commands::Kmeans { cluster } => kmeans_command(&cluster),
        Commands::Isodata {
            cluster,
            min_points,
            min_distance,
            max_std_dev,
            proportion_avg_distance,
        } => {
            let params = IsodataParams {
                move_threshold: cluster.move_threshold,
                max_iterations: cluster.max_iterations,
                min_points_per_cluster: min_points,
                min_inter_centre_distance: min_distance,
                max_std_dev,
                proportion_of_avg_distance: proportion_avg_distance,
            };
            isodata_command(&cluster, params)
        }
        Commands::Eliminate {
            input,
            output,
            connectivity,
            nodata,
        } => eliminate_command(&input, &output, connectivity, nodata),
    }
}
