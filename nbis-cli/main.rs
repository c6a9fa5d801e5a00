//! nbis: minutiae extraction, matching and quality assessment from the command line.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use nbis_cli::{EngineSettings, MatchResult, Nbis, NbisConfig, XytRecord, utils};
use nbis_core::Verbosity;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "nbis")]
#[command(about = "Fingerprint minutiae extraction, matching and quality assessment")]
#[command(version)]
struct Cli {
    /// Engine settings file (.json or .toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scan resolution of the input images.
    #[arg(long, global = true)]
    ppi: Option<u32>,

    /// Detector tuning preset, applied over the settings file.
    #[arg(long, global = true, value_parser = ["default", "fast", "sensitive"])]
    preset: Option<String>,

    /// Worker threads for batch commands.
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Increase log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect minutiae in an image.
    Extract(ExtractArgs),

    /// Detect on two images and score them.
    Match {
        #[arg(long)]
        probe: PathBuf,
        #[arg(long)]
        gallery: PathBuf,
        /// Scores at or above this are reported as a match.
        #[arg(long)]
        threshold: Option<i32>,
    },

    /// Grade image quality from 1 (best) to 5 (worst).
    Quality {
        #[arg(long)]
        image: PathBuf,
    },

    /// Score two pre-extracted minutiae files (.xyt text or JSON record lists).
    MatchXyt {
        #[arg(long)]
        probe: PathBuf,
        #[arg(long)]
        gallery: PathBuf,
        #[arg(long)]
        threshold: Option<i32>,
    },

    /// Rank gallery images against a probe image.
    Identify {
        #[arg(long)]
        probe: PathBuf,
        #[arg(long, num_args = 1.., required = true)]
        gallery: Vec<PathBuf>,
        /// Drop candidates scoring below this.
        #[arg(long)]
        threshold: Option<i32>,
        /// Candidates to print.
        #[arg(long, default_value = "5")]
        top: usize,
    },

    /// Write the default engine settings to a file.
    InitConfig {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct ExtractArgs {
    #[arg(long)]
    image: PathBuf,

    /// Write minutiae records as JSON.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write minutiae in .xyt text form.
    #[arg(long)]
    xyt: Option<PathBuf>,

    /// Write a colour overlay of the minutiae.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write the binarized ridge image.
    #[arg(long)]
    binarized: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if let Commands::InitConfig { out } = &cli.command {
        EngineSettings::default().save(out)?;
        println!("Wrote default settings to {}", out.display());
        return Ok(());
    }

    let engine = build_engine(&cli)?;
    let ppi = cli.ppi;

    match cli.command {
        Commands::Extract(args) => run_extract(&engine, &args, ppi),
        Commands::Match {
            probe,
            gallery,
            threshold,
        } => {
            let probe = utils::load_fingerprint(&probe)?;
            let gallery = utils::load_fingerprint(&gallery)?;
            let t0 = Instant::now();
            let score = engine.match_images(&probe, &gallery)?;
            info!("matched in {:.2?}", t0.elapsed());
            report_match(MatchResult::new(score), threshold);
            Ok(())
        }
        Commands::Quality { image } => {
            let img = utils::load_fingerprint(&image)?;
            let q = engine.compute_quality(&img, ppi)?;
            println!("{}", q);
            println!("Status: {} ({:?})", q.return_code(), q.status);
            if q.is_degenerate() {
                println!("Warning: degenerate image, treat the class as low confidence");
            }
            Ok(())
        }
        Commands::MatchXyt {
            probe,
            gallery,
            threshold,
        } => {
            let capacity = engine.config().matcher.capacity;
            let probe = read_minutiae_file(&probe, capacity)?;
            let gallery = read_minutiae_file(&gallery, capacity)?;
            let score = engine.score_records(&probe, &gallery);
            report_match(
                MatchResult::new(score).with_counts(probe.len(), gallery.len()),
                threshold,
            );
            Ok(())
        }
        Commands::Identify {
            probe,
            gallery,
            threshold,
            top,
        } => run_identify(&engine, &probe, &gallery, threshold, top, ppi),
        Commands::InitConfig { .. } => Ok(()),
    }
}

fn build_engine(cli: &Cli) -> CliResult<Nbis> {
    let mut settings = match &cli.config {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::new(NbisConfig::default()),
    };
    if let Some(preset) = &cli.preset {
        settings = settings.with_detector_preset(preset)?;
    }
    if let Some(ppi) = cli.ppi {
        settings.nbis.ppi = ppi;
    }
    if let Some(n) = cli.threads {
        settings.nbis.n_threads = n;
    }
    if cli.verbose >= 2 {
        settings.nbis.verbosity = Verbosity {
            main: true,
            load: true,
            bozorth: true,
            threshold: true,
        };
    }
    info!("{}", settings.summary());
    Ok(Nbis::from_settings(settings)?)
}

fn run_extract(engine: &Nbis, args: &ExtractArgs, ppi: Option<u32>) -> CliResult<()> {
    let img = utils::load_fingerprint(&args.image)?;
    let (w, h) = img.dimensions();

    let t0 = Instant::now();
    let detection = engine.extract_minutiae(&img, ppi)?;
    let elapsed = t0.elapsed();

    let minutiae = &detection.minutiae;
    println!("Image: {}x{}", w, h);
    println!("Detected {} minutiae in {:.2?}", minutiae.len(), elapsed);
    println!(
        "  ridge endings: {}, bifurcations: {}",
        minutiae.count_of(nbis_core::MinutiaType::RidgeEnding),
        minutiae.count_of(nbis_core::MinutiaType::Bifurcation)
    );

    if let Some(out) = &args.out {
        let doc = json!({
            "width": w,
            "height": h,
            "minutiae": minutiae.to_records(),
        });
        std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
        println!("Saved minutiae to {}", out.display());
    }
    if let Some(path) = &args.xyt {
        let record = engine.interchange(minutiae)?;
        std::fs::write(path, record.write_xyt_text())?;
        println!("Saved {} xyt rows to {}", record.len(), path.display());
    }
    if let Some(path) = &args.overlay {
        utils::visualize_minutiae(&img, minutiae, 6).save(path)?;
        println!("Saved overlay to {}", path.display());
    }
    if let Some(path) = &args.binarized {
        let bin = utils::binarized_to_image(&detection.diagnostics.binarized)?;
        utils::save_fingerprint(&bin, path)?;
        println!("Saved binarized image to {}", path.display());
    }
    Ok(())
}

fn run_identify(
    engine: &Nbis,
    probe: &Path,
    gallery: &[PathBuf],
    threshold: Option<i32>,
    top: usize,
    ppi: Option<u32>,
) -> CliResult<()> {
    let probe_img = utils::load_fingerprint(probe)?;
    let probe_set = engine.extract_minutiae(&probe_img, ppi)?.minutiae;

    let images = gallery
        .iter()
        .map(utils::load_fingerprint)
        .collect::<Result<Vec<_>, _>>()?;
    let t0 = Instant::now();
    let mut sets = Vec::with_capacity(images.len());
    for (path, result) in gallery.iter().zip(engine.extract_many(&images, ppi)) {
        match result {
            Ok(d) => sets.push(d.minutiae),
            Err(e) => {
                eprintln!("Skipping {}: {}", path.display(), e);
                sets.push(Default::default());
            }
        }
    }
    let ranked = engine.identify(&probe_set, &sets, threshold)?;
    info!("identified against {} prints in {:.2?}", sets.len(), t0.elapsed());

    println!("{:<6} {:<40} {:<8} Confidence", "Rank", "Gallery", "Score");
    for (rank, m) in ranked.iter().take(top).enumerate() {
        let strength = nbis_cli::MatchStrength::from_score(m.score);
        println!(
            "{:<6} {:<40} {:<8} {}",
            rank + 1,
            gallery[m.index].display(),
            m.score,
            strength.confidence()
        );
    }
    Ok(())
}

/// `.json` files hold a list of minutia records; anything else is `.xyt` text.
fn read_minutiae_file(path: &Path, capacity: usize) -> CliResult<XytRecord> {
    let content = std::fs::read_to_string(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let doc: Value = serde_json::from_str(&content)?;
        let list = match &doc {
            Value::Array(items) => items.as_slice(),
            Value::Object(obj) => match obj.get("minutiae") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => return Err(format!("{}: no minutiae list", path.display()).into()),
            },
            _ => return Err(format!("{}: expected a list of records", path.display()).into()),
        };
        Ok(nbis_core::from_dict_list(list, capacity)?)
    } else {
        Ok(XytRecord::parse_xyt_text(&content, capacity)?)
    }
}

fn report_match(result: MatchResult, threshold: Option<i32>) {
    let result = match threshold {
        Some(t) => result.with_threshold(t),
        None => result,
    };
    println!("Score: {}", result.score);
    if let (Some(p), Some(g)) = (result.probe_minutiae, result.gallery_minutiae) {
        println!("Minutiae: probe {}, gallery {}", p, g);
    }
    println!("{}", result.strength().description());
    if let Some(m) = result.matched {
        println!("Decision: {}", if m { "MATCH" } else { "NO MATCH" });
    }
}
