//! ALM Feature Uploader CLI
//!
//! Command-line tool for converting Gherkin feature files into ALM design-step sheets.

use alm_core::{
    convert_file, parse_feature_file, scan_directory, write_sheets, BatchFile, Conversion,
    ExportSource, OutputFormat, SheetConfig,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "alm-cli")]
#[command(about = "Gherkin to ALM sheet converter", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a feature file and print its export rows as JSON
    Parse {
        /// Path to feature file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Convert a feature file into sheets
    Convert {
        /// Path to feature file
        #[arg(short, long)]
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Sheet config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Scan directories for feature files
    Scan {
        /// Root directories to scan
        #[arg(short, long, required = true)]
        root: Vec<PathBuf>,

        /// Show scenario counts for each file
        #[arg(short = 'd', long)]
        detail: bool,
    },

    /// Convert every feature file listed by a batch file
    Batch {
        /// Path to batch file (JSON)
        #[arg(short, long)]
        batch: PathBuf,
    },

    /// Create a sheet config file with default values
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Create an empty batch file template
    CreateBatch {
        /// Output path for the batch file
        #[arg(short, long)]
        output: PathBuf,

        /// Root directories to include
        #[arg(short, long)]
        root: Vec<PathBuf>,

        /// Output directory for exports
        #[arg(long)]
        export_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(command: Commands) -> alm_core::Result<()> {
    match command {
        Commands::Parse { file } => cmd_parse(&file),
        Commands::Convert {
            file,
            output,
            format,
            config,
        } => cmd_convert(&file, &output, &format, config.as_deref()),
        Commands::Scan { root, detail } => cmd_scan(&root, detail),
        Commands::Batch { batch } => cmd_batch(&batch),
        Commands::InitConfig { output } => cmd_init_config(&output),
        Commands::CreateBatch {
            output,
            root,
            export_dir,
        } => cmd_create_batch(&output, &root, &export_dir),
    }
}

fn cmd_parse(file: &Path) -> alm_core::Result<()> {
    let parsed = parse_feature_file(file)?;
    let rows = parsed.export_rows();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn cmd_convert(
    file: &Path,
    output: &Path,
    format: &str,
    config: Option<&Path>,
) -> alm_core::Result<()> {
    let format: OutputFormat = format.parse()?;
    let config = SheetConfig::load_or_default(config)?;

    let conversion = convert_checked(file, &config)?;
    let result = export(&conversion, file, output, format)?;

    println!("Feature: {}", conversion.feature_name);
    println!(
        "Exported {} sheets ({} steps) to {}",
        conversion.sheets.len(),
        conversion.total_steps(),
        output.display()
    );
    for path in &result.files_written {
        println!("  - {}", path.display());
    }

    Ok(())
}

fn cmd_scan(roots: &[PathBuf], detail: bool) -> alm_core::Result<()> {
    let result = scan_directory(roots)?;

    println!("Scanned {} root(s):", result.roots.len());
    for root in &result.roots {
        println!("  {}", root.display());
    }
    println!();
    println!("Found {} feature files", result.total_files());
    if result.skipped > 0 {
        println!("Skipped {} unreadable entries", result.skipped);
    }

    for feature in &result.features {
        if detail {
            match parse_feature_file(&feature.path) {
                Ok(parsed) => println!(
                    "  {} ({} scenarios) - {}",
                    feature.path.display(),
                    parsed.scenario_count(),
                    parsed.feature_name
                ),
                Err(e) => println!("  {} (error: {})", feature.path.display(), e),
            }
        } else {
            println!("  {}", feature.path.display());
        }
    }

    Ok(())
}

fn cmd_batch(batch_path: &Path) -> alm_core::Result<()> {
    let batch = BatchFile::load(batch_path)?;
    let config = SheetConfig::load_or_default(batch.config.as_deref())?;

    println!("Roots: {:?}", batch.roots);
    println!("Output: {} ({})", batch.output_dir.display(), batch.format);
    println!();

    let scan_result = scan_directory(&batch.roots)?;

    let mut total_sheets = 0;
    let mut total_files = 0;
    let mut errors = Vec::new();

    for (feature, target) in scan_result.export_plan(&batch.output_dir) {
        let output_dir = match target {
            Ok(dir) => dir,
            Err(e) => {
                log::warn!("skipping {}: {}", feature.path.display(), e);
                errors.push((feature.path.clone(), e.to_string()));
                continue;
            }
        };

        log::info!("converting {}", feature.path.display());

        let conversion = match convert_checked(&feature.path, &config) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("failed to convert {}: {}", feature.path.display(), e);
                errors.push((feature.path.clone(), e.to_string()));
                continue;
            }
        };

        match export(&conversion, &feature.path, &output_dir, batch.format) {
            Ok(result) => {
                total_sheets += conversion.sheets.len();
                total_files += result.files_written.len();
                println!(
                    "{}: wrote {} sheets, {} files to {}",
                    feature.relative.display(),
                    conversion.sheets.len(),
                    result.files_written.len(),
                    output_dir.display()
                );
            }
            Err(e) => {
                log::warn!("failed to export {}: {}", feature.path.display(), e);
                errors.push((feature.path.clone(), e.to_string()));
            }
        }
    }

    println!();
    println!("Batch complete:");
    println!("  {} feature files", scan_result.total_files());
    println!("  {} total sheets", total_sheets);
    println!("  {} total files written", total_files);

    if !errors.is_empty() {
        println!("\nErrors ({}):", errors.len());
        for (path, err) in &errors {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}

fn cmd_init_config(output: &Path) -> alm_core::Result<()> {
    SheetConfig::default().save(output)?;
    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to change sheet metadata, then run:");
    println!(
        "  alm-cli convert --file <feature> --output <dir> --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_create_batch(output: &Path, roots: &[PathBuf], export_dir: &Path) -> alm_core::Result<()> {
    let batch = BatchFile {
        roots: roots.to_vec(),
        output_dir: export_dir.to_path_buf(),
        config: None,
        format: OutputFormat::Csv,
    };

    batch.save(output)?;
    println!("Created batch file: {}", output.display());
    println!();
    println!("Edit the file to configure your batch, then run:");
    println!("  alm-cli batch --batch {}", output.display());

    Ok(())
}

/// Convert a file, rejecting documents with nothing to export
fn convert_checked(file: &Path, config: &SheetConfig) -> alm_core::Result<Conversion> {
    let conversion = convert_file(file, config)?;
    if conversion.is_empty() {
        return Err(alm_core::Error::NoScenarios(file.to_path_buf()));
    }
    Ok(conversion)
}

fn export(
    conversion: &Conversion,
    source: &Path,
    output: &Path,
    format: OutputFormat,
) -> alm_core::Result<alm_core::ExportResult> {
    write_sheets(
        &conversion.sheets,
        output,
        format,
        ExportSource {
            feature: &conversion.feature_name,
            path: Some(source),
        },
    )
}
