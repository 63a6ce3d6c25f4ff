extern crate libctex;

use std::path::{Path, PathBuf};

use clap::Parser;
use console::style;
use libctex::batch::{self, FileOutcome, Options, Strategy, Summary};
use log::debug;
use miette::{IntoDiagnostic, Result};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

/// How many failed files are listed after the summary
const FAILED_LISTED: usize = 5;
/// How many output files are listed after the summary
const OUTPUT_LISTED: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "ctex-extract")]
#[command(about, author, version, long_about = None)]
struct Cli {
    /// Godot project directory
    #[arg(default_value = ".", value_name = "PROJECT")]
    project: PathBuf,
    /// Outbound directory [default: PROJECT/extracted_images]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Search containers for a WebP signature instead of reading their header
    #[arg(long, default_value_t = false)]
    scan: bool,
    /// Name files without a recoverable original name after their image format
    #[arg(long, default_value_t = false)]
    fallback_names: bool,
    /// Overwrite files
    #[arg(short, long, default_value_t = false)]
    force: bool,
    /// Number of parallel jobs [default: number of CPUs]
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn main() -> Result<()> {
    let stdout = console::Term::stdout();
    let cli = Cli::parse();

    init_logging(cli.verbose);
    debug!("{cli:?}");

    command_extract(stdout, cli)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn command_extract(stdout: console::Term, cli: Cli) -> Result<()> {
    stdout
        .write_line(&style("Godot 4 image extractor").bold().to_string())
        .into_diagnostic()?;

    let root = batch::find_project(&cli.project)?;
    stdout
        .write_line(&format!("Project: {}", root.display()))
        .into_diagnostic()?;

    let output_dir = cli
        .output
        .unwrap_or_else(|| batch::default_output_dir(&root));
    batch::prepare_output_dir(&output_dir)?;
    stdout
        .write_line(&format!("Output: {}", output_dir.display()))
        .into_diagnostic()?;

    let inventory = batch::scan_imported(&batch::imported_dir(&root))?;
    if inventory.textures.is_empty() && inventory.samples == 0 {
        miette::bail!("no imported resources found in the project");
    }

    let text = format!(
        "Found {} texture caches (.ctex) and {} audio caches (.sample)",
        inventory.textures.len(),
        inventory.samples
    );
    stdout.write_line(&text).into_diagnostic()?;

    let options = Options {
        output_dir: output_dir.clone(),
        strategy: if cli.scan {
            Strategy::Scan
        } else {
            Strategy::Header
        },
        fallback_names: cli.fallback_names,
        force: cli.force,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.jobs.unwrap_or(0))
        .build()
        .into_diagnostic()?;
    let bar = indicatif::ProgressBar::new(inventory.textures.len() as u64);

    bar.set_style(get_bar_style()?);

    let outcomes: Vec<FileOutcome> = pool.install(|| {
        inventory
            .textures
            .par_iter()
            .map(|path| {
                let outcome = batch::process_file(path, &options);
                report_outcome(&bar, &outcome);
                bar.inc(1);
                outcome
            })
            .collect()
    });

    bar.finish();

    let summary: Summary = outcomes.into_iter().collect();
    print_summary(&stdout, &summary)?;
    print_output_dir(&stdout, &output_dir)?;

    Ok(())
}

fn report_outcome(bar: &indicatif::ProgressBar, outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Extracted { name, .. } => bar.set_message(name.clone()),
        FileOutcome::Skipped { name } => bar.set_message(format!("{name} (exists)")),
        FileOutcome::Failed { file, error } => {
            bar.println(format!("{} {file}: {error}", style("failed").red()));
        }
    }
}

fn print_summary(stdout: &console::Term, summary: &Summary) -> Result<()> {
    let total = summary.total();
    let text = format!(
        "Extracted: {}/{total};\nSkipped (already present): {}/{total};\nFailed: {}/{total};",
        summary.extracted,
        summary.skipped,
        summary.failed.len(),
    );
    stdout.write_line(&text).into_diagnostic()?;

    if summary.failed.is_empty() {
        return Ok(());
    }

    stdout.write_line("Failed files:").into_diagnostic()?;
    for (file, _) in summary.failed.iter().take(FAILED_LISTED) {
        stdout.write_line(&format!("  - {file}")).into_diagnostic()?;
    }
    if summary.failed.len() > FAILED_LISTED {
        let text = format!("  ... and {} more", summary.failed.len() - FAILED_LISTED);
        stdout.write_line(&text).into_diagnostic()?;
    }

    Ok(())
}

fn print_output_dir(stdout: &console::Term, output_dir: &Path) -> Result<()> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(output_dir).into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    stdout
        .write_line(&format!("Files in {} ({}):", output_dir.display(), names.len()))
        .into_diagnostic()?;
    for name in names.iter().take(OUTPUT_LISTED) {
        stdout.write_line(&format!("  - {name}")).into_diagnostic()?;
    }
    if names.len() > OUTPUT_LISTED {
        let text = format!("  ... and {} more", names.len() - OUTPUT_LISTED);
        stdout.write_line(&text).into_diagnostic()?;
    }

    Ok(())
}

fn get_bar_style() -> Result<indicatif::ProgressStyle> {
    Ok(
        indicatif::ProgressStyle::with_template("[{bar:32}] {pos:>7}/{len:7} {msg}")
            .into_diagnostic()?
            .progress_chars("=>-"),
    )
}
