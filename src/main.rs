use anyhow::{Context, Result};
use bundle_patcher::config::{default_config, load_from_path, PatchConfig};
use bundle_patcher::edit::atomic_write;
use bundle_patcher::extract::{extract, BUN_HEADER, BUN_TAIL};
use bundle_patcher::js::{Bootstrap, Transformed, Transformer};
use bundle_patcher::pipeline::{HttpFetcher, Pipeline, PipelineSettings, RunOutcome};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "bundle-patcher")]
#[command(
    about = "Recover bundled JavaScript from standalone executables and patch it",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Log progress (equivalent to RUST_LOG=info)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Strip the bundler framing from an executable and print the source
    Extract {
        /// Executable (or any file) to extract from
        input: PathBuf,

        /// Write the payload here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a JavaScript file, or every script under a directory
    Transform {
        /// File or directory to transform
        input: PathBuf,

        /// Patch config (TOML, or JSON by extension); bundled defaults otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file, or output directory when transforming a directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rewrite files in place
        #[arg(short, long, conflicts_with = "output")]
        in_place: bool,

        /// Show a unified diff of the changes
        #[arg(short, long)]
        diff: bool,

        /// Do not write anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Download, patch and install the latest release
    Update {
        /// Pipeline settings file
        #[arg(short, long)]
        settings: PathBuf,

        /// Reinstall even when the installed version is current
        #[arg(short, long)]
        force: bool,
    },

    /// Compare the installed version with the release channel
    Status {
        /// Pipeline settings file
        #[arg(short, long)]
        settings: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract { input, output } => cmd_extract(&input, output.as_deref()),
        Commands::Transform {
            input,
            config,
            output,
            in_place,
            diff,
            dry_run,
        } => cmd_transform(
            &input,
            config.as_deref(),
            output.as_deref(),
            in_place,
            diff,
            dry_run,
        ),
        Commands::Update { settings, force } => cmd_update(&settings, force),
        Commands::Status { settings } => cmd_status(&settings),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PatchConfig> {
    let config = match path {
        Some(path) => load_from_path(path)?,
        None => default_config()?,
    };
    Ok(config)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for group in diff.grouped_ops(3) {
        for op in group {
            for change in diff.iter_changes(&op) {
                let line = match change.tag() {
                    ChangeTag::Delete => format!("-{}", change).red(),
                    ChangeTag::Insert => format!("+{}", change).green(),
                    ChangeTag::Equal => format!(" {}", change).normal(),
                };
                print!("{}", line);
            }
        }
    }
}

fn cmd_extract(input: &Path, output: Option<&Path>) -> Result<()> {
    let buffer = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let extraction = extract(&buffer, &BUN_HEADER, &BUN_TAIL);

    eprintln!(
        "{} header {}, tail {}",
        if extraction.is_framed() {
            "✓".green()
        } else {
            "!".yellow()
        },
        extraction.header,
        extraction.tail
    );

    let payload = extraction.into_payload();
    match output {
        Some(path) => {
            atomic_write(path, &payload)?;
            eprintln!("Wrote {} bytes to {}", payload.len(), path.display());
        }
        None => std::io::stdout().write_all(&payload)?,
    }
    Ok(())
}

fn is_script(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("js" | "mjs" | "cjs")
    )
}

fn cmd_transform(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    in_place: bool,
    show_diff: bool,
    dry_run: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let transformer = Transformer::new(Bootstrap::default());

    if !input.is_dir() {
        let source = fs::read_to_string(input)
            .with_context(|| format!("reading {}", input.display()))?;
        let transformed = transformer
            .transform(&source, &config)
            .with_context(|| format!("transforming {}", input.display()))?;
        report(input, &transformed);
        if show_diff {
            display_diff(input, &source, &transformed.code);
        }
        if dry_run {
            return Ok(());
        }
        let target = if in_place { Some(input) } else { output };
        match target {
            Some(path) => atomic_write(path, transformed.code.as_bytes())?,
            None if !show_diff => print!("{}", transformed.code),
            None => {}
        }
        return Ok(());
    }

    if output.is_none() && !in_place && !dry_run {
        anyhow::bail!("transforming a directory needs --output, --in-place or --dry-run");
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_script(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    if files.is_empty() {
        anyhow::bail!("no .js/.mjs/.cjs files under {}", input.display());
    }

    let mut failed = 0;
    for file in &files {
        let source = fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        let transformed = match transformer.transform(&source, &config) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                failed += 1;
                continue;
            }
        };
        report(file, &transformed);
        if show_diff {
            display_diff(file, &source, &transformed.code);
        }
        if dry_run {
            continue;
        }
        let target: PathBuf = match output {
            Some(out) => out.join(file.strip_prefix(input)?),
            None => file.clone(),
        };
        atomic_write(&target, transformed.code.as_bytes())?;
    }

    println!(
        "\nTransformed {} of {} file(s)",
        files.len() - failed,
        files.len()
    );
    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed to transform");
    }
    Ok(())
}

fn report(file: &Path, transformed: &Transformed) {
    let report = &transformed.report;
    eprintln!("{} {}: {}", "✓".green(), file.display(), report);
    if report.parse_errors > 0 {
        eprintln!(
            "  {} {} syntax error(s) tolerated",
            "!".yellow(),
            report.parse_errors
        );
    }
    for unmatched in &report.unmatched {
        eprintln!("  {} {}", "⊘".cyan(), unmatched);
    }
}

fn cmd_update(settings: &Path, force: bool) -> Result<()> {
    let settings = PipelineSettings::load(settings)?;
    let pipeline = Pipeline::from_settings(settings, HttpFetcher::default())?.force(force);

    match pipeline.run()? {
        RunOutcome::UpToDate { version } => {
            println!("{} {} is up to date", "✓".green(), version);
        }
        RunOutcome::Updated {
            previous,
            version,
            path,
            framed,
            report,
        } => {
            match previous {
                Some(prev) => println!("{} Updated {} -> {}", "✓".green(), prev, version),
                None => println!("{} Installed {}", "✓".green(), version),
            }
            println!("  Package: {}", path.display());
            println!("  Rewrites: {}", report);
            if !framed {
                println!(
                    "  {}",
                    "Bundler markers were not all found; check the extracted source".yellow()
                );
            }
            for unmatched in &report.unmatched {
                println!("  {} {}", "⊘".cyan(), unmatched);
            }
        }
    }
    Ok(())
}

fn cmd_status(settings: &Path) -> Result<()> {
    let settings = PipelineSettings::load(settings)?;
    let pipeline = Pipeline::from_settings(settings, HttpFetcher::default())?;
    let status = pipeline.status()?;

    match &status.installed {
        Some(state) => println!("Installed: {} {}", state.name, state.version),
        None => println!("Installed: {}", "none".dimmed()),
    }
    println!("Remote:    {}", status.remote);
    if status.is_up_to_date() {
        println!("{}", "Up to date".green());
    } else if status.update_available() {
        println!("{}", "Update available".yellow());
    } else {
        println!("{}", "Installed version is ahead of the release channel".yellow());
    }
    Ok(())
}
