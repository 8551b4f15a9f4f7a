use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use wsctool_core::{
    decompile_file, recompile_file, validate_transcript, RecompileOptions, Strictness,
    ValidationResult,
};

#[derive(Debug, Parser)]
#[command(name = "wsctool", version, about = "WSC script decompiler/recompiler")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print per-file warnings and suggestions.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract .WSC containers to offset-annotated transcripts.
    Decompile {
        /// Input .wsc files, or directories walked for *.wsc.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (single input only).
        #[arg(short, long, conflicts_with = "dir")]
        output: Option<PathBuf>,

        /// Output directory (default: alongside each input).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Rebuild .WSC containers from edited transcripts.
    Recompile {
        /// Input .txt transcripts, or directories walked for *.txt.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (single input only).
        #[arg(short, long, conflicts_with = "dir")]
        output: Option<PathBuf>,

        /// Output directory (default: alongside each input).
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Reassign all offsets sequentially instead of trying to keep the
        /// originals.
        #[arg(long)]
        recalculate_offsets: bool,

        /// Treat unencodable content as an error instead of a warning.
        #[arg(long)]
        strict: bool,
    },
    /// Validate a transcript without rebuilding anything.
    Validate {
        input: PathBuf,

        #[arg(long)]
        strict: bool,

        /// Emit the validation report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_logging();
    let args = Args::parse();

    let exit_code = match args.command {
        Command::Decompile {
            inputs,
            output,
            dir,
        } => run_decompile(&inputs, output.as_deref(), dir.as_deref(), args.verbose),
        Command::Recompile {
            inputs,
            output,
            dir,
            recalculate_offsets,
            strict,
        } => {
            let options = RecompileOptions {
                preserve_offsets: !recalculate_offsets,
                strictness: if strict {
                    Strictness::Strict
                } else {
                    Strictness::Lenient
                },
            };
            run_recompile(&inputs, output.as_deref(), dir.as_deref(), &options, args.verbose)
        }
        Command::Validate {
            input,
            strict,
            json,
        } => run_validate(&input, strict, json),
    };

    std::process::exit(exit_code);
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::builder()
        .with_env_var("WSCTOOL_LOG")
        .with_default_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Expand file and directory arguments into the list of files to process.
fn collect_inputs(inputs: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if path.is_file() && has_extension(path, extension) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            if !has_extension(input, extension) {
                eprintln!(
                    "Warning: '{}' does not have .{extension} extension",
                    input.display()
                );
            }
            files.push(input.clone());
        }
    }
    files
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn output_path(
    input: &Path,
    output: Option<&Path>,
    dir: Option<&Path>,
    new_extension: &str,
) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }
    let mut name = input.to_path_buf();
    name.set_extension(new_extension);
    match dir {
        Some(dir) => dir.join(name.file_name().unwrap_or_default()),
        None => name,
    }
}

fn run_decompile(
    inputs: &[PathBuf],
    output: Option<&Path>,
    dir: Option<&Path>,
    verbose: bool,
) -> i32 {
    let files = collect_inputs(inputs, "wsc");
    if files.is_empty() {
        eprintln!("Error: no input files found");
        return 1;
    }
    if output.is_some() && files.len() > 1 {
        eprintln!("Error: --output is only valid with a single input file");
        return 1;
    }

    let mut success_count = 0usize;
    let mut error_count = 0usize;

    for input in &files {
        let out = output_path(input, output, dir, "txt");
        match decompile_file(input, &out) {
            Ok(summary) => {
                success_count += 1;
                if verbose {
                    println!(
                        "{}: kept {}/{} records -> {}",
                        input.display(),
                        summary.kept_records,
                        summary.total_records,
                        out.display()
                    );
                }
            }
            Err(err) => {
                error_count += 1;
                eprintln!("Error: {}: {err}", input.display());
            }
        }
    }

    println!("Decompiled {success_count} file(s), {error_count} error(s)");
    if error_count > 0 {
        1
    } else {
        0
    }
}

fn run_recompile(
    inputs: &[PathBuf],
    output: Option<&Path>,
    dir: Option<&Path>,
    options: &RecompileOptions,
    verbose: bool,
) -> i32 {
    let files = collect_inputs(inputs, "txt");
    if files.is_empty() {
        eprintln!("Error: no input files found");
        return 1;
    }
    if output.is_some() && files.len() > 1 {
        eprintln!("Error: --output is only valid with a single input file");
        return 1;
    }

    let mut success_count = 0usize;
    let mut error_count = 0usize;

    for input in &files {
        let out = output_path(input, output, dir, "wsc");
        match recompile_file(input, &out, options) {
            Ok(report) => {
                success_count += 1;
                if verbose {
                    print_report(&report);
                }
            }
            Err(err) => {
                error_count += 1;
                eprintln!("Error: {}: {err}", input.display());
                if let wsctool_core::WscError::InvalidTranscript(report) = &err {
                    print_report(report);
                }
            }
        }
    }

    println!("Recompiled {success_count} file(s), {error_count} error(s)");
    if error_count > 0 {
        1
    } else {
        0
    }
}

fn run_validate(input: &Path, strict: bool, json: bool) -> i32 {
    let strictness = if strict {
        Strictness::Strict
    } else {
        Strictness::Lenient
    };

    let text = match std::fs::read_to_string(input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Error: {}: {err}", input.display());
            return 1;
        }
    };

    let report = validate_transcript(&text, strictness);
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("Error: failed to serialize report: {err}");
                return 1;
            }
        }
    } else {
        print_report(&report);
        println!("{}", if report.is_valid { "VALID" } else { "INVALID" });
    }

    if report.is_valid {
        0
    } else {
        1
    }
}

fn print_report(report: &ValidationResult) {
    for error in &report.errors {
        eprintln!("error: {error}");
    }
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    for suggestion in &report.suggestions {
        eprintln!("note: {suggestion}");
    }
    if report.needs_recalculation {
        eprintln!("note: offsets need recalculation");
    }
}
