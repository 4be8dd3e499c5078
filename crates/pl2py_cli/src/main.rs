mod config;

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process,
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info, LevelFilter};
use pl2py_driver::{
    prepare_document, trace_document, translate_document, DocExtractor, PerldocCommand,
    PodExtractor,
};
use pl2py_translate::translate_line;

use crate::config::load_config;

#[derive(Parser, Debug)]
#[command(name = "pl2py", version, about = "Translate Perl scripts into Python, line by line")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Translate from the first line instead of waiting for the sentinel.
    #[arg(long, global = true)]
    no_sentinel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate everything below the sentinel line.
    Translate {
        /// Input Perl script.
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Generate front matter first, so the input needs no sentinel.
        #[arg(long)]
        prepare: bool,
        /// Take the docstring from `perldoc` instead of the POD blocks.
        #[arg(long, requires = "prepare")]
        perldoc: bool,
    },
    /// Translate a single line of code.
    Line { text: String },
    /// Translate to nowhere and report the first failing line.
    Check { input: PathBuf },
    /// Print a JSON report of what happened to every line.
    Trace { input: PathBuf },
    /// Write the front matter plus the original source.
    Prepare {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        perldoc: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(cli:?; "Parsed arguments");

    if let Err(err) = run(cli) {
        error!("{err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if cli.no_sentinel {
        config.translate.require_sentinel = false;
    }
    let options = &config.translate;

    match cli.command {
        Commands::Translate {
            input,
            output,
            prepare,
            perldoc,
        } => {
            ensure_distinct(&input, output.as_deref())?;
            let mut out = open_output(output.as_deref())?;
            let summary = if prepare {
                let source = read_source(&input)?;
                let mut prepared = Vec::new();
                prepare_document(
                    &input,
                    &source,
                    extractor(perldoc).as_ref(),
                    &config.front_matter,
                    &mut prepared,
                )?;
                translate_document(prepared.as_slice(), &mut out, options)
            } else {
                let file = File::open(&input)
                    .with_context(|| format!("failed to open {}", input.display()))?;
                translate_document(BufReader::new(file), &mut out, options)
            }
            .with_context(|| format!("failed to translate {}", input.display()))?;

            info!(
                input = input.display().to_string(),
                lines = summary.lines_read,
                translated = summary.lines_translated;
                "Translation finished"
            );
        }
        Commands::Line { text } => {
            let translation = translate_line(&text, options)?;
            debug!(rules:? = translation.applied; "Rules applied");
            println!("{}", translation.text);
        }
        Commands::Check { input } => {
            let file = File::open(&input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            translate_document(BufReader::new(file), io::sink(), options)
                .with_context(|| format!("failed to translate {}", input.display()))?;
            eprintln!("OK: {}", input.display());
        }
        Commands::Trace { input } => {
            let file = File::open(&input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            let reports = trace_document(BufReader::new(file), options)?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::Prepare {
            input,
            output,
            perldoc,
        } => {
            ensure_distinct(&input, output.as_deref())?;
            let source = read_source(&input)?;
            let out = open_output(output.as_deref())?;
            prepare_document(
                &input,
                &source,
                extractor(perldoc).as_ref(),
                &config.front_matter,
                out,
            )?;
        }
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Opening the output truncates it, so it must not be the input.
fn ensure_distinct(input: &Path, output: Option<&Path>) -> Result<()> {
    let Some(output) = output else {
        return Ok(());
    };
    // A missing output cannot be the input.
    if let (Ok(input_path), Ok(output_path)) = (input.canonicalize(), output.canonicalize()) {
        if input_path == output_path {
            bail!(
                "output {} is the input file; refusing to overwrite it",
                output.display()
            );
        }
    }
    Ok(())
}

/// Created up front so a bad output path fails before any work is done.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    })
}

fn extractor(perldoc: bool) -> Box<dyn DocExtractor> {
    if perldoc {
        Box::new(PerldocCommand::default())
    } else {
        Box::new(PodExtractor)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pl2py", "line", "print $x;", "--no-sentinel"]).unwrap();
        assert!(cli.no_sentinel);
        assert_eq!(cli.log_level, "warn");
        assert!(matches!(cli.command, Commands::Line { ref text } if text == "print $x;"));
    }

    #[test]
    fn perldoc_requires_prepare() {
        assert!(Cli::try_parse_from(["pl2py", "translate", "a.pl", "--perldoc"]).is_err());
        assert!(Cli::try_parse_from(["pl2py", "translate", "a.pl", "--prepare", "--perldoc"]).is_ok());
    }

    #[test]
    fn output_may_not_overwrite_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.pl");
        let source = "=====Start Converting Now=====\nmy $x = 1;\n";
        std::fs::write(&input, source).unwrap();
        let same = dir.path().join(".").join("a.pl");
        let config = dir.path().join("pl2py.toml");
        std::fs::write(&config, "").unwrap();

        for command in ["translate", "prepare"] {
            let cli = Cli::try_parse_from([
                "pl2py",
                "--config",
                config.to_str().unwrap(),
                command,
                input.to_str().unwrap(),
                "-o",
                same.to_str().unwrap(),
            ])
            .unwrap();
            let err = run(cli).unwrap_err();
            assert!(err.to_string().contains("refusing to overwrite"));
            assert_eq!(std::fs::read_to_string(&input).unwrap(), source);
        }
    }

    #[test]
    fn translate_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.pl");
        let output = dir.path().join("a.py");
        std::fs::write(&input, "# header\n=====Start Converting Now=====\nmy $x = 1;\n").unwrap();

        let cli = Cli::try_parse_from([
            "pl2py",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "translate",
            input.to_str().unwrap(),
        ])
        .unwrap();
        assert!(run(cli).is_err());

        let config = dir.path().join("pl2py.toml");
        std::fs::write(&config, "").unwrap();
        let cli = Cli::try_parse_from([
            "pl2py",
            "--config",
            config.to_str().unwrap(),
            "translate",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "# header\nx: Any = 1;\n"
        );
    }
}
