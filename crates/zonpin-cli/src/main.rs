mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_HASH_ERROR, EXIT_MANIFEST_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;
use zonpin_core::{Config, UpdateOptions};

#[derive(Debug, Parser)]
#[command(
    name = "zonpin",
    version,
    about = "Format dependency manifests and pin package hashes"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Number of files hashed concurrently (overrides the config file).
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Config file to use instead of $ZONPIN_CONFIG or the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rewrite a manifest in canonical form.
    Fmt {
        /// Path to the manifest file.
        #[arg(default_value = "build.zig.zon")]
        manifest: PathBuf,
        /// Exit non-zero instead of rewriting when the file is not canonical.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// List the dependencies declared in a manifest.
    Deps {
        /// Path to the manifest file.
        #[arg(default_value = "build.zig.zon")]
        manifest: PathBuf,
    },
    /// Compute the package hash of an extracted directory tree.
    Hash {
        /// Package root directory.
        dir: PathBuf,
        /// Also list every hashed file with its digest.
        #[arg(long, default_value_t = false)]
        files: bool,
    },
    /// Recompute dependency hashes and compare them with the manifest.
    Verify {
        /// Path to the manifest file.
        #[arg(default_value = "build.zig.zon")]
        manifest: PathBuf,
        /// Extracted tree for a dependency, as NAME=DIR (repeatable).
        #[arg(long = "source", value_name = "NAME=DIR")]
        sources: Vec<String>,
        /// Only check these dependencies (repeatable).
        #[arg(long, value_name = "NAME")]
        only: Vec<String>,
    },
    /// Recompute dependency hashes and write them into the manifest.
    Update {
        /// Path to the manifest file.
        #[arg(default_value = "build.zig.zon")]
        manifest: PathBuf,
        /// Extracted tree for a dependency, as NAME=DIR (repeatable).
        #[arg(long = "source", value_name = "NAME=DIR")]
        sources: Vec<String>,
        /// Only update these dependencies (repeatable).
        #[arg(long, value_name = "NAME")]
        only: Vec<String>,
        /// Record failing dependencies and still write the others.
        #[arg(long, default_value_t = false)]
        keep_going: bool,
        /// Report what would change without writing the manifest.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<Config, String> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    }
    .map_err(|e| e.to_string())?;
    if let Some(workers) = cli.workers {
        if workers == 0 {
            return Err("--workers must be at least 1".to_owned());
        }
        config.workers = Some(workers);
    }
    Ok(config)
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("manifest error:")
        || msg.starts_with("failed to parse manifest")
        || msg.starts_with("failed to read manifest")
    {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("hash error:") {
        EXIT_HASH_ERROR
    } else {
        EXIT_FAILURE
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ZONPIN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Fmt { manifest, check } => {
            commands::fmt::run(&manifest, &config, check, json_output)
        }
        Commands::Deps { manifest } => commands::deps::run(&manifest, json_output),
        Commands::Hash { dir, files } => commands::hash::run(&dir, &config, files, json_output),
        Commands::Verify {
            manifest,
            sources,
            only,
        } => commands::verify::run(&manifest, &sources, &only, &config, json_output),
        Commands::Update {
            manifest,
            sources,
            only,
            keep_going,
            dry_run,
        } => commands::update::run(
            &manifest,
            &sources,
            &UpdateOptions {
                only,
                keep_going,
                dry_run,
            },
            &config,
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}
