//! terrasync - Main entry point
//!
//! Synchronizes (or checks) a local copy of a TerraSync scenery repository.
//!
//! Exit status: 0 on success, 1 on error, 2 when check mode found a
//! difference.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use terrasync::config::Config;
use terrasync::sync::{Mode, SyncOptions, SyncOutcome, TerraSync};
use terrasync::transfer::{Credentials, HttpTransport};
use terrasync::{utils, VirtualPath};

/// Exit status when check mode finds a difference.
const EXIT_MISMATCH: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server base URL (http or https)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Local directory holding the mirror
    #[arg(short, long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// HTTP basic authentication
    #[arg(long, value_name = "USERNAME:PASSWORD")]
    auth: Option<Credentials>,

    /// Only process this repository directory (e.g. /Terrain/w010n50)
    #[arg(long, value_name = "PATH")]
    subdir: Option<String>,

    /// Don't descend into directories whose .dirindex already matches
    #[arg(short, long)]
    quick: bool,

    /// Remove local files and directories absent from the server
    #[arg(short, long)]
    remove_orphan: bool,

    /// Main mode of operation: sync or check
    #[arg(long, value_name = "MODE")]
    mode: Option<Mode>,

    /// Print a report at the end of the run
    #[arg(long)]
    report: bool,

    /// Northern edge of the download rectangle
    #[arg(long, allow_negative_numbers = true)]
    top: Option<f64>,

    /// Southern edge of the download rectangle
    #[arg(long, allow_negative_numbers = true)]
    bottom: Option<f64>,

    /// Western edge of the download rectangle
    #[arg(long, allow_negative_numbers = true)]
    left: Option<f64>,

    /// Eastern edge of the download rectangle
    #[arg(long, allow_negative_numbers = true)]
    right: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    /// Command-line flags win over the configuration file.
    fn merge_into(self, config: &mut Config) {
        if let Some(url) = self.url {
            config.server.url = url;
        }
        if let Some(auth) = self.auth {
            config.server.username = Some(auth.username);
            config.server.password = Some(auth.password);
        }
        if let Some(target) = self.target {
            config.sync.target = target;
        }
        if let Some(subdir) = self.subdir {
            config.sync.subdir = subdir;
        }
        if let Some(mode) = self.mode {
            config.sync.mode = mode;
        }
        config.sync.quick |= self.quick;
        config.sync.remove_orphan |= self.remove_orphan;
        config.sync.report |= self.report;

        let bounds = &mut config.bounds;
        bounds.top = self.top.or(bounds.top);
        bounds.bottom = self.bottom.or(bounds.bottom);
        bounds.left = self.left.or(bounds.left);
        bounds.right = self.right.or(bounds.right);

        if let Some(level) = self.log_level {
            config.log.level = level;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("terrasync: error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    args.merge_into(&mut config);

    utils::logger::init(&config.log.level)?;

    tracing::info!("Starting terrasync v{}", env!("CARGO_PKG_VERSION"));

    if config.sync.mode == Mode::Check && config.sync.remove_orphan {
        bail!("'check' mode never modifies the local copy; it can't be combined with --remove-orphan");
    }

    let options = SyncOptions {
        mode: config.sync.mode,
        quick: config.sync.quick,
        remove_orphans: config.sync.remove_orphan,
        boundaries: config.bounds.to_boundaries()?,
    };

    let transport = HttpTransport::new(
        &config.server.url,
        config.transport.http_options(config.server.credentials()),
    )?;
    tracing::info!("Server: {}", transport.base_url());

    let mut engine = TerraSync::new(transport, &config.sync.target, options)?;
    let start = VirtualPath::new(&config.sync.subdir);

    let code = match engine.run(&start).await? {
        SyncOutcome::Completed => ExitCode::SUCCESS,
        SyncOutcome::MismatchFound(failure) => {
            println!(
                "terrasync: exiting from '{}' mode because {}.",
                Mode::Check,
                failure.explain()
            );
            ExitCode::from(EXIT_MISMATCH)
        }
    };

    if config.sync.report {
        println!("\n{}", engine.report());
    }

    Ok(code)
}
