//! # modex
//!
//! Extracts items, recipes and machines from a modded game install into one
//! JSON document.
//!
//! This is the entry point of the `modex` binary. It parses arguments, sets
//! up logging and panic reporting, runs the extraction and turns any error
//! into a formatted message and a non-zero exit code.

use camino::Utf8PathBuf;
use clap::Parser;
use modex_config::ModexToml;
use std::process::ExitCode;
use tracing::{error, info};

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "factorio-data.json";

/// Extract game data from a modded install
#[derive(Parser, Debug)]
#[command(name = "modex", version, about = "Extract game data from a modded install")]
pub struct Cli {
    /// Game directory containing 'data', 'mods' and 'config'
    #[arg(short, long, value_name = "GAME_DIR", env = "MODEX_GAME_DIR")]
    pub data: Option<Utf8PathBuf>,

    /// Where to write the JSON output
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    pub output: Utf8PathBuf,

    /// Configuration file (defaults to the nearest modex.toml)
    #[arg(short, long, value_name = "TOML")]
    pub config: Option<Utf8PathBuf>,

    /// Enablement list (defaults to <GAME_DIR>/mods/mod-list.json)
    #[arg(long, value_name = "FILE")]
    pub mod_list: Option<Utf8PathBuf>,

    /// Leave out the game's built-in packages
    #[arg(long)]
    pub no_vanilla: bool,

    /// Leave out user-added packages
    #[arg(long)]
    pub no_added: bool,

    /// Skip packages caught in dependency cycles instead of failing
    #[arg(long)]
    pub allow_cycles: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Command-line flags as the topmost configuration layer. Flags that were
    /// not given leave the field unset so lower layers still apply.
    pub fn config_layer(&self) -> ModexToml {
        let mut layer = ModexToml::default();
        layer.paths.game = self.data.clone();
        layer.paths.mod_list = self.mod_list.clone();
        if self.no_vanilla {
            layer.paths.vanilla = Some(false);
        }
        if self.no_added {
            layer.paths.added = Some(false);
        }
        if self.allow_cycles {
            layer.extract.allow_cycles = Some(true);
        }
        layer
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting modex v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let formatter = ErrorFormatter::new();
            let message = match err.downcast_ref::<modex_core::ModexError>() {
                Some(modex_error) => formatter.format_error(modex_error),
                None => formatter.format_simple(&format!("{:#}", err)),
            };
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: &Cli) -> anyhow::Result<()> {
    let ctx = CommandContext::new(cli.verbose)?;
    commands::extract::execute(cli, &ctx)
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let directives = ["modex", "modex_core", "modex_config", "modex_loader", "modex_extract"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("modex encountered an unexpected error: {}", panic_info);
        eprintln!("modex crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/modex-rs/modex/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
