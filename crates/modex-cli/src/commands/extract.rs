//! The extraction command

use super::CommandContext;
use crate::Cli;
use modex_config::{ConfigLayering, ConfigLoader, ModexConfig};
use modex_extract::{Extraction, OutputTarget, Session};
use tracing::{debug, info};

/// Merge configuration, run a session and report the outcome
pub fn execute(cli: &Cli, ctx: &CommandContext) -> anyhow::Result<()> {
    let config = resolve_config(cli, ctx)?;
    debug!("Effective configuration: {:?}", config);

    let target = OutputTarget {
        path: ctx.cwd.join(&cli.output),
        pretty: cli.pretty,
    };

    info!("Extracting game data");
    let extraction = Session::new(&config)?.run(Some(&target))?;

    report(&extraction, &target, ctx);
    Ok(())
}

/// Defaults, then `modex.toml` (explicit or discovered), then flags
pub fn resolve_config(cli: &Cli, ctx: &CommandContext) -> anyhow::Result<ModexConfig> {
    let explicit = cli.config.as_ref().map(|path| ctx.cwd.join(path));
    let file_layer = ConfigLoader::new(ctx.cwd.clone()).load(explicit.as_deref())?;

    let mut flags = cli.config_layer();
    flags.paths.game = flags.paths.game.map(|game| ctx.cwd.join(game));
    flags.paths.mod_list = flags.paths.mod_list.map(|list| ctx.cwd.join(list));

    Ok(ConfigLayering::new()
        .with_optional_layer(file_layer)
        .with_layer(flags)
        .merge())
}

fn report(extraction: &Extraction, target: &OutputTarget, ctx: &CommandContext) {
    let errors = extraction.error_count();
    if errors > 0 {
        ctx.output
            .warn(&format!("Ignoring {} Lua error(s)", errors));
        if ctx.verbose {
            for failure in &extraction.failures {
                ctx.output.info(&format!("  {}", failure));
            }
        } else {
            ctx.output.info("  rerun with --verbose to list them");
        }
    }
    ctx.output
        .success(&format!("Extracted game data to {}", target.path));
}
