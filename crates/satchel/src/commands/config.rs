//! Config command - show the effective session configuration.

use anyhow::Result;
use clap::Args;
use satchel_session::SessionSection;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let config = ctx.session_config()?;
    let section = SessionSection::from(&config);

    if ctx.verbose {
        match &ctx.config_path {
            Some(path) => eprintln!("# loaded from {}", path.display()),
            None => eprintln!("# built-in defaults"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&section)?);
    } else {
        print!("{}", section.to_toml()?);
    }

    Ok(())
}
