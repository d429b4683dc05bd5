use anyhow::{Context, Result};
use backdrop::{Renderer, Stage};
use bgconfig::Config;
use tracing_subscriber::EnvFilter;

use crate::bindings::renderer_config;
use crate::cli::{Cli, Command, ShadersArgs};
use crate::paths::ConfigLocation;

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    match cli.command {
        Some(Command::Shaders(args)) => print_shaders(&args),
        Some(Command::Check) => check_config(&ConfigLocation::resolve(cli.config)?),
        None => {
            let location = ConfigLocation::resolve(cli.config)?;
            let config = load_config(&location)?;
            let renderer_config = renderer_config(&config, &cli.run);
            tracing::info!(
                config = %location.path().display(),
                image = ?renderer_config.image,
                tier = %renderer_config.tier,
                "starting background preview"
            );
            let mut renderer = Renderer::new(renderer_config);
            renderer.run()
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit config paths must exist; the default location is optional.
fn load_config(location: &ConfigLocation) -> Result<Config> {
    let path = location.path();
    let config = if location.is_explicit() {
        Config::load(path)
    } else {
        Config::load_or_default(path)
    };
    let config =
        config.with_context(|| format!("failed to load config from {}", path.display()))?;
    tracing::debug!(path = %path.display(), "resolved configuration");
    Ok(config)
}

fn print_shaders(args: &ShadersArgs) -> Result<()> {
    let program = args.tier.program();
    match args.stage {
        Some(stage) => print!("{}", program.source(stage)),
        None => {
            for stage in [Stage::Vertex, Stage::Fragment] {
                println!("// {stage} shader ({} tier)", program.tier);
                print!("{}", program.source(stage));
                println!();
            }
        }
    }
    Ok(())
}

fn check_config(location: &ConfigLocation) -> Result<()> {
    let config = load_config(location)?;
    println!("# config: {}", location.path().display());
    print!("{}", config.to_toml_string()?);
    Ok(())
}
