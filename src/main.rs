use anyhow::Result;
use clap::Parser;

use crudkit::cli::{Cli, Commands, ConfigCommands, generate_config, show_config};
use crudkit::config::StaticConfig;
use crudkit::runtime::run_server;
use crudkit::system::logging::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    // .env 中的 CK__* 变量参与配置覆盖
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let source = cli.config_source();

    match cli.command {
        Some(Commands::Config { action }) => match action {
            ConfigCommands::Generate { output_path, force } => {
                let path = generate_config(output_path.as_deref(), force)?;
                println!("Sample configuration written to {}", path);
            }
            ConfigCommands::Show => {
                println!("{}", show_config(&source)?);
            }
        },
        Some(Commands::Serve) | None => {
            let config = StaticConfig::load(&source)?;
            let _guard = init_logging(&config.logging)?;
            tracing::info!(
                "crudkit {} starting (profile: {})",
                env!("CARGO_PKG_VERSION"),
                source.resolved_profile().as_deref().unwrap_or("default")
            );
            run_server(config).await?;
        }
    }

    Ok(())
}
