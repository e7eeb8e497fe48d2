use anyhow::Context;
use colored::Colorize;

use lanshare_server::{LanShareServer, ServerConfig};
use lanshare_types::StoreKind;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(&cli.config, args),
        Command::Info => cmd_info(&load(&cli.config)?),
        Command::Config(args) => cmd_config(&cli.config, args),
    }
}

fn load(path: &std::path::Path) -> anyhow::Result<ServerConfig> {
    tracing::debug!(path = %path.display(), "loading configuration");
    ServerConfig::load_or_init(path)
        .with_context(|| format!("loading configuration from {}", path.display()))
}

fn cmd_serve(path: &std::path::Path, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load(path)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = args.data_root {
        config.data_root = root;
    }

    if config.show_startup_info {
        print_banner(&config);
    }

    let server = LanShareServer::new(config).context("opening storage")?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_info(config: &ServerConfig) -> anyhow::Result<()> {
    print_banner(config);
    Ok(())
}

fn print_banner(config: &ServerConfig) {
    println!(
        "{} {}",
        config.app_name.bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Share URL: {}", config.share_url().cyan().bold());
    println!("  Listening: {}", config.bind_addr);
    for kind in [StoreKind::File, StoreKind::Video] {
        println!(
            "  {:<9}  {} (keeps {})",
            format!("{kind}s:"),
            config.store_dir(kind).display(),
            config.capacity(kind).to_string().yellow()
        );
    }
    println!(
        "  Messages:  {} (keeps {})",
        config.history_path().display(),
        config.messages.capacity.to_string().yellow()
    );
    println!("Open the share URL from any device on the same network.");
}

fn cmd_config(path: &std::path::Path, args: ConfigArgs) -> anyhow::Result<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = load(path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!(
                    "{} {} already exists (use --force to overwrite)",
                    "!".yellow().bold(),
                    path.display()
                );
                return Ok(());
            }
            ServerConfig::default().save(path)?;
            println!("{} Wrote default configuration to {}", "✓".green().bold(), path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_init_respects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lanshare.toml");
        std::fs::write(&path, "app_name = \"Mine\"\n").unwrap();

        let keep = ConfigArgs {
            action: Some(ConfigAction::Init { force: false }),
        };
        cmd_config(&path, keep).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "app_name = \"Mine\"\n");

        let replace = ConfigArgs {
            action: Some(ConfigAction::Init { force: true }),
        };
        cmd_config(&path, replace).unwrap();
        let written = ServerConfig::load_or_init(&path).unwrap();
        assert_eq!(written, ServerConfig::default());
    }

    #[test]
    fn info_creates_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lanshare.toml");
        let config = load(&path).unwrap();
        cmd_info(&config).unwrap();
        assert!(path.exists());
    }
}
