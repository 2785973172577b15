use anyhow::Result;
use clap::{Parser, Subcommand};
use runtime::{AppConfig, AppConfigProvider, CliArgs};

// Adapter to make AppConfigProvider implement modkit::ConfigProvider
struct ModkitConfigAdapter(std::sync::Arc<AppConfigProvider>);

impl modkit::ConfigProvider for ModkitConfigAdapter {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get_module_config(module_name)
    }
}

use api_ingress::ApiIngress;
use modkit::runtime::{run, RunOptions, ShutdownOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use users::{domain::store::UserStore, Users};

/// Users Server - in-memory user directory over HTTP
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "Users Server - in-memory user CRUD over HTTP")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Users Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!(addr = %config.server_addr(), "Initializing modules...");

    let config_provider = Arc::new(ModkitConfigAdapter(Arc::new(AppConfigProvider::new(
        config.clone(),
    ))));

    let request_timeout =
        (config.server.timeout_sec > 0).then(|| Duration::from_secs(config.server.timeout_sec));
    let host = Arc::new(ApiIngress::new(config.server_addr(), request_timeout));

    // The store lives for the whole process and is handed to the module explicitly.
    let store = Arc::new(UserStore::new());

    let run_options = RunOptions {
        modules_cfg: config_provider,
        host,
        modules: vec![Arc::new(Users::new(store))],
        shutdown: ShutdownOptions::Signals,
    };

    run(run_options).await
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Module sections are parsed strictly here; at runtime a bad section falls back to defaults.
    if let Some(section) = config.modules.get(api_ingress::MODULE_NAME) {
        serde_json::from_value::<api_ingress::ApiIngressConfig>(section.clone())
            .map_err(|e| anyhow::anyhow!("invalid modules.{}: {}", api_ingress::MODULE_NAME, e))?;
    }

    println!("Configuration check passed");
    println!("Server listens on {}", config.server_addr());
    println!("{}", config.to_yaml()?);
    Ok(())
}
