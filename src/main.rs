//! `convention-mvc` command line.
//!
//! `serve` binds the configured project root and listens. Without
//! compiled-in handlers, controller files are served as view-only pages.
//! `routes` prints the routes a project root would bind.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use convention_mvc::config::{self, MvcConfig};
use convention_mvc::observability::{logging, metrics};
use convention_mvc::routing::{Application, Manifest};
use convention_mvc::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "convention-mvc")]
#[command(about = "Convention-based MVC server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind the project root and serve it
    Serve {
        /// TOML configuration file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the routes a project root binds
    Routes {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config } => serve(config).await,
        Commands::Routes { root } => routes(root).await,
    }
}

fn load(path: Option<PathBuf>) -> Result<MvcConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config(&path),
        None => {
            let mut config = MvcConfig::default();
            config::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            config::validate_config(&config).map_err(config::ConfigError::Validation)?;
            Ok(config)
        }
    }
}

async fn serve(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(path)?;
    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %config.project.root.display(),
        mode = config.project.mode.as_str(),
        "convention-mvc starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut app = Application::new(&config);
    let report = app.bind(&config.project.root, Manifest::new()).await?;
    tracing::info!(
        routes = report.routes.iter().filter(|r| r.bound).count(),
        layouts = report.layouts.len(),
        partials = report.partials,
        "Project bound"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    HttpServer::new(app.into_router(), &config)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn routes(root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = MvcConfig::default();
    config.project.root = root.clone();

    let mut app = Application::new(&config);
    let report = app.bind(&root, Manifest::new()).await?;

    for route in &report.routes {
        let status = if route.bound { "bound" } else { "unregistered" };
        println!("{:<10} {:<12} {:<30} {}", route.kind.as_str(), status, route.source, route.context);
        for path in &route.paths {
            println!("{:<10} {:<12} {:<30}   {}", "", "", "", path);
        }
    }
    Ok(())
}
