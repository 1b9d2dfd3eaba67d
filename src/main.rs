use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use tokio::net::TcpListener;

use stationd::{
    cheer, complain,
    config::ServerConfig,
    handlers::HandlerRegistry,
    message::Message,
    oops, say,
    server::Server,
    VERSION,
};

#[derive(Parser)]
#[command(name = "stationd")]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve requests until interrupted
    Serve {
        #[arg(short = 'c', long)]
        config: PathBuf,

        /// Overrides the port from the config file
        #[arg(short = 'p', long)]
        port: Option<u16>,

        /// Overrides the server root from the config file
        #[arg(short = 'r', long)]
        root: Option<PathBuf>,
    },

    /// Validate a config file and list its routes
    Routes {
        #[arg(short = 'c', long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // access lines are logged at info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let outcome = match cli.commands {
        Commands::Serve { config, port, root } => serve(&config, port, root).await,
        Commands::Routes { config } => routes(&config),
    };

    if let Err(err) = outcome {
        oops!("{}", err);
        log::debug!("{:?}", err);
        std::process::exit(1);
    }

    Ok(())
}

fn routes(config: &Path) -> Result<()> {
    let config = ServerConfig::load(config)?;

    let routes = config.route_table();
    let handlers = HandlerRegistry::with_defaults(config.root()?);
    Message::print_routes(&routes, &handlers);

    match Message::unsupported_count(&routes, &handlers) {
        0 => cheer!("config is valid"),
        n => complain!("{} route(s) point at unregistered handlers", n),
    }
    Ok(())
}

async fn serve(config: &Path, port: Option<u16>, root: Option<PathBuf>) -> Result<()> {
    let mut config = ServerConfig::load(config)?;
    if let Some(port) = port {
        config.port = port;
    }
    if root.is_some() {
        config.root = root;
    }

    let root = config.root()?;
    if !root.is_dir() {
        return Err(eyre!("server root '{}' is not a directory", root.display()));
    }

    let routes = config.route_table();
    let handlers = HandlerRegistry::with_defaults(&root);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| eyre!("failed to bind port {}: {}", config.port, e))?;

    Message::print_listening(listener.local_addr()?, &root);
    Message::print_routes(&routes, &handlers);

    let server = Server::new(routes, handlers, config.limits())
        .with_max_connections(config.max_connections);

    server
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            say!("interrupted, finishing open connections");
        })
        .await?;

    cheer!("stopped");
    Ok(())
}
