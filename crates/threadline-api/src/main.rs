//! Threadline CLI and REST API entry point.
//!
//! Binary name: `tline`
//!
//! Parses CLI arguments, initializes the checkpoint store and turn
//! service, then dispatches to the appropriate command handler or
//! starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,threadline=debug",
        _ => "trace",
    };
    let otel = std::env::var("THREADLINE_OTEL").is_ok_and(|v| v == "1");
    threadline_observe::tracing_setup::init_tracing(filter, otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "tline", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| state.config.server.bind.clone());
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!("Threadline API listening on http://{addr}");
                println!("Press Ctrl+C to stop");
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("Server stopped.");
            }
        }

        Commands::Send { message, thread } => {
            cli::thread::send(&state, thread, &message, cli.json).await?;
        }

        Commands::History { thread } => {
            cli::thread::history(&state, &thread, cli.json).await?;
        }

        Commands::Export { thread } => {
            cli::thread::export(&state, &thread).await?;
        }

        Commands::Threads => {
            cli::thread::list(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    threadline_observe::tracing_setup::shutdown_tracing();

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
