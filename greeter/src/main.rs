//! # Greeter CLI
//!
//! The entry point for the `greeter` command-line tool.
//!
//! `greeter serve` runs the greeting service with logging interceptors on every call
//! shape. `greeter client` connects to it and opens the interactive menu.
//!
//! Logs go to stderr and are filtered through `RUST_LOG` (default `info`).
mod cli;
mod formatter;
mod menu;

use clap::Parser;
use cli::{Cli, Commands};
use formatter::FormattedString;
use greeter_core::{Greeter, GreeterClient, LoggingInterceptor, ServerConfig, server};
use menu::Menu;
use std::process;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Cli::parse();

    match args.command {
        Commands::Serve(args) => serve(args.into()).await,
        Commands::Client { url } => client(&url).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: ServerConfig) {
    let listener = unwrap_or_exit(server::bind(config.addr).await);

    let greeter = Greeter::new(config.service)
        .with_unary_interceptor(LoggingInterceptor::server())
        .with_stream_interceptor(LoggingInterceptor::server());

    unwrap_or_exit(server::run(listener, greeter).await);
}

async fn client(url: &str) {
    println!("start gRPC Client.");

    let client = unwrap_or_exit(GreeterClient::connect(url).await)
        .with_unary_interceptor(LoggingInterceptor::client())
        .with_stream_interceptor(LoggingInterceptor::client());

    let menu = Menu::new(client, BufReader::new(tokio::io::stdin()), std::io::stdout());

    unwrap_or_exit(menu.run().await);
}

fn unwrap_or_exit<T, E>(result: Result<T, E>) -> T
where
    E: Into<FormattedString>,
{
    match result {
        Ok(value) => value,
        Err(err) => {
            let err: FormattedString = err.into();
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
