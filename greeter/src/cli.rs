//! # CLI
//!
//! This module defines the command-line interface of `greeter` using `clap`.
use clap::{Args, Parser, Subcommand};
use greeter_core::server::DEFAULT_PORT;
use greeter_core::{ServerConfig, ServiceConfig};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "greeter", version, about = "Greeting gRPC server and interactive client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the greeting server until Ctrl-C
    ///
    /// Every call is logged by the server-side interceptors. Set `RUST_LOG` to change
    /// the log level.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// greeter serve --addr 127.0.0.1:8081 --interval-ms 200
    /// ```
    Serve(ServeArgs),

    /// Start the interactive client
    ///
    /// Presents a menu to invoke each call shape of the service.
    Client {
        /// The server URL to connect to
        #[arg(default_value = "http://localhost:8081")]
        url: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value_t = SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))]
    pub addr: SocketAddr,

    /// Number of responses sent by HelloServerStream
    #[arg(long, default_value_t = 5)]
    pub responses: usize,

    /// Pause after each HelloServerStream response, in milliseconds
    #[arg(long = "interval-ms", default_value_t = 1000)]
    pub interval_ms: u64,

    /// Make the unary Hello call fail with an Unknown status carrying error details
    #[arg(long)]
    pub inject_error: bool,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        ServerConfig {
            addr: args.addr,
            service: ServiceConfig {
                response_count: args.responses,
                response_interval: Duration::from_millis(args.interval_ms),
                inject_error: args.inject_error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults_match_the_default_server_config() {
        let cli = Cli::try_parse_from(["greeter", "serve"]).unwrap();

        let Commands::Serve(args) = cli.command else {
            panic!("expected the serve command");
        };

        assert_eq!(ServerConfig::from(args), ServerConfig::default());
    }

    #[test]
    fn serve_flags_override_the_service_config() {
        let cli = Cli::try_parse_from([
            "greeter",
            "serve",
            "--addr",
            "127.0.0.1:9000",
            "--responses",
            "2",
            "--interval-ms",
            "10",
            "--inject-error",
        ])
        .unwrap();

        let Commands::Serve(args) = cli.command else {
            panic!("expected the serve command");
        };
        let config = ServerConfig::from(args);

        assert_eq!(config.addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.service.response_count, 2);
        assert_eq!(config.service.response_interval, Duration::from_millis(10));
        assert!(config.service.inject_error);
    }

    #[test]
    fn client_url_defaults_to_localhost() {
        let cli = Cli::try_parse_from(["greeter", "client"]).unwrap();

        match cli.command {
            Commands::Client { url } => assert_eq!(url, "http://localhost:8081"),
            Commands::Serve(_) => panic!("expected the client command"),
        }
    }
}
