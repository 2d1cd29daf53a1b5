//! # Server
//!
//! Runs a [`Greeter`] on a TCP listener, next to the gRPC reflection service
//! (`grpc.reflection.v1`), until a shutdown signal arrives.
//!
//! Shutdown is graceful: the listener stops accepting and in-flight calls are allowed
//! to complete before [`serve`] returns.
use crate::interceptor::{StreamInterceptor, UnaryInterceptor};
use crate::service::{Greeter, ServiceConfig};
use greeting_service::FILE_DESCRIPTOR_SET;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::info;

pub const DEFAULT_PORT: u16 = 8081;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Failed to bind '{addr}': '{source}'")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to set up the reflection service: '{0}'")]
    Reflection(#[from] tonic_reflection::server::Error),
    #[error("Transport error: '{0}'")]
    Transport(#[from] tonic::transport::Error),
    #[error("Failed to listen for the shutdown signal: '{0}'")]
    Signal(#[source] std::io::Error),
    #[error("The server task failed: '{0}'")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub service: ServiceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            service: ServiceConfig::default(),
        }
    }
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })
}

/// Serves `greeter` and the reflection service on `listener` until `shutdown` resolves.
pub async fn serve<U, S>(
    listener: TcpListener,
    greeter: Greeter<U, S>,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<(), ServeError>
where
    U: UnaryInterceptor,
    S: StreamInterceptor,
{
    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "starting gRPC server");
    }

    Server::builder()
        .add_service(reflection)
        .add_service(greeter.into_service())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    info!("gRPC server stopped");
    Ok(())
}

/// Serves on a background task and shuts down gracefully on Ctrl-C.
pub async fn run<U, S>(listener: TcpListener, greeter: Greeter<U, S>) -> Result<(), ServeError>
where
    U: UnaryInterceptor,
    S: StreamInterceptor,
{
    run_until(listener, greeter, tokio::signal::ctrl_c()).await
}

/// Serves on a background task until `signal` resolves, then shuts down gracefully.
///
/// If the server fails first, its error is returned right away.
pub async fn run_until<U, S>(
    listener: TcpListener,
    greeter: Greeter<U, S>,
    signal: impl Future<Output = std::io::Result<()>>,
) -> Result<(), ServeError>
where
    U: UnaryInterceptor,
    S: StreamInterceptor,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, greeter, async {
        drop(shutdown_rx.await)
    }));

    supervise(server, shutdown_tx, signal).await
}

async fn supervise(
    mut server: JoinHandle<Result<(), ServeError>>,
    shutdown: oneshot::Sender<()>,
    signal: impl Future<Output = std::io::Result<()>>,
) -> Result<(), ServeError> {
    tokio::select! {
        result = &mut server => return result?,
        signal = signal => signal.map_err(ServeError::Signal)?,
    }

    info!("stopping gRPC server...");
    // Only fails if the server task is already gone, the join reports how it ended.
    let _ = shutdown.send(());

    server.await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    fn local() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
    }

    #[tokio::test]
    async fn supervise_returns_server_failure_without_waiting_for_the_signal() {
        let (shutdown_tx, _shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async {
            Err(ServeError::Bind {
                addr: local(),
                source: io::Error::from(io::ErrorKind::AddrInUse),
            })
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(server, shutdown_tx, std::future::pending()),
        )
        .await
        .expect("supervise waited for the signal");

        assert!(matches!(result, Err(ServeError::Bind { .. })));
    }

    #[tokio::test]
    async fn supervise_reports_a_failed_signal_listener() {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async {
            drop(shutdown_rx.await);
            Ok(())
        });

        let result = supervise(server, shutdown_tx, async {
            Err(io::Error::other("no signal handler"))
        })
        .await;

        assert!(matches!(result, Err(ServeError::Signal(_))));
    }

    #[tokio::test]
    async fn run_until_stops_the_server_when_the_signal_fires() {
        let listener = bind(local()).await.unwrap();

        run_until(listener, <Greeter>::default(), async { Ok(()) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bind_reports_the_address_in_use() {
        let taken = bind(local()).await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = bind(addr).await.unwrap_err();

        assert!(matches!(err, ServeError::Bind { addr: a, .. } if a == addr));
    }
}
