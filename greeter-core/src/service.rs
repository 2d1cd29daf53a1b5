//! # Greeting Service
//!
//! The [`Greeter`] implements the four methods of `greeting.GreetingService`:
//!
//! | Method              | Shape                    | Reply                                    |
//! |---------------------|--------------------------|------------------------------------------|
//! | `Hello`             | unary                    | `Hello, <name>!`                         |
//! | `HelloServerStream` | server streaming         | `[i] Hello, <name>!` for `i` in `0..count` |
//! | `HelloClientStream` | client streaming         | `Hello, [<name> <name> ...]!`            |
//! | `HelloBiStreams`    | bidirectional streaming  | `Hello, <name>!` per received name       |
//!
//! Unary calls go through the [`UnaryInterceptor`], every streaming call (including
//! server streaming, whose single request is delivered as the only inbound message)
//! through the [`StreamInterceptor`]. Streaming handlers run on their own task and
//! write into a bounded channel that backs the response stream.
use crate::interceptor::{PassThrough, StreamInterceptor, UnaryInterceptor};
use crate::stream::{BoxServerStream, ChannelServerStream, STREAM_BUFFER};
use futures_util::Stream;
use greeting_service::{GreetingService, GreetingServiceServer, HelloRequest, HelloResponse};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Code, Request, Response, Status, Streaming};
use tonic_types::{ErrorDetails, StatusExt};

/// Full gRPC method names, as seen by interceptors.
pub mod method {
    pub const HELLO: &str = "/greeting.GreetingService/Hello";
    pub const HELLO_SERVER_STREAM: &str = "/greeting.GreetingService/HelloServerStream";
    pub const HELLO_CLIENT_STREAM: &str = "/greeting.GreetingService/HelloClientStream";
    pub const HELLO_BI_STREAMS: &str = "/greeting.GreetingService/HelloBiStreams";
}

pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error occurred";
pub const UNKNOWN_ERROR_DETAIL: &str = "detail reason of err";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Number of responses sent by `HelloServerStream`.
    pub response_count: usize,
    /// Pause after each `HelloServerStream` response.
    pub response_interval: Duration,
    /// Makes `Hello` fail with an `Unknown` status carrying a `DebugInfo` detail.
    pub inject_error: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            response_count: 5,
            response_interval: Duration::from_secs(1),
            inject_error: false,
        }
    }
}

/// Formats the greeting for a single name.
pub fn greet(name: &str) -> String {
    format!("Hello, {name}!")
}

/// Formats the greeting for a sequence of names, keeping their order.
pub fn greet_all<S: AsRef<str>>(names: &[S]) -> String {
    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    format!("Hello, [{}]!", names.join(" "))
}

/// The status returned by `Hello` when error injection is on.
pub fn unknown_error() -> Status {
    Status::with_error_details(
        Code::Unknown,
        UNKNOWN_ERROR_MESSAGE,
        ErrorDetails::with_debug_info(vec![], UNKNOWN_ERROR_DETAIL),
    )
}

async fn hello(
    request: Request<HelloRequest>,
    config: ServiceConfig,
) -> Result<Response<HelloResponse>, Status> {
    if config.inject_error {
        return Err(unknown_error());
    }

    let name = request.into_inner().name;
    Ok(Response::new(HelloResponse {
        message: greet(&name),
    }))
}

async fn hello_server_stream(
    mut stream: BoxServerStream<HelloRequest, HelloResponse>,
    config: ServiceConfig,
) -> Result<(), Status> {
    let request = stream
        .recv()
        .await?
        .ok_or_else(|| Status::invalid_argument("missing request message"))?;

    for i in 0..config.response_count {
        stream
            .send(HelloResponse {
                message: format!("[{i}] {}", greet(&request.name)),
            })
            .await?;
        tokio::time::sleep(config.response_interval).await;
    }

    Ok(())
}

async fn hello_client_stream(
    mut stream: BoxServerStream<HelloRequest, HelloResponse>,
) -> Result<(), Status> {
    let mut names = Vec::new();
    while let Some(request) = stream.recv().await? {
        names.push(request.name);
    }

    stream
        .send(HelloResponse {
            message: greet_all(&names),
        })
        .await
}

async fn hello_bi_streams(
    mut stream: BoxServerStream<HelloRequest, HelloResponse>,
) -> Result<(), Status> {
    while let Some(request) = stream.recv().await? {
        stream
            .send(HelloResponse {
                message: greet(&request.name),
            })
            .await?;
    }

    Ok(())
}

/// The `greeting.GreetingService` handler.
///
/// `U` intercepts unary calls, `S` intercepts streaming calls. Both default to
/// [`PassThrough`].
#[derive(Debug, Clone, Default)]
pub struct Greeter<U = PassThrough, S = PassThrough> {
    config: ServiceConfig,
    unary: U,
    stream: S,
}

impl Greeter {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            unary: PassThrough,
            stream: PassThrough,
        }
    }
}

impl<U, S> Greeter<U, S>
where
    U: UnaryInterceptor,
    S: StreamInterceptor,
{
    pub fn with_unary_interceptor<I: UnaryInterceptor>(self, interceptor: I) -> Greeter<I, S> {
        Greeter {
            config: self.config,
            unary: interceptor,
            stream: self.stream,
        }
    }

    pub fn with_stream_interceptor<I: StreamInterceptor>(self, interceptor: I) -> Greeter<U, I> {
        Greeter {
            config: self.config,
            unary: self.unary,
            stream: interceptor,
        }
    }

    /// Wraps the handler into the `tonic` service to be registered on a server.
    pub fn into_service(self) -> GreetingServiceServer<Self> {
        GreetingServiceServer::new(self)
    }

    /// Runs `handler` on its own task over a stream reading from `inbound`.
    ///
    /// Returns the response stream. A handler error is delivered as the last item.
    fn spawn_stream<F, Fut>(
        &self,
        method: &'static str,
        inbound: impl Stream<Item = Result<HelloRequest, Status>> + Send + 'static,
        handler: F,
    ) -> ReceiverStream<Result<HelloResponse, Status>>
    where
        F: FnOnce(BoxServerStream<HelloRequest, HelloResponse>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Status>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let stream: BoxServerStream<HelloRequest, HelloResponse> =
            Box::new(ChannelServerStream::new(inbound, tx.clone()));
        let interceptor = self.stream.clone();

        tokio::spawn(async move {
            if let Err(status) = interceptor.intercept(method, stream, handler).await {
                // The client may already be gone, nobody is left to tell.
                let _ = tx.send(Err(status)).await;
            }
        });

        ReceiverStream::new(rx)
    }
}

#[tonic::async_trait]
impl<U, S> GreetingService for Greeter<U, S>
where
    U: UnaryInterceptor,
    S: StreamInterceptor,
{
    type HelloServerStreamStream = ReceiverStream<Result<HelloResponse, Status>>;
    type HelloBiStreamsStream = ReceiverStream<Result<HelloResponse, Status>>;

    async fn hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloResponse>, Status> {
        let config = self.config;
        self.unary
            .intercept(method::HELLO, request, move |request| hello(request, config))
            .await
    }

    async fn hello_server_stream(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<Self::HelloServerStreamStream>, Status> {
        let config = self.config;
        let inbound = tokio_stream::once(Ok(request.into_inner()));

        Ok(Response::new(self.spawn_stream(
            method::HELLO_SERVER_STREAM,
            inbound,
            move |stream| hello_server_stream(stream, config),
        )))
    }

    async fn hello_client_stream(
        &self,
        request: Request<Streaming<HelloRequest>>,
    ) -> Result<Response<HelloResponse>, Status> {
        // A single slot: the handler sends exactly one response.
        let (tx, mut rx) = mpsc::channel::<Result<HelloResponse, Status>>(1);
        let stream: BoxServerStream<HelloRequest, HelloResponse> =
            Box::new(ChannelServerStream::new(request.into_inner(), tx));

        self.stream
            .intercept(method::HELLO_CLIENT_STREAM, stream, hello_client_stream)
            .await?;

        match rx.recv().await {
            Some(response) => response.map(Response::new),
            None => Err(Status::internal("the handler finished without a response")),
        }
    }

    async fn hello_bi_streams(
        &self,
        request: Request<Streaming<HelloRequest>>,
    ) -> Result<Response<Self::HelloBiStreamsStream>, Status> {
        Ok(Response::new(self.spawn_stream(
            method::HELLO_BI_STREAMS,
            request.into_inner(),
            hello_bi_streams,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    fn instant() -> ServiceConfig {
        ServiceConfig {
            response_interval: Duration::ZERO,
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn greets_a_single_name() {
        assert_eq!(greet("Alice"), "Hello, Alice!");
        assert_eq!(greet(""), "Hello, !");
    }

    #[test]
    fn greets_names_in_order() {
        assert_eq!(greet_all(&["a", "b", "c"]), "Hello, [a b c]!");
        assert_eq!(greet_all::<String>(&[]), "Hello, []!");
    }

    #[test]
    fn injected_error_carries_debug_info() {
        let status = unknown_error();

        assert_eq!(status.code(), Code::Unknown);
        assert_eq!(status.message(), UNKNOWN_ERROR_MESSAGE);

        let debug_info = status.get_details_debug_info().expect("debug info detail");
        assert_eq!(debug_info.detail, UNKNOWN_ERROR_DETAIL);
    }

    #[tokio::test]
    async fn unary_replies_with_a_greeting() {
        let greeter = Greeter::new(instant());

        let response = greeter
            .hello(Request::new(HelloRequest {
                name: "Alice".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(response.into_inner().message, "Hello, Alice!");
    }

    #[tokio::test]
    async fn unary_fails_when_error_injection_is_on() {
        let greeter = Greeter::new(ServiceConfig {
            inject_error: true,
            ..instant()
        });

        let status = greeter
            .hello(Request::new(HelloRequest {
                name: "Alice".to_string(),
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::Unknown);
    }

    #[tokio::test]
    async fn server_stream_sends_numbered_greetings() {
        let greeter = Greeter::new(ServiceConfig {
            response_count: 3,
            ..instant()
        });

        let stream = greeter
            .hello_server_stream(Request::new(HelloRequest {
                name: "Bob".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        let messages: Vec<String> = stream.map(|r| r.unwrap().message).collect().await;
        assert_eq!(
            messages,
            vec!["[0] Hello, Bob!", "[1] Hello, Bob!", "[2] Hello, Bob!"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn server_stream_waits_between_responses() {
        let greeter = Greeter::new(ServiceConfig::default());
        let start = tokio::time::Instant::now();

        let stream = greeter
            .hello_server_stream(Request::new(HelloRequest {
                name: "Bob".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        let count = stream.map(|r| r.unwrap()).collect::<Vec<_>>().await.len();

        assert_eq!(count, 5);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn client_stream_handler_aggregates_names() {
        let (tx, mut rx) = mpsc::channel::<Result<HelloResponse, Status>>(1);
        let inbound = tokio_stream::iter(
            ["x", "y"].map(|name| {
                Ok(HelloRequest {
                    name: name.to_string(),
                })
            }),
        );

        hello_client_stream(Box::new(ChannelServerStream::new(inbound, tx)))
            .await
            .unwrap();

        let response = rx.recv().await.unwrap();
        assert_eq!(response.unwrap().message, "Hello, [x y]!");
    }

    #[tokio::test]
    async fn bi_streams_handler_answers_each_name() {
        let (tx, rx) = mpsc::channel::<Result<HelloResponse, Status>>(4);
        let inbound = tokio_stream::iter(
            ["x", "y"].map(|name| {
                Ok(HelloRequest {
                    name: name.to_string(),
                })
            }),
        );

        hello_bi_streams(Box::new(ChannelServerStream::new(inbound, tx)))
            .await
            .unwrap();

        let messages: Vec<String> = ReceiverStream::new(rx)
            .map(|r| r.unwrap().message)
            .collect()
            .await;
        assert_eq!(messages, vec!["Hello, x!", "Hello, y!"]);
    }
}
