//! # Greeter Client
//!
//! A client for `greeting.GreetingService` that routes every call through client-side
//! interceptors.
//!
//! * [`GreeterClient::hello`] is a plain unary call wrapped by the [`UnaryInterceptor`].
//! * The streaming methods return a [`ClientStream`] decorated by the
//!   [`ClientStreamInterceptor`]. The call itself runs on a spawned task so the caller
//!   can interleave `send` and `recv` freely.
//!
//! ## Example
//!
//! ```rust,no_run
//! use greeter_core::greeting_service::HelloRequest;
//! use greeter_core::{GreeterClient, LoggingInterceptor};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GreeterClient::connect("http://localhost:8081")
//!     .await?
//!     .with_unary_interceptor(LoggingInterceptor::client());
//!
//! let reply = client.hello("Alice").await?;
//! assert_eq!(reply.message, "Hello, Alice!");
//!
//! let mut stream = client.hello_bi_streams();
//! stream.send(HelloRequest { name: "Bob".into() }).await?;
//! stream.close_send();
//! while let Some(reply) = stream.recv().await? {
//!     println!("{}", reply.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`ClientStream`]: crate::stream::ClientStream
use crate::interceptor::{ClientStreamInterceptor, PassThrough, UnaryInterceptor};
use crate::service::method;
use crate::stream::{BoxClientStream, ChannelClientStream, STREAM_BUFFER};
use futures_util::{Stream, TryStreamExt, stream};
use greeting_service::{GreetingServiceClient, HelloRequest, HelloResponse};
use std::fmt::Debug;
use std::future::Future;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{
    Request, Status,
    transport::{Channel, Endpoint},
};

/// Errors that can occur when connecting to a gRPC server.
#[derive(Debug, thiserror::Error)]
pub enum ClientConnectError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
}

/// A `greeting.GreetingService` client.
///
/// `U` intercepts unary calls, `C` intercepts the opening of streaming calls. Both
/// default to [`PassThrough`].
#[derive(Debug, Clone)]
pub struct GreeterClient<U = PassThrough, C = PassThrough> {
    inner: GreetingServiceClient<Channel>,
    unary: U,
    stream: C,
}

impl GreeterClient {
    /// Connects to a gRPC server.
    ///
    /// # Arguments
    ///
    /// * `addr` - The server URI (e.g., `http://localhost:8081`).
    pub async fn connect(addr: &str) -> Result<Self, ClientConnectError> {
        let endpoint = Endpoint::new(addr.to_string())
            .map_err(|e| ClientConnectError::InvalidUrl(addr.to_string(), e))?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ClientConnectError::ConnectionFailed(addr.to_string(), e))?;

        Ok(Self::from_channel(channel))
    }

    /// Creates a client from an already established channel.
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            inner: GreetingServiceClient::new(channel),
            unary: PassThrough,
            stream: PassThrough,
        }
    }
}

impl<U, C> GreeterClient<U, C>
where
    U: UnaryInterceptor,
    C: ClientStreamInterceptor,
{
    pub fn with_unary_interceptor<I: UnaryInterceptor>(self, interceptor: I) -> GreeterClient<I, C> {
        GreeterClient {
            inner: self.inner,
            unary: interceptor,
            stream: self.stream,
        }
    }

    pub fn with_stream_interceptor<I: ClientStreamInterceptor>(
        self,
        interceptor: I,
    ) -> GreeterClient<U, I> {
        GreeterClient {
            inner: self.inner,
            unary: self.unary,
            stream: interceptor,
        }
    }

    /// Unary call: one name, one greeting.
    pub async fn hello(&self, name: impl Into<String>) -> Result<HelloResponse, Status> {
        let request = Request::new(HelloRequest { name: name.into() });
        let mut inner = self.inner.clone();

        let response = self
            .unary
            .intercept(method::HELLO, request, move |request| async move {
                inner.hello(request).await
            })
            .await?;

        Ok(response.into_inner())
    }

    /// Server streaming call: sends `name` and closes the send side, the returned
    /// stream yields the server's greetings.
    pub async fn hello_server_stream(
        &self,
        name: impl Into<String>,
    ) -> Result<BoxClientStream<HelloRequest, HelloResponse>, Status> {
        let mut inner = self.inner.clone();

        let mut stream = self.open(method::HELLO_SERVER_STREAM, move |mut requests| async move {
            let request = requests.recv().await.ok_or_else(|| {
                Status::cancelled("the stream was closed before a request was sent")
            })?;

            inner
                .hello_server_stream(request)
                .await
                .map(|response| response.into_inner())
        });

        stream.send(HelloRequest { name: name.into() }).await?;
        stream.close_send();

        Ok(stream)
    }

    /// Client streaming call. Send names, then call
    /// [`close_send`](crate::stream::ClientStream::close_send); the next `recv`
    /// yields the single aggregated greeting.
    pub fn hello_client_stream(&self) -> BoxClientStream<HelloRequest, HelloResponse> {
        let mut inner = self.inner.clone();

        self.open(method::HELLO_CLIENT_STREAM, move |requests| async move {
            let response = inner
                .hello_client_stream(ReceiverStream::new(requests))
                .await?
                .into_inner();

            Ok::<_, Status>(stream::once(async move { Ok(response) }))
        })
    }

    /// Bidirectional streaming call: one greeting per name sent.
    pub fn hello_bi_streams(&self) -> BoxClientStream<HelloRequest, HelloResponse> {
        let mut inner = self.inner.clone();

        self.open(method::HELLO_BI_STREAMS, move |requests| async move {
            inner
                .hello_bi_streams(ReceiverStream::new(requests))
                .await
                .map(|response| response.into_inner())
        })
    }

    /// Starts `call` on its own task, fed by the send side of the returned stream.
    ///
    /// The inbound side yields the call's responses, or its status if it failed.
    fn open<Res, F, Fut, St>(
        &self,
        method: &'static str,
        call: F,
    ) -> BoxClientStream<HelloRequest, Res>
    where
        Res: Debug + Send + 'static,
        F: FnOnce(mpsc::Receiver<HelloRequest>) -> Fut,
        Fut: Future<Output = Result<St, Status>> + Send + 'static,
        St: Stream<Item = Result<Res, Status>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let call = tokio::spawn(call(rx));

        let inbound = stream::once(async move {
            call.await
                .map_err(|e| Status::internal(format!("the call task failed: {e}")))?
        })
        .try_flatten();

        let stream: BoxClientStream<HelloRequest, Res> =
            Box::new(ChannelClientStream::new(tx, inbound));

        self.stream.intercept(method, stream)
    }
}
