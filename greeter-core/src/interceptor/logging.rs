//! # Logging Interceptor
//!
//! Logs every call and every stream event through `tracing`:
//!
//! | Event                         | Message             |
//! |-------------------------------|---------------------|
//! | before a unary call           | `[pre] unary`       |
//! | after a unary call            | `[post] unary`      |
//! | stream opened                 | `[pre stream]`      |
//! | stream closed (server)        | `[post stream]`     |
//! | message received              | `[pre message]` (server) / `[post message]` (client) |
//! | message sent                  | `[post message]` (server) / `[pre message]` (client) |
//! | send side closed (client)     | `[post close send]` |
//!
//! The end-of-stream signal is not logged as a received message.
use super::{ClientStreamInterceptor, StreamInterceptor, UnaryInterceptor};
use crate::stream::{BoxClientStream, BoxServerStream, ClientStream, ServerStream};
use std::fmt::{self, Debug, Display};
use std::future::Future;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

/// The end of the connection an interceptor is installed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Server,
    Client,
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Server => f.write_str("server"),
            Side::Client => f.write_str("client"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoggingInterceptor {
    side: Side,
}

impl LoggingInterceptor {
    pub fn server() -> Self {
        Self { side: Side::Server }
    }

    pub fn client() -> Self {
        Self { side: Side::Client }
    }
}

impl UnaryInterceptor for LoggingInterceptor {
    fn intercept<Req, Res, F, Fut>(
        &self,
        method: &'static str,
        request: Request<Req>,
        handler: F,
    ) -> impl Future<Output = Result<Response<Res>, Status>> + Send
    where
        Req: Debug + Send,
        Res: Debug + Send,
        F: FnOnce(Request<Req>) -> Fut + Send,
        Fut: Future<Output = Result<Response<Res>, Status>> + Send,
    {
        let side = self.side;

        async move {
            info!(%side, method, request = ?request.get_ref(), "[pre] unary");

            let result = handler(request).await;

            match &result {
                Ok(response) => info!(%side, method, response = ?response.get_ref(), "[post] unary"),
                Err(status) => warn!(
                    %side,
                    method,
                    code = ?status.code(),
                    error = status.message(),
                    "[post] unary"
                ),
            }

            result
        }
    }
}

impl StreamInterceptor for LoggingInterceptor {
    fn intercept<Req, Res, F, Fut>(
        &self,
        method: &'static str,
        stream: BoxServerStream<Req, Res>,
        handler: F,
    ) -> impl Future<Output = Result<(), Status>> + Send
    where
        Req: Debug + Send + 'static,
        Res: Debug + Send + 'static,
        F: FnOnce(BoxServerStream<Req, Res>) -> Fut + Send,
        Fut: Future<Output = Result<(), Status>> + Send,
    {
        let side = self.side;

        async move {
            info!(%side, method, "[pre stream]");

            let stream: BoxServerStream<Req, Res> =
                Box::new(LoggingServerStream::new(stream, side, method));
            let result = handler(stream).await;

            match &result {
                Ok(()) => info!(%side, method, "[post stream]"),
                Err(status) => warn!(
                    %side,
                    method,
                    code = ?status.code(),
                    error = status.message(),
                    "[post stream]"
                ),
            }

            result
        }
    }
}

impl ClientStreamInterceptor for LoggingInterceptor {
    fn intercept<Req, Res>(
        &self,
        method: &'static str,
        stream: BoxClientStream<Req, Res>,
    ) -> BoxClientStream<Req, Res>
    where
        Req: Debug + Send + 'static,
        Res: Debug + Send + 'static,
    {
        info!(side = %self.side, method, "[pre stream]");
        Box::new(LoggingClientStream::new(stream, self.side, method))
    }
}

/// A [`ServerStream`] that logs every message going through it.
pub struct LoggingServerStream<Req, Res> {
    inner: BoxServerStream<Req, Res>,
    side: Side,
    method: &'static str,
}

impl<Req, Res> LoggingServerStream<Req, Res> {
    pub fn new(inner: BoxServerStream<Req, Res>, side: Side, method: &'static str) -> Self {
        Self {
            inner,
            side,
            method,
        }
    }
}

#[tonic::async_trait]
impl<Req, Res> ServerStream<Req, Res> for LoggingServerStream<Req, Res>
where
    Req: Debug + Send + 'static,
    Res: Debug + Send + 'static,
{
    async fn recv(&mut self) -> Result<Option<Req>, Status> {
        let received = self.inner.recv().await;

        match &received {
            Ok(Some(payload)) => {
                info!(side = %self.side, method = self.method, ?payload, "[pre message]")
            }
            Ok(None) => {}
            Err(status) => warn!(
                side = %self.side,
                method = self.method,
                code = ?status.code(),
                error = status.message(),
                "[pre message] receive failed"
            ),
        }

        received
    }

    async fn send(&mut self, message: Res) -> Result<(), Status> {
        info!(side = %self.side, method = self.method, payload = ?message, "[post message]");
        self.inner.send(message).await
    }
}

/// A [`ClientStream`] that logs every message going through it and the close of its send side.
pub struct LoggingClientStream<Req, Res> {
    inner: BoxClientStream<Req, Res>,
    side: Side,
    method: &'static str,
}

impl<Req, Res> LoggingClientStream<Req, Res> {
    pub fn new(inner: BoxClientStream<Req, Res>, side: Side, method: &'static str) -> Self {
        Self {
            inner,
            side,
            method,
        }
    }
}

#[tonic::async_trait]
impl<Req, Res> ClientStream<Req, Res> for LoggingClientStream<Req, Res>
where
    Req: Debug + Send + 'static,
    Res: Debug + Send + 'static,
{
    async fn send(&mut self, message: Req) -> Result<(), Status> {
        info!(side = %self.side, method = self.method, payload = ?message, "[pre message]");
        self.inner.send(message).await
    }

    fn close_send(&mut self) {
        self.inner.close_send();
        info!(side = %self.side, method = self.method, "[post close send]");
    }

    async fn recv(&mut self) -> Result<Option<Res>, Status> {
        let received = self.inner.recv().await;

        match &received {
            Ok(Some(payload)) => {
                info!(side = %self.side, method = self.method, ?payload, "[post message]")
            }
            Ok(None) => {}
            Err(status) => warn!(
                side = %self.side,
                method = self.method,
                code = ?status.code(),
                error = status.message(),
                "[post message] receive failed"
            ),
        }

        received
    }
}
