//! # Interceptors
//!
//! Middleware wrapped around every RPC, on both ends of the connection.
//!
//! * [`UnaryInterceptor`] runs around a single request/response call, on the server
//!   (around the handler) and on the client (around the invocation).
//! * [`StreamInterceptor`] runs around a server streaming handler, from stream open to
//!   stream close, and chooses the [`ServerStream`] the handler works with.
//! * [`ClientStreamInterceptor`] decorates a [`ClientStream`] when it is opened.
//!
//! Interceptors observe calls. They must hand payloads and errors through unchanged.
//!
//! [`ServerStream`]: crate::stream::ServerStream
//! [`ClientStream`]: crate::stream::ClientStream
mod logging;

pub use logging::{LoggingClientStream, LoggingInterceptor, LoggingServerStream, Side};

use crate::stream::{BoxClientStream, BoxServerStream};
use std::fmt::Debug;
use std::future::Future;
use tonic::{Request, Response, Status};

pub trait UnaryInterceptor: Clone + Send + Sync + 'static {
    /// Runs `handler` with `request`. `method` is the full gRPC method name
    /// (e.g. `/greeting.GreetingService/Hello`).
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
        Fut: Future<Output = Result<Response<Res>, Status>> + Send;
}

pub trait StreamInterceptor: Clone + Send + Sync + 'static {
    /// Runs a streaming `handler` over `stream`. The future resolves when the handler
    /// is done with the stream.
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
        Fut: Future<Output = Result<(), Status>> + Send;
}

pub trait ClientStreamInterceptor: Clone + Send + Sync + 'static {
    /// Called once when a streaming call is opened. Returns the stream handed to the caller.
    fn intercept<Req, Res>(
        &self,
        method: &'static str,
        stream: BoxClientStream<Req, Res>,
    ) -> BoxClientStream<Req, Res>
    where
        Req: Debug + Send + 'static,
        Res: Debug + Send + 'static;
}

/// An interceptor that invokes the call and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl UnaryInterceptor for PassThrough {
    fn intercept<Req, Res, F, Fut>(
        &self,
        _method: &'static str,
        request: Request<Req>,
        handler: F,
    ) -> impl Future<Output = Result<Response<Res>, Status>> + Send
    where
        Req: Debug + Send,
        Res: Debug + Send,
        F: FnOnce(Request<Req>) -> Fut + Send,
        Fut: Future<Output = Result<Response<Res>, Status>> + Send,
    {
        handler(request)
    }
}

impl StreamInterceptor for PassThrough {
    fn intercept<Req, Res, F, Fut>(
        &self,
        _method: &'static str,
        stream: BoxServerStream<Req, Res>,
        handler: F,
    ) -> impl Future<Output = Result<(), Status>> + Send
    where
        Req: Debug + Send + 'static,
        Res: Debug + Send + 'static,
        F: FnOnce(BoxServerStream<Req, Res>) -> Fut + Send,
        Fut: Future<Output = Result<(), Status>> + Send,
    {
        handler(stream)
    }
}

impl ClientStreamInterceptor for PassThrough {
    fn intercept<Req, Res>(
        &self,
        _method: &'static str,
        stream: BoxClientStream<Req, Res>,
    ) -> BoxClientStream<Req, Res>
    where
        Req: Debug + Send + 'static,
        Res: Debug + Send + 'static,
    {
        stream
    }
}
