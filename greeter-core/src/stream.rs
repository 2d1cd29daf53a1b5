//! # Message Streams
//!
//! A streaming call is seen by the code on either end as a pair of operations:
//! receive one message, send one message. The traits in this module describe that
//! capability so that handlers and callers never touch the transport types directly,
//! and interceptors can hand them a decorated stream instead.
//!
//! * [`ServerStream`] is what a streaming handler works with.
//! * [`ClientStream`] is what the caller of a streaming method works with. It adds
//!   [`ClientStream::close_send`], which tells the server no more messages follow.
//!
//! The `Channel*` implementations bridge these traits with `tonic`: outbound messages
//! go through a bounded `mpsc` channel, inbound messages come from any stream of
//! `Result<T, Status>`.
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use tokio::sync::mpsc;
use tonic::Status;

/// Capacity of the channels backing outbound messages.
pub const STREAM_BUFFER: usize = 16;

/// A boxed stream of inbound messages.
pub type BoxMessageStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

pub type BoxServerStream<Req, Res> = Box<dyn ServerStream<Req, Res>>;

pub type BoxClientStream<Req, Res> = Box<dyn ClientStream<Req, Res>>;

/// The server side of a streaming call.
#[tonic::async_trait]
pub trait ServerStream<Req, Res>: Send {
    /// Receives the next message from the client.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(msg))` - A message was received.
    /// * `Ok(None)` - The client closed its send side, no more messages will arrive.
    /// * `Err(Status)` - The stream failed.
    async fn recv(&mut self) -> Result<Option<Req>, Status>;

    /// Sends a message to the client.
    async fn send(&mut self, message: Res) -> Result<(), Status>;
}

/// The client side of a streaming call.
#[tonic::async_trait]
pub trait ClientStream<Req, Res>: Send {
    /// Sends a message to the server.
    async fn send(&mut self, message: Req) -> Result<(), Status>;

    /// Closes the send side. The server observes the end of its inbound stream.
    ///
    /// Closing twice is a no-op.
    fn close_send(&mut self);

    /// Receives the next message from the server, `Ok(None)` once the server is done.
    async fn recv(&mut self) -> Result<Option<Res>, Status>;
}

/// A [`ServerStream`] reading from a `tonic` inbound stream and writing into a channel
/// whose receiving end is handed back to `tonic` as the response stream.
pub struct ChannelServerStream<Req, Res> {
    inbound: BoxMessageStream<Req>,
    outbound: mpsc::Sender<Result<Res, Status>>,
}

impl<Req, Res> ChannelServerStream<Req, Res> {
    pub fn new(
        inbound: impl Stream<Item = Result<Req, Status>> + Send + 'static,
        outbound: mpsc::Sender<Result<Res, Status>>,
    ) -> Self {
        Self {
            inbound: Box::pin(inbound),
            outbound,
        }
    }
}

#[tonic::async_trait]
impl<Req, Res> ServerStream<Req, Res> for ChannelServerStream<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    async fn recv(&mut self) -> Result<Option<Req>, Status> {
        self.inbound.next().await.transpose()
    }

    async fn send(&mut self, message: Res) -> Result<(), Status> {
        self.outbound
            .send(Ok(message))
            .await
            .map_err(|_| Status::cancelled("the client closed the stream"))
    }
}

/// A [`ClientStream`] writing into the channel that feeds the request stream of a call
/// and reading from the response stream of that call.
pub struct ChannelClientStream<Req, Res> {
    outbound: Option<mpsc::Sender<Req>>,
    inbound: BoxMessageStream<Res>,
}

impl<Req, Res> ChannelClientStream<Req, Res> {
    pub fn new(
        outbound: mpsc::Sender<Req>,
        inbound: impl Stream<Item = Result<Res, Status>> + Send + 'static,
    ) -> Self {
        Self {
            outbound: Some(outbound),
            inbound: Box::pin(inbound),
        }
    }
}

#[tonic::async_trait]
impl<Req, Res> ClientStream<Req, Res> for ChannelClientStream<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    async fn send(&mut self, message: Req) -> Result<(), Status> {
        let Some(outbound) = &self.outbound else {
            return Err(Status::failed_precondition("send called after close_send"));
        };

        outbound
            .send(message)
            .await
            .map_err(|_| Status::cancelled("the server closed the stream"))
    }

    fn close_send(&mut self) {
        // Dropping the sender ends the request stream.
        self.outbound.take();
    }

    async fn recv(&mut self) -> Result<Option<Res>, Status> {
        self.inbound.next().await.transpose()
    }
}
