//! # Greeter Core
//!
//! `greeter-core` implements the `greeting.GreetingService` on top of `tonic` and a
//! client for it, with interceptors wrapped around every call shape.
//!
//! ## Key Components
//!
//! * **[`Greeter`]:** The service handler. Exposes a unary, a server-streaming, a
//!   client-streaming and a bidirectional-streaming method.
//! * **[`GreeterClient`]:** Connects to a server and invokes each call shape.
//! * **[`interceptor`]:** Middleware around unary calls and around the open, send,
//!   receive and close events of streaming calls. [`LoggingInterceptor`] logs every
//!   event through `tracing`, [`PassThrough`] does nothing.
//! * **[`stream`]:** The send/receive capability traits that streaming handlers and
//!   the client are written against, so interceptors can decorate them.
//! * **[`server`]:** Binds the listener, registers reflection and shuts down gracefully.
//!
//! ## Re-exports
//!
//! This crate re-exports `tonic` and the generated `greeting_service` types so that
//! consumers use compatible versions.
pub mod client;
pub mod interceptor;
pub mod server;
pub mod service;
pub mod stream;

pub use client::{ClientConnectError, GreeterClient};
pub use interceptor::{LoggingInterceptor, PassThrough};
pub use server::{ServeError, ServerConfig};
pub use service::{Greeter, ServiceConfig};

// Re-exports
pub use greeting_service;
pub use tonic;
pub use tonic_types;
