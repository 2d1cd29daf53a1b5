//! # Greeting Service
//!
//! Protobuf definitions for the `greeting.GreetingService` together with the
//! `tonic` server and client stubs generated from them.
//!
//! The encoded descriptor set is exported as [`FILE_DESCRIPTOR_SET`] so the server
//! can register it with the reflection service.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/greeting.rs"));
}

pub use pb::greeting_service_client::GreetingServiceClient;
pub use pb::greeting_service_server::{GreetingService, GreetingServiceServer};
pub use pb::{HelloRequest, HelloResponse};

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("greeting_descriptor");
