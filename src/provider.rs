//! Provider-facing descriptors.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the handshake
//! endpoints, the API and search bases, and provider quirks (client identifier header,
//! request-token ttl, search format filter).

pub mod descriptor;

pub use descriptor::*;
