// crates/lootforge-providers/src/lib.rs
// ============================================================================
// Module: LootForge Providers
// Description: Provider adapter interface, built-in adapters, and the
//   registry/router that resolves a planned target to a provider chain.
// Purpose: Isolate every image-provider wire protocol behind one trait, so
//   the generate orchestrator never branches on provider name (§4.3/§4.4).
// Dependencies: lootforge-core, lootforge-config, reqwest, base64, serde_json
// ============================================================================

//! ## Overview
//! [`adapter::Provider`] is the seam: [`adapters`] supplies the three
//! built-in implementations over [`transport::ProviderTransport`], and
//! [`registry::ProviderRegistry`] holds configured instances and resolves
//! routing per target. [`error::ProviderError`] is the one failure shape
//! every adapter raises, regardless of which provider failed.

pub mod adapter;
pub mod adapters;
pub mod error;
pub mod registry;
pub mod transport;

pub use adapter::PrepareContext;
pub use adapter::Provider;
pub use adapter::RunContext;
pub use error::ProviderError;
pub use registry::ProviderRegistry;
pub use registry::Route;
pub use transport::ProviderTransport;
pub use transport::ReqwestTransport;
