// crates/lootforge-config/src/lib.rs
// ============================================================================
// Module: LootForge Config
// Description: Ambient runtime configuration resolved from environment,
//   independent of any single manifest.
// Purpose: Centralize the environment-over-manifest-over-default precedence
//   rule (§4.4, §6) so no crate reads `std::env` directly.
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! Three kinds of ambient configuration live here: per-provider runtime
//! knobs ([`provider_config`]), soft-metric adapter invocation mode
//! ([`adapter_config`]), and the HTTP service's bind address
//! ([`service_config`]). All three resolve through an [`env::EnvSource`]
//! so tests never touch the real process environment.

pub mod adapter_config;
pub mod env;
pub mod provider_config;
pub mod service_config;

pub use adapter_config::AdapterMode;
pub use adapter_config::AdapterName;
pub use env::EnvSource;
pub use env::ProcessEnv;
pub use provider_config::ManifestProviderOverrides;
pub use provider_config::ProviderRuntimeConfig;
pub use service_config::ServiceConfig;
