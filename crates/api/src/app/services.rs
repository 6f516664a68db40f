//! Infrastructure wiring for the HTTP process.
//!
//! One store, one publisher, one outbox forwarder per process; all front
//! ends in this process share the same orchestrator instance.

pub use tradepost_infra::Services as AppServices;

/// Wire services from the environment (`TRADEPOST_BACKEND`).
pub async fn build_services() -> anyhow::Result<AppServices> {
    tradepost_infra::build_from_env("tradepost-api").await
}
