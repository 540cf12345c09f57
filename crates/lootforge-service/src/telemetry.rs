// crates/lootforge-service/src/telemetry.rs
// ============================================================================
// Module: Service Telemetry
// Description: Observability hooks for HTTP tool and generation dispatch.
// Purpose: Provide metric events without hard deps on a particular backend.
// Dependencies: (none beyond std)
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for request counters and
//! latency observations. It is intentionally dependency-light so a
//! deployment can plug in Prometheus or OpenTelemetry without redesign.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Route classification for a dispatched HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMethod {
    /// `POST /v1/tools/:name`.
    Tool,
    /// `POST /v1/generation/requests`.
    GenerationRequest,
    /// `GET /v1/contract/*`.
    ContractInfo,
}

impl ServiceMethod {
    /// Returns a stable label for the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::GenerationRequest => "generation_request",
            Self::ContractInfo => "contract_info",
        }
    }
}

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl ServiceOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// A single request's metric event payload.
#[derive(Debug, Clone)]
pub struct ServiceMetricEvent {
    /// Route classification.
    pub method: ServiceMethod,
    /// Tool name when the route is [`ServiceMethod::Tool`].
    pub tool: Option<String>,
    /// Request outcome.
    pub outcome: ServiceOutcome,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for service requests and latencies.
pub trait ServiceMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: ServiceMetricEvent);
    /// Records a latency observation for the request.
    fn record_latency(&self, event: ServiceMetricEvent, latency: Duration);
}

/// No-op metrics sink; the default until a deployment wires in a real one.
pub struct NoopMetrics;

impl ServiceMetrics for NoopMetrics {
    fn record_request(&self, _event: ServiceMetricEvent) {}

    fn record_latency(&self, _event: ServiceMetricEvent, _latency: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::NoopMetrics;
    use super::ServiceMethod;
    use super::ServiceMetricEvent;
    use super::ServiceMetrics;
    use super::ServiceOutcome;
    use std::time::Duration;

    #[test]
    fn noop_metrics_discards_every_event() {
        let metrics = NoopMetrics;
        let event = ServiceMetricEvent { method: ServiceMethod::Tool, tool: Some("plan".to_string()), outcome: ServiceOutcome::Ok };
        metrics.record_request(event.clone());
        metrics.record_latency(event, Duration::from_millis(5));
    }

    #[test]
    fn method_labels_are_stable() {
        assert_eq!(ServiceMethod::Tool.as_str(), "tool");
        assert_eq!(ServiceMethod::GenerationRequest.as_str(), "generation_request");
        assert_eq!(ServiceMethod::ContractInfo.as_str(), "contract_info");
    }
}
