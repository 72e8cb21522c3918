//! Component health for the style service
//!
//! Two components are tracked. The model is critical: without it nothing can
//! be served. The store is auxiliary: its failures are reported as degraded
//! health while the service stays ready.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Parts of the service whose health is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Model,
    Store,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Model, Component::Store];

    pub fn name(self) -> &'static str {
        match self {
            Component::Model => "model",
            Component::Store => "store",
        }
    }

    /// Readiness requires every critical component to be operational
    pub fn is_critical(self) -> bool {
        matches!(self, Component::Model)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix seconds of the last status change
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn now(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: Utc::now().timestamp(),
        }
    }
}

/// Body of `GET /healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Body of `GET /readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct RegistryState {
    components: BTreeMap<Component, ComponentHealth>,
    started: bool,
}

impl RegistryState {
    /// Worst reported status; an auxiliary component caps at degraded
    fn overall(&self) -> ComponentStatus {
        self.components
            .iter()
            .map(|(component, health)| match health.status {
                ComponentStatus::Unhealthy if !component.is_critical() => {
                    ComponentStatus::Degraded
                }
                status => status,
            })
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }

    fn unavailable_critical(&self) -> Option<Component> {
        Component::ALL.into_iter().filter(|c| c.is_critical()).find(|c| {
            !self
                .components
                .get(c)
                .is_some_and(|health| health.status.is_operational())
        })
    }
}

/// Shared, cloneable view of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a component as healthy
    pub async fn register(&self, component: Component) {
        self.set(component, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_healthy(&self, component: Component) {
        self.set(component, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_degraded(&self, component: Component, message: impl Into<String>) {
        self.set(component, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn set_unhealthy(&self, component: Component, message: impl Into<String>) {
        self.set(component, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    async fn set(&self, component: Component, status: ComponentStatus, message: Option<String>) {
        self.state
            .write()
            .await
            .components
            .insert(component, ComponentHealth::now(status, message));
    }

    /// Mark startup as finished (or not)
    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.started = ready;
    }

    pub async fn status_of(&self, component: Component) -> Option<ComponentStatus> {
        self.state
            .read()
            .await
            .components
            .get(&component)
            .map(|health| health.status)
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        HealthResponse {
            status: state.overall(),
            components: state
                .components
                .iter()
                .map(|(component, health)| (component.name().to_string(), health.clone()))
                .collect(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        let reason = if !state.started {
            Some("Service not yet initialized".to_string())
        } else {
            state
                .unavailable_critical()
                .map(|component| format!("{} not available", component))
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy_but_not_ready() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(
            readiness.reason.as_deref(),
            Some("Service not yet initialized")
        );
    }

    #[tokio::test]
    async fn test_register_tracks_only_named_component() {
        let registry = HealthRegistry::new();
        registry.register(Component::Model).await;

        assert_eq!(
            registry.status_of(Component::Model).await,
            Some(ComponentStatus::Healthy)
        );
        assert_eq!(registry.status_of(Component::Store).await, None);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_overall_health() {
        let registry = HealthRegistry::new();
        registry.register(Component::Model).await;
        registry.register(Component::Store).await;

        registry.set_degraded(Component::Store, "insert failed").await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components["store"].message.as_deref(),
            Some("insert failed")
        );
        assert_eq!(health.components["model"].message, None);
    }

    #[tokio::test]
    async fn test_unhealthy_store_only_degrades() {
        let registry = HealthRegistry::new();
        registry.register(Component::Model).await;
        registry.set_unhealthy(Component::Store, "unreachable").await;
        registry.set_ready(true).await;

        assert_eq!(registry.health().await.status, ComponentStatus::Degraded);
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_unhealthy_model_is_unhealthy_and_not_ready() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;
        registry.set_degraded(Component::Store, "slow").await;
        registry
            .set_unhealthy(Component::Model, "artifact corrupt")
            .await;

        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("model not available"));
    }

    #[tokio::test]
    async fn test_readiness_requires_model() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;
        assert!(!registry.readiness().await.ready);

        registry.register(Component::Model).await;
        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert!(readiness.reason.is_none());
    }

    #[test]
    fn test_status_order_and_wire_names() {
        assert!(ComponentStatus::Healthy < ComponentStatus::Degraded);
        assert!(ComponentStatus::Degraded < ComponentStatus::Unhealthy);
        assert_eq!(
            serde_json::to_value(ComponentStatus::Degraded).unwrap(),
            "degraded"
        );
        assert_eq!(Component::Store.to_string(), "store");
        assert!(Component::Model.is_critical());
        assert!(!Component::Store.is_critical());
    }
}
