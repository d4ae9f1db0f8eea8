//! Aggregated health reporting.
//!
//! Combines the router's health with the intake buffer's into a single
//! [`DaemonHealth`] report. The overall status is the worst component status.
//!
//! # Aggregation Rule
//!
//! - All Healthy -> Healthy
//! - Any Degraded, none Unhealthy -> Degraded(reason)
//! - Any Unhealthy -> Unhealthy(reason)

use serde::Serialize;

use logrelay_core::pipeline::HealthStatus;

/// Buffer fill ratio above which intake reports Degraded.
const BUFFER_DEGRADED_RATIO: f64 = 0.9;

/// Aggregated health report for the daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Overall status (worst of all components).
    pub status: HealthStatus,
    /// Seconds since the daemon started.
    pub uptime_secs: u64,
    /// Per-component reports.
    pub components: Vec<ComponentHealth>,
}

/// Health of a single component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// Component name (e.g. "log-router", "intake").
    pub name: String,
    /// Current status.
    pub status: HealthStatus,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Health of the intake buffer given its fill ratio.
pub fn intake_status(utilization: f64) -> HealthStatus {
    if utilization > BUFFER_DEGRADED_RATIO {
        HealthStatus::Degraded(format!(
            "buffer utilization high: {:.1}%",
            utilization * 100.0
        ))
    } else {
        HealthStatus::Healthy
    }
}

/// Aggregate component statuses into one.
///
/// Returns the worst status found: Unhealthy > Degraded > Healthy.
pub fn aggregate_status(components: &[ComponentHealth]) -> HealthStatus {
    let mut worst = HealthStatus::Healthy;
    let mut reasons = Vec::new();

    for component in components {
        match &component.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => {
                if !worst.is_unhealthy() {
                    reasons.push(format!("{}: {}", component.name, reason));
                    worst = HealthStatus::Degraded(String::new());
                }
            }
            HealthStatus::Unhealthy(reason) => {
                reasons.push(format!("{}: {}", component.name, reason));
                worst = HealthStatus::Unhealthy(String::new());
            }
        }
    }

    match worst {
        HealthStatus::Healthy => HealthStatus::Healthy,
        HealthStatus::Degraded(_) => HealthStatus::Degraded(reasons.join("; ")),
        HealthStatus::Unhealthy(_) => HealthStatus::Unhealthy(reasons.join("; ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_healthy() {
        let components = vec![
            ComponentHealth::new("log-router", HealthStatus::Healthy),
            ComponentHealth::new("intake", HealthStatus::Healthy),
        ];
        assert_eq!(aggregate_status(&components), HealthStatus::Healthy);
    }

    #[test]
    fn degraded_reason_names_component() {
        let components = vec![
            ComponentHealth::new("log-router", HealthStatus::Degraded("no patterns".to_owned())),
            ComponentHealth::new("intake", HealthStatus::Healthy),
        ];
        assert_eq!(
            aggregate_status(&components),
            HealthStatus::Degraded("log-router: no patterns".to_owned())
        );
    }

    #[test]
    fn unhealthy_wins_over_degraded() {
        let components = vec![
            ComponentHealth::new("intake", HealthStatus::Degraded("full".to_owned())),
            ComponentHealth::new("log-router", HealthStatus::Unhealthy("disabled".to_owned())),
        ];
        let status = aggregate_status(&components);
        assert!(status.is_unhealthy());
        assert!(matches!(status, HealthStatus::Unhealthy(r) if r.contains("log-router: disabled")));
    }

    #[test]
    fn empty_component_list_is_healthy() {
        assert_eq!(aggregate_status(&[]), HealthStatus::Healthy);
    }

    #[test]
    fn intake_degrades_when_nearly_full() {
        assert!(intake_status(0.5).is_healthy());
        assert!(intake_status(0.95).is_degraded());
    }

    #[test]
    fn daemon_health_serializes() {
        let health = DaemonHealth {
            status: HealthStatus::Healthy,
            uptime_secs: 5,
            components: vec![ComponentHealth::new("intake", HealthStatus::Healthy)],
        };
        let json = serde_json::to_value(&health).expect("serialize");
        assert_eq!(json["status"]["status"], "healthy");
        assert_eq!(json["components"][0]["name"], "intake");
    }
}
