//! Service health command

use anyhow::Result;
use serde::Serialize;
use style_lib::{ComponentStatus, HealthResponse, ReadinessResponse};
use tabled::Tabled;

use crate::client::{ApiClient, ServiceBanner};
use crate::output::{color_status, print_heading, print_json, print_table, print_info, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

#[derive(Serialize)]
struct HealthReport {
    banner: ServiceBanner,
    health: HealthResponse,
    readiness: ReadinessResponse,
}

fn status_name(status: ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "healthy",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "unhealthy",
    }
}

/// Show liveness, readiness, and per-component health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let banner: ServiceBanner = client.get("").await?;
    let (_, health): (_, HealthResponse) = client.get_health("healthz").await?;
    let (_, readiness): (_, ReadinessResponse) = client.get_health("readyz").await?;

    match format {
        OutputFormat::Json => print_json(&HealthReport {
            banner,
            health,
            readiness,
        })?,
        OutputFormat::Table => {
            print_heading("Service Health", 50);
            print_info(&banner.message);
            println!("Status:                 {}", color_status(status_name(health.status)));
            let ready = if readiness.ready { "ready" } else { "not ready" };
            println!("Readiness:              {}", color_status(ready));
            if let Some(reason) = &readiness.reason {
                println!("Reason:                 {}", reason);
            }
            println!();

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(status_name(component.status)),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            print_table(&rows);
        }
    }

    Ok(())
}
