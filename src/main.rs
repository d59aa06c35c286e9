use std::sync::Arc;

use lead_pulse::config::Settings;
use lead_pulse::crm::{CrmClient, WebhookClient};
use lead_pulse::pipeline::{Orchestrator, SnapshotSlot};
use lead_pulse::report;

/// Deadline for one full pipeline run.
const RUN_DEADLINE_SECS: u64 = 120;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export KEYCRM_API_KEY=...");
        eprintln!("  export LEAD_WEBHOOK_URL=https://.../webhook/new-leads");
        std::process::exit(1);
    });

    eprintln!("📊 lead-pulse v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   CRM: {}", settings.base_url);

    let crm = Arc::new(CrmClient::new(&settings));
    let feed = Arc::new(WebhookClient::new(
        settings.webhook_url.clone(),
        settings.timeout,
    ));
    let orchestrator = Orchestrator::new(crm, feed, settings.max_calls);

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let slot = SnapshotSlot::new();

    match orchestrator
        .run_with_timeout(&today, std::time::Duration::from_secs(RUN_DEADLINE_SECS))
        .await
    {
        Ok(snapshot) => {
            slot.publish(snapshot);
        }
        Err(e) => {
            // A failed run never replaces a previous snapshot.
            tracing::error!(error = ?e, "Pipeline run failed");
            anyhow::bail!("Pipeline run failed: {e}");
        }
    }

    if let Some(snapshot) = slot.latest() {
        println!("{}", report::render(&snapshot));
    }

    Ok(())
}
