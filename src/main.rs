use anyhow::Result;
use kube::Client;
use tracing::info;

use kube_unused_reporter::{
    load_config, render_structured, render_text, resolve_namespaces, send_to_slack,
    KubeDeploymentSource, SlackNotifier, UnusedCollector,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;

    let client = Client::try_default().await?;
    let namespaces = resolve_namespaces(&client, &cfg).await?;
    info!("namespaces = {:?}", namespaces);

    let source = KubeDeploymentSource::new(client);
    let outcome = UnusedCollector::new(&source).scan(&namespaces).await;

    let summary = outcome.report.summary();
    info!(
        "Found {} unused Deployments in {} of {} namespaces",
        summary.unused_count, summary.namespaces_with_findings, summary.scanned_namespaces
    );

    // Structured output is always written locally
    if cfg.output_format.is_structured() {
        println!("{}", render_structured(&outcome.report, cfg.output_format)?);
        return Ok(());
    }

    let text = render_text(&outcome.report);

    if !cfg.notification.is_configured() {
        if text.is_empty() {
            info!("No unused Deployments found");
        } else {
            println!("{}", text);
        }
        return Ok(());
    }

    if !summary.has_findings() {
        println!("No unused Deployments found, skipping Slack notification");
        return Ok(());
    }

    let notifier = SlackNotifier::from_config(&cfg)?;
    if let Err(undelivered) = send_to_slack(&notifier, &cfg.notification, text).await {
        println!("{}", undelivered.text);
        return Err(undelivered.into());
    }
    info!("Report sent to Slack");

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
