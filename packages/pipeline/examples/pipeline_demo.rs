// ABOUTME: End-to-end demo of the pipeline store against a live deals API
// ABOUTME: Loads the board, prints per-stage totals, then runs a debounced search

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dealflow_pipeline::{
    DealStage, FilterCoordinator, FilterUpdate, HttpDealApi, PipelineStore, TracingNotifier,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let base_url =
        std::env::var("DEALFLOW_API_URL").unwrap_or_else(|_| "http://localhost:4411".to_string());
    let mut api = HttpDealApi::new(base_url.as_str())?;
    if let Ok(token) = std::env::var("DEALFLOW_API_TOKEN") {
        api.set_auth_token(token);
    }

    let store = PipelineStore::new(Arc::new(api), Arc::new(TracingNotifier));

    println!("Fetching deals from {}...", base_url);
    let deals = store.fetch(true).await;
    if let Some(err) = store.last_error() {
        eprintln!("❌ Could not load the pipeline: {}", err);
        return Ok(());
    }
    println!("✅ Loaded {} deals", deals.len());

    for stage in DealStage::ALL {
        let stats = store.stage_stats(stage);
        println!(
            "  {:<17} {:>3} deals  ${:>12.2}  avg age {:>5.1}d",
            stage.display_name(),
            stats.count,
            stats.total_value,
            stats.average_age_days
        );
    }

    store.refresh_analytics().await;
    if let Some(snapshot) = store.analytics() {
        println!(
            "Pipeline total ${:.2} across {} deals, {:.0}% reach paid",
            snapshot.total_value,
            snapshot.total_deals,
            snapshot.conversion_rate * 100.0
        );
    }

    let coordinator = FilterCoordinator::new(store);
    coordinator.set_filters(FilterUpdate::search("sponsorship"));
    // Wait out the search debounce window plus a little slack.
    tokio::time::sleep(Duration::from_millis(700)).await;
    println!(
        "✅ Search narrowed the board to {} deals",
        coordinator.store().deals().len()
    );

    Ok(())
}
