//! Live zone refresh against a running server

use crate::{print_effects, read_json};
use anyhow::{Context, Result};
use std::path::Path;
use trellis::{Driver, ReqwestTransport, RuntimeConfig};

pub fn run_refresh_command(
    zone: &str,
    url: &str,
    init_path: Option<&Path>,
    config: RuntimeConfig,
) -> Result<()> {
    let spec = init_path.map(read_json).transpose()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async move {
        let driver = Driver::new(ReqwestTransport::new(&config.location));
        let location = config.location.clone();
        let mut page = driver
            .open(config)
            .await
            .with_context(|| format!("Failed to load {location}"))?;

        if let Some(spec) = &spec {
            for err in page.init(spec) {
                eprintln!("  ⚠️  {err}");
            }
        }
        page.update_zone(zone, url, &[])?;
        let host = driver.run(&mut page).await;
        print_effects(&host);

        for diagnostic in page.diagnostics().entries() {
            eprintln!("  {:?}: {}", diagnostic.level, diagnostic.message);
        }
        let node = page
            .document()
            .by_id(zone)
            .with_context(|| format!("Zone '{zone}' is gone after the update"))?;
        println!("{}", page.document().inner_html(node));
        tracing::info!(zone, "refresh complete");
        Ok::<(), anyhow::Error>(())
    })
}
