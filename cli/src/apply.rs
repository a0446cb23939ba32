//! Offline payload application

use crate::{print_effects, read_json, read_text};
use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use trellis::runtime::ZoneState;
use trellis::{Effect, Page, RuntimeConfig, UpdatePayload};

/// Apply `payload` to `zone` and write the resulting document. Scripts named
/// by the payload count as loaded as soon as they are requested.
pub fn run_apply_command(
    page_path: &Path,
    zone: &str,
    payload_path: &Path,
    init_path: Option<&Path>,
    output: Option<&Path>,
    config: RuntimeConfig,
) -> Result<()> {
    let html = read_text(page_path)?;
    let mut page = Page::load(&html, config);

    if let Some(init_path) = init_path {
        let errors = page.init(&read_json(init_path)?);
        for err in &errors {
            eprintln!("  ⚠️  {err}");
        }
    }
    if page.state::<ZoneState>(zone).is_none() {
        let errors = page.init(&json!({ "zone": { "element": zone } }));
        if let Some(err) = errors.into_iter().next() {
            anyhow::bail!("Cannot use '{zone}' as a zone: {err}");
        }
    }

    let body = read_text(payload_path)?;
    let payload = UpdatePayload::from_json(&body)
        .with_context(|| format!("{} is not an update payload", payload_path.display()))?;
    page.process_reply(zone, payload)?;

    let mut host = Vec::new();
    loop {
        let effects = page.take_effects();
        if effects.is_empty() {
            break;
        }
        for effect in effects {
            match effect {
                Effect::LoadScript { url } => page.script_loaded(&url),
                other => host.push(other),
            }
        }
    }
    print_effects(&host);
    for diagnostic in page.diagnostics().entries() {
        eprintln!("  {:?}: {}", diagnostic.level, diagnostic.message);
    }

    let document = page.document().outer_html(page.document().root());
    match output {
        Some(path) => {
            std::fs::write(path, document.as_bytes()).context("Failed to write output file")?;
            println!("Updated page saved to: {}", path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}
