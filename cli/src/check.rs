//! Initializer spec validation

use crate::{read_json, read_text};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use trellis::core::Initializer;
use trellis::{Page, RuntimeConfig};

/// Parse the spec and, with a page, run it to surface unresolved elements.
pub fn run_check_command(spec_path: &Path, page_path: Option<&Path>, config: RuntimeConfig) -> Result<()> {
    println!("Checking initializer spec: {}", spec_path.display());
    let spec = read_json(spec_path)?;

    let (initializers, mut errors) = Initializer::parse_spec(&spec);
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for initializer in &initializers {
        *counts.entry(initializer.name()).or_default() += 1;
    }
    for (name, count) in &counts {
        println!("  ✅ {name}: {count} invocation(s)");
    }

    if let Some(page_path) = page_path {
        println!("  Running against page: {}", page_path.display());
        let html = read_text(page_path)?;
        let mut page = Page::load(&html, config);
        // init reports the parse errors again, plus every id that does not resolve.
        errors = page.init(&spec);
    }

    if errors.is_empty() {
        println!();
        println!("✅ Check complete!");
        return Ok(());
    }
    for err in &errors {
        println!("  ❌ {err}");
    }
    anyhow::bail!("{} configuration error(s)", errors.len())
}
