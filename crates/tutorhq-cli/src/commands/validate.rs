//! The `tutorhq validate` command.

use anyhow::Result;

use tutorhq_core::catalog::{load_catalog_directory, parse_catalog, validate_catalog};

use super::{resolve_config, Overrides};

pub fn execute(overrides: &Overrides) -> Result<()> {
    let path = resolve_config(overrides)?.catalog;
    let catalogs = if path.is_dir() {
        load_catalog_directory(&path)?
    } else {
        vec![parse_catalog(&path)?]
    };

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!(
            "Catalog: {} ({} lessons, {} tests)",
            catalog.name,
            catalog.lessons.len(),
            catalog.tests.len()
        );

        let warnings = validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
