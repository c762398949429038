//! Catalog loading from JSON.

use std::path::Path;

use super::model::Catalog;
use crate::error::CatalogError;

/// Parse and validate a catalog from a JSON string.
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = serde_json::from_str(json)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Read, parse and validate a catalog file.
pub async fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let catalog = parse_catalog(&raw)?;
    tracing::info!(
        path = %path.display(),
        questions = catalog.questions.len(),
        items = catalog.items.len(),
        "Catalog loaded"
    );
    Ok(catalog)
}
