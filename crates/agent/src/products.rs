use serde_json::Value;

use nova_core::catalog::{Catalog, CatalogProduct};
use nova_core::config::ExtractionConfig;
use nova_core::domain::product::ProductRecord;
use nova_core::identity::ToolKind;

use crate::shapes::{plain_text, Envelope, Shape};
use crate::tiers::{Matched, Tier, Tiers};

/// Product list recovered from a catalog or sales sub-agent output.
///
/// `Some(vec![])` means the catalog genuinely found nothing; `None` means no
/// tier could recover anything.
pub fn extract_products(output: &Value, catalog: &Catalog) -> Option<Vec<ProductRecord>> {
    extract_products_tiered(output, catalog, &ExtractionConfig::default()).map(Matched::into_value)
}

pub fn extract_products_tiered(
    output: &Value,
    catalog: &Catalog,
    config: &ExtractionConfig,
) -> Option<Matched<Vec<ProductRecord>>> {
    let envelope = Envelope::normalize(output);

    Tiers::new("products")
        .then(Tier::Steps, || from_latest_catalog_step(&envelope))
        .then(Tier::Direct, || from_direct_list(&envelope))
        .then_if(config.text_fallback, Tier::EnvelopeText, || {
            let matched = match_catalog_text(&envelope.text, catalog, config.max_text_matches);
            (!matched.is_empty()).then_some(matched)
        })
        .run()
}

/// Contextual prose of a sub-agent output, trimmed.
pub fn extract_text(output: &Value) -> String {
    plain_text(output).trim().to_string()
}

/// In-stock catalog products mentioned in `text`, in catalog order.
///
/// A product is mentioned when its brand or its full name appears, or when at
/// least two significant tokens of its name appear.
pub fn match_catalog_text(text: &str, catalog: &Catalog, limit: usize) -> Vec<ProductRecord> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let haystack = text.to_lowercase();
    catalog
        .in_stock()
        .filter(|product| is_mentioned(&haystack, product))
        .take(limit)
        .map(|product| catalog.to_record(product))
        .collect()
}

fn from_latest_catalog_step(envelope: &Envelope<'_>) -> Option<Vec<ProductRecord>> {
    match envelope.last_step(ToolKind::CatalogQuery)?.shape() {
        Shape::Products(items) => non_empty(valid_records(items)),
        _ => None,
    }
}

fn from_direct_list(envelope: &Envelope<'_>) -> Option<Vec<ProductRecord>> {
    match envelope.shape {
        Shape::Products([]) => Some(Vec::new()),
        Shape::Products(items) => non_empty(valid_records(items)),
        _ => None,
    }
}

fn valid_records(items: &[Value]) -> Vec<ProductRecord> {
    items.iter().filter_map(ProductRecord::from_json).collect()
}

fn non_empty(records: Vec<ProductRecord>) -> Option<Vec<ProductRecord>> {
    (!records.is_empty()).then_some(records)
}

fn is_mentioned(haystack: &str, product: &CatalogProduct) -> bool {
    let brand = product.brand.trim().to_lowercase();
    if !brand.is_empty() && haystack.contains(&brand) {
        return true;
    }

    let name = product.name.to_lowercase();
    if !name.trim().is_empty() && haystack.contains(&name) {
        return true;
    }

    name_tokens(&name).filter(|token| haystack.contains(token)).take(2).count() >= 2
}

fn name_tokens(name: &str) -> impl Iterator<Item = String> + '_ {
    name.split_whitespace()
        .map(|word| word.chars().filter(|ch| ch.is_alphanumeric() || *ch == '_').collect::<String>())
        .filter(|token| token.chars().count() > 2)
}
