use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::product::{ProductId, ProductRecord};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file `{0}` was not found")]
    Missing(PathBuf),
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
}

/// A product exactly as stored in the storefront catalog fixture.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub brand: String,
    pub category_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<u8>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub free_shipping: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    products: Vec<CatalogProduct>,
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(products: Vec<CatalogProduct>, categories: Vec<Category>) -> Self {
        Self { products, categories }
    }

    pub fn load(products_path: &Path, categories_path: &Path) -> Result<Self, CatalogError> {
        let products: Vec<CatalogProduct> = read_json(products_path)?;
        let categories: Vec<Category> = read_json(categories_path)?;

        let catalog = Self::new(products, categories);
        info!(
            event_name = "catalog.loaded",
            products = catalog.products.len(),
            in_stock = catalog.in_stock().count(),
            categories = catalog.categories.len(),
            path = %products_path.display(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    pub fn in_stock(&self) -> impl Iterator<Item = &CatalogProduct> {
        self.products.iter().filter(|product| product.in_stock)
    }

    pub fn category_name(&self, category_id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
            .map(|category| category.name.as_str())
    }

    /// Maps a fixture product to the record shape the chat UI renders,
    /// labelling the category by name when the id is known.
    pub fn to_record(&self, product: &CatalogProduct) -> ProductRecord {
        ProductRecord {
            id: ProductId(product.id.clone()),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: self
                .category_name(&product.category_id)
                .unwrap_or(&product.category_id)
                .to_string(),
            price: product.price,
            original_price: product.original_price,
            discount: product.discount,
            rating: product.rating,
            review_count: product.review_count,
            image: product.image.clone(),
            badges: product.badges.clone(),
            free_shipping: product.free_shipping,
            slug: product.slug.clone(),
        }
        .normalized()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn read_json<T>(path: &Path) -> Result<T, CatalogError>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Err(CatalogError::Missing(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)
        .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{Catalog, CatalogError};

    const PRODUCTS: &str = r#"[
        {
            "id": "kb-1",
            "name": "Razer BlackWidow V4",
            "slug": "razer-blackwidow-v4",
            "brand": "Razer",
            "categoryId": "peripherals",
            "price": 149.99,
            "originalPrice": 179.99,
            "discount": 17,
            "rating": 4.6,
            "reviewCount": 311,
            "image": "/images/kb-1.jpg",
            "badges": ["Top ventas"],
            "inStock": true,
            "freeShipping": true,
            "deliveryEstimate": "24h"
        },
        {
            "id": "kb-2",
            "name": "Keychron Q1",
            "slug": "keychron-q1",
            "brand": "Keychron",
            "categoryId": "unknown-category",
            "price": 199,
            "inStock": false
        }
    ]"#;

    const CATEGORIES: &str = r#"[{ "id": "peripherals", "name": "Periféricos", "slug": "perifericos" }]"#;

    fn write_catalog(dir: &TempDir) -> Result<Catalog, CatalogError> {
        let products = dir.path().join("products.json");
        let categories = dir.path().join("categories.json");
        fs::write(&products, PRODUCTS).expect("write products");
        fs::write(&categories, CATEGORIES).expect("write categories");
        Catalog::load(&products, &categories)
    }

    #[test]
    fn load_reads_fixture_and_filters_stock() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = write_catalog(&dir).expect("catalog loads");

        assert_eq!(catalog.len(), 2);
        let in_stock: Vec<_> = catalog.in_stock().map(|product| product.id.as_str()).collect();
        assert_eq!(in_stock, vec!["kb-1"]);
    }

    #[test]
    fn record_uses_category_name_and_falls_back_to_id() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = write_catalog(&dir).expect("catalog loads");

        let keyboard = catalog.to_record(&catalog.products()[0]);
        assert_eq!(keyboard.category, "Periféricos");
        assert_eq!(keyboard.discount, Some(17));
        assert_eq!(keyboard.price, Decimal::new(14999, 2));

        let out_of_stock = catalog.to_record(&catalog.products()[1]);
        assert_eq!(out_of_stock.category, "unknown-category");
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope.json");

        let error = Catalog::load(&missing, &missing).expect_err("missing file");
        assert!(matches!(error, CatalogError::Missing(ref path) if path == &missing));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let products = dir.path().join("products.json");
        fs::write(&products, "{ not json").expect("write");

        let error = Catalog::load(&products, &products).expect_err("parse failure");
        assert!(matches!(error, CatalogError::ParseFile { .. }));
    }
}
