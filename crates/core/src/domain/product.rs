use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// A product as surfaced to the chat UI by the catalog tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub original_price: Option<Decimal>,
    pub discount: Option<u8>,
    pub rating: f64,
    pub review_count: u32,
    pub image: String,
    pub badges: Vec<String>,
    pub free_shipping: bool,
    pub slug: String,
}

impl ProductRecord {
    /// Builds a record from an arbitrary tool-output object.
    ///
    /// Only `id` and `name` are required; every other field is defaulted when
    /// missing or mistyped. Returns `None` when the value is not an object with
    /// string `id` and `name`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get("id")?.as_str()?;
        let name = object.get("name")?.as_str()?;

        let record = Self {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            brand: string_field(object, "brand"),
            category: string_field(object, "category"),
            price: decimal_field(object, "price").unwrap_or(Decimal::ZERO),
            original_price: decimal_field(object, "originalPrice"),
            discount: object.get("discount").and_then(percent_value),
            rating: object.get("rating").and_then(Value::as_f64).unwrap_or(0.0),
            review_count: object
                .get("reviewCount")
                .and_then(Value::as_f64)
                .map(|count| count.clamp(0.0, f64::from(u32::MAX)) as u32)
                .unwrap_or(0),
            image: string_field(object, "image"),
            badges: badges_field(object),
            free_shipping: object.get("freeShipping").and_then(Value::as_bool).unwrap_or(false),
            slug: string_field(object, "slug"),
        };

        Some(record.normalized())
    }

    /// Enforces the record invariants: rating within 0..=5 and a positive
    /// discount only alongside an original price above the current price.
    pub fn normalized(mut self) -> Self {
        self.rating = if self.rating.is_finite() { self.rating.clamp(0.0, 5.0) } else { 0.0 };

        if self.discount == Some(0) {
            self.discount = None;
        }
        let discount_backed = self.original_price.is_some_and(|original| original > self.price);
        if self.discount.is_some() && !discount_backed {
            self.discount = None;
        }

        self
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn decimal_field(object: &Map<String, Value>, key: &str) -> Option<Decimal> {
    let decimal = match object.get(key)? {
        Value::Number(number) => {
            let raw = number.to_string();
            raw.parse::<Decimal>().or_else(|_| Decimal::from_scientific(&raw)).ok()?
        }
        Value::String(raw) => raw.trim().parse::<Decimal>().ok()?,
        _ => return None,
    };
    (decimal >= Decimal::ZERO).then_some(decimal)
}

fn percent_value(value: &Value) -> Option<u8> {
    let percent = value.as_f64()?.round();
    (percent > 0.0 && percent <= 100.0).then_some(percent as u8)
}

fn badges_field(object: &Map<String, Value>) -> Vec<String> {
    let mut badges: Vec<String> = Vec::new();
    let Some(Value::Array(items)) = object.get("badges") else {
        return badges;
    };
    for badge in items.iter().filter_map(Value::as_str) {
        if !badge.trim().is_empty() && !badges.iter().any(|seen| seen == badge) {
            badges.push(badge.to_string());
        }
    }
    badges
}
