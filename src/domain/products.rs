//! Product payloads and the field rules shared by create and update.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationErrors;

const EMPTY: &str = "must not be empty";
const NON_POSITIVE_PRICE: &str = "must be greater than zero";
const NEGATIVE_STOCK: &str = "must not be negative";

/// Caller-supplied fields of a new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Check every rule of a new product and report all failures together.
pub fn validate_new_product(product: &NewProduct) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "name", &product.name);
    check_text(&mut errors, "description", &product.description);
    check_text(&mut errors, "category", &product.category);
    check_price(&mut errors, product.price);
    check_stock(&mut errors, product.stock);
    errors.into_result()
}

/// Apply the same rules to the fields a patch actually supplies.
pub fn validate_patch(patch: &ProductPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = patch.name.as_deref() {
        check_text(&mut errors, "name", name);
    }
    if let Some(description) = patch.description.as_deref() {
        check_text(&mut errors, "description", description);
    }
    if let Some(category) = patch.category.as_deref() {
        check_text(&mut errors, "category", category);
    }
    if let Some(price) = patch.price {
        check_price(&mut errors, price);
    }
    if let Some(stock) = patch.stock {
        check_stock(&mut errors, stock);
    }
    errors.into_result()
}

fn check_text(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, EMPTY);
    }
}

fn check_price(errors: &mut ValidationErrors, price: Decimal) {
    if price <= Decimal::ZERO {
        errors.push("price", NON_POSITIVE_PRICE);
    }
}

fn check_stock(errors: &mut ValidationErrors, stock: i64) {
    if stock < 0 {
        errors.push("stock", NEGATIVE_STOCK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewProduct {
        NewProduct {
            name: "Parlante JBL Flip 6".to_string(),
            description: "Parlante portátil resistente al agua".to_string(),
            price: Decimal::new(49999, 2),
            category: "Audio".to_string(),
            stock: 30,
            image_url: None,
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(validate_new_product(&valid()).is_ok());
    }

    #[test]
    fn reports_every_offending_field() {
        let product = NewProduct {
            name: "  ".to_string(),
            description: String::new(),
            category: String::new(),
            price: Decimal::ZERO,
            stock: -1,
            ..valid()
        };

        let errors = validate_new_product(&product).expect_err("invalid product");
        assert_eq!(
            errors.fields(),
            vec!["name", "description", "category", "price", "stock"]
        );
    }

    #[test]
    fn patch_checks_only_supplied_fields() {
        assert!(validate_patch(&ProductPatch::default()).is_ok());

        let patch = ProductPatch {
            price: Some(Decimal::new(-1, 0)),
            stock: Some(0),
            ..Default::default()
        };
        let errors = validate_patch(&patch).expect_err("negative price");
        assert_eq!(errors.fields(), vec!["price"]);
    }
}
