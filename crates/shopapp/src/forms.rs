//! HTML form binding and validation.
//!
//! Each form deserializes every field as raw text so that a bad value can be
//! echoed back to the user alongside its error. `validate` turns the raw form
//! into a typed input or a [`FormErrors`] keyed by field name.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use shopapp_core::{Discount, Price, ProductId, UserId};

use crate::models::{NewOrder, ProductInput};

const REQUIRED: &str = "This field is required.";

/// Maximum product name length.
pub const PRODUCT_NAME_MAX: usize = 100;
/// Maximum group name length.
pub const GROUP_NAME_MAX: usize = 150;
/// Maximum promocode length.
pub const PROMOCODE_MAX: usize = 20;

/// Field-level validation errors.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    /// Record an error against a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Errors for one field, empty if it is valid.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether a field has any errors.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    /// Whether no field has errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn check_length(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

// =============================================================================
// Product
// =============================================================================

/// Product create/update form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discount: String,
}

impl ProductForm {
    /// Pre-fill the form from an existing product.
    #[must_use]
    pub fn from_product(product: &crate::models::Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.to_string(),
            description: product.description.clone(),
            discount: product.discount.to_string(),
        }
    }

    /// Initial values for a blank create form.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            price: Price::ZERO.to_string(),
            discount: Discount::NONE.to_string(),
            ..Self::default()
        }
    }

    /// Validate into a [`ProductInput`].
    ///
    /// # Errors
    ///
    /// Returns the field errors if any field is invalid.
    pub fn validate(&self) -> Result<ProductInput, FormErrors> {
        let mut errors = FormErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        check_length(&mut errors, "name", name, PRODUCT_NAME_MAX);

        let price = match self.price.trim() {
            "" => {
                errors.add("price", REQUIRED);
                None
            }
            raw => raw
                .parse::<Price>()
                .map_err(|e| errors.add("price", capitalize(&e.to_string())))
                .ok(),
        };

        let discount = match self.discount.trim() {
            "" => {
                errors.add("discount", REQUIRED);
                None
            }
            raw => raw
                .parse::<Discount>()
                .map_err(|e| errors.add("discount", capitalize(&e.to_string())))
                .ok(),
        };

        match (price, discount) {
            (Some(price), Some(discount)) => errors.into_result(ProductInput {
                name: name.to_string(),
                description: self.description.clone(),
                price,
                discount,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order creation form.
///
/// `products` is multi-valued, so the form is bound from raw key/value pairs
/// with [`OrderForm::from_pairs`] rather than through `serde` directly.
#[derive(Debug, Clone, Default)]
pub struct OrderForm {
    pub user: String,
    pub products: Vec<String>,
    pub delivery_address: String,
    pub promocode: String,
}

impl OrderForm {
    /// Bind from `application/x-www-form-urlencoded` pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "user" => form.user = value,
                "products" => form.products.push(value),
                "delivery_address" => form.delivery_address = value,
                "promocode" => form.promocode = value,
                _ => {}
            }
        }
        form
    }

    /// Whether a product id was selected, for re-rendering the choices.
    #[must_use]
    pub fn is_selected(&self, id: ProductId) -> bool {
        let id = id.to_string();
        self.products.iter().any(|p| p.trim() == id)
    }

    /// Whether a user id was chosen as owner.
    #[must_use]
    pub fn is_owner(&self, id: UserId) -> bool {
        self.user.trim() == id.to_string()
    }

    /// Validate against the offered choices.
    ///
    /// `users` and `products` are the ids the form offered; anything else is
    /// rejected the same way as a malformed id.
    ///
    /// # Errors
    ///
    /// Returns the field errors if any field is invalid.
    pub fn validate(
        &self,
        users: &BTreeSet<UserId>,
        products: &BTreeSet<ProductId>,
    ) -> Result<NewOrder, FormErrors> {
        let mut errors = FormErrors::default();

        let user_id = match self.user.trim() {
            "" => {
                errors.add("user", REQUIRED);
                None
            }
            raw => match raw.parse::<UserId>() {
                Ok(id) if users.contains(&id) => Some(id),
                _ => {
                    errors.add(
                        "user",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            },
        };

        let mut product_ids = Vec::new();
        if self.products.is_empty() {
            errors.add("products", REQUIRED);
        }
        for raw in &self.products {
            match raw.trim().parse::<ProductId>() {
                Ok(id) if products.contains(&id) => {
                    if !product_ids.contains(&id) {
                        product_ids.push(id);
                    }
                }
                _ => errors.add(
                    "products",
                    format!("Select a valid choice. {} is not one of the available choices.", raw.trim()),
                ),
            }
        }

        let promocode = self.promocode.trim();
        check_length(&mut errors, "promocode", promocode, PROMOCODE_MAX);

        let delivery_address = self.delivery_address.trim();

        match user_id {
            Some(user_id) => errors.into_result(NewOrder {
                user_id,
                product_ids,
                delivery_address: (!delivery_address.is_empty())
                    .then(|| delivery_address.to_string()),
                promocode: promocode.to_string(),
            }),
            None => Err(errors),
        }
    }
}

// =============================================================================
// Group
// =============================================================================

/// Group creation form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupForm {
    #[serde(default)]
    pub name: String,
}

impl GroupForm {
    /// Validate the group name. Uniqueness is checked against the store by
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns the field errors if the name is blank or too long.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        check_length(&mut errors, "name", name, GROUP_NAME_MAX);
        errors.into_result(name.to_string())
    }
}

/// The error shown when a group name is already taken.
pub const GROUP_NAME_TAKEN: &str = "Group with this Name already exists.";

// =============================================================================
// Login
// =============================================================================

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Upper-case the first letter of an error message.
fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        let mut out: String = first.to_uppercase().collect();
        out.push_str(chars.as_str());
        if !out.ends_with('.') {
            out.push('.');
        }
        out
    })
}
