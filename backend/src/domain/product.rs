//! Product records, admin drafts and purchase perks.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Error, Money};

/// Maximum product name length in characters.
pub const PRODUCT_NAME_MAX: usize = 100;
/// Maximum product description length in characters.
pub const PRODUCT_DESCRIPTION_MAX: usize = 1000;

/// Surrogate key of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Wrap a store-assigned identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stored product.
///
/// `price == None` means the product cannot be bought; `quantity == None`
/// means stock is unlimited and never adjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Surrogate key.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Unit price, absent when not for sale.
    pub price: Option<Money>,
    /// Remaining stock, absent when unlimited.
    pub quantity: Option<u32>,
}

impl Product {
    /// Visible in the shopper view: priced and not sold out.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.price.is_some() && self.quantity != Some(0)
    }
}

/// Validated input for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    name: String,
    description: String,
    price: Option<Money>,
    quantity: Option<u32>,
}

impl ProductDraft {
    /// Validate admin input. The name is trimmed.
    pub fn new(
        name: &str,
        description: Option<&str>,
        price: Option<Money>,
        quantity: Option<u32>,
    ) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_request("product name must not be empty"));
        }
        if name.chars().count() > PRODUCT_NAME_MAX {
            return Err(Error::invalid_request(format!(
                "product name must be at most {PRODUCT_NAME_MAX} characters"
            )));
        }
        let description = description.unwrap_or_default().trim();
        if description.chars().count() > PRODUCT_DESCRIPTION_MAX {
            return Err(Error::invalid_request(format!(
                "product description must be at most {PRODUCT_DESCRIPTION_MAX} characters"
            )));
        }
        Ok(Self {
            name: name.to_owned(),
            description: description.to_owned(),
            price,
            quantity,
        })
    }

    /// Product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Product description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Unit price.
    pub fn price(&self) -> Option<Money> {
        self.price
    }

    /// Initial or replacement stock.
    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    /// Materialise the draft under a store-assigned id.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// Bonus attached to special products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductPerk {
    /// Raises the buyer's earnings multiplier by the given step per unit.
    Multiplier(u32),
}

impl ProductPerk {
    /// Recognise perk products by name, e.g. `Multiplier + 2`.
    ///
    /// ```
    /// use storefront::domain::ProductPerk;
    ///
    /// assert_eq!(ProductPerk::from_name("multiplier+3"), Some(ProductPerk::Multiplier(3)));
    /// assert_eq!(ProductPerk::from_name("Mug"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        let lower = compact.to_ascii_lowercase();
        let step = lower.strip_prefix("multiplier+")?;
        match step.parse::<u32>() {
            Ok(step) if step > 0 => Some(Self::Multiplier(step)),
            _ => None,
        }
    }

    /// Multiplier increase earned by buying `quantity` units.
    #[must_use]
    pub fn multiplier_bonus(self, quantity: u32) -> u32 {
        match self {
            Self::Multiplier(step) => step.saturating_mul(quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn product(price: Option<i64>, quantity: Option<u32>) -> Product {
        Product {
            id: ProductId::new(4),
            name: "Mug".to_owned(),
            description: "Ceramic".to_owned(),
            price: price.map(|cents| Money::from_cents(cents).expect("non-negative")),
            quantity,
        }
    }

    #[rstest]
    #[case(Some(999), Some(5), true)]
    #[case(Some(999), None, true)]
    #[case(None, Some(5), false)]
    #[case(Some(999), Some(0), false)]
    fn listing_hides_unpriced_and_sold_out(
        #[case] price: Option<i64>,
        #[case] quantity: Option<u32>,
        #[case] listed: bool,
    ) {
        assert_eq!(product(price, quantity).is_listed(), listed);
    }

    #[rstest]
    #[case("Multiplier + 2", Some(ProductPerk::Multiplier(2)))]
    #[case("MULTIPLIER+10", Some(ProductPerk::Multiplier(10)))]
    #[case("Multiplier + 0", None)]
    #[case("Multiplier", None)]
    #[case("Super Multiplier + 2", None)]
    fn parses_multiplier_perks(#[case] name: &str, #[case] expected: Option<ProductPerk>) {
        assert_eq!(ProductPerk::from_name(name), expected);
    }

    #[rstest]
    fn draft_trims_and_validates_names() {
        let draft = ProductDraft::new("  Mug  ", None, None, Some(3)).expect("valid draft");
        assert_eq!(draft.name(), "Mug");
        assert_eq!(draft.description(), "");
        assert!(ProductDraft::new("   ", None, None, None).is_err());
        assert!(ProductDraft::new(&"x".repeat(PRODUCT_NAME_MAX + 1), None, None, None).is_err());
    }
}
