//! Product catalog shared by stock movements, online orders, returns and
//! reviews.

use crate::generators::numeric::generate_int_range;
use crate::generators::pick::pick_str;
use rand::Rng;

const MATERIALS: &[&str] = &["Denim", "Corduroy", "Linen", "Cotton", "Wool", "Canvas"];
const STYLES: &[&str] = &["Skinny", "Bootcut", "Straight", "Relaxed", "Cargo", "Wide-leg"];
const GARMENTS: &[&str] = &["Jeans", "Trousers", "Shorts", "Jacket", "Skirt"];
const SIZES: &[&str] = &["XS", "S", "M", "L", "XL", "XXL"];

/// A product that can be ordered and reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Product {
    pub sku: String,
    pub description: String,
    pub size: String,
}

impl Product {
    /// Generate a random product.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let material = pick_str(rng, MATERIALS);
        let style = pick_str(rng, STYLES);
        let garment = pick_str(rng, GARMENTS);
        let size = pick_str(rng, SIZES);
        let number = generate_int_range(rng, 1000, 9999);

        Self {
            sku: format!(
                "{}-{}-{number}",
                &material[..3].to_uppercase(),
                &garment[..3].to_uppercase()
            ),
            description: format!("{size} {style} {material} {garment}"),
            size: size.to_string(),
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description, self.sku)
    }
}

/// The set of reviewable products, some of which have a known size issue.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
    size_issue_count: usize,
}

impl ProductCatalog {
    /// Generate `total` products, the first `with_size_issue` of which are
    /// flagged as having a size issue. `total` is raised to cover them.
    pub fn generate<R: Rng>(rng: &mut R, total: usize, with_size_issue: usize) -> Self {
        let total = total.max(with_size_issue);
        let products = (0..total).map(|_| Product::generate(rng)).collect();
        Self {
            products,
            size_issue_count: with_size_issue,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products with a known size issue.
    pub fn with_size_issue(&self) -> &[Product] {
        &self.products[..self.size_issue_count]
    }

    pub fn has_size_issue(&self, index: usize) -> bool {
        index < self.size_issue_count
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
