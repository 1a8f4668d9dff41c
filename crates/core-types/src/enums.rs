use serde::{Deserialize, Serialize};

/// Whether a product is sold as a whole bird or as a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    WholeBird,
    Cut,
}

/// Classifies a free-text product category.
///
/// A category containing "inteiro" or "inteira" (any case) is a whole bird;
/// everything else, including an empty string, counts as a cut.
pub fn classify_product(tipo: &str) -> ProductCategory {
    let tipo = tipo.to_lowercase();
    if tipo.contains("inteiro") || tipo.contains("inteira") {
        ProductCategory::WholeBird
    } else {
        ProductCategory::Cut
    }
}
