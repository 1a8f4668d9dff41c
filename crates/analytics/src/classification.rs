use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative band of a performance score.
///
/// Variants are declared worst to best, so the derived ordering ranks them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PerformanceClass {
    #[default]
    Ruim,
    Regular,
    Bom,
    #[serde(rename = "Muito Bom")]
    MuitoBom,
    Excelente,
}

impl PerformanceClass {
    /// Maps a 0-100 score to its band. Each band includes its lower bound.
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(90) {
            PerformanceClass::Excelente
        } else if score >= dec!(80) {
            PerformanceClass::MuitoBom
        } else if score >= dec!(70) {
            PerformanceClass::Bom
        } else if score >= dec!(60) {
            PerformanceClass::Regular
        } else {
            PerformanceClass::Ruim
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceClass::Excelente => "Excelente",
            PerformanceClass::MuitoBom => "Muito Bom",
            PerformanceClass::Bom => "Bom",
            PerformanceClass::Regular => "Regular",
            PerformanceClass::Ruim => "Ruim",
        }
    }
}

impl fmt::Display for PerformanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
