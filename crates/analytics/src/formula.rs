use crate::engine::{product, total};
use crate::error::AnalyticsError;
use core_types::SlaughterRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the cost of the live birds is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveCostBasis {
    /// `peso_total_kg * valor_kg_vivo`.
    #[default]
    TotalWeight,
    /// `quantidade_aves * valor_kg_vivo * peso_medio_ave`.
    BirdCountTimesAverageWeight,
}

/// Which hours figure drives the throughput indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursBasis {
    /// `horarios.horas_trabalhadas`.
    #[default]
    Scheduled,
    /// `horarios.horas_reais`.
    Net,
}

/// Which expense fields enter the fixed-cost sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedCostScope {
    /// The seventeen base operating costs.
    #[default]
    Base,
    /// The base costs plus the four byproduct/waste entries.
    WithByproducts,
}

/// Policy for the percentage fields that have no natural ratio baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// Each such field is its own whole, so it always reads 100%.
    #[default]
    SelfReferential,
}

impl BaselinePolicy {
    pub const SELF_REFERENTIAL_PCT: Decimal = dec!(100);

    /// Value reported for `percentual_receita_bruta`, `percentual_custos_totais`,
    /// `percentual_media_valor_kg`, `percentual_custo_kg` and `percentual_custo_ave`.
    pub fn baseline_pct(self) -> Decimal {
        match self {
            BaselinePolicy::SelfReferential => Self::SELF_REFERENTIAL_PCT,
        }
    }
}

/// The set of formula choices the metrics engine computes under.
///
/// Records have been computed under more than one convention over time; keeping the
/// choices explicit lets old figures be reproduced exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaVariant {
    pub live_cost: LiveCostBasis,
    pub hours: HoursBasis,
    pub fixed_costs: FixedCostScope,
    pub baseline: BaselinePolicy,
}

impl FormulaVariant {
    /// Weight-based live cost, scheduled hours, base expense fields.
    pub const fn canonical() -> Self {
        Self {
            live_cost: LiveCostBasis::TotalWeight,
            hours: HoursBasis::Scheduled,
            fixed_costs: FixedCostScope::Base,
            baseline: BaselinePolicy::SelfReferential,
        }
    }

    /// Bird-count live cost and net hours, as used by older generated data.
    pub const fn legacy() -> Self {
        Self {
            live_cost: LiveCostBasis::BirdCountTimesAverageWeight,
            hours: HoursBasis::Net,
            fixed_costs: FixedCostScope::Base,
            baseline: BaselinePolicy::SelfReferential,
        }
    }

    pub fn live_bird_cost(&self, record: &SlaughterRecord) -> Decimal {
        match self.live_cost {
            LiveCostBasis::TotalWeight => product(record.peso_total_kg, record.valor_kg_vivo),
            LiveCostBasis::BirdCountTimesAverageWeight => product(
                product(Decimal::from(record.quantidade_aves), record.valor_kg_vivo),
                record.peso_medio_ave,
            ),
        }
    }

    pub fn working_hours(&self, record: &SlaughterRecord) -> Decimal {
        match self.hours {
            HoursBasis::Scheduled => record.horarios.horas_trabalhadas,
            HoursBasis::Net => record.horarios.horas_reais,
        }
    }

    pub fn fixed_costs(&self, record: &SlaughterRecord) -> Decimal {
        let expenses = &record.despesas_fixas;
        let base = expenses.base_entries().into_iter().map(|(_, v)| v);
        match self.fixed_costs {
            FixedCostScope::Base => total(base),
            FixedCostScope::WithByproducts => {
                total(base.chain(expenses.byproduct_entries().into_iter().map(|(_, v)| v)))
            }
        }
    }
}

impl fmt::Display for FormulaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::canonical() {
            write!(f, "canonical")
        } else if *self == Self::legacy() {
            write!(f, "legacy")
        } else {
            write!(
                f,
                "custom(live_cost={:?}, hours={:?}, fixed_costs={:?})",
                self.live_cost, self.hours, self.fixed_costs
            )
        }
    }
}

impl FromStr for FormulaVariant {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "canonical" => Ok(Self::canonical()),
            "legacy" => Ok(Self::legacy()),
            other => Err(AnalyticsError::UnknownFormulaVariant(other.to_string())),
        }
    }
}
