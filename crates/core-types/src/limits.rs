use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Performance thresholds and alert toggles for processing days.
///
/// Each `*_minimo`/`*_maximo` is the hard limit; each `*_ideal` is the target that
/// separates an acceptable day from a good one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingLimits {
    // Yield (%)
    pub rendimento_minimo: Decimal,
    pub rendimento_ideal: Decimal,

    // Profit per bird
    pub lucro_minimo_por_ave: Decimal,
    pub lucro_ideal_por_ave: Decimal,

    // Throughput
    pub aves_por_hora_minimo: Decimal,
    pub aves_por_hora_ideal: Decimal,

    // Average processed weight per bird (kg)
    pub peso_medio_minimo: Decimal,
    pub peso_medio_ideal: Decimal,

    // Fixed (operational) cost per bird
    pub custo_operacional_maximo_por_ave: Decimal,
    pub custo_operacional_ideal_por_ave: Decimal,

    // Loss (%)
    pub percentual_perdas_maximo: Decimal,

    pub alertas_ativos: bool,
    pub alerta_rendimento_baixo: bool,
    pub alerta_lucro_baixo: bool,
    pub alerta_eficiencia_baixa: bool,
    pub alerta_qualidade_baixa: bool,
    pub alerta_custo_alto: bool,
}

impl Default for ProcessingLimits {
    fn default() -> Self {
        Self {
            rendimento_minimo: dec!(80),
            rendimento_ideal: dec!(85),
            lucro_minimo_por_ave: dec!(5),
            lucro_ideal_por_ave: dec!(8),
            aves_por_hora_minimo: dec!(80),
            aves_por_hora_ideal: dec!(120),
            peso_medio_minimo: dec!(1.8),
            peso_medio_ideal: dec!(2.2),
            custo_operacional_maximo_por_ave: dec!(3.0),
            custo_operacional_ideal_por_ave: dec!(2.5),
            percentual_perdas_maximo: dec!(15),
            alertas_ativos: true,
            alerta_rendimento_baixo: true,
            alerta_lucro_baixo: true,
            alerta_eficiencia_baixa: true,
            alerta_qualidade_baixa: true,
            alerta_custo_alto: true,
        }
    }
}
