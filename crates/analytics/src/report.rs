use crate::classification::PerformanceClass;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Every indicator derived from one processing day.
///
/// This struct is the final output of the `MetricsEngine` and is stored next to the
/// record it was derived from. It is never patched field by field: any change to the
/// inputs replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    // I. Revenue, cost and profit
    /// Total product weight (Σ `peso_kg`).
    pub peso_inteiro_abatido: Decimal,
    pub preco_venda_kg: Decimal,
    pub receita_bruta: Decimal,
    pub custos_fixos: Decimal,
    pub custo_frango_vivo: Decimal,
    pub custos_totais: Decimal,
    pub lucro_liquido: Decimal,
    pub rendimento_final: Decimal,

    // II. Cuts vs whole birds
    pub cortes_peso_total: Decimal,
    pub cortes_valor_total: Decimal,
    pub cortes_percentual_peso: Decimal,
    pub cortes_percentual_valor: Decimal,
    pub inteiro_peso_total: Decimal,
    pub inteiro_valor_total: Decimal,
    pub inteiro_percentual_peso: Decimal,
    pub inteiro_percentual_valor: Decimal,

    // III. Per-unit indicators
    pub media_valor_kg: Decimal,
    pub custo_kg: Decimal,
    pub custo_ave: Decimal,
    pub custo_abate_kg: Decimal,
    pub custo_frango: Decimal,
    pub lucro_kg: Decimal,
    pub lucro_frango: Decimal,
    pub lucro_total: Decimal,

    // IV. Operational efficiency
    pub aves_hora: Decimal,
    pub kg_hora: Decimal,
    /// Minutes per bird.
    pub tempo_medio_ave: Decimal,
    pub eficiencia_operacional: Decimal,

    // V. Losses
    pub peso_total_perdas: Decimal,
    pub percentual_perda_total: Decimal,
    pub valor_perdas: Decimal,
    pub eficiencia_aproveitamento: Decimal,

    // VI. Quality
    pub diversificacao_produtos: u32,
    pub peso_medio_geral: Decimal,

    // VII. Score
    pub score_performance: Decimal,
    pub classificacao_performance: PerformanceClass,

    // VIII. Percentages
    pub percentual_receita_bruta: Decimal,
    pub percentual_custos_totais: Decimal,
    pub percentual_lucro_liquido: Decimal,
    pub percentual_rendimento: Decimal,
    pub percentual_media_valor_kg: Decimal,
    pub percentual_custo_kg: Decimal,
    pub percentual_custo_ave: Decimal,
    pub percentual_custo_abate_kg: Decimal,
    pub percentual_custo_frango: Decimal,
    pub percentual_lucro_kg: Decimal,
    pub percentual_lucro_frango: Decimal,
    pub percentual_lucro_total: Decimal,
}

impl DerivedMetrics {
    /// Creates a new, zeroed-out report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rounds every decimal field to `dp` places (banker's rounding).
    pub fn round_dp(&mut self, dp: u32) {
        for field in self.decimal_fields_mut() {
            *field = field.round_dp(dp).normalize();
        }
    }

    fn decimal_fields_mut(&mut self) -> [&mut Decimal; 46] {
        [
            &mut self.peso_inteiro_abatido,
            &mut self.preco_venda_kg,
            &mut self.receita_bruta,
            &mut self.custos_fixos,
            &mut self.custo_frango_vivo,
            &mut self.custos_totais,
            &mut self.lucro_liquido,
            &mut self.rendimento_final,
            &mut self.cortes_peso_total,
            &mut self.cortes_valor_total,
            &mut self.cortes_percentual_peso,
            &mut self.cortes_percentual_valor,
            &mut self.inteiro_peso_total,
            &mut self.inteiro_valor_total,
            &mut self.inteiro_percentual_peso,
            &mut self.inteiro_percentual_valor,
            &mut self.media_valor_kg,
            &mut self.custo_kg,
            &mut self.custo_ave,
            &mut self.custo_abate_kg,
            &mut self.custo_frango,
            &mut self.lucro_kg,
            &mut self.lucro_frango,
            &mut self.lucro_total,
            &mut self.aves_hora,
            &mut self.kg_hora,
            &mut self.tempo_medio_ave,
            &mut self.eficiencia_operacional,
            &mut self.peso_total_perdas,
            &mut self.percentual_perda_total,
            &mut self.valor_perdas,
            &mut self.eficiencia_aproveitamento,
            &mut self.peso_medio_geral,
            &mut self.score_performance,
            &mut self.percentual_receita_bruta,
            &mut self.percentual_custos_totais,
            &mut self.percentual_lucro_liquido,
            &mut self.percentual_rendimento,
            &mut self.percentual_media_valor_kg,
            &mut self.percentual_custo_kg,
            &mut self.percentual_custo_ave,
            &mut self.percentual_custo_abate_kg,
            &mut self.percentual_custo_frango,
            &mut self.percentual_lucro_kg,
            &mut self.percentual_lucro_frango,
            &mut self.percentual_lucro_total,
        ]
    }
}
