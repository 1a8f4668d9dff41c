use crate::classification::PerformanceClass;
use crate::formula::FormulaVariant;
use crate::report::DerivedMetrics;
use core_types::{ProductCategory, SlaughterRecord, classify_product};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal places every derived field is rounded to.
pub const OUTPUT_DECIMAL_PLACES: u32 = 2;

const HUNDRED: Decimal = dec!(100);

/// Resolves an arithmetic result that left `Decimal`'s range to zero, with a warning.
fn or_overflow(result: Option<Decimal>, operation: &'static str) -> Decimal {
    result.unwrap_or_else(|| {
        tracing::warn!(operation, "Decimal overflow while deriving metrics; using zero.");
        Decimal::ZERO
    })
}

/// `a * b`, or zero (logged) when the product overflows.
pub(crate) fn product(a: Decimal, b: Decimal) -> Decimal {
    or_overflow(a.checked_mul(b), "multiplication")
}

/// Overflow-checked sum, zero (logged) when it overflows.
pub(crate) fn total(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    let sum = values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value));
    or_overflow(sum, "sum")
}

/// `numerator / denominator`, or zero when the denominator is not positive. A
/// quotient outside `Decimal`'s range is logged and also resolves to zero.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        or_overflow(numerator.checked_div(denominator), "division")
    } else {
        Decimal::ZERO
    }
}

/// `numerator / denominator * 100`, or zero when the denominator is not positive.
fn percent(numerator: Decimal, denominator: Decimal) -> Decimal {
    product(ratio(numerator, denominator), HUNDRED)
}

fn clamp(value: Decimal, lo: Decimal, hi: Decimal) -> Decimal {
    value.max(lo).min(hi)
}

/// A stateless calculator deriving performance metrics from one processing day.
///
/// The engine holds only its formula choices, so it is `Copy` and can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine {
    variant: FormulaVariant,
    classifier: fn(&str) -> ProductCategory,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(FormulaVariant::canonical())
    }
}

impl MetricsEngine {
    pub fn new(variant: FormulaVariant) -> Self {
        Self {
            variant,
            classifier: classify_product,
        }
    }

    /// Replaces the whole-bird/cut classification rule.
    pub fn with_classifier(mut self, classifier: fn(&str) -> ProductCategory) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn variant(&self) -> FormulaVariant {
        self.variant
    }

    /// The main entry point for deriving metrics.
    ///
    /// Never fails: every ratio with a zero denominator resolves to zero. All
    /// intermediate values are kept exact and only the final report is rounded.
    pub fn compute(&self, record: &SlaughterRecord) -> DerivedMetrics {
        let mut report = DerivedMetrics::new();

        self.calculate_revenue_and_costs(record, &mut report);
        self.calculate_yield_and_losses(record, &mut report);
        self.calculate_unit_indicators(record, &mut report);
        self.calculate_operational_efficiency(record, &mut report);
        self.calculate_product_mix(record, &mut report);
        self.calculate_score(&mut report);
        self.calculate_percentages(record, &mut report);

        report.round_dp(OUTPUT_DECIMAL_PLACES);

        tracing::debug!(
            unidade = %record.unidade,
            data_abate = %record.data_abate,
            variant = %self.variant,
            score = %report.score_performance,
            classificacao = %report.classificacao_performance,
            "Derived metrics computed."
        );

        report
    }

    /// Product aggregates, fixed and live-bird costs, revenue and profit.
    fn calculate_revenue_and_costs(&self, record: &SlaughterRecord, report: &mut DerivedMetrics) {
        let peso_total_produtos = total(record.produtos.iter().map(|p| p.peso_kg));
        let receita_bruta = total(record.produtos.iter().map(|p| p.valor_total));

        report.peso_inteiro_abatido = peso_total_produtos;
        report.receita_bruta = receita_bruta;
        report.custos_fixos = self.variant.fixed_costs(record);
        report.custo_frango_vivo = self.variant.live_bird_cost(record);
        report.custos_totais = total([report.custos_fixos, report.custo_frango_vivo]);
        report.preco_venda_kg = ratio(receita_bruta, peso_total_produtos);
        report.lucro_liquido = receita_bruta - report.custos_totais;
    }

    fn calculate_yield_and_losses(&self, record: &SlaughterRecord, report: &mut DerivedMetrics) {
        let peso_total_produtos = report.peso_inteiro_abatido;

        report.rendimento_final = percent(peso_total_produtos, record.peso_total_kg).min(HUNDRED);
        report.peso_total_perdas = (record.peso_total_kg - peso_total_produtos).max(Decimal::ZERO);
        report.percentual_perda_total = percent(report.peso_total_perdas, record.peso_total_kg);
        report.valor_perdas = product(report.peso_total_perdas, report.preco_venda_kg);
        report.eficiencia_aproveitamento = report.rendimento_final.min(HUNDRED);
    }

    fn calculate_unit_indicators(&self, record: &SlaughterRecord, report: &mut DerivedMetrics) {
        let peso = report.peso_inteiro_abatido;
        let aves = Decimal::from(record.quantidade_aves);

        report.media_valor_kg = ratio(report.receita_bruta, peso);
        report.custo_kg = ratio(report.custos_totais, peso);
        report.custo_abate_kg = ratio(report.custos_fixos, peso);
        report.lucro_kg = ratio(report.lucro_liquido, peso);

        report.custo_ave = ratio(report.custos_totais, aves);
        report.custo_frango = ratio(report.custo_frango_vivo, aves);
        report.lucro_frango = ratio(report.lucro_liquido, aves);
        report.lucro_total = report.lucro_liquido;
    }

    /// Throughput figures and the penalty-based efficiency index.
    fn calculate_operational_efficiency(
        &self,
        record: &SlaughterRecord,
        report: &mut DerivedMetrics,
    ) {
        let horas = self.variant.working_hours(record);
        let aves = Decimal::from(record.quantidade_aves);

        report.aves_hora = ratio(aves, horas);
        report.kg_hora = ratio(report.peso_inteiro_abatido, horas);
        report.tempo_medio_ave = ratio(product(horas, dec!(60)), aves);

        let mut eficiencia = HUNDRED;
        if report.rendimento_final < dec!(70) {
            eficiencia -= (dec!(70) - report.rendimento_final) * dec!(0.5);
        }
        if report.aves_hora < dec!(50) {
            eficiencia -= (dec!(50) - report.aves_hora) * dec!(0.3);
        }
        if report.percentual_perda_total > dec!(10) {
            eficiencia -= (report.percentual_perda_total - dec!(10)) * dec!(2);
        }
        report.eficiencia_operacional = clamp(eficiencia, Decimal::ZERO, HUNDRED);
    }

    /// Whole-bird vs cut split, diversity and processed weight per bird.
    fn calculate_product_mix(&self, record: &SlaughterRecord, report: &mut DerivedMetrics) {
        for produto in &record.produtos {
            match (self.classifier)(&produto.tipo) {
                ProductCategory::WholeBird => {
                    report.inteiro_peso_total += produto.peso_kg;
                    report.inteiro_valor_total += produto.valor_total;
                }
                ProductCategory::Cut => {
                    report.cortes_peso_total += produto.peso_kg;
                    report.cortes_valor_total += produto.valor_total;
                }
            }
        }

        let peso = report.peso_inteiro_abatido;
        let receita = report.receita_bruta;
        report.cortes_percentual_peso = percent(report.cortes_peso_total, peso);
        report.cortes_percentual_valor = percent(report.cortes_valor_total, receita);
        report.inteiro_percentual_peso = percent(report.inteiro_peso_total, peso);
        report.inteiro_percentual_valor = percent(report.inteiro_valor_total, receita);

        report.diversificacao_produtos = u32::try_from(record.produtos.len()).unwrap_or(u32::MAX);
        report.peso_medio_geral = ratio(peso, Decimal::from(record.quantidade_aves));
    }

    /// Weighted 0-100 score and its qualitative band, from unrounded inputs.
    fn calculate_score(&self, report: &mut DerivedMetrics) {
        let score = report.rendimento_final * dec!(0.3)
            + report.eficiencia_operacional * dec!(0.3)
            + report.aves_hora.min(HUNDRED) * dec!(0.2)
            + (HUNDRED - report.percentual_perda_total).min(HUNDRED) * dec!(0.2);

        report.score_performance = score;
        report.classificacao_performance = PerformanceClass::from_score(score);
    }

    /// Each indicator relative to its natural whole.
    fn calculate_percentages(&self, record: &SlaughterRecord, report: &mut DerivedMetrics) {
        let baseline = self.variant.baseline.baseline_pct();
        report.percentual_receita_bruta = baseline;
        report.percentual_custos_totais = baseline;
        report.percentual_media_valor_kg = baseline;
        report.percentual_custo_kg = baseline;
        report.percentual_custo_ave = baseline;

        let receita_por_ave = ratio(report.receita_bruta, Decimal::from(record.quantidade_aves));
        let margem = percent(report.lucro_liquido, report.receita_bruta);

        // Cost shares are bounded ratios; profit margins may go negative.
        report.percentual_rendimento = clamp(report.rendimento_final, Decimal::ZERO, HUNDRED);
        report.percentual_custo_abate_kg = clamp(
            percent(report.custo_abate_kg, report.custo_kg),
            Decimal::ZERO,
            HUNDRED,
        );
        report.percentual_custo_frango = clamp(
            percent(report.custo_frango, report.custo_ave),
            Decimal::ZERO,
            HUNDRED,
        );
        report.percentual_lucro_kg = clamp(
            percent(report.lucro_kg, report.preco_venda_kg),
            -HUNDRED,
            HUNDRED,
        );
        report.percentual_lucro_frango = clamp(
            percent(report.lucro_frango, receita_por_ave),
            -HUNDRED,
            HUNDRED,
        );
        report.percentual_lucro_liquido = clamp(margem, -HUNDRED, HUNDRED);
        report.percentual_lucro_total = clamp(margem, -HUNDRED, HUNDRED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_types::ProductOutput;

    fn sample_record() -> SlaughterRecord {
        let mut r = SlaughterRecord::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
            "Unidade Principal",
            100,
            dec!(5.50),
            dec!(180.5),
        );
        r.horarios.horas_trabalhadas = dec!(7.0);
        r.produtos.push(ProductOutput::priced(
            "Frango Inteiro",
            "Carcaça",
            dec!(150.0),
            dec!(12.50),
        ));
        r.despesas_fixas.funcionarios = dec!(200);
        r.despesas_fixas.agua = dec!(50);
        r.despesas_fixas.energia = dec!(80);
        r
    }

    #[test]
    fn ratio_guards_zero_denominators() {
        assert_eq!(ratio(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio(dec!(10), dec!(-2)), Decimal::ZERO);
        assert_eq!(percent(dec!(1), dec!(4)), dec!(25));
    }

    #[test]
    fn efficiency_penalties_stack_and_clamp() {
        let engine = MetricsEngine::default();
        let mut r = sample_record();
        // 20 kg out of 180.5 kg: yield ~11%, loss ~89%, throughput ~14/h.
        r.produtos[0].peso_kg = dec!(20);
        r.produtos[0].valor_total = dec!(250);
        let m = engine.compute(&r);
        assert_eq!(m.eficiencia_operacional, Decimal::ZERO);
    }

    #[test]
    fn no_penalty_for_a_fast_high_yield_day() {
        let engine = MetricsEngine::default();
        let mut r = sample_record();
        r.peso_total_kg = dec!(160);
        r.horarios.horas_trabalhadas = dec!(1);
        let m = engine.compute(&r);
        // yield 93.75, loss 6.25, 100 birds/hour
        assert_eq!(m.eficiencia_operacional, dec!(100));
        assert_eq!(m.score_performance, dec!(96.88));
        assert_eq!(m.classificacao_performance, PerformanceClass::Excelente);
    }

    #[test]
    fn custom_classifier_moves_products_between_groups() {
        let engine = MetricsEngine::default().with_classifier(|_| ProductCategory::WholeBird);
        let m = engine.compute(&sample_record());
        assert_eq!(m.inteiro_peso_total, dec!(150));
        assert_eq!(m.inteiro_percentual_peso, dec!(100));
        assert_eq!(m.cortes_peso_total, Decimal::ZERO);
    }

    #[test]
    fn legacy_variant_reproduces_bird_count_cost_and_net_hours() {
        let mut r = sample_record();
        r.peso_medio_ave = dec!(1.8);
        r.horarios.horas_reais = dec!(5);
        let m = MetricsEngine::new(FormulaVariant::legacy()).compute(&r);
        assert_eq!(m.custo_frango_vivo, dec!(990));
        assert_eq!(m.custos_totais, dec!(1320));
        assert_eq!(m.aves_hora, dec!(20));
        assert_eq!(m.tempo_medio_ave, dec!(3));
    }
}
