use analytics::{DerivedMetrics, FormulaVariant, MetricsEngine, PerformanceClass};
use chrono::{TimeZone, Utc};
use core_types::{MAX_MAGNITUDE, ProductOutput, SlaughterRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The reference day: 100 birds, 180.5 kg live, one 150 kg carcass line.
fn reference_record() -> SlaughterRecord {
    let mut record = SlaughterRecord::new(
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
        "Unidade Principal",
        100,
        dec!(5.50),
        dec!(180.5),
    );
    record.horarios.horas_trabalhadas = dec!(7.0);
    record.horarios.horas_reais = dec!(8.0);
    record.produtos.push(ProductOutput {
        produto_id: None,
        nome: "Frango Inteiro".to_string(),
        tipo: "Carcaça".to_string(),
        peso_kg: dec!(150.0),
        preco_kg: dec!(12.50),
        valor_total: dec!(1875.0),
        percentual: Some(dec!(83.1)),
    });
    record.despesas_fixas.funcionarios = dec!(200);
    record.despesas_fixas.agua = dec!(50);
    record.despesas_fixas.energia = dec!(80);
    record
}

fn assert_all_fields_zero_or_baseline(m: &DerivedMetrics) {
    let zero_fields = [
        m.peso_inteiro_abatido,
        m.preco_venda_kg,
        m.receita_bruta,
        m.rendimento_final,
        m.media_valor_kg,
        m.custo_kg,
        m.custo_abate_kg,
        m.lucro_kg,
        m.kg_hora,
        m.percentual_custo_abate_kg,
        m.percentual_lucro_kg,
        m.percentual_lucro_total,
        m.percentual_lucro_liquido,
        m.cortes_percentual_peso,
        m.inteiro_percentual_valor,
    ];
    for value in zero_fields {
        assert_eq!(value, Decimal::ZERO);
    }
    assert_eq!(m.percentual_receita_bruta, dec!(100));
    assert_eq!(m.percentual_custo_ave, dec!(100));
}

#[test]
fn reference_day_matches_hand_computed_figures() {
    let m = MetricsEngine::default().compute(&reference_record());

    assert_eq!(m.custos_fixos, dec!(330.0));
    assert_eq!(m.custo_frango_vivo, dec!(992.75));
    assert_eq!(m.custos_totais, dec!(1322.75));
    assert_eq!(m.receita_bruta, dec!(1875.0));
    assert_eq!(m.lucro_liquido, dec!(552.25));
    assert_eq!(m.rendimento_final, dec!(83.10));
    assert_eq!(m.peso_total_perdas, dec!(30.5));
    assert_eq!(m.percentual_perda_total, dec!(16.90));

    assert_eq!(m.peso_inteiro_abatido, dec!(150));
    assert_eq!(m.preco_venda_kg, dec!(12.50));
    assert_eq!(m.valor_perdas, dec!(381.25));
    assert_eq!(m.eficiencia_aproveitamento, dec!(83.10));

    assert_eq!(m.media_valor_kg, dec!(12.50));
    assert_eq!(m.custo_kg, dec!(8.82));
    assert_eq!(m.custo_abate_kg, dec!(2.20));
    assert_eq!(m.lucro_kg, dec!(3.68));
    assert_eq!(m.custo_ave, dec!(13.23));
    assert_eq!(m.custo_frango, dec!(9.93));
    assert_eq!(m.lucro_frango, dec!(5.52));
    assert_eq!(m.lucro_total, dec!(552.25));

    assert_eq!(m.aves_hora, dec!(14.29));
    assert_eq!(m.kg_hora, dec!(21.43));
    assert_eq!(m.tempo_medio_ave, dec!(4.20));
    assert_eq!(m.eficiencia_operacional, dec!(75.49));

    assert_eq!(m.diversificacao_produtos, 1);
    assert_eq!(m.peso_medio_geral, dec!(1.50));

    assert_eq!(m.score_performance, dec!(67.06));
    assert_eq!(m.classificacao_performance, PerformanceClass::Regular);

    // "Carcaça" is not a whole-bird label, so everything is a cut.
    assert_eq!(m.cortes_peso_total, dec!(150));
    assert_eq!(m.cortes_percentual_peso, dec!(100));
    assert_eq!(m.cortes_percentual_valor, dec!(100));
    assert_eq!(m.inteiro_peso_total, Decimal::ZERO);

    assert_eq!(m.percentual_receita_bruta, dec!(100));
    assert_eq!(m.percentual_custos_totais, dec!(100));
    assert_eq!(m.percentual_media_valor_kg, dec!(100));
    assert_eq!(m.percentual_custo_kg, dec!(100));
    assert_eq!(m.percentual_custo_ave, dec!(100));
    assert_eq!(m.percentual_rendimento, dec!(83.10));
    assert_eq!(m.percentual_custo_abate_kg, dec!(24.95));
    assert_eq!(m.percentual_custo_frango, dec!(75.05));
    assert_eq!(m.percentual_lucro_kg, dec!(29.45));
    assert_eq!(m.percentual_lucro_frango, dec!(29.45));
    assert_eq!(m.percentual_lucro_total, dec!(29.45));
    assert_eq!(m.percentual_lucro_liquido, dec!(29.45));
}

#[test]
fn zero_live_weight_zeroes_yield_and_loss_only() {
    let mut record = reference_record();
    record.peso_total_kg = Decimal::ZERO;

    let m = MetricsEngine::default().compute(&record);

    assert_eq!(m.rendimento_final, Decimal::ZERO);
    assert_eq!(m.percentual_perda_total, Decimal::ZERO);
    assert_eq!(m.peso_total_perdas, Decimal::ZERO);
    // Per-kg figures are taken against product weight, not live weight.
    assert_eq!(m.custo_kg, dec!(2.20));
    assert_eq!(m.custos_totais, dec!(330));
    assert_eq!(m.percentual_custo_abate_kg, dec!(100));
}

#[test]
fn zero_birds_zeroes_every_per_bird_ratio() {
    let mut record = reference_record();
    record.quantidade_aves = 0;

    let m = MetricsEngine::default().compute(&record);

    assert_eq!(m.custo_ave, Decimal::ZERO);
    assert_eq!(m.custo_frango, Decimal::ZERO);
    assert_eq!(m.lucro_frango, Decimal::ZERO);
    assert_eq!(m.aves_hora, Decimal::ZERO);
    assert_eq!(m.tempo_medio_ave, Decimal::ZERO);
    assert_eq!(m.peso_medio_geral, Decimal::ZERO);
    assert_eq!(m.percentual_custo_frango, Decimal::ZERO);
    assert_eq!(m.percentual_lucro_frango, Decimal::ZERO);
}

#[test]
fn zero_hours_zeroes_throughput() {
    let mut record = reference_record();
    record.horarios.horas_trabalhadas = Decimal::ZERO;

    let m = MetricsEngine::default().compute(&record);

    assert_eq!(m.aves_hora, Decimal::ZERO);
    assert_eq!(m.kg_hora, Decimal::ZERO);
    assert_eq!(m.tempo_medio_ave, Decimal::ZERO);
}

#[test]
fn no_products_zeroes_product_ratios() {
    let mut record = reference_record();
    record.produtos.clear();

    let m = MetricsEngine::default().compute(&record);

    assert_all_fields_zero_or_baseline(&m);
    assert_eq!(m.diversificacao_produtos, 0);
    assert_eq!(m.peso_total_perdas, dec!(180.5));
    assert_eq!(m.percentual_perda_total, dec!(100));
    assert_eq!(m.lucro_liquido, dec!(-1322.75));
    assert_eq!(m.classificacao_performance, PerformanceClass::Ruim);
}

#[test]
fn computing_twice_is_identical() {
    let engine = MetricsEngine::default();
    let record = reference_record();
    assert_eq!(engine.compute(&record), engine.compute(&record));
}

#[test]
fn yield_is_capped_and_loss_never_negative() {
    let mut record = reference_record();
    // More product weight than live weight: inconsistent, but not an error.
    record.produtos.push(ProductOutput::priced("Coxa", "Corte", dec!(60), dec!(15)));

    let m = MetricsEngine::default().compute(&record);

    assert_eq!(m.rendimento_final, dec!(100));
    assert_eq!(m.eficiencia_aproveitamento, m.rendimento_final);
    assert_eq!(m.peso_total_perdas, Decimal::ZERO);
    assert_eq!(m.percentual_perda_total, Decimal::ZERO);
}

#[test]
fn profit_identity_holds_for_a_loss_making_day() {
    let mut record = reference_record();
    record.valor_kg_vivo = dec!(11.37);
    record.despesas_fixas.inss = dec!(123.456);

    let m = MetricsEngine::default().compute(&record);

    let diff = (m.lucro_liquido - (m.receita_bruta - m.custos_totais)).abs();
    assert!(diff <= dec!(0.01), "profit identity off by {diff}");
    assert!(m.lucro_liquido < Decimal::ZERO);
    assert!(m.percentual_lucro_total >= dec!(-100));
    assert!(m.percentual_lucro_kg >= dec!(-100));
}

#[test]
fn whole_birds_and_cuts_split_weight_and_revenue() {
    let mut record = reference_record();
    record.peso_total_kg = dec!(2500);
    record.produtos = vec![
        ProductOutput::priced("Frango", "Frango Inteiro", dec!(1000), dec!(12.50)),
        ProductOutput::priced("Coxa e Sobrecoxa", "Corte", dec!(600), dec!(15)),
    ];

    let m = MetricsEngine::default().compute(&record);

    assert_eq!(m.inteiro_peso_total, dec!(1000));
    assert_eq!(m.inteiro_valor_total, dec!(12500));
    assert_eq!(m.cortes_peso_total, dec!(600));
    assert_eq!(m.cortes_valor_total, dec!(9000));
    assert_eq!(m.inteiro_percentual_peso, dec!(62.5));
    assert_eq!(m.cortes_percentual_peso, dec!(37.5));
    assert_eq!(m.inteiro_percentual_valor, dec!(58.14));
    assert_eq!(m.cortes_percentual_valor, dec!(41.86));
    assert_eq!(m.diversificacao_produtos, 2);
}

#[test]
fn byproduct_expenses_only_count_under_their_scope() {
    let mut record = reference_record();
    record.despesas_fixas.frango_morto_plataforma = dec!(30);
    record.despesas_fixas.descarte = dec!(15);

    let canonical = MetricsEngine::default().compute(&record);
    assert_eq!(canonical.custos_fixos, dec!(330));

    let mut variant = FormulaVariant::canonical();
    variant.fixed_costs = analytics::FixedCostScope::WithByproducts;
    let with_byproducts = MetricsEngine::new(variant).compute(&record);
    assert_eq!(with_byproducts.custos_fixos, dec!(375));
}

#[test]
fn serialized_metrics_are_plain_numbers() {
    let m = MetricsEngine::default().compute(&reference_record());
    let json = serde_json::to_value(&m).unwrap();

    assert_eq!(json["lucro_liquido"], serde_json::json!(552.25));
    assert_eq!(json["classificacao_performance"], "Regular");
    assert_eq!(json["diversificacao_produtos"], 1);

    let back: DerivedMetrics = serde_json::from_value(json).unwrap();
    assert_eq!(back, m);
}

fn extreme_record(
    quantidade_aves: u32,
    valor_kg_vivo: Decimal,
    peso_total_kg: Decimal,
    produtos: &[(&str, Decimal, Decimal)],
) -> SlaughterRecord {
    let mut record = SlaughterRecord::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap(),
        "Unidade Teste",
        quantidade_aves,
        valor_kg_vivo,
        peso_total_kg,
    );
    record.peso_medio_ave = MAX_MAGNITUDE;
    record.horarios.horas_trabalhadas = dec!(8);
    record.horarios.horas_reais = dec!(7.5);
    for (tipo, peso_kg, valor_total) in produtos {
        record.produtos.push(ProductOutput {
            produto_id: None,
            nome: format!("{tipo} teste"),
            tipo: tipo.to_string(),
            peso_kg: *peso_kg,
            preco_kg: dec!(1),
            valor_total: *valor_total,
            percentual: None,
        });
    }
    record.despesas_fixas.funcionarios = MAX_MAGNITUDE;
    record.despesas_fixas.descarte = MAX_MAGNITUDE;
    record
}

#[test]
fn invariants_hold_across_degenerate_and_extreme_days() {
    let tiny = Decimal::new(1, 18);
    let cases = [
        // Tiny live weight under a heavy product line.
        extreme_record(100, dec!(5.5), dec!(0.0001), &[("Carcaça", dec!(150), dec!(1875))]),
        // A product worth a single cent.
        extreme_record(100, dec!(5.5), dec!(180.5), &[("Asa", dec!(150), dec!(0.01))]),
        // Every magnitude at its ceiling.
        extreme_record(
            u32::MAX,
            MAX_MAGNITUDE,
            MAX_MAGNITUDE,
            &[("Carcaça", MAX_MAGNITUDE, MAX_MAGNITUDE), ("Peito", MAX_MAGNITUDE, MAX_MAGNITUDE)],
        ),
        // A near-weightless product makes the price per kg enormous.
        extreme_record(1, MAX_MAGNITUDE, MAX_MAGNITUDE, &[("Coxa", tiny, MAX_MAGNITUDE)]),
        // A weightless-looking line against an equally tiny live weight.
        extreme_record(1, tiny, tiny, &[("Carcaça", tiny, tiny)]),
        // No products at all.
        extreme_record(1, dec!(0.01), dec!(0.01), &[]),
        // Many lines at the ceiling.
        extreme_record(
            10,
            dec!(6),
            dec!(1000),
            &[("Carcaça", MAX_MAGNITUDE, MAX_MAGNITUDE); 40],
        ),
    ];

    for variant in [FormulaVariant::canonical(), FormulaVariant::legacy()] {
        let engine = MetricsEngine::new(variant);
        for (i, record) in cases.iter().enumerate() {
            assert_eq!(record.validate(), Ok(()), "case {i} should be valid");
            let m = engine.compute(record);

            assert!(
                m.rendimento_final >= Decimal::ZERO && m.rendimento_final <= dec!(100),
                "case {i}: rendimento {}",
                m.rendimento_final
            );
            assert_eq!(m.rendimento_final, m.eficiencia_aproveitamento, "case {i}");

            let produced: Decimal = record.produtos.iter().map(|p| p.peso_kg).sum();
            let perdas = (record.peso_total_kg - produced).max(Decimal::ZERO).round_dp(2);
            assert_eq!(m.peso_total_perdas, perdas, "case {i}");
            assert!(m.peso_total_perdas >= Decimal::ZERO, "case {i}");
            assert!(m.percentual_perda_total <= dec!(100), "case {i}");

            let drift = (m.lucro_liquido - (m.receita_bruta - m.custos_totais)).abs();
            assert!(drift <= dec!(0.01), "case {i}: profit drift {drift}");

            assert!(
                m.score_performance >= Decimal::ZERO && m.score_performance <= dec!(100),
                "case {i}: score {}",
                m.score_performance
            );
        }
    }
}

#[test]
fn overflowing_live_cost_resolves_to_zero_instead_of_panicking() {
    // Beyond the validation ceiling, the product of weight and price leaves
    // `Decimal`'s range.
    let record = extreme_record(
        100,
        dec!(1000000000000000),
        dec!(100000000000000),
        &[("Carcaça", dec!(150), dec!(1875))],
    );
    assert!(record.validate().is_err());

    let m = MetricsEngine::default().compute(&record);
    assert_eq!(m.custo_frango_vivo, Decimal::ZERO);
    assert_eq!(m.receita_bruta, dec!(1875));
    assert_eq!(m.lucro_liquido, m.receita_bruta - m.custos_totais);
}
