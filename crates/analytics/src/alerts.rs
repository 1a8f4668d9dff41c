use crate::report::DerivedMetrics;
use core_types::{ProcessingLimits, SlaughterRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    RendimentoBaixo,
    LucroBaixo,
    EficienciaBaixa,
    QualidadeBaixa,
    CustoAlto,
    PerdasAltas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Acceptable, but short of the ideal.
    Warning,
    /// Past the hard limit.
    Critical,
}

/// One limit a processing day did not meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub observed: Decimal,
    pub threshold: Decimal,
    pub message: String,
}

/// Severity for a metric where higher is better.
fn floor_severity(observed: Decimal, minimum: Decimal, ideal: Decimal) -> Option<AlertSeverity> {
    if observed < minimum {
        Some(AlertSeverity::Critical)
    } else if observed < ideal {
        Some(AlertSeverity::Warning)
    } else {
        None
    }
}

/// Severity for a metric where lower is better.
fn ceiling_severity(observed: Decimal, maximum: Decimal, ideal: Decimal) -> Option<AlertSeverity> {
    if observed > maximum {
        Some(AlertSeverity::Critical)
    } else if observed > ideal {
        Some(AlertSeverity::Warning)
    } else {
        None
    }
}

fn alert(
    kind: AlertKind,
    severity: AlertSeverity,
    observed: Decimal,
    threshold: Decimal,
    what: &str,
) -> LimitAlert {
    LimitAlert {
        kind,
        severity,
        observed,
        threshold,
        message: format!("{what}: {observed} (limit {threshold})"),
    }
}

/// Compares a day's metrics with the configured limits.
///
/// Returns nothing when alerts are globally disabled. Each check is skipped when its
/// own toggle is off. Critical alerts report the hard limit as threshold, warnings
/// report the ideal.
pub fn evaluate_limits(
    record: &SlaughterRecord,
    metrics: &DerivedMetrics,
    limits: &ProcessingLimits,
) -> Vec<LimitAlert> {
    let mut alerts = Vec::new();
    if !limits.alertas_ativos {
        return alerts;
    }

    let floor_checks = [
        (
            limits.alerta_rendimento_baixo,
            AlertKind::RendimentoBaixo,
            metrics.rendimento_final,
            limits.rendimento_minimo,
            limits.rendimento_ideal,
            "Rendimento",
        ),
        (
            limits.alerta_lucro_baixo,
            AlertKind::LucroBaixo,
            metrics.lucro_frango,
            limits.lucro_minimo_por_ave,
            limits.lucro_ideal_por_ave,
            "Lucro por ave",
        ),
        (
            limits.alerta_eficiencia_baixa,
            AlertKind::EficienciaBaixa,
            metrics.aves_hora,
            limits.aves_por_hora_minimo,
            limits.aves_por_hora_ideal,
            "Aves por hora",
        ),
        (
            limits.alerta_qualidade_baixa,
            AlertKind::QualidadeBaixa,
            metrics.peso_medio_geral,
            limits.peso_medio_minimo,
            limits.peso_medio_ideal,
            "Peso médio por ave",
        ),
    ];

    for (enabled, kind, observed, minimum, ideal, what) in floor_checks {
        if !enabled {
            continue;
        }
        match floor_severity(observed, minimum, ideal) {
            Some(AlertSeverity::Critical) => {
                alerts.push(alert(kind, AlertSeverity::Critical, observed, minimum, what))
            }
            Some(AlertSeverity::Warning) => {
                alerts.push(alert(kind, AlertSeverity::Warning, observed, ideal, what))
            }
            None => {}
        }
    }

    if limits.alerta_custo_alto && record.quantidade_aves > 0 {
        let custo_operacional = metrics
            .custos_fixos
            .checked_div(Decimal::from(record.quantidade_aves))
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        let maximum = limits.custo_operacional_maximo_por_ave;
        let ideal = limits.custo_operacional_ideal_por_ave;
        match ceiling_severity(custo_operacional, maximum, ideal) {
            Some(AlertSeverity::Critical) => alerts.push(alert(
                AlertKind::CustoAlto,
                AlertSeverity::Critical,
                custo_operacional,
                maximum,
                "Custo operacional por ave",
            )),
            Some(AlertSeverity::Warning) => alerts.push(alert(
                AlertKind::CustoAlto,
                AlertSeverity::Warning,
                custo_operacional,
                ideal,
                "Custo operacional por ave",
            )),
            None => {}
        }
    }

    // Losses have no ideal, only a ceiling.
    if metrics.percentual_perda_total > limits.percentual_perdas_maximo {
        alerts.push(alert(
            AlertKind::PerdasAltas,
            AlertSeverity::Critical,
            metrics.percentual_perda_total,
            limits.percentual_perdas_maximo,
            "Percentual de perdas",
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn record() -> SlaughterRecord {
        SlaughterRecord::new(Utc::now(), "U1", 1000, dec!(5.5), dec!(2500))
    }

    fn healthy_metrics() -> DerivedMetrics {
        DerivedMetrics {
            rendimento_final: dec!(90),
            lucro_frango: dec!(9),
            aves_hora: dec!(130),
            peso_medio_geral: dec!(2.3),
            custos_fixos: dec!(2000),
            percentual_perda_total: dec!(10),
            ..DerivedMetrics::default()
        }
    }

    #[test]
    fn healthy_day_raises_nothing() {
        let alerts = evaluate_limits(&record(), &healthy_metrics(), &ProcessingLimits::default());
        assert!(alerts.is_empty(), "{alerts:?}");
    }

    #[test]
    fn below_minimum_is_critical_and_below_ideal_is_warning() {
        let metrics = DerivedMetrics {
            rendimento_final: dec!(75),
            lucro_frango: dec!(6),
            ..healthy_metrics()
        };
        let alerts = evaluate_limits(&record(), &metrics, &ProcessingLimits::default());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::RendimentoBaixo);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].threshold, dec!(80));
        assert_eq!(alerts[1].kind, AlertKind::LucroBaixo);
        assert_eq!(alerts[1].severity, AlertSeverity::Warning);
        assert_eq!(alerts[1].threshold, dec!(8));
    }

    #[test]
    fn operational_cost_uses_fixed_costs_per_bird() {
        let metrics = DerivedMetrics {
            custos_fixos: dec!(2800),
            ..healthy_metrics()
        };
        let alerts = evaluate_limits(&record(), &metrics, &ProcessingLimits::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::CustoAlto);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[0].observed, dec!(2.8));
    }

    #[test]
    fn master_switch_and_toggles_silence_alerts() {
        let metrics = DerivedMetrics {
            rendimento_final: dec!(10),
            percentual_perda_total: dec!(90),
            ..healthy_metrics()
        };
        let off = ProcessingLimits {
            alertas_ativos: false,
            ..ProcessingLimits::default()
        };
        assert!(evaluate_limits(&record(), &metrics, &off).is_empty());

        let no_yield = ProcessingLimits {
            alerta_rendimento_baixo: false,
            ..ProcessingLimits::default()
        };
        let alerts = evaluate_limits(&record(), &metrics, &no_yield);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::PerdasAltas);
    }
}
