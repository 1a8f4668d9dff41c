use analytics::DerivedMetrics;
use chrono::{DateTime, Utc};
use core_types::{PriceChangeKind, ProductDraft, SlaughterRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted processing day: the input record, its derived metrics and
/// bookkeeping timestamps. Serializes to one flat JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAbate {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: SlaughterRecord,
    /// `None` when the stored metrics are absent or incomplete.
    #[serde(flatten)]
    pub metrics: Option<DerivedMetrics>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredAbate {
    pub fn new(record: SlaughterRecord, metrics: DerivedMetrics) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            metrics: Some(metrics),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Selection and paging for listing queries.
///
/// `unidade` and `tipo_ave` match as case-insensitive substrings. The date bounds
/// are both inclusive. Results are ordered by `data_abate`, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbateFilter {
    pub unidade: Option<String>,
    pub tipo_ave: Option<String>,
    pub data_inicio: Option<DateTime<Utc>>,
    pub data_fim: Option<DateTime<Utc>>,
    pub skip: usize,
    /// `None` returns every match.
    pub limit: Option<usize>,
}

impl AbateFilter {
    pub fn period(
        data_inicio: DateTime<Utc>,
        data_fim: DateTime<Utc>,
        unidade: Option<String>,
    ) -> Self {
        Self {
            unidade,
            data_inicio: Some(data_inicio),
            data_fim: Some(data_fim),
            ..Self::default()
        }
    }

    /// Whether a record passes the selection criteria. Paging is not applied.
    pub fn matches(&self, record: &SlaughterRecord) -> bool {
        contains_ci(&record.unidade, &self.unidade)
            && contains_ci(&record.tipo_ave, &self.tipo_ave)
            && self.data_inicio.is_none_or(|from| record.data_abate >= from)
            && self.data_fim.is_none_or(|to| record.data_abate <= to)
    }
}

/// A catalog entry as stored, flattened on the wire like [`StoredAbate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: ProductDraft,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(draft: ProductDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            draft,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// One entry of a product's price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub id: Uuid,
    pub produto_id: Uuid,
    pub tipo_alteracao: PriceChangeKind,
    pub campo_alterado: String,
    pub valor_anterior: Decimal,
    pub valor_novo: Decimal,
    pub data_alteracao: DateTime<Utc>,
    pub usuario: String,
    pub observacoes: Option<String>,
}

impl PriceChange {
    pub const DEFAULT_USER: &'static str = "Sistema";

    pub fn new(
        produto_id: Uuid,
        tipo_alteracao: PriceChangeKind,
        valor_anterior: Decimal,
        valor_novo: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            produto_id,
            tipo_alteracao,
            campo_alterado: "preco_kg".to_string(),
            valor_anterior,
            valor_novo,
            data_alteracao: Utc::now(),
            usuario: Self::DEFAULT_USER.to_string(),
            observacoes: None,
        }
    }
}

/// Selection and paging for catalog listings, ordered by name.
///
/// `search` matches `nome` or `tipo`; every text criterion is a
/// case-insensitive substring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub tipo: Option<String>,
    pub unidade_origem: Option<String>,
    pub skip: usize,
    pub limit: Option<usize>,
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    needle
        .as_deref()
        .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

impl ProductFilter {
    pub fn by_tipo(tipo: impl Into<String>) -> Self {
        Self {
            tipo: Some(tipo.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, draft: &ProductDraft) -> bool {
        let searched = self.search.is_none()
            || contains_ci(&draft.nome, &self.search)
            || contains_ci(&draft.tipo, &self.search);
        searched
            && contains_ci(&draft.tipo, &self.tipo)
            && contains_ci(&draft.unidade_origem, &self.unidade_origem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(unidade: &str, day: u32) -> SlaughterRecord {
        SlaughterRecord::new(
            Utc.with_ymd_and_hms(2024, 3, day, 6, 0, 0).unwrap(),
            unidade,
            100,
            dec!(5),
            dec!(200),
        )
    }

    #[test]
    fn unit_filter_is_a_case_insensitive_substring() {
        let filter = AbateFilter {
            unidade: Some("norte".to_string()),
            ..AbateFilter::default()
        };
        assert!(filter.matches(&record("Unidade Norte", 1)));
        assert!(!filter.matches(&record("Unidade Sul", 1)));
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let from = Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        let filter = AbateFilter::period(from, to, None);
        assert!(!filter.matches(&record("U", 1)));
        assert!(filter.matches(&record("U", 2)));
        assert!(filter.matches(&record("U", 4)));
        assert!(!filter.matches(&record("U", 5)));
    }

    #[test]
    fn stored_abate_serializes_flat() {
        let stored = StoredAbate::new(record("U1", 1), DerivedMetrics::default());
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["unidade"], "U1");
        assert_eq!(json["classificacao_performance"], "Ruim");
        assert!(json.get("record").is_none());

        let back: StoredAbate = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, stored.id);
        assert!(back.metrics.is_some());
    }

    #[test]
    fn product_search_covers_name_and_type() {
        let draft = ProductDraft {
            nome: "Sobrecoxa".to_string(),
            tipo: "Coxa".to_string(),
            preco_kg: dec!(9.9),
            unidade_origem: "Unidade Norte".to_string(),
        };
        let search = |term: &str| ProductFilter {
            search: Some(term.to_string()),
            ..ProductFilter::default()
        };
        assert!(search("sobre").matches(&draft));
        assert!(search("COXA").matches(&draft));
        assert!(!search("peito").matches(&draft));
        assert!(ProductFilter::by_tipo("cox").matches(&draft));

        let elsewhere = ProductFilter {
            unidade_origem: Some("sul".to_string()),
            ..ProductFilter::default()
        };
        assert!(!elsewhere.matches(&draft));
    }

    #[test]
    fn product_serializes_flat() {
        let product = Product::new(ProductDraft {
            nome: "Asa".to_string(),
            tipo: "asa".to_string(),
            preco_kg: dec!(7.25),
            unidade_origem: "U1".to_string(),
        });
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["nome"], "Asa");
        assert_eq!(json["preco_kg"].as_f64(), Some(7.25));
        assert!(json.get("draft").is_none());
    }

    #[test]
    fn incomplete_metrics_deserialize_as_missing() {
        let stored = StoredAbate::new(record("U1", 1), DerivedMetrics::default());
        let mut json = serde_json::to_value(&stored).unwrap();
        json.as_object_mut().unwrap().remove("lucro_liquido");

        let back: StoredAbate = serde_json::from_value(json).unwrap();
        assert!(back.metrics.is_none());
        assert_eq!(back.record.unidade, "U1");
    }
}
