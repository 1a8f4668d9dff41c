use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_tipo_ave() -> String {
    "frango".to_string()
}

/// One day (or batch) of processing at one unit: the input of the metrics engine.
///
/// Only `data_abate`, `quantidade_aves`, `valor_kg_vivo`, `peso_total_kg` and
/// `unidade` are required on the wire. Every other numeric field defaults to zero
/// and the collections default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaughterRecord {
    pub data_abate: DateTime<Utc>,
    pub quantidade_aves: u32,
    pub valor_kg_vivo: Decimal,
    pub peso_total_kg: Decimal,
    #[serde(default)]
    pub peso_medio_ave: Decimal,
    #[serde(default)]
    pub valor_total: Decimal,

    pub unidade: String,
    #[serde(default = "default_tipo_ave")]
    pub tipo_ave: String,
    #[serde(default)]
    pub observacoes: Option<String>,

    #[serde(default)]
    pub horarios: WorkSchedule,
    #[serde(default)]
    pub produtos: Vec<ProductOutput>,
    #[serde(default)]
    pub despesas_fixas: FixedExpenses,
}

impl SlaughterRecord {
    /// Creates a record with the required fields set and everything else empty.
    pub fn new(
        data_abate: DateTime<Utc>,
        unidade: impl Into<String>,
        quantidade_aves: u32,
        valor_kg_vivo: Decimal,
        peso_total_kg: Decimal,
    ) -> Self {
        Self {
            data_abate,
            quantidade_aves,
            valor_kg_vivo,
            peso_total_kg,
            peso_medio_ave: Decimal::ZERO,
            valor_total: Decimal::ZERO,
            unidade: unidade.into(),
            tipo_ave: default_tipo_ave(),
            observacoes: None,
            horarios: WorkSchedule::default(),
            produtos: Vec::new(),
            despesas_fixas: FixedExpenses::default(),
        }
    }
}

/// Working-time record of a processing day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkSchedule {
    /// Start of the shift, "HH:MM".
    pub hora_inicio: Option<String>,
    /// End of the shift, "HH:MM".
    pub hora_termino: Option<String>,
    pub intervalo_minutos: u32,
    /// Scheduled hours.
    pub horas_trabalhadas: Decimal,
    /// Hours net of the break.
    pub horas_reais: Decimal,
}

/// A product (cut or whole bird) produced by a processing day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOutput {
    #[serde(default)]
    pub produto_id: Option<String>,
    #[serde(default)]
    pub nome: String,
    /// Free-text category, matched case-insensitively.
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub peso_kg: Decimal,
    #[serde(default)]
    pub preco_kg: Decimal,
    /// Expected to be close to `peso_kg * preco_kg`; not enforced.
    #[serde(default)]
    pub valor_total: Decimal,
    #[serde(default)]
    pub percentual: Option<Decimal>,
}

impl ProductOutput {
    /// Builds a product whose total is exactly `peso_kg * preco_kg`.
    pub fn priced(
        nome: impl Into<String>,
        tipo: impl Into<String>,
        peso_kg: Decimal,
        preco_kg: Decimal,
    ) -> Self {
        Self {
            produto_id: None,
            nome: nome.into(),
            tipo: tipo.into(),
            peso_kg,
            preco_kg,
            valor_total: peso_kg * preco_kg,
            percentual: None,
        }
    }
}

/// The fixed operating expenses of a processing day.
///
/// The first seventeen fields are the base operating costs. The last four are
/// byproduct/waste entries that only some formula variants add to the fixed-cost sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedExpenses {
    pub funcionarios: Decimal,
    pub agua: Decimal,
    pub energia: Decimal,
    pub embalagem: Decimal,
    pub refeicao: Decimal,
    pub materiais_limpeza: Decimal,
    pub gelo: Decimal,
    pub horas_extras: Decimal,
    pub amonia: Decimal,
    pub epi: Decimal,
    pub manutencao: Decimal,
    pub lenha_caldeira: Decimal,
    pub diaristas: Decimal,
    pub depreciacao: Decimal,
    pub recisao: Decimal,
    pub ferias: Decimal,
    pub inss: Decimal,

    pub frango_morto_plataforma: Decimal,
    pub escaldagem_eviceracao: Decimal,
    pub pe_graxaria: Decimal,
    pub descarte: Decimal,
}

impl FixedExpenses {
    /// The base operating costs, paired with their field names.
    pub fn base_entries(&self) -> [(&'static str, Decimal); 17] {
        [
            ("funcionarios", self.funcionarios),
            ("agua", self.agua),
            ("energia", self.energia),
            ("embalagem", self.embalagem),
            ("refeicao", self.refeicao),
            ("materiais_limpeza", self.materiais_limpeza),
            ("gelo", self.gelo),
            ("horas_extras", self.horas_extras),
            ("amonia", self.amonia),
            ("epi", self.epi),
            ("manutencao", self.manutencao),
            ("lenha_caldeira", self.lenha_caldeira),
            ("diaristas", self.diaristas),
            ("depreciacao", self.depreciacao),
            ("recisao", self.recisao),
            ("ferias", self.ferias),
            ("inss", self.inss),
        ]
    }

    /// The byproduct and waste entries, paired with their field names.
    pub fn byproduct_entries(&self) -> [(&'static str, Decimal); 4] {
        [
            ("frango_morto_plataforma", self.frango_morto_plataforma),
            ("escaldagem_eviceracao", self.escaldagem_eviceracao),
            ("pe_graxaria", self.pe_graxaria),
            ("descarte", self.descarte),
        ]
    }

    pub fn base_total(&self) -> Decimal {
        self.base_entries().iter().map(|(_, v)| *v).sum()
    }

    pub fn byproduct_total(&self) -> Decimal {
        self.byproduct_entries().iter().map(|(_, v)| *v).sum()
    }
}
