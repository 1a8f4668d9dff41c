use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog prices are kept in cents, rounding half away from zero.
pub fn round_price(preco_kg: Decimal) -> Decimal {
    preco_kg.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A cut or product sold by a unit, with its current price per kilogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub nome: String,
    /// Free-text product type, e.g. "peito", "coxa" or "inteiro".
    pub tipo: String,
    pub preco_kg: Decimal,
    pub unidade_origem: String,
}

impl ProductDraft {
    /// The same draft with surrounding whitespace trimmed and the price rounded.
    pub fn normalized(mut self) -> Self {
        self.nome = self.nome.trim().to_string();
        self.tipo = self.tipo.trim().to_string();
        self.unidade_origem = self.unidade_origem.trim().to_string();
        self.preco_kg = round_price(self.preco_kg);
        self
    }
}

/// A partial catalog update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub nome: Option<String>,
    pub tipo: Option<String>,
    pub preco_kg: Option<Decimal>,
    pub unidade_origem: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.nome.is_none()
            && self.tipo.is_none()
            && self.preco_kg.is_none()
            && self.unidade_origem.is_none()
    }

    /// Writes the present fields over `draft`. Returns the previous price when
    /// the update changes it.
    pub fn apply_to(self, draft: &mut ProductDraft) -> Option<Decimal> {
        if let Some(nome) = self.nome {
            draft.nome = nome.trim().to_string();
        }
        if let Some(tipo) = self.tipo {
            draft.tipo = tipo.trim().to_string();
        }
        if let Some(unidade_origem) = self.unidade_origem {
            draft.unidade_origem = unidade_origem.trim().to_string();
        }
        let preco_kg = round_price(self.preco_kg?);
        if preco_kg == draft.preco_kg {
            return None;
        }
        Some(std::mem::replace(&mut draft.preco_kg, preco_kg))
    }
}

/// Why a catalog price changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceChangeKind {
    /// The price changed as part of a general product edit.
    #[serde(rename = "Edição")]
    Edicao,
    /// A dedicated price update.
    #[serde(rename = "Atualização de Preço")]
    AtualizacaoPreco,
}

impl fmt::Display for PriceChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edicao => write!(f, "Edição"),
            Self::AtualizacaoPreco => write!(f, "Atualização de Preço"),
        }
    }
}
