use crate::catalog::{ProductDraft, ProductPatch, round_price};
use crate::error::CoreError;
use crate::limits::ProcessingLimits;
use crate::record::{FixedExpenses, SlaughterRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const MAX_UNIDADE_LEN: usize = 100;
const MAX_OBSERVACOES_LEN: usize = 500;
const MAX_PRODUCT_NAME_LEN: usize = 100;
const MAX_PRODUCT_TYPE_LEN: usize = 50;

/// Upper bound for any single weight, price, hour count or expense.
///
/// Keeps every product of two inputs (and of a bird count with two inputs)
/// inside `Decimal`'s range, so derived metrics never overflow.
pub const MAX_MAGNITUDE: Decimal = dec!(1000000000);

fn require_within_ceiling(field: &str, value: Decimal) -> Result<(), CoreError> {
    if value > MAX_MAGNITUDE {
        Err(CoreError::InvalidInput(
            field.to_string(),
            format!("must not exceed {MAX_MAGNITUDE}, got {value}"),
        ))
    } else {
        Ok(())
    }
}

fn require_positive(field: &str, value: Decimal) -> Result<(), CoreError> {
    if value > Decimal::ZERO {
        require_within_ceiling(field, value)
    } else {
        Err(CoreError::InvalidInput(
            field.to_string(),
            format!("must be greater than zero, got {value}"),
        ))
    }
}

fn require_non_negative(field: &str, value: Decimal) -> Result<(), CoreError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(CoreError::InvalidInput(
            field.to_string(),
            format!("must not be negative, got {value}"),
        ))
    } else {
        require_within_ceiling(field, value)
    }
}

impl SlaughterRecord {
    /// Checks the presence, sign and magnitude rules a record must satisfy before it is stored.
    ///
    /// Returns the first violation found. Data-quality concerns (a product total that
    /// does not match weight times price, products heavier than the live weight) are
    /// not violations.
    pub fn validate(&self) -> Result<(), CoreError> {
        let unidade = self.unidade.trim();
        if unidade.is_empty() {
            return Err(CoreError::MissingRequiredField("unidade".to_string()));
        }
        if unidade.chars().count() > MAX_UNIDADE_LEN {
            return Err(CoreError::InvalidInput(
                "unidade".to_string(),
                format!("must be at most {MAX_UNIDADE_LEN} characters"),
            ));
        }
        if let Some(obs) = &self.observacoes {
            if obs.chars().count() > MAX_OBSERVACOES_LEN {
                return Err(CoreError::InvalidInput(
                    "observacoes".to_string(),
                    format!("must be at most {MAX_OBSERVACOES_LEN} characters"),
                ));
            }
        }

        if self.quantidade_aves == 0 {
            return Err(CoreError::InvalidInput(
                "quantidade_aves".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        require_positive("valor_kg_vivo", self.valor_kg_vivo)?;
        require_positive("peso_total_kg", self.peso_total_kg)?;
        require_non_negative("peso_medio_ave", self.peso_medio_ave)?;
        require_non_negative("valor_total", self.valor_total)?;

        require_non_negative("horarios.horas_trabalhadas", self.horarios.horas_trabalhadas)?;
        require_non_negative("horarios.horas_reais", self.horarios.horas_reais)?;

        self.despesas_fixas.validate_as("despesas_fixas")?;

        for (i, produto) in self.produtos.iter().enumerate() {
            require_positive(&format!("produtos[{i}].peso_kg"), produto.peso_kg)?;
            require_positive(&format!("produtos[{i}].preco_kg"), produto.preco_kg)?;
            require_positive(&format!("produtos[{i}].valor_total"), produto.valor_total)?;
        }

        Ok(())
    }
}

impl FixedExpenses {
    /// Every expense, base or byproduct, must be non-negative.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.validate_as("")
    }

    fn validate_as(&self, prefix: &str) -> Result<(), CoreError> {
        for (name, value) in self
            .base_entries()
            .into_iter()
            .chain(self.byproduct_entries())
        {
            let field = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };
            require_non_negative(&field, value)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::MissingRequiredField(field.to_string()));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(())
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("nome", &self.nome, MAX_PRODUCT_NAME_LEN)?;
        require_text("tipo", &self.tipo, MAX_PRODUCT_TYPE_LEN)?;
        // Judged at the precision it is stored with.
        require_positive("preco_kg", round_price(self.preco_kg))?;
        require_text("unidade_origem", &self.unidade_origem, MAX_UNIDADE_LEN)
    }
}

impl ProductPatch {
    /// Applies the draft rules to the fields that are present.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(nome) = &self.nome {
            require_text("nome", nome, MAX_PRODUCT_NAME_LEN)?;
        }
        if let Some(tipo) = &self.tipo {
            require_text("tipo", tipo, MAX_PRODUCT_TYPE_LEN)?;
        }
        if let Some(preco_kg) = self.preco_kg {
            require_positive("preco_kg", round_price(preco_kg))?;
        }
        if let Some(unidade_origem) = &self.unidade_origem {
            require_text("unidade_origem", unidade_origem, MAX_UNIDADE_LEN)?;
        }
        Ok(())
    }
}

fn require_ordered(
    low_name: &str,
    low: Decimal,
    high_name: &str,
    high: Decimal,
) -> Result<(), CoreError> {
    if low > high {
        Err(CoreError::InvalidInput(
            low_name.to_string(),
            format!("must not exceed {high_name} ({low} > {high})"),
        ))
    } else {
        Ok(())
    }
}

impl ProcessingLimits {
    /// Thresholds must be non-negative and each hard limit must sit on the correct
    /// side of its ideal.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("rendimento_minimo", self.rendimento_minimo),
            ("rendimento_ideal", self.rendimento_ideal),
            ("aves_por_hora_minimo", self.aves_por_hora_minimo),
            ("aves_por_hora_ideal", self.aves_por_hora_ideal),
            ("peso_medio_minimo", self.peso_medio_minimo),
            ("peso_medio_ideal", self.peso_medio_ideal),
            ("custo_operacional_maximo_por_ave", self.custo_operacional_maximo_por_ave),
            ("custo_operacional_ideal_por_ave", self.custo_operacional_ideal_por_ave),
            ("percentual_perdas_maximo", self.percentual_perdas_maximo),
        ] {
            require_non_negative(name, value)?;
        }

        require_ordered(
            "rendimento_minimo",
            self.rendimento_minimo,
            "rendimento_ideal",
            self.rendimento_ideal,
        )?;
        require_ordered(
            "lucro_minimo_por_ave",
            self.lucro_minimo_por_ave,
            "lucro_ideal_por_ave",
            self.lucro_ideal_por_ave,
        )?;
        require_ordered(
            "aves_por_hora_minimo",
            self.aves_por_hora_minimo,
            "aves_por_hora_ideal",
            self.aves_por_hora_ideal,
        )?;
        require_ordered(
            "peso_medio_minimo",
            self.peso_medio_minimo,
            "peso_medio_ideal",
            self.peso_medio_ideal,
        )?;
        require_ordered(
            "custo_operacional_ideal_por_ave",
            self.custo_operacional_ideal_por_ave,
            "custo_operacional_maximo_por_ave",
            self.custo_operacional_maximo_por_ave,
        )
    }
}
