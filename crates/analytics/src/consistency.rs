use core_types::SlaughterRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Largest accepted gap between a product's total and `peso_kg * preco_kg`.
const TOTAL_TOLERANCE: Decimal = dec!(0.01);

/// A data-quality note about a record. Never blocks storage or computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyWarning {
    ProductTotalMismatch {
        index: usize,
        nome: String,
        expected: Decimal,
        actual: Decimal,
    },
    ProductsExceedLiveWeight {
        produtos_kg: Decimal,
        peso_total_kg: Decimal,
    },
}

/// Lists the inconsistencies an auditor would want to look at.
pub fn consistency_warnings(record: &SlaughterRecord) -> Vec<ConsistencyWarning> {
    let mut warnings = Vec::new();

    for (index, produto) in record.produtos.iter().enumerate() {
        let expected = produto.peso_kg * produto.preco_kg;
        if (expected - produto.valor_total).abs() > TOTAL_TOLERANCE {
            warnings.push(ConsistencyWarning::ProductTotalMismatch {
                index,
                nome: produto.nome.clone(),
                expected,
                actual: produto.valor_total,
            });
        }
    }

    let produtos_kg: Decimal = record.produtos.iter().map(|p| p.peso_kg).sum();
    if produtos_kg > record.peso_total_kg {
        warnings.push(ConsistencyWarning::ProductsExceedLiveWeight {
            produtos_kg,
            peso_total_kg: record.peso_total_kg,
        });
    }

    warnings
}
