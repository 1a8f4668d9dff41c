use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Unknown formula variant '{0}' (expected 'canonical' or 'legacy')")]
    UnknownFormulaVariant(String),
}
