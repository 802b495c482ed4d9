use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdenError {
    #[error("Unknown garden category: {0}")]
    InvalidCategory(String),

    #[error("Recipe not found in catalog: {0}")]
    UnknownRecipe(String),

    #[error("Shopping item not found: {0}")]
    UnknownShoppingItem(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EdenError>;
