pub type TurnshotResult<T> = Result<T, TurnshotError>;

#[derive(thiserror::Error, Debug)]
pub enum TurnshotError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("scene error: {0}")]
    Scene(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TurnshotError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
