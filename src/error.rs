use thiserror::Error;

#[derive(Debug, Error)]
pub enum CropError {
    /// The image has not finished loading; hosts ignore this.
    #[error("Image not ready")]
    NotReady,

    #[error("No committed selection")]
    NoSelection,

    #[error("Failed to load source image: {0}")]
    SourceLoad(String),

    #[error("Failed to encode cropped image: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl CropError {
    /// Whether the error should be shown to the operator as a blocking notice.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, CropError::SourceLoad(_) | CropError::Encode(_))
    }
}

pub type CropResult<T> = Result<T, CropError>;
