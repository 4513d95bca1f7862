use carbonmap::error::CarbonMapError;

#[derive(thiserror::Error, Debug)]
pub enum CarbonMapCliError {
    #[error("Anyhow error")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error(transparent)]
    CarbonMapError(#[from] CarbonMapError),
    #[error("std IO error")]
    IOError(#[from] std::io::Error),
    #[error("Invalid TOML in config file: {0}")]
    ConfigError(#[from] toml::de::Error),
}

pub type CarbonMapCliResult<T> = Result<T, CarbonMapCliError>;
