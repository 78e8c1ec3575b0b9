use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error(
        "Configuration file not found. Looked in:\n\
        - INFRADOC_CONFIG_PATH\n\
        - current directory: infradoc.local.yaml, infradoc.yaml\n\
        - ./.infradoc/\n\
        - ~/.config/infradoc/infradoc.yaml"
    )]
    ConfigFileNotFound,

    #[error("Invalid setting {field}: {message}")]
    InvalidSetting { field: &'static str, message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
