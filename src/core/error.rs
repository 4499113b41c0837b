use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scale {scale} is {}", bound_phrase("scale", .scale, .min, .max))]
    InvalidScale { scale: i32, min: i32, max: i32 },

    #[error("Max size {size} is {}", bound_phrase("size", .size, .min, .max))]
    InvalidMaxSize { size: usize, min: usize, max: usize },

    #[error("mapping overflow: index {index} has no finite lower boundary at scale {scale}")]
    MappingOverflow { index: i32, scale: i32 },

    #[error("mapping underflow: index {index} is below the smallest boundary at scale {scale}")]
    MappingUnderflow { index: i32, scale: i32 },

    #[error("Incorrect merge scale: {message}")]
    MergeScale { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn bound_phrase<T: PartialOrd + std::fmt::Display>(what: &str, value: &T, min: &T, max: &T) -> String {
    if value > max {
        format!("larger than maximum {} {}", what, max)
    } else {
        format!("smaller than minimum {} {}", what, min)
    }
}

/// Result type alias for aggregation operations
pub type Result<T> = std::result::Result<T, MetricsError>;

impl MetricsError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new merge-scale error
    pub fn merge_scale<S: Into<String>>(msg: S) -> Self {
        Self::MergeScale {
            message: msg.into(),
        }
    }

    /// Returns true if this error signals misuse of the mapping API or a
    /// broken bucket invariant rather than bad input.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            Self::MappingOverflow { .. } | Self::MappingUnderflow { .. } | Self::MergeScale { .. }
        )
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::InvalidScale { .. } | Self::InvalidMaxSize { .. } => "config",
            Self::MappingOverflow { .. } | Self::MappingUnderflow { .. } => "mapping",
            Self::MergeScale { .. } => "merge",
            Self::Io(_) => "io",
            Self::Yaml(_) | Self::Serialization(_) => "serialization",
        }
    }
}
