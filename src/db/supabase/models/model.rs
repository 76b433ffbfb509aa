use std::mem::discriminant;
use std::path::PathBuf;

/// Broad failure classes an operator (or a calling script) can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    FileAccess,
    RemoteCall,
    /// The report itself could not be written (closed or full stdout).
    Output,
}

impl ErrorClass {
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorClass::Configuration => 1,
            ErrorClass::FileAccess => 2,
            ErrorClass::RemoteCall => 3,
            ErrorClass::Output => 4,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupabaseModelError {
    #[error("Missing {}", .0.join(" and "))]
    MissingConfig(Vec<&'static str>),

    #[error("{0} is set but is not valid UTF-8")]
    NonUnicodeConfig(&'static str),

    #[error("Invalid RPC function name: {0}")]
    InvalidRpcFunction(String),

    #[error("Could not read migration file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl SupabaseModelError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingConfig(_) | Self::NonUnicodeConfig(_) | Self::InvalidRpcFunction(_) => {
                ErrorClass::Configuration
            }
            Self::FileRead { .. } => ErrorClass::FileAccess,
            Self::ClientBuild(_) | Self::Network(_) | Self::Api { .. } => ErrorClass::RemoteCall,
        }
    }
}

impl PartialEq for SupabaseModelError {
    fn eq(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }
}

impl Eq for SupabaseModelError {}

impl From<reqwest::Error> for SupabaseModelError {
    fn from(error: reqwest::Error) -> Self {
        SupabaseModelError::Network(error.to_string())
    }
}
