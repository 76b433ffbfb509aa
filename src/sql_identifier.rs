use std::fmt;
use std::str::FromStr;

/// A Postgres identifier that is safe to splice into a REST path,
/// e.g. the name of the function behind `/rest/v1/rpc/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SqlIdentifier(String);

impl SqlIdentifier {
    /// Creates a new SqlIdentifier if the input is non-empty and only contains
    /// alphanumeric characters and underscores
    pub fn new(s: &str) -> Result<Self, String> {
        if Self::is_valid(s) {
            Ok(SqlIdentifier(s.to_string()))
        } else {
            Err(format!(
                "Invalid identifier: '{}'. Only alphanumeric characters and underscores are allowed.",
                s
            ))
        }
    }

    pub fn is_valid(s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl FromStr for SqlIdentifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SqlIdentifier::new(s)
    }
}

impl fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
