use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::db::supabase::models::model::SupabaseModelError;
use crate::db::supabase::supabase_db::{lookup_utf8, SupabaseCredentials};
use crate::sql_identifier::SqlIdentifier;

pub const DEFAULT_MIGRATION_FILE: &str = "migrations/update_clients_schema.sql";
pub const MIGRATION_FILE_VAR: &str = "MIGRATION_FILE";
pub const SQL_RPC_VAR: &str = "SUPABASE_SQL_RPC";

/// How the SQL text is handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    /// `POST /rest/v1/` with `{"query": ...}`. Not part of the documented REST
    /// contract, so acceptance does not prove execution.
    Raw,
    /// `POST /rest/v1/rpc/<function>` with `{"sql_query": ...}`. Requires a
    /// matching function to exist in the target database.
    Rpc(SqlIdentifier),
}

impl DeliveryMode {
    pub fn request_path(&self) -> String {
        match self {
            DeliveryMode::Raw => "/rest/v1/".to_string(),
            DeliveryMode::Rpc(function) => format!("/rest/v1/rpc/{}", function),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Raw => write!(f, "raw query"),
            DeliveryMode::Rpc(function) => write!(f, "rpc {}", function),
        }
    }
}

/// Everything one run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub credentials: SupabaseCredentials,
    pub migration_file_path: PathBuf,
    pub delivery: DeliveryMode,
}

impl MigrationConfig {
    /// `path_arg` (the first command line argument) wins over `MIGRATION_FILE`,
    /// which wins over the built-in default. The path is kept as an OS string
    /// end to end so non-UTF-8 file names are read as given.
    pub fn from_lookup<F>(lookup: F, path_arg: Option<PathBuf>) -> Result<Self, SupabaseModelError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let credentials = SupabaseCredentials::from_lookup(&lookup)?;

        let delivery = match lookup_utf8(&lookup, SQL_RPC_VAR)? {
            Some(function) => DeliveryMode::Rpc(
                SqlIdentifier::new(function.trim()).map_err(SupabaseModelError::InvalidRpcFunction)?,
            ),
            None => DeliveryMode::Raw,
        };

        let migration_file_path = path_arg
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| {
                lookup(MIGRATION_FILE_VAR)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATION_FILE));

        Ok(Self {
            credentials,
            migration_file_path,
            delivery,
        })
    }

    /// Reads the process environment. Call `dotenvy::dotenv()` beforehand if a
    /// `.env` file should be honored.
    pub fn from_env() -> Result<Self, SupabaseModelError> {
        Self::from_lookup(|name: &str| env::var_os(name), env::args_os().nth(1).map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let vars: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const BASE: [(&str, &str); 2] = [
        ("SUPABASE_URL", "https://abc.supabase.co"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::from_lookup(lookup_from(&BASE), None).unwrap();

        assert_eq!(config.migration_file_path, PathBuf::from(DEFAULT_MIGRATION_FILE));
        assert_eq!(config.delivery, DeliveryMode::Raw);
        assert_eq!(config.delivery.request_path(), "/rest/v1/");
    }

    #[test]
    fn test_path_precedence() {
        let mut vars = BASE.to_vec();
        vars.push(("MIGRATION_FILE", "from_env.sql"));

        let config = MigrationConfig::from_lookup(lookup_from(&vars), None).unwrap();
        assert_eq!(config.migration_file_path, PathBuf::from("from_env.sql"));

        let config =
            MigrationConfig::from_lookup(lookup_from(&vars), Some("from_arg.sql".into())).unwrap();
        assert_eq!(config.migration_file_path, PathBuf::from("from_arg.sql"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_are_kept() {
        use std::os::unix::ffi::OsStringExt;

        let env_path = OsString::from_vec(b"env\xff.sql".to_vec());
        let lookup = {
            let env_path = env_path.clone();
            move |name: &str| match name {
                "MIGRATION_FILE" => Some(env_path.clone()),
                _ => lookup_from(&BASE)(name),
            }
        };

        let config = MigrationConfig::from_lookup(&lookup, None).unwrap();
        assert_eq!(config.migration_file_path, PathBuf::from(env_path));

        let arg_path = PathBuf::from(OsString::from_vec(b"arg\xff.sql".to_vec()));
        let config = MigrationConfig::from_lookup(&lookup, Some(arg_path.clone())).unwrap();
        assert_eq!(config.migration_file_path, arg_path);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_rpc_name_is_invalid() {
        use std::os::unix::ffi::OsStringExt;

        let lookup = |name: &str| match name {
            "SUPABASE_SQL_RPC" => Some(OsString::from_vec(b"exec\xff".to_vec())),
            _ => lookup_from(&BASE)(name),
        };

        let err = MigrationConfig::from_lookup(lookup, None).unwrap_err();
        match err {
            SupabaseModelError::NonUnicodeConfig(name) => assert_eq!(name, "SUPABASE_SQL_RPC"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rpc_mode() {
        let mut vars = BASE.to_vec();
        vars.push(("SUPABASE_SQL_RPC", "exec_sql"));

        let config = MigrationConfig::from_lookup(lookup_from(&vars), None).unwrap();
        assert_eq!(config.delivery, DeliveryMode::Rpc("exec_sql".parse().unwrap()));
        assert_eq!(config.delivery.request_path(), "/rest/v1/rpc/exec_sql");
        assert_eq!(config.delivery.to_string(), "rpc exec_sql");
    }

    #[test]
    fn test_invalid_rpc_name_is_a_config_error() {
        let mut vars = BASE.to_vec();
        vars.push(("SUPABASE_SQL_RPC", "exec_sql; drop"));

        let err = MigrationConfig::from_lookup(lookup_from(&vars), None).unwrap_err();
        assert_eq!(err, SupabaseModelError::InvalidRpcFunction(String::new()));
        assert_eq!(err.class().exit_code(), 1);
    }

    #[test]
    fn test_missing_key_is_reported_before_anything_else() {
        let err = MigrationConfig::from_lookup(
            lookup_from(&[("SUPABASE_URL", "https://abc.supabase.co"), ("SUPABASE_SQL_RPC", "bad name")]),
            Some("whatever.sql".into()),
        )
        .unwrap_err();

        match err {
            SupabaseModelError::MissingConfig(missing) => {
                assert_eq!(missing, vec!["SUPABASE_SERVICE_ROLE_KEY"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_url_is_reported_missing() {
        let err = MigrationConfig::from_lookup(
            lookup_from(&[("SUPABASE_URL", ""), ("SUPABASE_SERVICE_ROLE_KEY", "service-key")]),
            None,
        )
        .unwrap_err();

        match err {
            SupabaseModelError::MissingConfig(missing) => assert_eq!(missing, vec!["SUPABASE_URL"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
