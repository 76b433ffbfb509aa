pub mod db;
pub mod migration_applicator;
pub mod migration_config;
pub mod sql_identifier;
