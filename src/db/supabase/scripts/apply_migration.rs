use std::io::Write;
use std::process::ExitCode;

use dotenvy::dotenv;
use log::error;
use supabase_sql_apply::db::supabase::models::model::ErrorClass;
use supabase_sql_apply::migration_applicator::{self, ApplyStatus};
use supabase_sql_apply::migration_config::MigrationConfig;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let mut stdout = std::io::stdout();

    let status = match MigrationConfig::from_env() {
        Ok(config) => migration_applicator::run(&config, &mut stdout).await,
        Err(e) => writeln!(stdout, "Error: {}", e).map(|_| ApplyStatus::Failed(e.class())),
    };

    // A report that cannot be written gets its own code so it is never
    // mistaken for a configuration or remote failure.
    let status = status.unwrap_or_else(|e| {
        error!("Could not write to stdout: {}", e);
        ApplyStatus::Failed(ErrorClass::Output)
    });

    ExitCode::from(status.exit_code())
}
