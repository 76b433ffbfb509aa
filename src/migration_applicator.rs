use std::io::Write;

use chrono::{DateTime, Utc};
use log::{error, info};

use crate::db::supabase::models::migration_payload_model::{display_file_name, MigrationPayload};
use crate::db::supabase::models::model::{ErrorClass, SupabaseModelError};
use crate::db::supabase::supabase_db::SupabaseAdmin;
use crate::migration_config::{DeliveryMode, MigrationConfig};

/// What a run that got a 2xx back knows about itself.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub file_name: String,
    pub sql_bytes: usize,
    pub endpoint: String,
    pub status: u16,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Failed(ErrorClass),
}

impl ApplyStatus {
    pub fn exit_code(&self) -> u8 {
        match self {
            ApplyStatus::Applied => 0,
            ApplyStatus::Failed(class) => class.exit_code(),
        }
    }
}

async fn submit(
    admin: &SupabaseAdmin,
    payload: &MigrationPayload,
    delivery: &DeliveryMode,
) -> Result<MigrationOutcome, SupabaseModelError> {
    let attempted_at = Utc::now();
    let response = admin.execute_sql(payload, delivery).await?;

    Ok(MigrationOutcome {
        file_name: payload.file_name(),
        sql_bytes: payload.sql.len(),
        endpoint: admin.endpoint_for(delivery),
        status: response.status,
        attempted_at,
    })
}

/// Client, file, request. Stops at the first failure; the file is never read
/// if the client cannot be built and the request is never sent if the file
/// cannot be read.
pub async fn apply_migration(config: &MigrationConfig) -> Result<MigrationOutcome, SupabaseModelError> {
    let admin = SupabaseAdmin::connect(config.credentials.clone())?;
    let payload = MigrationPayload::read(&config.migration_file_path)?;

    submit(&admin, &payload, &config.delivery).await
}

/// Same flow as [`apply_migration`], reporting progress and the outcome to `out`
/// in operator-facing form.
pub async fn run<W: Write>(config: &MigrationConfig, out: &mut W) -> std::io::Result<ApplyStatus> {
    let file_name = display_file_name(&config.migration_file_path);

    let admin = match SupabaseAdmin::connect(config.credentials.clone()) {
        Ok(admin) => admin,
        Err(e) => return report_remote_failure(out, &e, &file_name),
    };

    let payload = match MigrationPayload::read(&config.migration_file_path) {
        Ok(payload) => payload,
        Err(e) => {
            error!("{}", e);
            writeln!(out, "Error: {}", e)?;
            return Ok(ApplyStatus::Failed(e.class()));
        }
    };

    writeln!(out, "Applying migration from {}...", payload.path.display())?;
    info!("Delivery mode: {}", config.delivery);

    match submit(&admin, &payload, &config.delivery).await {
        Ok(outcome) => {
            writeln!(
                out,
                "Migration request accepted (HTTP {}) by {} at {}.",
                outcome.status,
                outcome.endpoint,
                outcome.attempted_at.to_rfc3339()
            )?;
            writeln!(
                out,
                "The backend does not confirm that the SQL in {} was executed.",
                outcome.file_name
            )?;
            Ok(ApplyStatus::Applied)
        }
        Err(e) => report_remote_failure(out, &e, &file_name),
    }
}

fn report_remote_failure<W: Write>(
    out: &mut W,
    e: &SupabaseModelError,
    file_name: &str,
) -> std::io::Result<ApplyStatus> {
    error!("{}", e);
    writeln!(out, "Error applying migration: {}", e)?;
    writeln!(
        out,
        "Please run the SQL in {} manually in your Supabase SQL Editor.",
        file_name
    )?;
    Ok(ApplyStatus::Failed(e.class()))
}
