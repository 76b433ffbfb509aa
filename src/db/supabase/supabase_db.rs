use log::{debug, info};

use std::ffi::OsString;
use std::fmt;

use super::models::migration_payload_model::{MigrationPayload, RawQueryBody, RpcQueryBody};
use super::models::model::SupabaseModelError;
use crate::migration_config::DeliveryMode;

pub const SUPABASE_URL_VARS: [&str; 2] = ["SUPABASE_URL", "REACT_APP_SUPABASE_URL"];
pub const SERVICE_ROLE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseCredentials {
    pub url: String,
    pub service_role_key: String,
}

impl fmt::Debug for SupabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseCredentials")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

/// Reads `name` through `lookup`. Unset and blank values come back as `None`;
/// a value that is set but not UTF-8 is an error rather than absent.
pub fn lookup_utf8<F>(lookup: &F, name: &'static str) -> Result<Option<String>, SupabaseModelError>
where
    F: Fn(&str) -> Option<OsString>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => {
            let value = raw
                .into_string()
                .map_err(|_| SupabaseModelError::NonUnicodeConfig(name))?;
            Ok(Some(value).filter(|v| !v.trim().is_empty()))
        }
    }
}

impl SupabaseCredentials {
    /// Reads the endpoint and the service-role key through `lookup`.
    /// Unset and empty values are both reported as missing.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, SupabaseModelError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let url = match lookup_utf8(lookup, SUPABASE_URL_VARS[0])? {
            Some(url) => Some(url),
            None => lookup_utf8(lookup, SUPABASE_URL_VARS[1])?,
        };
        let service_role_key = lookup_utf8(lookup, SERVICE_ROLE_KEY_VAR)?;

        match (url, service_role_key) {
            (Some(url), Some(service_role_key)) => Ok(Self {
                url,
                service_role_key,
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(SUPABASE_URL_VARS[0]);
                }
                if key.is_none() {
                    missing.push(SERVICE_ROLE_KEY_VAR);
                }
                Err(SupabaseModelError::MissingConfig(missing))
            }
        }
    }

    pub fn build_endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

/// A request the backend accepted. The response body is only logged.
#[derive(Debug, Clone, Copy)]
pub struct AcceptedResponse {
    pub status: u16,
}

pub struct SupabaseAdmin {
    client: reqwest::Client,
    credentials: SupabaseCredentials,
}

impl SupabaseAdmin {
    /// Binds an HTTP client to the given credentials. Neither the URL nor the key
    /// is checked here; bad values only show up when a request is sent.
    pub fn connect(credentials: SupabaseCredentials) -> Result<SupabaseAdmin, SupabaseModelError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SupabaseModelError::ClientBuild(e.to_string()))?;

        info!("Supabase admin client bound to {}", credentials.url);

        Ok(SupabaseAdmin {
            client,
            credentials,
        })
    }

    pub fn endpoint_for(&self, mode: &DeliveryMode) -> String {
        self.credentials.build_endpoint_url(&mode.request_path())
    }

    /// Submits the whole payload in one POST. Whether the backend actually runs
    /// the SQL is up to the backend: a 2xx only means the request was accepted.
    pub async fn execute_sql(
        &self,
        payload: &MigrationPayload,
        mode: &DeliveryMode,
    ) -> Result<AcceptedResponse, SupabaseModelError> {
        let endpoint = self.endpoint_for(mode);
        let key = &self.credentials.service_role_key;

        info!("POST {} ({} bytes of SQL)", endpoint, payload.sql.len());

        let request = self
            .client
            .post(&endpoint)
            .header("apikey", key)
            .bearer_auth(key);

        let request = match mode {
            DeliveryMode::Raw => request.json(&RawQueryBody { query: &payload.sql }),
            DeliveryMode::Rpc(_) => request.json(&RpcQueryBody {
                sql_query: &payload.sql,
            }),
        };

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SupabaseModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        debug!("Response {}: {}", status, body);

        Ok(AcceptedResponse {
            status: status.as_u16(),
        })
    }
}
