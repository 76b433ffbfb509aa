pub mod migration_payload_model;
pub mod model;
