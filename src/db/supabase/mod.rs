pub mod models;
pub mod supabase_db;
