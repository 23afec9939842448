// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export the pure helpers for convenience
pub use handlers::{load_import_file, resolve_database_path};
