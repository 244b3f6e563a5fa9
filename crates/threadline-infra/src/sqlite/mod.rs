//! SQLite-backed persistence via sqlx.

pub mod checkpoint;
pub mod pool;

pub use checkpoint::SqliteCheckpointer;
pub use pool::DatabasePool;
