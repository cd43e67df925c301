mod preferences;
mod schema;
mod types;

pub use preferences::API_KEY_PREF;
pub use schema::Database;
pub use types::DatabaseError;
