mod config;
mod error;
mod store;

pub use config::FirebaseConfig;
pub use error::FirebaseDaoError;
pub use store::FirebaseRealtimeStore;
