mod config;
mod error;
mod store;

pub use config::SheetConfig;
pub use error::SheetDaoError;
pub use store::SheetRegistrationStore;
