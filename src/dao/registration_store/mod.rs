mod memory;
#[cfg(feature = "sheet-store")]
pub mod sheet;

pub use memory::MemoryRegistrationStore;

use crate::dao::models::{NewRegistrationEntity, RegistrationRecord};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the spreadsheet-backed system of record.
///
/// Every method maps to one action of the registration web app; the store is the
/// durable source of truth and is treated as authoritative for audit.
pub trait RegistrationStore: Send + Sync {
    /// Append a new registration row and return its generated identifier.
    fn register(
        &self,
        registration: NewRegistrationEntity,
    ) -> BoxFuture<'static, StorageResult<String>>;
    /// Overwrite the `Status` column of a registration (e.g. `Verified`).
    fn update_status(&self, id: String, status: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite the `Assigned Domain` column; an empty domain clears it.
    fn update_domain(&self, id: String, domain: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Mark the registration as checked in at the event desk.
    fn event_check_in(
        &self,
        id: String,
        timestamp: String,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Ask the system of record to mail participation certificates.
    fn send_certificate(&self, id: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Bulk read of every registration row.
    fn list_registrations(&self) -> BoxFuture<'static, StorageResult<Vec<RegistrationRecord>>>;
    /// Cheap reachability probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
