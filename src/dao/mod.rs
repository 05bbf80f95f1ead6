/// Data shapes exchanged with both stores.
pub mod models;
/// Realtime overlay store (timer and per-team live state).
pub mod realtime_store;
/// System-of-record store for registrations.
pub mod registration_store;
/// Storage error types shared by every backend.
pub mod storage;
