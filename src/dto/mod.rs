pub mod desk;
pub mod health;
pub mod registration;
pub mod sse;
pub mod timer;
pub mod validation;
