//! Library crate for coderush-desk-back: shared event timer, domain wheel and
//! check-in desk coordinator, exposed for the binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
