/// Operator identity checks.
pub mod auth_service;
/// Check-in desk coordinator: check-in, spin, confirm, reset.
pub mod desk_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Registration plumbing towards the system of record.
pub mod registration_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Background store health supervisor driving degraded mode.
pub mod storage_supervisor;
/// Operator timer actions.
pub mod timer_service;
/// Timer viewer loop: ticks, cues and single-writer completion.
pub mod timer_ticker;
