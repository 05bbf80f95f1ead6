use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the CodeRush desk backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::timer::current,
        crate::routes::timer::configure,
        crate::routes::timer::start,
        crate::routes::timer::pause,
        crate::routes::timer::toggle,
        crate::routes::timer::reset,
        crate::routes::timer::set_status,
        crate::routes::timer::lunch,
        crate::routes::timer::hold,
        crate::routes::desk::list_teams,
        crate::routes::desk::check_in,
        crate::routes::desk::spin,
        crate::routes::desk::confirm,
        crate::routes::desk::discard,
        crate::routes::desk::reset,
        crate::routes::registrations::register,
        crate::routes::registrations::list_registrations,
        crate::routes::registrations::update_status,
        crate::routes::registrations::send_certificate,
        crate::routes::sse::public_stream,
        crate::routes::sse::operator_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::StoreHealth,
            crate::dto::timer::ConfigureTimerRequest,
            crate::dto::timer::SetStatusRequest,
            crate::dto::timer::TimerView,
            crate::dto::timer::TimerActionResponse,
            crate::dto::desk::TeamSummary,
            crate::dto::desk::ConfirmDomainRequest,
            crate::dto::desk::ResetDomainRequest,
            crate::dto::desk::SyncReport,
            crate::dto::desk::CheckInResponse,
            crate::dto::desk::SpinResponse,
            crate::dto::desk::AssignmentResponse,
            crate::dto::registration::RegistrationRequest,
            crate::dto::registration::RegistrationCreated,
            crate::dto::registration::UpdateStatusRequest,
            crate::dto::registration::RegistrationSummary,
            crate::dto::registration::ActionResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::TimerTickEvent,
            crate::dto::sse::TimerCueEvent,
            crate::dto::sse::WheelSpinEvent,
            crate::dto::sse::DomainRevealedEvent,
            crate::dto::sse::TeamUpdatedEvent,
            crate::dto::sse::SyncFailedEvent,
            crate::dto::sse::RegistrationChangedEvent,
            crate::state::timer::TimerState,
            crate::state::timer::TimerMode,
            crate::state::timer::DisplayDigits,
            crate::state::cues::AudioCue,
            crate::state::spinner::SpinOutcome,
            crate::state::wheel::WheelSegment,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "timer", description = "Shared event timer"),
        (name = "desk", description = "Check-in desk and domain wheel"),
        (name = "registrations", description = "Team registration and verification"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
