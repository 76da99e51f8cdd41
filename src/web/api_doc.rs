use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::passes::ListPassesQuery;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::rotor::get_position,
        super::api::rotor::set_position,
        super::api::passes::list_passes,
        super::api::passes::create_pass,
        super::api::passes::get_pass,
        super::api::passes::update_pass,
        super::api::passes::delete_pass,
        super::api::executor::status,
        super::api::executor::abort,
    ),
    components(
        schemas(
            ErrorResponse,
            ListPassesQuery,
            crate::rotor::AzEl,
            crate::passes::Waypoint,
            crate::passes::PassRequest,
            crate::passes::TrackingPass,
            crate::executor::ExecutorStatus,
            crate::executor::ExecutorMode,
            crate::executor::TrackerPhase,
        )
    ),
    info(
        title = "Trackctl Rotor API",
        description = "API for steering the antenna rotator and managing tracking passes",
        version = "0.1.0"
    ),
    tags(
        (name = "rotor", description = "Manual rotor control"),
        (name = "passes", description = "Tracking pass management"),
        (name = "executor", description = "Pass executor status and control")
    )
)]
pub struct ApiDoc;
