use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/venues", venue_routes(config))
        .nest("/activities", activity_routes(config))
        .nest("/api", auth_routes())
}

fn venue_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::venue::list_venues,
            handlers::venue::create_venue
        ))
        .routes(routes!(
            handlers::venue::get_venue,
            handlers::venue::update_venue
        ))
        .layer(handlers::venue::upload_body_limit(config))
}

fn activity_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::activity::list_activities,
            handlers::activity::create_activity
        ))
        .routes(routes!(
            handlers::activity::get_activity,
            handlers::activity::update_activity,
            handlers::activity::delete_activity
        ))
        .layer(handlers::venue::upload_body_limit(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
        .nest("/users", user_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::list_users))
        .routes(routes!(
            handlers::user::update_user,
            handlers::user::delete_user
        ))
}
