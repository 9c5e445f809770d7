//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use diary_backend::Trace;
#[cfg(debug_assertions)]
use diary_backend::doc::ApiDoc;
use diary_backend::inbound::http::accounts::{login, signup};
use diary_backend::inbound::http::diaries::{
    create_diary, delete_diary, get_diary, list_diaries, update_diary,
};
use diary_backend::inbound::http::error::route_not_found;
use diary_backend::inbound::http::health::{HealthState, live, ready};
use diary_backend::inbound::http::state::HttpState;
use diary_backend::inbound::http::uploads::{
    confirm_upload, create_upload_session, get_upload_session, payload_config, upload_file,
};
use diary_backend::inbound::http::validation::{json_config, path_config, query_config};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    // Upload routes precede `/diaries/{id}` so literal segments win.
    let api = web::scope("/api/v1")
        .service(signup)
        .service(login)
        .service(create_upload_session)
        .service(confirm_upload)
        .service(get_upload_session)
        .service(upload_file)
        .service(create_diary)
        .service(list_diaries)
        .service(get_diary)
        .service(update_diary)
        .service(delete_diary);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .app_data(payload_config())
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.default_service(web::to(route_not_found))
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
