//! Native HTTP server.
//!
//! Adapts actix-web requests into Spin requests so the same router serves
//! both the Spin component and a plain binary.

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

use crate::handlers::route;
use crate::state::AppState;

mod adapter {
    use actix_web::HttpRequest;
    use spin_sdk::http::{Method, Request, Response};

    pub fn actix_to_spin_request(req: &HttpRequest, body: actix_web::web::Bytes) -> Request {
        let method = match req.method().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other => Method::Other(other.to_string()),
        };

        let mut builder = Request::builder();
        builder.method(method).uri(req.uri().to_string());
        for (name, value) in req.headers() {
            if let Ok(val_str) = value.to_str() {
                builder.header(name.as_str(), val_str);
            }
        }
        builder.body(body.to_vec()).build()
    }

    pub fn spin_to_actix_response(spin_resp: Response) -> actix_web::HttpResponse {
        let status = actix_web::http::StatusCode::from_u16(*spin_resp.status())
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = actix_web::HttpResponse::build(status);
        for (name, value) in spin_resp.headers() {
            if let Some(val_str) = value.as_str() {
                response.insert_header((name, val_str));
            }
        }
        response.body(spin_resp.body().to_vec())
    }
}

pub async fn handle_all(req: HttpRequest, body: web::Bytes, state: web::Data<AppState>) -> HttpResponse {
    let spin_req = adapter::actix_to_spin_request(&req, body);
    adapter::spin_to_actix_response(route(&spin_req, &state))
}

/// Routes every request through `handle_all`. `AppState` must be registered
/// as `web::Data` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/{tail:.*}", web::route().to(handle_all));
}

pub async fn run(state: AppState, addr: &str) -> std::io::Result<()> {
    let state = web::Data::new(state);
    tracing::info!(addr, "server listening");

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(addr)?
        .run()
        .await
}
