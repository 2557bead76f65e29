use crate::models::ack::{ErrorResponse, INTERNAL_ERROR, INVALID_REQUEST, ROUTE_NOT_FOUND};
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(INVALID_REQUEST))
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ROUTE_NOT_FOUND))
}

#[catch(500)]
pub fn internal_error(req: &Request) -> Json<ErrorResponse> {
    tracing::error!(method = %req.method(), uri = %req.uri(), "unhandled server error");
    Json(ErrorResponse::new(INTERNAL_ERROR))
}
