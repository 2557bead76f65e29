use crate::models::ack::{ErrorResponse, INTERNAL_ERROR};
use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::serde::json::serde_json;
use rocket::{Request, Response};
use std::io::Cursor;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Email delivery failed: {message}")]
    Email { message: String },
    #[error("IP lookup failed: {message}")]
    Geolocation {
        message: String,
        #[source]
        source: reqwest::Error,
    },
}

impl AppError {
    pub fn email(message: impl Into<String>) -> Self {
        Self::Email { message: message.into() }
    }

    pub fn geolocation(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Geolocation {
            message: message.into(),
            source,
        }
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::BadRequest(_) => Status::BadRequest,
            // Only reachable from handlers that surface collaborator failures
            AppError::Email { .. } | AppError::Geolocation { .. } => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        error!(
            error = ?self,
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "request failed"
        );

        let status = Status::from(&self);
        // Downstream failures never reach the client with their details.
        let message = match &self {
            AppError::BadRequest(message) => message.clone(),
            _ => INTERNAL_ERROR.to_string(),
        };
        let body = serde_json::to_string(&ErrorResponse::new(message)).map_err(|_| Status::InternalServerError)?;

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
