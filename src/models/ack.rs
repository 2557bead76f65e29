use serde::Serialize;

pub const LOCATION_PROCESSED: &str = "Localização processada com sucesso.";
pub const ACCESS_PROCESSED: &str = "Dados processados com sucesso.";
pub const ROUTE_NOT_FOUND: &str = "Rota não encontrada";
pub const INTERNAL_ERROR: &str = "Erro interno do servidor";
pub const INVALID_REQUEST: &str = "Requisição inválida";

/// Acknowledgement returned by the capture endpoints.
#[derive(Serialize, Debug)]
pub struct CaptureAck {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl CaptureAck {
    pub fn location() -> Self {
        Self {
            success: true,
            message: LOCATION_PROCESSED,
            timestamp: None,
        }
    }

    pub fn access(timestamp: String) -> Self {
        Self {
            success: true,
            message: ACCESS_PROCESSED,
            timestamp: Some(timestamp),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
