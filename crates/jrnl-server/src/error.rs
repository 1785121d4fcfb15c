use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jrnl_ledger::wire::ErrorBody;
use jrnl_ledger::ProgramError;
use jrnl_types::{Address, Identity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Program(#[from] ProgramError),

    #[error("program not deployed: {0}")]
    ProgramNotFound(Identity),

    #[error("payload targets program {payload}, request path names {path}")]
    ProgramMismatch { path: Identity, payload: Identity },

    #[error("entry not found: {0}")]
    EntryNotFound(Address),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Program(ProgramError::AccountInUse) => StatusCode::CONFLICT,
            Self::Program(ProgramError::AccountNotFound) => StatusCode::NOT_FOUND,
            Self::Program(ProgramError::InvalidSignature) => StatusCode::UNAUTHORIZED,
            Self::Program(ProgramError::Unauthorized) => StatusCode::FORBIDDEN,
            Self::Program(_) | Self::ProgramMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::ProgramNotFound(_) | Self::EntryNotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let code = match &self {
            Self::Program(err) => Some(err.code()),
            _ => None,
        };
        let missing_program = match &self {
            Self::ProgramNotFound(program) => Some(*program),
            _ => None,
        };
        let body = ErrorBody {
            code,
            missing_program,
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
