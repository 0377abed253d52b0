//! Transport-agnostic request handlers.
//!
//! Each handler returns an `ApiResponse` carrying an HTTP-style status and a
//! JSON body; wiring them to a router is left to the embedding server.

use crate::application::batch::BatchActuator;
use crate::application::early_access::EarlyAccessList;
use crate::config::{INVALID_PAYLOAD_MESSAGE, SERVER_ERROR_MESSAGE, UNAUTHORIZED_MESSAGE};
use crate::domain::audit::AuditEvent;
use crate::domain::card::{Card, Operation};
use crate::domain::early_access::{ClientInfo, EarlyAccessEntry};
use crate::domain::ports::{Session, SessionVerifierBox};
use crate::domain::provider::ProviderResult;
use crate::error::AppError;
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                Self::server_error()
            }
        }
    }

    pub fn server_error() -> Self {
        Self {
            status: 500,
            body: json!({ "ok": false, "error": "INTERNAL_ERROR", "message": SERVER_ERROR_MESSAGE }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<AppError> for ApiResponse {
    fn from(error: AppError) -> Self {
        let message = match &error {
            AppError::InvalidInput(msg) | AppError::Duplicate(msg) => msg.clone(),
            AppError::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            _ => SERVER_ERROR_MESSAGE.to_string(),
        };
        Self {
            status: error.status(),
            body: json!({ "ok": false, "error": error.code(), "message": message }),
        }
    }
}

#[derive(Serialize)]
struct BatchBody<'a> {
    ok: bool,
    results: &'a [ProviderResult],
}

#[derive(Serialize)]
struct StateBody {
    cards: Vec<Card>,
    audit: Vec<AuditEvent>,
}

#[derive(Serialize)]
struct EntriesBody {
    ok: bool,
    entries: Vec<EarlyAccessEntry>,
}

/// Request handlers for the card-lock prototype and the early-access list.
pub struct PrototypeApi {
    actuator: BatchActuator,
    early_access: EarlyAccessList,
    sessions: SessionVerifierBox,
}

impl PrototypeApi {
    pub fn new(
        actuator: BatchActuator,
        early_access: EarlyAccessList,
        sessions: SessionVerifierBox,
    ) -> Self {
        Self {
            actuator,
            early_access,
            sessions,
        }
    }

    /// Blocks every card. Open to anonymous callers so a lost card can be
    /// locked without signing in.
    pub async fn block_all(&self) -> ApiResponse {
        self.run(Operation::Block).await
    }

    /// Unblocks every card. Requires an authenticated caller.
    pub async fn unblock_all(&self, session: Option<&str>) -> ApiResponse {
        if let Err(e) = self.authenticate(session).await {
            return e.into();
        }
        self.run(Operation::Unblock).await
    }

    /// Current cards and audit trail. Requires an authenticated caller.
    pub async fn state(&self, session: Option<&str>) -> ApiResponse {
        if let Err(e) = self.authenticate(session).await {
            return e.into();
        }
        let body = StateBody {
            cards: self.actuator.registry().list().await,
            audit: self.actuator.audit().list().await,
        };
        ApiResponse::json(200, &body)
    }

    /// Accepts an early-access signup body of the form `{"email": "..."}`.
    pub async fn signup(&self, body: &Value, client: ClientInfo) -> ApiResponse {
        let Some(email) = body.get("email").and_then(Value::as_str) else {
            return AppError::InvalidInput(INVALID_PAYLOAD_MESSAGE.to_string()).into();
        };

        match self.early_access.submit(email, client).await {
            Ok(_) => ApiResponse::json(200, &json!({ "ok": true })),
            Err(e) => e.into(),
        }
    }

    /// Every stored signup. Requires an authenticated caller.
    pub async fn list_signups(&self, session: Option<&str>) -> ApiResponse {
        if let Err(e) = self.authenticate(session).await {
            return e.into();
        }
        match self.early_access.entries().await {
            Ok(entries) => ApiResponse::json(200, &EntriesBody { ok: true, entries }),
            Err(e) => {
                tracing::error!(error = %e, "failed to read early-access list");
                e.into()
            }
        }
    }

    async fn authenticate(&self, token: Option<&str>) -> Result<Session, AppError> {
        self.sessions
            .verify(token)
            .await
            .ok_or(AppError::Unauthorized)
    }

    async fn run(&self, operation: Operation) -> ApiResponse {
        match self.actuator.run_batch(operation).await {
            Ok(outcome) => ApiResponse::json(
                200,
                &BatchBody {
                    ok: !outcome.any_failed,
                    results: &outcome.results,
                },
            ),
            Err(e) => {
                tracing::error!(%operation, error = %e, "batch failed");
                ApiResponse::server_error()
            }
        }
    }
}
