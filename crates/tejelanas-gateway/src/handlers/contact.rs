//! Contact form relay
//!
//! POST /api/contact - validate a contact submission and forward it upstream

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::GatewayRequest;
use crate::error::RouteFailure;
use crate::state::AppState;

/// Upstream endpoint receiving contact submissions.
pub const CONTACT_UPSTREAM_PATH: &str = "/contact/";

const CONTACT_FAILURE_MESSAGE: &str = "No se pudo enviar el mensaje.";

const MALFORMED_BODY_MESSAGE: &str = "La solicitud no es válida.";

const MAX_NAME_CHARS: usize = 80;
const MAX_EMAIL_CHARS: usize = 100;
const MAX_MESSAGE_CHARS: usize = 1000;
const MAX_PRODUCT_CHARS: usize = 100;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));

/// Body of POST /api/contact
///
/// Missing fields deserialize as empty strings so they are reported by
/// [`ContactSubmission::validate`] rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactSubmission {
    pub nombre: String,
    pub email: String,
    /// Product or service the visitor is asking about (optional)
    pub producto: String,
    pub mensaje: String,
}

/// Rejected contact submission. The message is shown to the visitor.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContactValidationError {
    #[error("Por favor, completa todos los campos obligatorios.")]
    MissingFields,

    #[error("El nombre es demasiado largo.")]
    NameTooLong,

    #[error("El email es demasiado largo.")]
    EmailTooLong,

    #[error("El email no es válido.")]
    InvalidEmail,

    #[error("El mensaje es demasiado largo.")]
    MessageTooLong,

    #[error("El producto de interés es demasiado largo.")]
    ProductTooLong,
}

impl ContactSubmission {
    /// Check required fields, lengths and the email shape, in that order.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if [&self.nombre, &self.email, &self.mensaje]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(ContactValidationError::MissingFields);
        }
        if self.nombre.chars().count() > MAX_NAME_CHARS {
            return Err(ContactValidationError::NameTooLong);
        }
        if self.email.chars().count() > MAX_EMAIL_CHARS {
            return Err(ContactValidationError::EmailTooLong);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ContactValidationError::InvalidEmail);
        }
        if self.mensaje.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ContactValidationError::MessageTooLong);
        }
        if self.producto.chars().count() > MAX_PRODUCT_CHARS {
            return Err(ContactValidationError::ProductTooLong);
        }
        Ok(())
    }
}

/// POST /api/contact
///
/// Invalid submissions get 400 without any upstream call. A body that is not
/// JSON keeps the extractor's status but uses the failure envelope.
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Response {
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            info!(error = %rejection.body_text(), "unreadable contact submission");
            return RouteFailure::new(rejection.status(), MALFORMED_BODY_MESSAGE).into_response();
        }
    };

    if let Err(err) = submission.validate() {
        info!(reason = ?err, "rejected contact submission");
        return RouteFailure::new(StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }

    let request = GatewayRequest::new(CONTACT_UPSTREAM_PATH)
        .with_method(Method::POST)
        .with_json(json!({
            "nombre": submission.nombre,
            "email": submission.email,
            "producto": submission.producto,
            "mensaje": submission.mensaje,
        }));

    match state.client.call(request).await {
        Ok(payload) => Json(payload.body).into_response(),
        Err(err) => {
            warn!(kind = ?err.kind(), error = %err, "contact relay failed");
            RouteFailure::bad_gateway(CONTACT_FAILURE_MESSAGE, &err, state.config.expose_error_detail)
                .into_response()
        }
    }
}

/// Build the contact router sub-tree
pub fn contact_router() -> Router<Arc<AppState>> {
    use axum::routing::post;
    Router::new().route("/api/contact", post(submit_contact))
}
