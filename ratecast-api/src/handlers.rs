//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use tracing::{debug, info};

use ratecast_core::constants::{rate_email_body, RATE_EMAIL_SUBJECT};
use ratecast_core::error::RatecastError;
use ratecast_core::types::{Appended, EmailAddress};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        subscribers: state.registry.len(),
    })
}

/// GET /rate
///
/// The body is a bare JSON number in its shortest form (`42`, not `42.0`).
pub async fn get_rate(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    info!("Fetching exchange rates");
    let rate = state.rates.fetch_rate().await?;
    info!(rate, "Exchange rates fetched successfully");

    Ok(([(header::CONTENT_TYPE, "application/json")], rate_json(rate)?))
}

fn rate_json(rate: f64) -> std::result::Result<String, RatecastError> {
    if !rate.is_finite() {
        return Err(RatecastError::RateSourceError(format!(
            "Rate is not a finite number: {}",
            rate
        )));
    }
    // `Display` for f64 never uses an exponent.
    Ok(rate.to_string())
}

/// POST /subscribe
///
/// A body that is not a urlencoded form is treated as a missing address.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<SubscribeForm>, FormRejection>,
) -> Result<StatusCode> {
    let raw = match form {
        Ok(Form(form)) => form.email.unwrap_or_default(),
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable subscribe form");
            String::new()
        }
    };

    let email = EmailAddress::parse(&raw).inspect_err(|e| {
        info!(error = %e, "Rejected subscription");
    })?;

    info!(email = %email, "Saving subscriber to the file");
    match state.registry.append(email.as_str()).await? {
        Appended::New => {
            info!(email = %email, "Subscriber saved");
            Ok(StatusCode::OK)
        }
        Appended::Existing => {
            info!(email = %email, "Subscriber already exists");
            Err(RatecastError::AlreadySubscribed(email.into_inner()).into())
        }
    }
}

/// POST /sendEmails
pub async fn send_emails(State(state): State<Arc<AppState>>) -> Result<StatusCode> {
    info!("Fetching exchange rate");
    let rate = state.rates.fetch_rate().await?;
    info!(rate, "Exchange rate fetched successfully");

    let recipients = state.registry.list();
    if recipients.is_empty() {
        info!("No subscribers, nothing to send");
        return Ok(StatusCode::OK);
    }

    state
        .mailer
        .send(&recipients, RATE_EMAIL_SUBJECT, &rate_email_body(rate))
        .await?;
    info!(sent = recipients.len(), "Rate emails sent");

    Ok(StatusCode::OK)
}
