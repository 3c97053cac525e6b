//! Identity-provider lifecycle events.
//!
//! The gateway in front of this service verifies the provider's signature
//! before forwarding, so the route takes no session identity. Payloads follow
//! the provider's `{ "type", "data" }` envelope with snake_case user fields.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::profile::NewProfile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub id: String,
    pub email_address: String,
}

#[derive(Debug, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    pub primary_email_address_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeletedUser {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl IdentityUser {
    /// The primary address, or the first one when no primary is marked.
    fn primary_email(&self) -> Option<&str> {
        let primary = match &self.primary_email_address_id {
            Some(id) => self.email_addresses.iter().find(|e| &e.id == id),
            None => self.email_addresses.first(),
        };
        primary
            .map(|e| e.email_address.trim())
            .filter(|e| !e.is_empty())
    }

    fn into_profile(self) -> Result<NewProfile, AppError> {
        let email = self
            .primary_email()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("User has no primary email address".to_string()))?;

        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(NewProfile {
            subject: self.id,
            email,
            full_name: Some(full_name).filter(|n| !n.is_empty()),
            username: self.username.filter(|u| !u.trim().is_empty()),
        })
    }
}

fn decode<T: for<'de> Deserialize<'de>>(data: Value) -> Result<T, AppError> {
    serde_json::from_value(data)
        .map_err(|e| AppError::Validation(format!("Invalid event payload: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/webhooks/identity
pub async fn handle_identity_event(
    State(state): State<AppState>,
    Json(event): Json<IdentityEvent>,
) -> Result<Json<WebhookAck>, AppError> {
    match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let profile = decode::<IdentityUser>(event.data)?.into_profile()?;
            let user = state.store.upsert_identity(profile).await?;
            info!("{}: synced profile for {}", event.event_type, user.subject);
        }
        "user.deleted" => {
            let DeletedUser { id } = decode::<DeletedUser>(event.data)?;
            if state.store.delete_profile(&id).await? {
                info!("user.deleted: removed profile for {id}");
            } else {
                debug!("user.deleted: no profile for {id}");
            }
        }
        other => debug!("Ignoring identity event {other}"),
    }

    Ok(Json(WebhookAck { received: true }))
}
