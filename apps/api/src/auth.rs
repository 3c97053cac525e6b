//! Request identity.
//!
//! Credentials are verified upstream by the identity gateway, which forwards
//! the authenticated subject in `x-subject-id` (plus optional claims). This
//! service trusts the header as given and never inspects credentials itself.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::models::company::Company;
use crate::models::profile::CandidateProfile;
use crate::state::AppState;

pub const SUBJECT_HEADER: &str = "x-subject-id";
pub const EMAIL_HEADER: &str = "x-subject-email";
pub const NAME_HEADER: &str = "x-subject-name";
pub const USERNAME_HEADER: &str = "x-subject-username";

/// The authenticated subject and whatever session claims came with it.
#[derive(Debug, Clone)]
pub struct AuthSubject {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSubject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = header(parts, SUBJECT_HEADER).ok_or(AppError::Unauthorized)?;
        Ok(AuthSubject {
            subject,
            email: header(parts, EMAIL_HEADER),
            name: header(parts, NAME_HEADER),
            username: header(parts, USERNAME_HEADER),
        })
    }
}

/// A subject that already has a candidate profile. 404 otherwise.
#[derive(Debug, Clone)]
pub struct Candidate(pub CandidateProfile);

#[async_trait]
impl FromRequestParts<AppState> for Candidate {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthSubject::from_request_parts(parts, state).await?;
        let profile = state
            .store
            .find_profile(&auth.subject)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("User not found. Please complete your profile first.".to_string())
            })?;
        Ok(Candidate(profile))
    }
}

/// A subject registered as a company. 403 for everyone else.
#[derive(Debug, Clone)]
pub struct CompanyAccount(pub Company);

#[async_trait]
impl FromRequestParts<AppState> for CompanyAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthSubject::from_request_parts(parts, state).await?;
        match state.store.find_company(&auth.subject).await? {
            Some(company) => Ok(CompanyAccount(company)),
            None => {
                tracing::debug!("Subject {} is not a company account", auth.subject);
                Err(AppError::Forbidden)
            }
        }
    }
}
