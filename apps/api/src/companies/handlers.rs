//! Axum route handlers for company accounts.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{AuthSubject, CompanyAccount};
use crate::errors::AppError;
use crate::models::company::{Company, CompanyDetails};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterCompanyRequest {
    #[serde(flatten)]
    pub details: CompanyDetails,
    /// Used only when the session carries no email claim.
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub company: Company,
}

/// POST /api/companies/register
pub async fn handle_register_company(
    State(state): State<AppState>,
    auth: AuthSubject,
    Json(request): Json<RegisterCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    let email = auth
        .email
        .or(request.email)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("User email not found".to_string()))?;

    let company_name = request
        .details
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Company name is required".to_string()))?;

    let company = state
        .store
        .create_company(Company::new(auth.subject, email, company_name, request.details))
        .await?;
    info!("Registered company {} ({})", company.company_name, company.id);

    Ok((
        StatusCode::CREATED,
        Json(CompanyResponse {
            message: Some("Company registered successfully"),
            company,
        }),
    ))
}

/// GET /api/companies/profile
pub async fn handle_get_company(
    CompanyAccount(company): CompanyAccount,
) -> Json<CompanyResponse> {
    Json(CompanyResponse {
        message: None,
        company,
    })
}

/// PUT /api/companies/profile
pub async fn handle_update_company(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
    Json(details): Json<CompanyDetails>,
) -> Result<Json<CompanyResponse>, AppError> {
    if details
        .company_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        return Err(AppError::Validation("Company name cannot be empty".to_string()));
    }

    let company = state
        .store
        .update_company(&company.subject, &details)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

    Ok(Json(CompanyResponse {
        message: Some("Company profile updated successfully"),
        company,
    }))
}
