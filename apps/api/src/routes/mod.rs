pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::companies::handlers as companies;
use crate::documents::upload::{self, MAX_RESUME_BYTES};
use crate::jobs::handlers as jobs;
use crate::state::AppState;
use crate::users::handlers as users;
use crate::webhooks::handlers as webhooks;

/// Room for multipart framing on top of the file itself.
const UPLOAD_BODY_LIMIT: usize = MAX_RESUME_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidates
        .route("/api/users/sync", post(users::handle_sync_user))
        .route(
            "/api/users/profile",
            get(users::handle_get_profile).put(users::handle_update_profile),
        )
        .route("/api/users/target-jobs", post(users::handle_add_target_job))
        .route(
            "/api/users/target-jobs/:id/analysis",
            put(users::handle_update_target_job_status),
        )
        .route("/api/webhooks/identity", post(webhooks::handle_identity_event))
        .route(
            "/api/upload/resume",
            post(upload::handle_upload_resume).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Analysis
        .route(
            "/api/analysis/resume",
            get(analysis::handle_get_resume_analysis).post(analysis::handle_analyze_resume),
        )
        .route(
            "/api/analysis/jobs/:target_job_id",
            get(analysis::handle_get_target_job_analysis).post(analysis::handle_analyze_target_job),
        )
        // Job board
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/jobs/company/my-jobs", get(jobs::handle_company_jobs))
        .route("/api/jobs/company/applicants", get(jobs::handle_company_applicants))
        .route("/api/jobs/company/stats", get(jobs::handle_company_stats))
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/jobs/:id/evaluate", post(jobs::handle_evaluate_job))
        .route("/api/jobs/:id/apply", post(jobs::handle_apply_to_job))
        .route("/api/jobs/:id/applicants", get(jobs::handle_job_applicants))
        .route(
            "/api/jobs/:id/applicants/:user_id/status",
            put(jobs::handle_update_applicant_status),
        )
        // Companies
        .route("/api/companies/register", post(companies::handle_register_company))
        .route(
            "/api/companies/profile",
            get(companies::handle_get_company).put(companies::handle_update_company),
        )
        .with_state(state)
}
