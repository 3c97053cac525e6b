use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanySize {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub subject: String,
    pub company_name: String,
    pub email: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub industry: Option<String>,
    pub size: Option<CompanySize>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for company registration and profile updates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub industry: Option<String>,
    pub size: Option<CompanySize>,
}

impl Company {
    pub fn new(subject: String, email: String, company_name: String, details: CompanyDetails) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject,
            company_name,
            email,
            website: details.website,
            description: details.description,
            logo: details.logo,
            industry: details.industry,
            size: details.size,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, details: &CompanyDetails) {
        if let Some(v) = &details.company_name {
            self.company_name = v.clone();
        }
        if let Some(v) = &details.website {
            self.website = Some(v.clone());
        }
        if let Some(v) = &details.description {
            self.description = Some(v.clone());
        }
        if let Some(v) = &details.logo {
            self.logo = Some(v.clone());
        }
        if let Some(v) = &details.industry {
            self.industry = Some(v.clone());
        }
        if let Some(v) = details.size {
            self.size = Some(v);
        }
        self.updated_at = Utc::now();
    }
}
