use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the specialties table. Names and descriptions are bilingual.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyModel {
    pub id: String,
    pub name_ar: String,
    pub name_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SpecialtyModel {
    pub fn new(name_ar: String, name_en: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name_ar,
            name_en,
            description_ar: None,
            description_en: None,
            icon: None,
            created_at: Utc::now(),
        }
    }
}

/// Response language for localized fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    Ar,
    #[default]
    En,
}

impl Locale {
    /// Picks the locale from the first language tag of `Accept-Language`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .filter(|tag| tag.starts_with("ar"))
            .map(|_| Locale::Ar)
            .unwrap_or_default()
    }

    pub fn pick<'a>(self, ar: &'a str, en: &'a str) -> &'a str {
        match self {
            Locale::Ar => ar,
            Locale::En => en,
        }
    }
}
