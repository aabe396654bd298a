use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpecialtyRequest {
    pub name_ar: String,
    pub name_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpecialtyRequest {
    pub name_ar: Option<String>,
    pub name_en: Option<String>,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub icon: Option<String>,
}
