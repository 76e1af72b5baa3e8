//! Per-tenant storefront configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteConfig {
    pub tenant_id: Uuid,
    pub site_name: Option<String>,
    pub logo_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub whatsapp: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    /// Free-form storefront settings (colors, social links, banners).
    pub extra: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SiteConfigInput {
    pub site_name: Option<String>,
    pub logo_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub whatsapp: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}
