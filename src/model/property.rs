//! Real-estate listings.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Listing lifecycle: offered for sale or rent, then sold or rented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Venda,
    Aluguel,
    Vendido,
    Alugado,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Venda => "venda",
            PropertyStatus::Aluguel => "aluguel",
            PropertyStatus::Vendido => "vendido",
            PropertyStatus::Alugado => "alugado",
        }
    }

    /// Still on the market.
    pub fn is_available(&self) -> bool {
        matches!(self, PropertyStatus::Venda | PropertyStatus::Aluguel)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyStatus::Venda => "À venda",
            PropertyStatus::Aluguel => "Para alugar",
            PropertyStatus::Vendido => "Vendido",
            PropertyStatus::Alugado => "Alugado",
        }
    }
}

impl std::str::FromStr for PropertyStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "venda" => Ok(PropertyStatus::Venda),
            "aluguel" => Ok(PropertyStatus::Aluguel),
            "vendido" => Ok(PropertyStatus::Vendido),
            "alugado" => Ok(PropertyStatus::Alugado),
            _ => Err(AppError::Validation(format!(
                "invalid property status: {} (expected venda, aluguel, vendido or alugado)",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub status: PropertyStatus,
    pub price: Option<f64>,
    pub area_m2: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking_spots: Option<i32>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub featured: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Body for creating a listing. `slug` defaults to one derived from the title.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewProperty {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub area_m2: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default)]
    pub parking_spots: Option<i32>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewProperty {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        if self.title.chars().count() > 200 {
            return Err(AppError::Validation("title must be at most 200 characters".into()));
        }
        if self.status.is_none() {
            return Err(AppError::Validation("status is required".into()));
        }
        validate_amounts(self.price, self.area_m2)?;
        validate_counts(self.bedrooms, self.bathrooms, self.parking_spots)
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PropertyStatus>,
    pub price: Option<f64>,
    pub area_m2: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking_spots: Option<i32>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
}

impl PropertyPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("title must not be empty".into()));
            }
        }
        validate_amounts(self.price, self.area_m2)?;
        validate_counts(self.bedrooms, self.bathrooms, self.parking_spots)
    }
}

fn validate_amounts(price: Option<f64>, area: Option<f64>) -> Result<(), AppError> {
    for (name, v) in [("price", price), ("area_m2", area)] {
        if let Some(n) = v {
            if !n.is_finite() || n < 0.0 {
                return Err(AppError::Validation(format!("{} must be a non-negative number", name)));
            }
        }
    }
    Ok(())
}

fn validate_counts(bedrooms: Option<i32>, bathrooms: Option<i32>, parking: Option<i32>) -> Result<(), AppError> {
    for (name, v) in [("bedrooms", bedrooms), ("bathrooms", bathrooms), ("parking_spots", parking)] {
        if matches!(v, Some(n) if n < 0) {
            return Err(AppError::Validation(format!("{} must be at least 0", name)));
        }
    }
    Ok(())
}

/// Storefront search parameters (query string).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropertyFilter {
    pub status: Option<PropertyStatus>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<i32>,
    pub featured: Option<bool>,
    /// Free text matched against title, description and neighborhood.
    pub q: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// URL slug: lowercase ASCII letters and digits separated by single dashes. Portuguese accents are folded.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(c);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(folded);
        } else {
            pending_dash = true;
        }
    }
    out
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// First of `base`, `base-2`, `base-3`, ... not in `taken`.
pub fn next_free_slug(base: &str, taken: &HashSet<String>) -> String {
    let base = if base.is_empty() { "imovel" } else { base };
    if !taken.contains(base) {
        return base.to_string();
    }
    (2u32..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{}-{}", base, Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_folds_accents_and_collapses_separators() {
        assert_eq!(slugify("Apartamento  à venda -- São Paulo!"), "apartamento-a-venda-sao-paulo");
        assert_eq!(slugify("  Casa Térrea, 3 Quartos "), "casa-terrea-3-quartos");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn next_free_slug_skips_taken_suffixes() {
        let taken: HashSet<String> = ["casa", "casa-2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(next_free_slug("casa", &taken), "casa-3");
        assert_eq!(next_free_slug("sobrado", &taken), "sobrado");
        assert_eq!(next_free_slug("", &taken), "imovel");
    }

    #[test]
    fn new_property_requires_title_and_status() {
        let mut p = NewProperty {
            title: "Casa".into(),
            ..Default::default()
        };
        assert!(p.validate().is_err());
        p.status = Some(PropertyStatus::Venda);
        assert!(p.validate().is_ok());
        p.price = Some(-1.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn availability_follows_lifecycle() {
        assert!(PropertyStatus::Aluguel.is_available());
        assert!(!PropertyStatus::Vendido.is_available());
        assert_eq!("ALUGADO".parse::<PropertyStatus>().unwrap(), PropertyStatus::Alugado);
    }
}
