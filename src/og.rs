//! Link-preview pages: static HTML with Open Graph and Twitter tags that sends browsers on
//! to the canonical storefront URL.

use crate::access::normalize_hostname;
use crate::html::{document, escape};
use crate::model::{Property, SiteConfig};

/// Longest description put in preview tags, in characters.
pub const DESCRIPTION_LIMIT: usize = 200;

/// Storefront URL of a listing.
pub fn canonical_property_url(host: &str, slug: &str) -> String {
    format!("https://{}/imovel/{}", host, slug)
}

/// Host for canonical links: the primary public domain, else the domain that served the
/// request, else the hostname the client asked for. `None` when all three are missing.
pub fn canonical_host(primary: Option<String>, served: Option<&str>, requested: Option<&str>) -> Option<String> {
    primary
        .or_else(|| served.map(str::to_string))
        .or_else(|| requested.map(normalize_hostname))
        .filter(|h| !h.is_empty())
}

/// `R$ 1.250.000` style price, rounded to whole reais.
pub fn format_brl(value: f64) -> String {
    let whole = value.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("R$ {}", grouped)
}

fn truncate_chars(s: &str, limit: usize) -> String {
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= limit {
        return s;
    }
    let cut: String = s.chars().take(limit.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Description text for previews: the listing's own description, or a summary of status,
/// place and price when it has none.
pub fn preview_description(property: &Property) -> String {
    if let Some(d) = property.description.as_deref().filter(|d| !d.trim().is_empty()) {
        return truncate_chars(d, DESCRIPTION_LIMIT);
    }
    let mut parts = vec![property.status.label().to_string()];
    let place: Vec<&str> = [property.neighborhood.as_deref(), property.city.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !place.is_empty() {
        parts.push(place.join(", "));
    }
    if let Some(price) = property.price {
        parts.push(format_brl(price));
    }
    parts.join(" · ")
}

fn meta_property(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!("<meta property=\"{}\" content=\"{}\">\n", key, escape(value)));
}

fn meta_name(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!("<meta name=\"{}\" content=\"{}\">\n", key, escape(value)));
}

pub fn render_property_page(property: &Property, site: Option<&SiteConfig>, canonical_url: &str) -> String {
    let site_name = site.and_then(|s| s.site_name.as_deref()).unwrap_or("Imóveis");
    let title = format!("{} | {}", property.title, site_name);
    let description = preview_description(property);
    let image = property
        .cover_image()
        .or_else(|| site.and_then(|s| s.logo_url.as_deref()));

    let mut head = String::new();
    meta_name(&mut head, "description", &description);
    meta_property(&mut head, "og:type", "website");
    meta_property(&mut head, "og:site_name", site_name);
    meta_property(&mut head, "og:title", &title);
    meta_property(&mut head, "og:description", &description);
    meta_property(&mut head, "og:url", canonical_url);
    if let Some(img) = image {
        meta_property(&mut head, "og:image", img);
    }
    meta_name(
        &mut head,
        "twitter:card",
        if image.is_some() { "summary_large_image" } else { "summary" },
    );
    meta_name(&mut head, "twitter:title", &title);
    meta_name(&mut head, "twitter:description", &description);
    if let Some(img) = image {
        meta_name(&mut head, "twitter:image", img);
    }
    let url = escape(canonical_url);
    head.push_str(&format!("<link rel=\"canonical\" href=\"{}\">\n", url));
    head.push_str(&format!("<meta http-equiv=\"refresh\" content=\"0; url={}\">\n", url));

    let body = format!(
        "<p><a href=\"{url}\">{}</a></p>\n<script>window.location.replace({});</script>",
        escape(&property.title),
        js_string(canonical_url),
        url = url
    );
    document(&title, &head, &body)
}

/// JSON string literal safe to embed in a `<script>` element.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyStatus;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn canonical_host_prefers_primary_then_served_then_requested() {
        let primary = Some("www.example.com".to_string());
        assert_eq!(
            canonical_host(primary, Some("vitrine.example.com"), Some("x")).as_deref(),
            Some("www.example.com")
        );
        assert_eq!(
            canonical_host(None, Some("vitrine.example.com"), Some("x")).as_deref(),
            Some("vitrine.example.com")
        );
        assert_eq!(
            canonical_host(None, None, Some("Vitrine.Example.com:8080")).as_deref(),
            Some("vitrine.example.com")
        );
        assert_eq!(canonical_host(None, None, None), None);
        assert_eq!(canonical_host(None, None, Some("  ")), None);
    }

    fn listing() -> Property {
        Property {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            slug: "casa-centro".into(),
            title: "Casa <Centro> & \"quintal\"".into(),
            description: None,
            status: PropertyStatus::Venda,
            price: Some(1_250_000.0),
            area_m2: None,
            bedrooms: Some(3),
            bathrooms: Some(2),
            parking_spots: None,
            address: None,
            neighborhood: Some("Centro".into()),
            city: Some("Campinas".into()),
            state: Some("SP".into()),
            featured: false,
            images: vec!["https://cdn.example.com/capa.jpg".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn prices_are_grouped_with_dots() {
        assert_eq!(format_brl(1_250_000.0), "R$ 1.250.000");
        assert_eq!(format_brl(950.4), "R$ 950");
        assert_eq!(format_brl(100_000.0), "R$ 100.000");
    }

    #[test]
    fn page_carries_escaped_tags_and_redirect() {
        let url = canonical_property_url("www.example.com", "casa-centro");
        let html = render_property_page(&listing(), None, &url);
        assert!(html.contains("og:title\" content=\"Casa &lt;Centro&gt; &amp; &quot;quintal&quot; | Imóveis\""));
        assert!(html.contains("og:image\" content=\"https://cdn.example.com/capa.jpg\""));
        assert!(html.contains("twitter:card\" content=\"summary_large_image\""));
        assert!(html.contains("<link rel=\"canonical\" href=\"https://www.example.com/imovel/casa-centro\">"));
        assert!(html.contains("window.location.replace(\"https://www.example.com/imovel/casa-centro\")"));
        assert!(!html.contains("<Centro>"));
    }

    #[test]
    fn summary_description_when_listing_has_none() {
        assert_eq!(preview_description(&listing()), "À venda · Centro, Campinas · R$ 1.250.000");
    }

    #[test]
    fn long_descriptions_are_cut() {
        let mut p = listing();
        p.description = Some("palavra ".repeat(100));
        let d = preview_description(&p);
        assert!(d.chars().count() <= DESCRIPTION_LIMIT);
        assert!(d.ends_with('…'));
    }
}
