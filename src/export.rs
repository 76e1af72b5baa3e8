//! Fixed-column CSV exports and the property import.

use crate::csv::{CsvTable, CsvWriter};
use crate::error::AppError;
use crate::model::{ContactMessage, NewProperty, Property, PropertyStatus};

pub const PROPERTY_COLUMNS: [&str; 17] = [
    "id",
    "slug",
    "title",
    "description",
    "status",
    "price",
    "area_m2",
    "bedrooms",
    "bathrooms",
    "parking_spots",
    "address",
    "neighborhood",
    "city",
    "state",
    "featured",
    "images",
    "created_at",
];

pub const MESSAGE_COLUMNS: [&str; 8] = ["id", "property_id", "name", "email", "phone", "message", "read", "created_at"];

/// Separator between image URLs inside the `images` cell.
pub const IMAGE_SEPARATOR: &str = "|";

/// Most rows accepted by one import.
pub const IMPORT_LIMIT: usize = 1000;

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

pub fn properties_csv(properties: &[Property]) -> String {
    let mut w = CsvWriter::new();
    w.write_record(PROPERTY_COLUMNS);
    for p in properties {
        w.write_record([
            p.id.to_string(),
            p.slug.clone(),
            p.title.clone(),
            opt(&p.description),
            p.status.as_str().to_string(),
            opt(&p.price),
            opt(&p.area_m2),
            opt(&p.bedrooms),
            opt(&p.bathrooms),
            opt(&p.parking_spots),
            opt(&p.address),
            opt(&p.neighborhood),
            opt(&p.city),
            opt(&p.state),
            p.featured.to_string(),
            p.images.join(IMAGE_SEPARATOR),
            p.created_at.to_rfc3339(),
        ]);
    }
    w.finish()
}

pub fn messages_csv(messages: &[ContactMessage]) -> String {
    let mut w = CsvWriter::new();
    w.write_record(MESSAGE_COLUMNS);
    for m in messages {
        w.write_record([
            m.id.to_string(),
            opt(&m.property_id),
            m.name.clone(),
            m.email.clone(),
            opt(&m.phone),
            m.message.clone(),
            m.read.to_string(),
            m.created_at.to_rfc3339(),
        ]);
    }
    w.finish()
}

/// Parse an upload in the properties column set. Columns are matched by header name,
/// unknown ones ignored; `id` and `created_at` are assigned on insert. A `slug` is kept as
/// the preferred slug and suffixed on collision. Text cells are stored as written.
pub fn parse_properties_csv(input: &str) -> Result<Vec<NewProperty>, AppError> {
    let table = CsvTable::parse(input)?;
    for required in ["title", "status"] {
        if !table.has_column(required) {
            return Err(AppError::Validation(format!("csv: missing column {}", required)));
        }
    }
    if table.len() > IMPORT_LIMIT {
        return Err(AppError::BadRequest(format!("import limited to {} rows", IMPORT_LIMIT)));
    }
    let mut out = Vec::with_capacity(table.len());
    for row in table.rows() {
        let line = row.number;
        let property = NewProperty {
            title: row.get("title").unwrap_or_default().to_string(),
            slug: row.get_trimmed("slug").map(str::to_string),
            description: row.get("description").map(str::to_string),
            status: row
                .get_trimmed("status")
                .map(str::parse::<PropertyStatus>)
                .transpose()
                .map_err(|e| at_line(line, e))?,
            price: parse_cell(row.get_trimmed("price"), "price", line)?,
            area_m2: parse_cell(row.get_trimmed("area_m2"), "area_m2", line)?,
            bedrooms: parse_cell(row.get_trimmed("bedrooms"), "bedrooms", line)?,
            bathrooms: parse_cell(row.get_trimmed("bathrooms"), "bathrooms", line)?,
            parking_spots: parse_cell(row.get_trimmed("parking_spots"), "parking_spots", line)?,
            address: row.get("address").map(str::to_string),
            neighborhood: row.get("neighborhood").map(str::to_string),
            city: row.get("city").map(str::to_string),
            state: row.get("state").map(str::to_string),
            featured: row.get_trimmed("featured").map(parse_bool).unwrap_or(false),
            images: row
                .get("images")
                .map(|cell| {
                    cell.split(IMAGE_SEPARATOR)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };
        property.validate().map_err(|e| at_line(line, e))?;
        out.push(property);
    }
    Ok(out)
}

fn parse_cell<T: std::str::FromStr>(cell: Option<&str>, column: &str, line: usize) -> Result<Option<T>, AppError> {
    cell.map(|v| {
        v.parse::<T>()
            .map_err(|_| AppError::Validation(format!("csv line {}: {} is not a number: {}", line, column, v)))
    })
    .transpose()
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "sim" | "s")
}

fn at_line(line: usize, e: AppError) -> AppError {
    match e {
        AppError::Validation(msg) | AppError::BadRequest(msg) => {
            AppError::Validation(format!("csv line {}: {}", line, msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse;
    use chrono::Utc;
    use uuid::Uuid;

    fn property(i: usize, title: &str) -> Property {
        Property {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            slug: format!("imovel-{}", i),
            title: title.to_string(),
            description: Some(format!("Descricao {}", i)),
            status: PropertyStatus::Venda,
            price: Some(350000.0 + i as f64),
            area_m2: Some(72.5),
            bedrooms: Some(3),
            bathrooms: None,
            parking_spots: Some(1),
            address: Some("Rua A, 10".into()),
            neighborhood: Some("Centro".into()),
            city: Some("Campinas".into()),
            state: Some("SP".into()),
            featured: i % 2 == 0,
            images: vec!["https://cdn.example.com/a.jpg".into(), "https://cdn.example.com/b.jpg".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn export_then_import_keeps_listing_fields() {
        let originals: Vec<Property> = (0..5).map(|i| property(i, &format!("Casa {}", i))).collect();
        let csv = properties_csv(&originals);
        assert_eq!(parse(&csv).unwrap().len(), originals.len() + 1);

        let imported = parse_properties_csv(&csv).unwrap();
        assert_eq!(imported.len(), originals.len());
        for (p, n) in originals.iter().zip(&imported) {
            assert_eq!(n.title, p.title);
            assert_eq!(n.description, p.description);
            assert_eq!(n.status, Some(p.status));
            assert_eq!(n.price, p.price);
            assert_eq!(n.area_m2, p.area_m2);
            assert_eq!(n.bedrooms, p.bedrooms);
            assert_eq!(n.bathrooms, p.bathrooms);
            assert_eq!(n.address, p.address);
            assert_eq!(n.featured, p.featured);
            assert_eq!(n.images, p.images);
        }
    }

    #[test]
    fn awkward_text_survives_the_round_trip() {
        let tricky = "Cobertura \"vista mar\", 2 suítes\r\nvaranda gourmet";
        let mut p = property(1, tricky);
        p.slug = "meu-slug-custom".into();
        p.description = Some("  Linha 1\nLinha 2\n".into());
        p.address = Some(" Rua A ".into());
        let csv = properties_csv(&[p]);
        let imported = parse_properties_csv(&csv).unwrap();
        assert_eq!(imported[0].title, tricky);
        assert_eq!(imported[0].slug.as_deref(), Some("meu-slug-custom"));
        assert_eq!(imported[0].description.as_deref(), Some("  Linha 1\nLinha 2\n"));
        assert_eq!(imported[0].address.as_deref(), Some(" Rua A "));
    }

    #[test]
    fn header_columns_are_fixed() {
        let csv = properties_csv(&[]);
        let records = parse(&csv).unwrap();
        assert_eq!(records, vec![PROPERTY_COLUMNS.to_vec()]);
        let csv = messages_csv(&[]);
        assert_eq!(parse(&csv).unwrap(), vec![MESSAGE_COLUMNS.to_vec()]);
    }

    #[test]
    fn import_reports_the_offending_line() {
        let err = parse_properties_csv("title,status,price\nCasa,venda,100\nApto,venda,caro\n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
        let err = parse_properties_csv("title,status\nCasa,leilao\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
        assert!(parse_properties_csv("title\nCasa\n").is_err());
    }

    #[test]
    fn import_ignores_unknown_columns_and_parses_flags() {
        let rows = parse_properties_csv("\u{feff}title,status,featured,corretor\nCasa,aluguel,sim,Joao\n").unwrap();
        assert_eq!(rows[0].status, Some(PropertyStatus::Aluguel));
        assert!(rows[0].featured);
    }
}
