//! CSV interchange format for bulk export and import of products.
//!
//! ## Column contract
//!
//! | Column        | Export                       | Import                                 |
//! |---------------|------------------------------|----------------------------------------|
//! | `id`          | product id                   | empty ⇒ new product                    |
//! | `name`        |                              |                                        |
//! | `details`     |                              |                                        |
//! | `category`    | category display name        | resolved or created by name            |
//! | `price`       | number, empty when 0/missing | lenient: non-numeric or empty ⇒ 0      |
//! | `description` |                              |                                        |
//! | `imageUrl`    |                              |                                        |
//! | `status`      | status display name          | resolved or created; empty ⇒ inactive  |
//! | `condition`   | condition display name       | resolved or created by name            |
//! | `brand`       | brand display name           | resolved or created by name            |
//! | `reference`   |                              |                                        |
//!
//! Export writes the columns in this order. Import matches header names
//! case-insensitively in any order, ignores unknown columns, and treats a
//! column that is absent from the header as "leave unchanged".

use std::collections::HashMap;
use crate::catalog::Catalog;
use crate::domain::aggregates::NamedEntity;
use crate::{CatalogError, Result};

pub const CSV_HEADER: [&str; 11] = [
    "id", "name", "details", "category", "price", "description", "imageUrl", "status", "condition", "brand", "reference",
];

/// One decoded import row. A field is `None` when its column is missing from
/// the header and `Some("")` when the column is present but blank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based line in the source text where the record starts.
    pub line: u64,
    pub id: Option<String>,
    pub name: Option<String>,
    pub details: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub reference: Option<String>,
}

/// Renders every product with foreign keys replaced by display names.
/// Dangling ids render as empty cells.
pub fn encode_products(catalog: &Catalog) -> Result<String> {
    let categories = name_map(&catalog.categories);
    let statuses = name_map(&catalog.statuses);
    let conditions = name_map(&catalog.conditions);
    let brands = name_map(&catalog.brands);

    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    csv.write_record(CSV_HEADER).map_err(write_error)?;

    for p in &catalog.products {
        csv.write_record([
            p.id.clone(),
            p.name.clone(),
            p.details.clone().unwrap_or_default(),
            display_name(&categories, Some(p.category.as_str())),
            format_number(p.price),
            p.description.clone().unwrap_or_default(),
            p.image_url.clone(),
            display_name(&statuses, Some(p.status_id.as_str())),
            display_name(&conditions, p.condition_id.as_deref()),
            display_name(&brands, p.brand_id.as_deref()),
            p.reference.clone().unwrap_or_default(),
        ])
        .map_err(write_error)?;
    }

    let bytes = csv.into_inner().map_err(|e| CatalogError::StorageError(format!("CSV flush error: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CatalogError::StorageError(format!("CSV encoding error: {e}")))
}

/// Decodes the whole text before anything is applied. Any structural problem
/// (no data rows, a record whose field count differs from the header,
/// unterminated quoting) fails the entire batch.
pub fn decode_rows(text: &str) -> Result<Vec<ImportRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.lines().filter(|l| !l.trim().is_empty()).count() < 2 {
        return Err(CatalogError::Parse { line: 1, message: "CSV is empty or has no data rows below the header".into() });
    }
    if let Some(line) = unterminated_quote(text) {
        return Err(CatalogError::Parse { line, message: "quoted field is never closed".into() });
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers().map_err(read_error)?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim_matches('"').eq_ignore_ascii_case(name));
    let columns: Vec<Option<usize>> = CSV_HEADER.iter().map(|name| column(name)).collect();
    if columns.iter().all(Option::is_none) {
        return Err(CatalogError::Parse { line: 1, message: format!("header has none of the expected columns: {}", CSV_HEADER.join(",")) });
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(read_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(|f| f.is_empty()) { continue; }
        if record.len() != headers.len() {
            return Err(CatalogError::Parse {
                line,
                message: format!("expected {} fields, found {}", headers.len(), record.len()),
            });
        }
        let field = |slot: usize| columns[slot].and_then(|i| record.get(i)).map(str::to_string);
        rows.push(ImportRow {
            line,
            id: field(0),
            name: field(1),
            details: field(2),
            category: field(3),
            price: field(4),
            description: field(5),
            image_url: field(6),
            status: field(7),
            condition: field(8),
            brand: field(9),
            reference: field(10),
        });
    }

    if rows.is_empty() {
        return Err(CatalogError::Parse { line: 1, message: "CSV has no data rows below the header".into() });
    }
    Ok(rows)
}

/// Line of a quoted field that runs to the end of the input. The reader
/// closes such a field silently, folding every later record into it.
fn unterminated_quote(text: &str) -> Option<u64> {
    let mut line = 1;
    let mut opened_at = None;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if opened_at.is_some() {
            match c {
                '"' if chars.peek() == Some(&'"') => { chars.next(); }
                '"' => opened_at = None,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }
        if c == '"' && at_field_start { opened_at = Some(line); }
        if c == '\n' { line += 1; }
        at_field_start = matches!(c, ',' | '\n' | '\r');
    }
    opened_at
}

/// Permissive number parsing: a comma decimal separator is accepted, and
/// anything unparseable or non-finite reads as 0.
pub fn parse_lenient_number(raw: &str) -> f64 {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

fn display_name(names: &HashMap<&str, &str>, id: Option<&str>) -> String {
    id.and_then(|id| names.get(id)).map(|n| n.to_string()).unwrap_or_default()
}

fn name_map<T: NamedEntity>(entities: &[T]) -> HashMap<&str, &str> {
    entities.iter().map(|e| (e.id(), e.name())).collect()
}

fn read_error(e: csv::Error) -> CatalogError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    CatalogError::Parse { line, message: e.to_string() }
}

fn write_error(e: csv::Error) -> CatalogError {
    CatalogError::StorageError(format!("CSV write error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::seed_catalog;

    const HEADER: &str = "id,name,details,category,price,description,imageUrl,status,condition,brand,reference";

    #[test]
    fn test_export_resolves_names_and_escapes() {
        let mut catalog = seed_catalog();
        catalog.products.truncate(1);
        catalog.products[0].name = "Iphone 11, \"Swap\"".into();
        catalog.products[0].details = Some("Bateria 85%\nTela Original".into());
        let text = encode_products(&catalog).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert!(text.contains("\"Iphone 11, \"\"Swap\"\"\""));
        assert!(text.contains("\"Bateria 85%\nTela Original\""));
        assert!(text.contains(",iPhone Swap,1695,"));
        assert!(text.contains(",Estoque disponível,Swap,Apple,AP11SW128"));
    }

    #[test]
    fn test_export_renders_dangling_and_zero_as_empty() {
        let mut catalog = seed_catalog();
        catalog.products.truncate(1);
        catalog.products[0].category = "cat_deleted".into();
        catalog.products[0].price = Some(0.0);
        catalog.products[0].brand_id = None;
        catalog.products[0].details = None;
        let text = encode_products(&catalog).unwrap();
        let row = text.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[3], "");
        assert_eq!(fields[4], "");
        assert_eq!(fields[9], "");
    }

    #[test]
    fn test_decode_round_trips_export() {
        let catalog = seed_catalog();
        let rows = decode_rows(&encode_products(&catalog).unwrap()).unwrap();
        assert_eq!(rows.len(), catalog.products.len());
        assert_eq!(rows[0].id.as_deref(), Some("10"));
        assert_eq!(rows[0].brand.as_deref(), Some("Apple"));
        assert_eq!(rows[0].line, 2);
    }

    #[test]
    fn test_decode_maps_headers_by_name() {
        let rows = decode_rows("Name, PRICE ,unknown\nCapinha,\"12,50\",x\n").unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("Capinha"));
        assert_eq!(rows[0].price.as_deref(), Some("12,50"));
        assert_eq!(rows[0].id, None);
        assert_eq!(rows[0].category, None);
        assert_eq!(parse_lenient_number(rows[0].price.as_deref().unwrap()), 12.5);
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert!(matches!(decode_rows(""), Err(CatalogError::Parse { .. })));
        assert!(matches!(decode_rows(&format!("{HEADER}\n\n")), Err(CatalogError::Parse { .. })));
        assert!(matches!(decode_rows("foo,bar\n1,2\n"), Err(CatalogError::Parse { .. })));
    }

    #[test]
    fn test_decode_rejects_broken_row_shape() {
        let text = format!("{HEADER}\n,Phone A,,Phones,100,,,,,,\n,Phone B,,Phones,12\n0,,,,,,\n");
        match decode_rows(&text) {
            Err(CatalogError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_unclosed_quote() {
        let text = "id,name,reference\n,Phone A,\"REF1\n,Phone B,REF2\n,Phone C,REF3\n";
        match decode_rows(text) {
            Err(CatalogError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_accepts_bare_inch_marks() {
        let rows = decode_rows("name,details\nTela 6.1\" OLED,\"Caixa \"\"original\"\"\"\n").unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("Tela 6.1\" OLED"));
        assert_eq!(rows[0].details.as_deref(), Some("Caixa \"original\""));
        assert_eq!(unterminated_quote("a,\"b\nc\"\n"), None);
    }

    #[test]
    fn test_decode_skips_blank_records() {
        let text = format!("{HEADER}\n,Phone A,,Phones,100,,,,,,\n   \n,,,,,,,,,,\n");
        assert_eq!(decode_rows(&text).unwrap().len(), 1);
    }

    #[test]
    fn test_lenient_numbers() {
        assert_eq!(parse_lenient_number(""), 0.0);
        assert_eq!(parse_lenient_number("abc"), 0.0);
        assert_eq!(parse_lenient_number(" 1695.5 "), 1695.5);
        assert_eq!(parse_lenient_number("NaN"), 0.0);
        assert_eq!(parse_lenient_number("inf"), 0.0);
    }
}
