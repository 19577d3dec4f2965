//! Generic HTML table extraction.
//!
//! Everything downstream treats a page as "a table of rows with named columns".
//! Cells are whitespace-normalized text; an empty cell is `None`.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static THEAD_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead tr").expect("valid selector"));
static TBODY_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("valid selector"));
static ANY_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("valid selector"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// First header among `names` that exists.
    pub fn column_any(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.column(name))
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column(from) {
            self.headers[idx] = to.to_string();
        }
    }
}

/// Finds `<table id="...">`. basketball-reference ships some tables inside HTML
/// comments, so a miss retries against the page with comment markers removed.
pub fn extract_table_by_id(html: &str, id: &str) -> Option<RawTable> {
    let doc = Html::parse_document(html);
    if let Some(table) = doc
        .select(&TABLE)
        .find(|t| t.value().id() == Some(id))
    {
        return Some(table_from_element(table));
    }

    if !html.contains("<!--") {
        return None;
    }
    let uncommented = html.replace("<!--", "").replace("-->", "");
    let doc = Html::parse_document(&uncommented);
    doc.select(&TABLE)
        .find(|t| t.value().id() == Some(id))
        .map(table_from_element)
}

pub fn extract_first_table(html: &str) -> Option<RawTable> {
    let doc = Html::parse_document(html);
    doc.select(&TABLE).next().map(table_from_element)
}

pub fn table_from_element(table: ElementRef<'_>) -> RawTable {
    let mut headers = table
        .select(&THEAD_ROW)
        .last()
        .map(header_cells)
        .unwrap_or_default();

    let mut body: Vec<ElementRef<'_>> = table.select(&TBODY_ROW).collect();
    if headers.is_empty() {
        // No thead: the parser still wraps bare rows in an implicit tbody,
        // so the first body row is the header.
        if body.is_empty() {
            body = table.select(&ANY_ROW).collect();
        }
        if !body.is_empty() {
            headers = header_cells(body.remove(0));
        }
    }

    let rows = body
        .into_iter()
        .map(row_cells)
        .filter(|cells| !cells.is_empty())
        .collect();

    RawTable { headers, rows }
}

fn header_cells(row: ElementRef<'_>) -> Vec<String> {
    row_cells(row)
        .into_iter()
        .map(|c| c.unwrap_or_default())
        .collect()
}

fn row_cells(row: ElementRef<'_>) -> Vec<Option<String>> {
    row.select(&CELL).map(cell_text).collect()
}

pub fn cell_text(el: ElementRef<'_>) -> Option<String> {
    let raw = el.text().collect::<String>();
    let text = normalize_ws(&raw);
    if text.is_empty() { None } else { Some(text) }
}

/// Collapse whitespace runs (including non-breaking spaces) into one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() || ch == '\u{a0}' {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Parses a numeric cell. Accepts leading-dot decimals (".512") and treats
/// dashes or empty cells as missing.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let s = raw?.trim().trim_start_matches('+');
    if s.is_empty() || s == "-" || s == "—" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
        <html><body>
        <table id="other"><tr><td>x</td></tr></table>
        <table id="target">
          <thead><tr><th>Name</th><th>W</th></tr></thead>
          <tbody>
            <tr><th>Alpha  Team</th><td>10</td></tr>
            <tr><th>Beta</th><td></td></tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn finds_table_by_id() {
        let table = extract_table_by_id(SIMPLE, "target").expect("table");
        assert_eq!(table.headers, vec!["Name", "W"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "Name"), Some("Alpha Team"));
        assert_eq!(table.cell(0, "W"), Some("10"));
        assert_eq!(table.cell(1, "W"), None);
    }

    #[test]
    fn missing_id_is_none() {
        assert!(extract_table_by_id(SIMPLE, "nope").is_none());
    }

    #[test]
    fn finds_commented_table() {
        let html = r#"<div><!-- <table id="hidden"><thead><tr><th>A</th></tr></thead>
            <tbody><tr><td>1</td></tr></tbody></table> --></div>"#;
        let table = extract_table_by_id(html, "hidden").expect("table");
        assert_eq!(table.cell(0, "A"), Some("1"));
    }

    #[test]
    fn table_without_thead_uses_first_row() {
        let html = "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>";
        let table = extract_first_table(html).expect("table");
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec![Some("1".into()), Some("2".into())]]);
    }

    #[test]
    fn rename_and_lookup_any() {
        let mut table = extract_table_by_id(SIMPLE, "target").unwrap();
        table.rename_column("W", "Wins");
        assert_eq!(table.column("Wins"), Some(1));
        assert_eq!(table.column_any(&["Tm", "Name"]), Some(0));
    }

    #[test]
    fn parse_number_variants() {
        assert_eq!(parse_number(Some(".512")), Some(0.512));
        assert_eq!(parse_number(Some("+3.5")), Some(3.5));
        assert_eq!(parse_number(Some("—")), None);
        assert_eq!(parse_number(Some("abc")), None);
        assert_eq!(parse_number(None), None);
    }
}
