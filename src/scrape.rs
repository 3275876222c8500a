//! Subtitle listing scraper
//!
//! The movie page embeds a full `#subtitlesList` table; the episode endpoint
//! returns bare `<tr>` rows. Fragments are wrapped into a minimal table first
//! so both shapes go through the same row extraction.
//!
//! Column layout:
//!
//! | # | content                                                   |
//! |---|-----------------------------------------------------------|
//! | 0 | `<div>file name<br><small>credit</small></div>`            |
//! | 1 | file type                                                 |
//! | 2 | file size                                                 |
//! | 3 | upload date, `DD/MM/YYYY`                                 |
//! | 4 | download count                                            |
//! | 5 | element carrying `data-subtitle-id`                       |

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Node, Selector};
use std::borrow::Cow;
use tracing::{debug, warn};

use crate::error::{KtuvitError, Result};
use crate::models::SubtitleRecord;

/// `id` of the listing table on Ktuvit pages
pub const SUBTITLE_TABLE_ID: &str = "subtitlesList";

const SUBTITLE_ID_ATTR: &str = "data-subtitle-id";

/// Wrap a bare-rows fragment into a document with an empty header row.
///
/// Full documents (anything with a doctype) pass through untouched.
pub fn normalize_fragment(html: &str) -> Cow<'_, str> {
    if html.to_ascii_lowercase().contains("<!doctype html") {
        Cow::Borrowed(html)
    } else {
        Cow::Owned(format!(
            "<!DOCTYPE html><table id=\"{}\"><thead><tr></tr></thead>{}</table>",
            SUBTITLE_TABLE_ID, html
        ))
    }
}

/// Extract subtitle rows from a listing page or episode fragment.
///
/// Rows that can't be downloaded (no ID) or have no name block are skipped.
/// A document without the listing table is an error; a table with only the
/// header row yields an empty list.
pub fn extract_subtitles(html: &str) -> Result<Vec<SubtitleRecord>> {
    let document = Html::parse_document(&normalize_fragment(html));

    let table_sel = selector(&format!("table#{}", SUBTITLE_TABLE_ID))?;
    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| KtuvitError::Parse("subtitle table not found".to_string()))?;

    let rows = table_rows(table);
    debug!(rows = rows.len(), "subtitle table located");

    // First row is the header
    let subtitles: Vec<SubtitleRecord> = rows
        .into_iter()
        .skip(1)
        .enumerate()
        .filter_map(|(idx, row)| {
            let parsed = parse_row(row);
            if parsed.is_none() {
                warn!(row = idx + 1, "skipping malformed subtitle row");
            }
            parsed
        })
        .collect();

    Ok(subtitles)
}

/// Rows of `table` in document order, like the DOM's `table.rows`
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child_elements(child).filter(|e| e.value().name() == "tr"))
            }
            _ => {}
        }
    }
    rows
}

fn parse_row(row: ElementRef<'_>) -> Option<SubtitleRecord> {
    let cells: Vec<ElementRef<'_>> = child_elements(row)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .collect();
    if cells.len() < 6 {
        return None;
    }

    let id = subtitle_id(cells[5])?;

    let name_block = child_elements(cells[0])
        .find(|e| e.value().name() == "div")
        .or_else(|| cells[0].select(&selector("div").ok()?).next())?;
    let name = file_name(name_block);
    if name.is_empty() {
        return None;
    }

    let credit = child_elements(name_block)
        .find(|e| e.value().name() == "small")
        .map(cell_text)
        .unwrap_or_default();

    Some(SubtitleRecord {
        name,
        id,
        credit,
        downloads: parse_downloads(&cell_text(cells[4])),
        upload_date: parse_upload_date(&cell_text(cells[3])),
        size: cell_text(cells[2]),
        file_type: cell_text(cells[1]),
    })
}

/// `data-subtitle-id` from the first child element, or any descendant
fn subtitle_id(cell: ElementRef<'_>) -> Option<String> {
    let from_first = child_elements(cell)
        .next()
        .and_then(|e| e.value().attr(SUBTITLE_ID_ATTR));

    let id = match from_first {
        Some(id) => id,
        None => {
            let sel = selector(&format!("[{}]", SUBTITLE_ID_ATTR)).ok()?;
            cell.select(&sel).next()?.value().attr(SUBTITLE_ID_ATTR)?
        }
    };

    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Text of the name block up to the first `<br>` (or the credit line)
fn file_name(block: ElementRef<'_>) -> String {
    let mut name = String::new();
    for node in block.children() {
        match node.value() {
            Node::Text(text) => name.push_str(text),
            Node::Element(el) if matches!(el.name(), "br" | "small") => break,
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(node) {
                    name.extend(el.text());
                }
            }
            _ => {}
        }
    }
    name.trim().to_string()
}

/// Parse the download counter the way a lenient integer parse would:
/// leading digits count, anything else means "unknown".
pub fn parse_downloads(raw: &str) -> Option<u64> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// `DD/MM/YYYY` -> date (reordered to `YYYY-MM-DD` before parsing)
pub fn parse_upload_date(raw: &str) -> Option<NaiveDate> {
    let reordered: Vec<&str> = raw.trim().split('/').rev().collect();
    NaiveDate::parse_from_str(&reordered.join("-"), "%Y-%m-%d").ok()
}

fn child_elements(parent: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    parent.children().filter_map(ElementRef::wrap)
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| KtuvitError::Parse(format!("bad selector {}: {}", css, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, credit: &str, id: Option<&str>) -> String {
        let id_cell = match id {
            Some(id) => format!(r##"<a href="#" data-subtitle-id="{}">הורדה</a>"##, id),
            None => "<span>n/a</span>".to_string(),
        };
        format!(
            "<tr><td><div>{}<br /><small>{}</small></div></td>\
             <td>srt</td><td>42kb</td><td>01/02/2020</td><td>17</td>\
             <td>{}</td></tr>",
            name, credit, id_cell
        )
    }

    #[test]
    fn test_fragment_is_wrapped() {
        let wrapped = normalize_fragment("<tr></tr>");
        assert!(wrapped.starts_with("<!DOCTYPE html><table id=\"subtitlesList\">"));
        assert!(wrapped.ends_with("<tr></tr></table>"));
    }

    #[test]
    fn test_document_passes_through() {
        let doc = "<!doctype html><html><body></body></html>";
        assert!(matches!(normalize_fragment(doc), Cow::Borrowed(_)));
    }

    #[test]
    fn test_single_row_fragment() {
        let subs = extract_subtitles(&row("Show.S01E02.HEBREW", "uploader1", Some("abc123"))).unwrap();
        assert_eq!(subs.len(), 1);

        let sub = &subs[0];
        assert_eq!(sub.name, "Show.S01E02.HEBREW");
        assert_eq!(sub.credit, "uploader1");
        assert_eq!(sub.id, "abc123");
        assert_eq!(sub.file_type, "srt");
        assert_eq!(sub.size, "42kb");
        assert_eq!(sub.downloads, Some(17));
        assert_eq!(sub.upload_date, NaiveDate::from_ymd_opt(2020, 2, 1));
    }

    #[test]
    fn test_row_without_id_is_dropped() {
        let html = format!(
            "{}{}",
            row("Good.Release", "a", Some("1")),
            row("Bad.Release", "b", None)
        );
        let subs = extract_subtitles(&html).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].name, "Good.Release");
    }

    #[test]
    fn test_short_row_is_dropped() {
        let html = format!("<tr><td>only</td></tr>{}", row("Kept", "a", Some("7")));
        let subs = extract_subtitles(&html).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "7");
    }

    #[test]
    fn test_empty_fragment() {
        assert!(extract_subtitles("").unwrap().is_empty());
    }

    #[test]
    fn test_document_without_table_is_error() {
        let err = extract_subtitles("<!DOCTYPE html><html><body>login</body></html>").unwrap_err();
        assert!(matches!(err, KtuvitError::Parse(_)));
    }

    #[test]
    fn test_parse_upload_date() {
        assert_eq!(parse_upload_date("21/05/2019"), NaiveDate::from_ymd_opt(2019, 5, 21));
        assert_eq!(parse_upload_date(" 1/2/2020 "), NaiveDate::from_ymd_opt(2020, 2, 1));
        assert_eq!(parse_upload_date("yesterday"), None);
        assert_eq!(parse_upload_date("31/02/2020"), None);
    }

    #[test]
    fn test_parse_downloads() {
        assert_eq!(parse_downloads("17"), Some(17));
        assert_eq!(parse_downloads(" 250 "), Some(250));
        assert_eq!(parse_downloads("12 הורדות"), Some(12));
        assert_eq!(parse_downloads("n/a"), None);
        assert_eq!(parse_downloads(""), None);
    }
}
