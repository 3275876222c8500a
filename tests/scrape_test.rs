//! Subtitle listing scraper tests

use chrono::NaiveDate;
use ktuvit::scrape::{extract_subtitles, parse_upload_date};

fn row(name: &str, credit: &str, date: &str, downloads: &str, id_cell: &str) -> String {
    format!(
        "<tr><td><div>{}<br><small>{}</small></div></td>\
         <td>srt</td><td>42kb</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        name, credit, date, downloads, id_cell
    )
}

#[test]
fn test_single_episode_row() {
    let html = row(
        "Show.S01E02.HEBREW",
        "uploader1",
        "01/02/2020",
        "17",
        r#"<a data-subtitle-id="abc123"></a>"#,
    );
    let subs = extract_subtitles(&html).unwrap();

    assert_eq!(subs.len(), 1);
    let sub = &subs[0];
    assert_eq!(sub.name, "Show.S01E02.HEBREW");
    assert_eq!(sub.credit, "uploader1");
    assert_eq!(sub.file_type, "srt");
    assert_eq!(sub.size, "42kb");
    assert_eq!(sub.downloads, Some(17));
    assert_eq!(sub.upload_date, NaiveDate::from_ymd_opt(2020, 2, 1));
    assert_eq!(sub.id, "abc123");
}

#[test]
fn test_missing_identifier_drops_row() {
    let html = format!(
        "{}{}",
        row("Valid", "a", "01/01/2021", "3", r#"<a data-subtitle-id="1"></a>"#),
        row("NoId", "b", "01/01/2021", "3", "<a></a>")
    );
    let subs = extract_subtitles(&html).unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].name, "Valid");
}

#[test]
fn test_row_order_is_kept() {
    let html: String = (1..=5)
        .map(|i| {
            row(
                &format!("Release.{}", i),
                "x",
                "01/01/2021",
                &(100 - i).to_string(),
                &format!(r#"<a data-subtitle-id="{}"></a>"#, i),
            )
        })
        .collect();
    let ids: Vec<String> = extract_subtitles(&html)
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn test_malformed_fields_default() {
    let html = row(
        "Weird.Row",
        "",
        "not a date",
        "many",
        r#"<a data-subtitle-id="9"></a>"#,
    );
    let subs = extract_subtitles(&html).unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].downloads, None);
    assert_eq!(subs[0].upload_date, None);
    assert_eq!(subs[0].credit, "");
}

#[test]
fn test_full_document_with_empty_table() {
    let html = r#"<!DOCTYPE html><html><body>
        <table id="subtitlesList"><thead><tr><th>name</th></tr></thead><tbody></tbody></table>
        </body></html>"#;
    assert!(extract_subtitles(html).unwrap().is_empty());
}

#[test]
fn test_upload_date_reversal() {
    assert_eq!(parse_upload_date("21/05/2019"), NaiveDate::from_ymd_opt(2019, 5, 21));
}
