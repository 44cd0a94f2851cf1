//! Edge case tests for malformed and unusual feed payloads

use crate::common::snap;
use feedwatch::notify::MessageStyle;
use feedwatch::schema::RowLayout;
use feedwatch::tsv::{parse, parse_feed, Delimiters};
use feedwatch::{diff, Snapshot};

#[test]
fn test_escaped_separators_with_real_whitespace() {
    // the escaped preset must not split on real tabs or newlines
    let payload = "stamp\\n101\tIntro\\tDr. X\\n102\\tB";
    let feed = parse_feed(payload, &Delimiters::escaped());
    assert_eq!(feed.stamp, "stamp");
    assert_eq!(feed.snapshot.len(), 2);
    assert_eq!(feed.snapshot.rows()[0].fields(), &["101\tIntro".to_string(), "Dr. X".to_string()]);
}

#[test]
fn test_empty_payload() {
    let feed = parse_feed("", &Delimiters::tsv());
    assert_eq!(feed.stamp, "");
    assert!(feed.snapshot.is_empty());

    // the raw parser still yields one empty row for empty input
    let raw = parse("", &Delimiters::tsv());
    assert_eq!(raw.len(), 1);
    assert_eq!(raw.rows()[0].key(), "");
}

#[test]
fn test_blank_lines_diff_as_rows() {
    let previous = parse_feed("s\na\tb\n", &Delimiters::tsv()).snapshot;
    let current = parse_feed("s\na\tb\n\n", &Delimiters::tsv()).snapshot;
    // the extra blank row matches the existing blank row verbatim
    assert!(diff(&previous, &current).is_empty());
}

#[test]
fn test_empty_key_rows_pair_by_empty_key() {
    let previous = snap(&[&["", "x"]]);
    let current = snap(&[&["", "y"]]);
    let entries = diff(&previous, &current);
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].is_new());
}

#[test]
fn test_duplicate_current_rows_each_reported() {
    let previous = snap(&[&["1", "a"]]);
    let current = snap(&[&["1", "b"], &["1", "c"]]);
    let entries = diff(&previous, &current);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.previous.as_ref().and_then(|p| p.get(1)) == Some("a")));
}

#[test]
fn test_render_tolerates_single_field_rows() {
    let style = MessageStyle::with_layout(RowLayout::current());
    let previous = snap(&[&["1"]]);
    let current = snap(&[&["1", "now longer"]]);
    let entries = diff(&previous, &current);
    let embed = style.render(&entries, 2024);
    assert_eq!(embed.fields.len(), 1);
    assert_eq!(embed.fields[0].name, "?");
}

#[test]
fn test_unicode_fields_compare_exactly() {
    let previous = snap(&[&["K101", "日本語Ⅰ", "山田"]]);
    let current = snap(&[&["K101", "日本語I", "山田"]]);
    assert_eq!(diff(&previous, &current).len(), 1);
    assert!(diff(&previous, &previous).is_empty());
    assert!(diff(&Snapshot::default(), &previous)[0].is_new());
}
