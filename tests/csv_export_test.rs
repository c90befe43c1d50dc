//! Exported CSV must read back unchanged with a standard CSV parser

use proptest::prelude::*;
use campus_events::services::exports::CsvDocument;
use campus_events::utils::helpers::csv_line;

fn read_back(text: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn document() -> impl Strategy<Value = CsvDocument> {
    (2usize..6).prop_flat_map(|columns| {
        let cell = "[a-zA-Z0-9 ,\"\n.@-]{0,16}";
        (
            prop::collection::vec(cell, columns),
            prop::collection::vec(prop::collection::vec(cell, columns), 0..8),
        )
            .prop_map(|(headers, rows)| CsvDocument { headers, rows })
    })
}

proptest! {
    #[test]
    fn rendered_document_parses_back(doc in document()) {
        let parsed = read_back(&doc.render());

        prop_assert_eq!(&parsed[0], &doc.headers);
        prop_assert_eq!(&parsed[1..], &doc.rows[..]);
    }
}

#[test]
fn test_answers_with_punctuation_survive() {
    let line = csv_line(["Vegetarian, no nuts", "He said \"hi\"", "line one\nline two"]);
    assert_eq!(
        read_back(&line),
        vec![vec![
            "Vegetarian, no nuts".to_string(),
            "He said \"hi\"".to_string(),
            "line one\nline two".to_string(),
        ]]
    );
}
