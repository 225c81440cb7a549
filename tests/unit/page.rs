//! Unit tests for response page normalization

use serde_json::json;

use mindat_downloader::client::Page;

#[test]
fn bare_array_is_a_complete_page() {
    let body = json!([
        { "id": 1, "name": "Abbas Abad Mine" },
        { "id": 2, "name": "Anarak District" }
    ]);

    let page = Page::from_body(body);

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0]["name"], "Abbas Abad Mine");
    assert_eq!(page.count, None);
    assert_eq!(page.next, None);
}

#[test]
fn envelope_carries_count_and_next() {
    let body = json!({
        "count": 42,
        "next": "https://api.example.org/localities/?page=2",
        "results": [{ "id": 1 }]
    });

    let page = Page::from_body(body);

    assert_eq!(page.records.len(), 1);
    assert_eq!(page.count, Some(42));
    assert_eq!(
        page.next.as_deref(),
        Some("https://api.example.org/localities/?page=2")
    );
}

#[test]
fn null_next_ends_pagination() {
    let body = json!({ "count": 1, "next": null, "results": [{ "id": 1 }] });

    let page = Page::from_body(body);

    assert_eq!(page.next, None);
    assert!(!page.is_empty());
}

#[test]
fn empty_string_next_ends_pagination() {
    let body = json!({ "count": 1, "next": "", "results": [{ "id": 1 }] });

    assert_eq!(Page::from_body(body).next, None);
}

#[test]
fn object_without_results_is_an_empty_final_page() {
    let page = Page::from_body(json!({ "detail": "throttled" }));

    assert!(page.is_empty());
    assert_eq!(page.next, None);
}

#[test]
fn non_array_results_is_an_empty_final_page() {
    let page = Page::from_body(json!({ "results": "oops" }));

    assert!(page.is_empty());
}

#[test]
fn scalar_body_is_an_empty_final_page() {
    assert!(Page::from_body(json!(17)).is_empty());
    assert!(Page::from_body(json!("maintenance")).is_empty());
    assert!(Page::from_body(json!(null)).is_empty());
}

#[test]
fn non_object_entries_are_dropped() {
    let body = json!([{ "id": 1 }, "stray string", 99, { "id": 2 }]);

    let page = Page::from_body(body);

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[1]["id"], 2);
}
