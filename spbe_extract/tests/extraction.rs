use serde_json::{json, Value};
use spbe_extract::{balanced_span, locate_payload, normalize, Strategy};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[test]
fn listing_page_yields_all_records() {
    let html = load_fixture("listing_page.html");
    let result = locate_payload(&html).unwrap();

    assert_eq!(result.strategy, Strategy::PageData);
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.records[0]["sisinCode"], "RU000A0JX0J2");
    assert_eq!(result.records[1]["srtsCode"], "PK0002");
    assert_eq!(result.records[2]["fullName"], "CK Hutchison Holdings Limited");
}

#[test]
fn listing_page_recovers_issuer_name_with_embedded_quotes() {
    let html = load_fixture("listing_page.html");
    let result = locate_payload(&html).unwrap();
    assert_eq!(result.records[0]["fullName"], "ООО \"Рога и Копыта\"");
}

#[test]
fn listing_page_carries_pagination_envelope() {
    let html = load_fixture("listing_page.html");
    let info = locate_payload(&html).unwrap().pagination.unwrap();
    assert_eq!(info.current_page, 1);
    assert_eq!(info.total_pages, 3);
    assert_eq!(info.total_elements, 250);
}

/// Embeds a payload behind K layers of string-escaping and checks the engine
/// recovers a structurally equal value, for K in {0, 1, 2}.
#[test]
fn recovers_value_through_k_escape_layers() {
    let original = json!({
        "content": [
            {"sisinCode": "RU000A0JX0J2", "fullName": "ООО \"Тест\"", "sfaceValue": "1000"},
            {"sisinCode": "RU000A0JX0K0", "fullName": "АО Пример", "sfaceValue": null}
        ],
        "totalPages": 1,
        "totalElements": 2
    });

    let mut embedded = original.to_string();
    for layers in 0..3 {
        let page = format!("<script>var x = {};</script>", embedded);
        let result = locate_payload(&page)
            .unwrap_or_else(|e| panic!("extraction failed at {} layers: {}", layers, e));
        assert_eq!(result.records.len(), 2, "at {} layers", layers);
        assert_eq!(
            Value::Object(result.records[0].clone()),
            original["content"][0],
            "at {} layers",
            layers
        );

        // add one more escaping layer for the next round: the payload becomes
        // the contents of a script string literal
        embedded = serde_json::to_string(&Value::String(embedded)).unwrap();
        embedded = embedded[1..embedded.len() - 1].to_string();
    }
}

#[test]
fn bracket_matching_survives_literal_brace_and_escaped_quote_in_string() {
    let text = r#"{"a":"}\""}"#;
    assert_eq!(balanced_span(text, 0).unwrap(), text);
}

#[test]
fn normalize_is_idempotent_on_fixture() {
    let html = load_fixture("listing_page.html");
    let once = normalize(&html).unwrap();
    let twice = normalize(&once).unwrap();
    assert_eq!(once, twice);
}
