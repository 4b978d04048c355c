use serde_json::json;

use mcp_servicenow::manifest::{CreatedRecord, Link, Manifest};
use mcp_servicenow::model::{tables, variable_type_code, RecordProducerArgs, VariableSetArgs};

#[test]
fn test_record_producer_manifest_shape() {
    let args: RecordProducerArgs = serde_json::from_value(json!({
        "name": "Laptop",
        "table_name": "sc_request",
        "category_sys_id": "cat1",
        "variables": [
            { "name": "os", "type": "choice", "choices": ["Linux", "macOS"] },
            { "name": "notes" }
        ]
    }))
    .unwrap();
    let manifest = args.manifest();
    let steps = manifest.steps();

    assert_eq!(manifest.len(), 5);
    assert_eq!(steps[0].table, tables::RECORD_PRODUCER);
    assert_eq!(steps[0].link, None);
    assert_eq!(steps[0].fields["category"], "cat1");

    assert_eq!(steps[1].table, tables::VARIABLE);
    assert_eq!(steps[1].link, Some(Link { field: "cat_item", step: 0 }));
    assert_eq!(steps[2].link, Some(Link { field: "question", step: 1 }));
    assert_eq!(steps[3].fields["order"], 200);
    assert_eq!(steps[4].label, "variable `notes`");
    assert_eq!(steps[4].link, Some(Link { field: "cat_item", step: 0 }));
}

#[test]
fn test_variable_set_manifest_without_variables() {
    let args: VariableSetArgs = serde_json::from_value(json!({ "name": "Empty" })).unwrap();
    let manifest = args.manifest();

    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.steps()[0].table, tables::VARIABLE_SET);
}

#[test]
#[should_panic(expected = "manifest link must point backwards")]
fn test_links_must_point_backwards() {
    let mut manifest = Manifest::new();
    manifest.push_linked("orphan", tables::VARIABLE, Default::default(), "cat_item", 0);
}

#[test]
fn test_variable_type_codes() {
    assert_eq!(variable_type_code(Some("Yes/No")), 6);
    assert_eq!(variable_type_code(Some("yes-no")), 1);
    assert_eq!(variable_type_code(Some("Multi Line Text")), 2);
    assert_eq!(variable_type_code(Some("select_box")), 5);
    assert_eq!(variable_type_code(Some("checkbox")), 7);
    assert_eq!(variable_type_code(Some("date_time")), 10);
    assert_eq!(variable_type_code(Some("string")), 6);
    assert_eq!(variable_type_code(None), 6);
}

#[test]
fn test_created_record_display() {
    let record = json!({ "sys_id": "abc", "name": "os" });
    let created = CreatedRecord::new("variable `os`", tables::VARIABLE, record.as_object().unwrap().clone());

    assert_eq!(created.sys_id.as_deref(), Some("abc"));
    assert_eq!(created.display.as_deref(), Some("os"));
    assert_eq!(
        serde_json::to_value(&created).unwrap(),
        json!({ "label": "variable `os`", "table": "item_option_new", "sys_id": "abc", "display": "os" })
    );
}
