use nodestore_core::{NodeFields, NodeKind, NodeRecord, NodeValidationError, DEFAULT_NUMBER};
use uuid::Uuid;

#[test]
fn new_stamps_category_and_applies_defaults() {
    let record = NodeRecord::new(NodeKind::Analysis, NodeFields::default());

    assert!(!record.id.is_nil());
    assert_eq!(record.category, NodeKind::Analysis);
    assert_eq!(record.name, "");
    assert_eq!(record.number, DEFAULT_NUMBER);
}

#[test]
fn new_applies_caller_overrides() {
    let record = NodeRecord::new(
        NodeKind::Data,
        NodeFields::named("My Raw Data").with_number(31),
    );

    assert_eq!(record.category, NodeKind::Data);
    assert_eq!(record.name, "My Raw Data");
    assert_eq!(record.number, 31);
}

#[test]
fn new_generates_distinct_ids() {
    let first = NodeRecord::new(NodeKind::Project, NodeFields::default());
    let second = NodeRecord::new(NodeKind::Project, NodeFields::default());
    assert_ne!(first.id, second.id);
}

#[test]
fn with_id_rejects_nil_id() {
    let err = NodeRecord::with_id(Uuid::nil(), NodeKind::Folder, NodeFields::default())
        .unwrap_err();
    assert_eq!(err, NodeValidationError::NilId);
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let record = NodeRecord::with_id(id, NodeKind::Dashboard, NodeFields::named("Dashboard"))
        .unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["category"], "dashboard");
    assert_eq!(json["name"], "Dashboard");
    assert_eq!(json["number"], 1);

    let decoded: NodeRecord = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn deserialize_fills_defaults_and_rejects_bad_records() {
    let decoded: NodeRecord = serde_json::from_value(serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "category": "project"
    }))
    .unwrap();
    assert_eq!(decoded.name, "");
    assert_eq!(decoded.number, 1);

    let nil = serde_json::from_value::<NodeRecord>(serde_json::json!({
        "id": "00000000-0000-0000-0000-000000000000",
        "category": "project"
    }))
    .unwrap_err();
    assert!(nil.to_string().contains("nil"), "unexpected error: {nil}");

    assert!(serde_json::from_value::<NodeRecord>(serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "category": "widget"
    }))
    .is_err());
}
