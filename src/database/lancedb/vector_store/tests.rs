use super::*;
use arrow::array::{Float32Array, StringArray, UInt32Array};

fn sample_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("source_id", DataType::Utf8, false),
        Field::new("document_type", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, true),
        Field::new("business_type", DataType::Utf8, true),
        Field::new("content", DataType::Utf8, false),
        Field::new("variables", DataType::Utf8, false),
        Field::new("button", DataType::Utf8, true),
        Field::new("char_count", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("_distance", DataType::Float32, false),
    ]));

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(vec!["chunk-1", "chunk-2"])),
        Arc::new(StringArray::from(vec!["tpl-1", "tpl-2"])),
        Arc::new(StringArray::from(vec![
            "approved_template",
            "category_pattern",
        ])),
        Arc::new(StringArray::from(vec![Some("주문/배송"), None])),
        Arc::new(StringArray::from(vec![Some("전자상거래"), None])),
        Arc::new(StringArray::from(vec!["본문 1", "본문 2"])),
        Arc::new(StringArray::from(vec![
            join_variables(&["고객명".to_string(), "주문번호".to_string()]),
            String::new(),
        ])),
        Arc::new(StringArray::from(vec![Some("주문 확인"), None])),
        Arc::new(UInt32Array::from(vec![120_u32, 80])),
        Arc::new(StringArray::from(vec![
            "2026-08-01T00:00:00Z",
            "2026-08-02T00:00:00Z",
        ])),
        Arc::new(Float32Array::from(vec![0.25_f32, 0.6])),
    ];

    RecordBatch::try_new(schema, arrays).expect("Failed to build test batch")
}

#[test]
fn parse_batch_converts_distance_to_similarity() {
    let results = parse_search_batch(&sample_batch()).expect("Failed to parse batch");

    assert_eq!(results.len(), 2);
    assert!((results[0].similarity_score - 0.75).abs() < f32::EPSILON);
    assert!((results[1].similarity_score - 0.4).abs() < f32::EPSILON);
    assert!(results[0].similarity_score > results[1].similarity_score);
}

#[test]
fn parse_batch_preserves_metadata() {
    let results = parse_search_batch(&sample_batch()).expect("Failed to parse batch");

    let first = &results[0].metadata;
    assert_eq!(first.chunk_id, "chunk-1");
    assert_eq!(first.document_type, "approved_template");
    assert_eq!(first.category.as_deref(), Some("주문/배송"));
    assert_eq!(first.variables, vec!["고객명", "주문번호"]);
    assert_eq!(first.button.as_deref(), Some("주문 확인"));
    assert_eq!(first.char_count, 120);

    let second = &results[1].metadata;
    assert!(second.category.is_none());
    assert!(second.business_type.is_none());
    assert!(second.variables.is_empty());
    assert!(second.button.is_none());
}

#[test]
fn variable_join_round_trip() {
    let variables = vec!["고객명".to_string(), "수령인".to_string()];
    assert_eq!(split_variables(&join_variables(&variables)), variables);
    assert!(split_variables("").is_empty());
}
