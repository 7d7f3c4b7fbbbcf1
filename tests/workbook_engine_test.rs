// ==========================================
// WorkbookEngine 集成测试（分隔文本数据源）
// ==========================================
// 测试目标: 验证 请求 → 校验 → 映射 → 过滤 → 查找 → 分组 → 序列化 的完整流程
// ==========================================

use config_workbook::config::{FilterSpec, LookupSpec, WorkbookRequest};
use config_workbook::logging;
use config_workbook::workbook::{render, FieldValue, OutputFormat, WorkbookEngine, WorkbookError};

const INVENTORY: &str = "\
configuration_item,attr1,attr2,t_owner,env
vm,web01,4,ops,prod
vm,web02,8,dev-team,dev
disk,d1,64,ops,prod
";

const SCHEMA: &str = "
config_schema:
  vm:
    attr1: hostname
    attr2: { name: cpu, type: number }
  disk:
    attr1: label
    attr2: { name: size_gb, type: numeric }
";

fn inventory_request() -> WorkbookRequest {
    WorkbookRequest {
        csv: Some(INVENTORY.to_string()),
        schema: Some(SCHEMA.to_string()),
        ..WorkbookRequest::default()
    }
}

#[test]
fn test_schema_mapping_end_to_end() {
    logging::init_test();

    let json = WorkbookEngine::new()
        .transform_to_string(&inventory_request(), OutputFormat::Json)
        .unwrap();

    assert_eq!(
        json,
        concat!(
            r#"{"vm":["#,
            r#"{"hostname":"web01","cpu":4.0,"env":"prod","tags":{"Owner":"ops"}},"#,
            r#"{"hostname":"web02","cpu":8.0,"env":"dev","tags":{"Owner":"dev-team"}}"#,
            r#"],"disk":["#,
            r#"{"label":"d1","size_gb":64.0,"env":"prod","tags":{"Owner":"ops"}}"#,
            r#"]}"#
        )
    );
}

#[test]
fn test_schema_as_json_text() {
    let mut request = inventory_request();
    request.schema = Some(r#"{"config_schema":{"vm":{"attr1":"hostname"}}}"#.to_string());

    let document = WorkbookEngine::new().transform(&request).unwrap();
    let vm = document.group("vm").unwrap();
    assert_eq!(vm[0].get("hostname"), Some(&FieldValue::String("web01".into())));
    // 映射中没有的列原样保留
    assert_eq!(vm[0].get("attr2"), Some(&FieldValue::String("4".into())));

    let disk = document.group("disk").unwrap();
    assert_eq!(disk[0].get("attr1"), Some(&FieldValue::String("d1".into())));
}

#[test]
fn test_default_mapping_is_identity() {
    let request = WorkbookRequest {
        csv: Some("configuration_item,attr1,name\nvm,x,web01\nvm,y,web02\n".to_string()),
        ..WorkbookRequest::default()
    };

    let document = WorkbookEngine::new().transform(&request).unwrap();
    let vm = document.group("vm").unwrap();
    assert_eq!(vm.len(), 2);
    assert_eq!(vm[1].get("attr1"), Some(&FieldValue::String("y".into())));
    assert_eq!(vm[1].get("name"), Some(&FieldValue::String("web02".into())));
    assert!(vm[1].get("configuration_item").is_none());
}

#[test]
fn test_filter_matches_target_name() {
    let mut request = inventory_request();
    request.filters = vec![FilterSpec {
        name: "owner".to_string(),
        values: vec!["dev-team".to_string()],
    }];

    let document = WorkbookEngine::new().transform(&request).unwrap();
    assert_eq!(document.group_names().collect::<Vec<_>>(), vec!["vm"]);
    assert_eq!(document.record_count(), 1);
}

#[test]
fn test_filter_without_match_yields_empty_document() {
    let mut request = inventory_request();
    request.filters = vec![FilterSpec {
        name: "env".to_string(),
        values: vec!["staging".to_string()],
    }];

    let document = WorkbookEngine::new().transform(&request).unwrap();
    assert!(document.is_empty());
    assert_eq!(render(&document, OutputFormat::Json).unwrap(), "{}");
}

#[test]
fn test_inline_lookups() {
    let request = WorkbookRequest {
        csv: Some("name,owner_id,s_region\nweb01,\"101,102\",east\n".to_string()),
        default_category: Some("hosts".to_string()),
        lookups: vec![
            LookupSpec {
                column: "owner_id".to_string(),
                yaml: Some("101: Team-A\n102: Team-B\n".to_string()),
                ..LookupSpec::default()
            },
            LookupSpec {
                column: "region".to_string(),
                ini: Some("[regions]\neast = us-east-1\n".to_string()),
                section: Some("regions".to_string()),
                ..LookupSpec::default()
            },
        ],
        ..WorkbookRequest::default()
    };

    let document = WorkbookEngine::new().transform(&request).unwrap();
    let hosts = document.group("hosts").unwrap();
    assert_eq!(hosts[0].get("owner_id"), Some(&FieldValue::String("Team-A,Team-B".into())));
    assert_eq!(hosts[0].get("region"), Some(&FieldValue::String("us-east-1".into())));
}

#[test]
fn test_lookup_validation_fails_before_parsing() {
    let request = WorkbookRequest {
        // 列数不一致的 CSV，若先解析会得到 CSV 错误
        csv: Some("a,b\n1\n".to_string()),
        lookups: vec![LookupSpec {
            column: "a".to_string(),
            json: Some("{}".to_string()),
            yaml: Some("{}".to_string()),
            ..LookupSpec::default()
        }],
        ..WorkbookRequest::default()
    };

    let err = WorkbookEngine::new().transform(&request).unwrap_err();
    assert!(matches!(err, WorkbookError::MultipleLookupSources { .. }));
}

#[test]
fn test_malformed_csv_is_an_error() {
    let request = WorkbookRequest {
        csv: Some("a,b\n1\n".to_string()),
        ..WorkbookRequest::default()
    };
    let err = WorkbookEngine::new().transform(&request).unwrap_err();
    assert!(matches!(err, WorkbookError::CsvParseError(_)));
}

#[test]
fn test_unterminated_quote_is_an_error() {
    let request = WorkbookRequest {
        csv: Some("name,env\nweb01,\"prod\nweb02,dev\n".to_string()),
        ..WorkbookRequest::default()
    };
    let err = WorkbookEngine::new().transform(&request).unwrap_err();
    assert!(matches!(err, WorkbookError::CsvParseError(_)));
}

#[test]
fn test_convention_column_named_like_category_keeps_record() {
    let request = WorkbookRequest {
        csv: Some("configuration_item,n_configuration_item,name\nvm,3,web01\n".to_string()),
        ..WorkbookRequest::default()
    };

    let json = WorkbookEngine::new()
        .transform_to_string(&request, OutputFormat::Json)
        .unwrap();
    assert_eq!(json, r#"{"vm":[{"name":"web01","tags":{}}]}"#);
}

#[test]
fn test_malformed_schema_is_an_error() {
    let mut request = inventory_request();
    request.schema = Some("config_schema: [unclosed".to_string());

    let err = WorkbookEngine::new().transform(&request).unwrap_err();
    assert!(matches!(err, WorkbookError::DocumentParseError(_)));
}

#[test]
fn test_output_is_deterministic() {
    let engine = WorkbookEngine::new();
    let first = engine
        .transform_to_string(&inventory_request(), OutputFormat::Yaml)
        .unwrap();
    for _ in 0..5 {
        let again = engine
            .transform_to_string(&inventory_request(), OutputFormat::Yaml)
            .unwrap();
        assert_eq!(first, again);
    }
    assert!(first.starts_with("vm:\n"));
}

#[test]
fn test_custom_category_column() {
    let request = WorkbookRequest {
        csv: Some("kind,name\nrouter,r1\nswitch,s1\n".to_string()),
        category_column: Some("kind".to_string()),
        ..WorkbookRequest::default()
    };

    let document = WorkbookEngine::new().transform(&request).unwrap();
    assert_eq!(document.group_names().collect::<Vec<_>>(), vec!["router", "switch"]);
    assert!(document.group("router").unwrap()[0].get("kind").is_none());
}
