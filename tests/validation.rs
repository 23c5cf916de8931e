use pretty_assertions::assert_eq;
use serde_json::json;
use sqlwarden::placeholder;
use sqlwarden::prelude::*;
use sqlwarden::scanner::SqlText;
use std::sync::{Arc, Mutex};

fn codes(report: &Report) -> Vec<FindingCode> {
    report.findings().iter().map(|f| f.code).collect()
}

fn verbose() -> Guard {
    Guard::new(GuardConfig::new(true, true))
}

#[test]
fn test_missing_parameter_report_json() {
    let query = Query::prepared(
        "INSERT INTO users (name, email, age) VALUES (?, ?, ?)",
        Params::positional(["John", "john@example.com"]),
    );
    let report = validate(&query, true, false);
    let message = "Missing parameters: the query has 3 placeholders but only 2 values bound (3 expected, 2 given)";

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "status": "error",
            "errors": [message],
            "warnings": [],
            "infos": [],
            "errorCount": 1,
            "warningCount": 0,
            "findings": [
                {"severity": "error", "code": "PARAM_COUNT_MISMATCH", "message": message}
            ]
        })
    );
}

#[test]
fn test_disabled_is_bypassed_for_any_input() {
    for sql in ["DELETE FROM users", "", "SELECT ? , :x", "not even sql '"] {
        let report = validate(&Query::raw(sql), false, true);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "bypassed");
        assert_eq!(json["errors"], json!([]));
        assert_eq!(json["warnings"], json!([]));
        assert!(json.get("suggestion").is_none());
    }
}

#[test]
fn test_placeholders_inside_strings_and_comments_are_ignored() {
    let sql = "SELECT name FROM t WHERE a = '?' AND b = ':x' -- ? :y\n/* ? */";
    let text = SqlText::new(sql, Dialect::Standard);
    assert!(placeholder::extract(&text).is_empty());

    let report = validate(&Query::raw(sql), true, false);
    assert_eq!(codes(&report), vec![FindingCode::NotPrepared]);
}

#[test]
fn test_matching_positional_succeeds() {
    let query = Query::prepared(
        "SELECT id, name FROM users WHERE id = ? AND status = ?",
        Params::positional([BoundValue::from(1), "active".into()]),
    );
    let report = validate(&query, true, false);
    assert_eq!(report.status, Status::Success);
    assert!(report.findings().is_empty());
    assert!(is_valid(&query));
}

#[test]
fn test_mixed_placeholders_single_error() {
    let query = Query::prepared(
        "SELECT * FROM users WHERE id = ? AND email = :email",
        Params::positional([BoundValue::from(123), "a@b.c".into()]),
    );
    let report = validate(&query, true, false);
    assert_eq!(report.status, Status::Error);
    assert_eq!(report.error_count(), 1);
    assert_eq!(
        codes(&report),
        vec![FindingCode::MixedPlaceholders, FindingCode::SelectStar]
    );
}

#[test]
fn test_missing_where_fix_is_clean() {
    let report = verbose().validate(&Query::prepared("DELETE FROM users", Params::new()));
    assert_eq!(report.status, Status::Success);
    assert_eq!(codes(&report), vec![FindingCode::MissingWhere]);

    let suggestion = report.suggestion.expect("suggestion for MISSING_WHERE");
    assert_eq!(suggestion.secure_sql, "DELETE FROM users WHERE id = ?");

    let fixed = verbose().validate(&Query::prepared(suggestion.secure_sql, Params::positional([7])));
    assert!(fixed.findings().is_empty());
    assert!(fixed.suggestion.is_none());
}

#[test]
fn test_where_in_subquery_does_not_count() {
    let report = validate(
        &Query::prepared(
            "UPDATE accounts SET flagged = (SELECT 1 FROM bans WHERE bans.id = accounts.id)",
            Params::new(),
        ),
        true,
        false,
    );
    assert_eq!(codes(&report), vec![FindingCode::MissingWhere]);
}

#[test]
fn test_injection_warning_and_escalation() {
    let query = Query::prepared(
        "SELECT id FROM users WHERE username = ?",
        Params::positional(["admin' OR '1'='1"]),
    );
    let report = validate(&query, true, false);
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.warning_count(), 1);
    assert_eq!(
        report.warnings(),
        vec!["Parameter #1 looks like SQL injection (tautology): \"admin' OR '1'='1\""]
    );

    let config = GuardConfig::from_toml_str("[policy]\nescalate = [\"INJECTION_SUSPECTED\"]").unwrap();
    let escalated = Guard::new(config).validate(&query);
    assert_eq!(escalated.status, Status::Error);
    assert_eq!(escalated.error_count(), 0);
    assert_eq!(escalated.warning_count(), 1);
}

#[test]
fn test_named_parameters_from_json() {
    let params = Params::from_json(&json!({":status": "completed", "id": 42})).unwrap();
    let query = Query::prepared("UPDATE orders SET status = :status WHERE id = :id", params);
    let report = validate(&query, true, false);
    assert_eq!(report.status, Status::Success);
    assert!(report.findings().is_empty());
}

#[test]
fn test_named_mismatch_lists_names() {
    let query = Query::prepared(
        "UPDATE orders SET status = :status WHERE id = :id",
        Params::named([("status", BoundValue::from("done")), ("order_id", 4.into())]),
    );
    let report = validate(&query, true, false);
    assert_eq!(
        report.errors(),
        vec![
            "Missing named parameters: :id",
            "Unexpected named parameters: :order_id",
        ]
    );
}

#[test]
fn test_hardcoded_value_is_informational() {
    let query = Query::prepared(
        "INSERT INTO logs (message, level) VALUES (?, 'ERROR')",
        Params::positional(["Database connection failed"]),
    );
    let report = verbose().validate(&query);
    assert_eq!(report.status, Status::Success);
    assert_eq!(codes(&report), vec![FindingCode::HardcodedValue]);

    let suggestion = report.suggestion.expect("info fallback suggestion");
    assert_eq!(suggestion.secure_sql, "INSERT INTO logs (message, level) VALUES (?, ?)");
}

#[test]
fn test_field_count_mismatch() {
    let query = Query::prepared(
        "INSERT INTO orders (user_id, product_id, quantity) VALUES (?, ?)",
        Params::positional([123, 456]),
    );
    let report = validate(&query, true, false);
    assert_eq!(codes(&report), vec![FindingCode::FieldCountMismatch]);
    assert_eq!(report.status, Status::Error);
}

#[test]
fn test_verbose_suggestion_json_keys() {
    let report = verbose().validate(&Query::raw("SELECT * FROM users WHERE id = 123"));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["suggestion"]["query"], "SELECT * FROM users WHERE id = ?");
    assert!(json["suggestion"]["code"].as_str().unwrap().contains(".bind(123)"));
    assert!(json["suggestion"]["explanation"].is_string());
}

#[test]
fn test_context_passthrough_and_notification() {
    let received = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&received);
    let guard = Guard::default().with_notifier(
        move |_: usize, summary: &str, _: &Report| -> Result<(), NotifyError> {
            sink.lock().unwrap().push_str(summary);
            Ok(())
        },
    );

    let context = json!({"script": "checkout.php", "line": 42});
    let report = guard.validate_with_context(&Query::raw("DELETE FROM carts WHERE id = 5"), Some(context.clone()));

    assert_eq!(report.context, Some(context));
    let summary = received.lock().unwrap();
    assert!(summary.contains("[NOT_PREPARED]"));
    assert!(summary.contains("checkout.php"));
}

#[test]
fn test_mysql_hash_comment() {
    let sql = "DELETE FROM t # WHERE id = 1";
    let mysql = GuardConfig {
        dialect: Dialect::MySql,
        ..GuardConfig::default()
    };
    let report = Guard::new(mysql).validate(&Query::prepared(sql, Params::new()));
    assert_eq!(codes(&report), vec![FindingCode::MissingWhere]);

    let standard = Guard::default().validate(&Query::prepared(sql, Params::new()));
    assert!(standard.findings().is_empty());
}

#[test]
fn test_json_params_keep_caller_order() {
    let params = Params::from_json(&json!({"zeta": "x'; DROP TABLE t", "alpha": "1 UNION SELECT 1"})).unwrap();
    let query = Query::prepared("SELECT id FROM t WHERE a = :zeta AND b = :alpha", params);
    let report = validate(&query, true, false);
    assert_eq!(
        report.warnings(),
        vec![
            "Parameter :zeta looks like SQL injection (stacked statement): \"x'; DROP TABLE t\"",
            "Parameter :alpha looks like SQL injection (UNION SELECT): \"1 UNION SELECT 1\"",
        ]
    );

    let params = Params::from_json(&json!({"zz": 1, "a": 2, "aa": 3})).unwrap();
    let report = validate(&Query::prepared("SELECT id FROM t WHERE a = :a", params), true, false);
    assert_eq!(report.errors(), vec!["Unexpected named parameters: :zz, :aa"]);
}

#[test]
fn test_positional_placeholders_reject_named_map() {
    let params = Params::from_json(&json!({"id": 1})).unwrap();
    let report = validate(&Query::prepared("SELECT name FROM t WHERE id = ?", params), true, false);
    assert_eq!(report.status, Status::Error);
    assert_eq!(codes(&report), vec![FindingCode::ParamNameMismatch]);
}
