use super::*;
use crate::entities::{COMPANY_FILTERS, JOB_FILTERS};
use serde_json::json;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

fn company(value: Value) -> SqlResult<Fragment> {
    compile_filter(&object(value), &COMPANY_FILTERS)
}

fn job(value: Value) -> SqlResult<Fragment> {
    compile_filter(&object(value), &JOB_FILTERS)
}

#[test]
fn name_is_substring_match() {
    let f = company(json!({"name": "test"})).unwrap();
    assert_eq!(f.text(), "WHERE name ILIKE $1");
    assert_eq!(f.params(), &[SqlValue::from("%test%")]);
}

#[test]
fn min_employees() {
    let f = company(json!({"minEmployees": 50})).unwrap();
    assert_eq!(f.text(), "WHERE num_employees >= $1");
    assert_eq!(f.params(), &[SqlValue::Int(50)]);
}

#[test]
fn clauses_joined_with_and() {
    let f = company(json!({"name": "test", "maxEmployees": 50})).unwrap();
    assert_eq!(f.text(), "WHERE name ILIKE $1 AND num_employees <= $2");
    assert_eq!(f.params(), &[SqlValue::from("%test%"), SqlValue::Int(50)]);
}

#[test]
fn all_company_filters() {
    let f = company(json!({"name": "c", "minEmployees": 1, "maxEmployees": 3})).unwrap();
    assert_eq!(
        f.text(),
        "WHERE name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3"
    );
    assert_eq!(
        f.params(),
        &[SqlValue::from("%c%"), SqlValue::Int(1), SqlValue::Int(3)]
    );
}

#[test]
fn empty_filter_gives_empty_fragment() {
    let f = company(json!({})).unwrap();
    assert!(f.is_empty());
    assert!(f.params().is_empty());
}

#[test]
fn clause_order_follows_declaration_not_input() {
    let a = company(json!({"maxEmployees": 50, "name": "test"})).unwrap();
    let b = company(json!({"name": "test", "maxEmployees": 50})).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.text(), "WHERE name ILIKE $1 AND num_employees <= $2");
}

#[test]
fn compiling_twice_is_identical() {
    let raw = object(json!({"title": "eng", "minSalary": 100, "hasEquity": true}));
    let a = compile_filter(&raw, &JOB_FILTERS).unwrap();
    let b = compile_filter(&raw, &JOB_FILTERS).unwrap();
    assert_eq!(a, b);
}

#[test]
fn min_greater_than_max_is_rejected() {
    let err = company(json!({"minEmployees": 100, "maxEmployees": 50})).unwrap_err();
    assert!(err.is_invalid_combination());
    assert!(err.is_client_error());
    assert_eq!(
        err.to_string(),
        "minEmployees cannot be greater than maxEmployees"
    );
}

#[test]
fn min_equal_to_max_is_allowed() {
    let f = company(json!({"minEmployees": 50, "maxEmployees": 50})).unwrap();
    assert_eq!(f.text(), "WHERE num_employees >= $1 AND num_employees <= $2");
}

#[test]
fn rule_skipped_when_one_side_absent_or_null() {
    let f = company(json!({"minEmployees": 100, "maxEmployees": null})).unwrap();
    assert_eq!(f.text(), "WHERE num_employees >= $1");
    assert_eq!(f.params(), &[SqlValue::Int(100)]);
}

#[test]
fn rules_run_before_unknown_key_check() {
    let err = company(json!({"foo": 1, "minEmployees": 9, "maxEmployees": 1})).unwrap_err();
    assert!(err.is_invalid_combination());
}

#[test]
fn unknown_key_is_rejected() {
    let err = company(json!({"name": "x", "handle": "c1"})).unwrap_err();
    assert!(err.is_unknown_key());
    assert_eq!(err.to_string(), "unknown company filter: 'handle'");

    let err = job(json!({"equity": 0.5})).unwrap_err();
    assert!(matches!(
        err,
        SqlError::UnknownFilterKey { entity: "job", ref key } if key == "equity"
    ));
}

#[test]
fn has_equity_true_binds_bound() {
    let f = job(json!({"hasEquity": true})).unwrap();
    assert_eq!(f.text(), "WHERE equity >= $1");
    assert_eq!(f.params(), &[SqlValue::Int(0)]);
}

#[test]
fn has_equity_false_emits_nothing() {
    let f = job(json!({"hasEquity": false})).unwrap();
    assert!(f.is_empty());
    assert!(f.params().is_empty());
}

#[test]
fn false_flag_leaves_no_gap_in_numbering() {
    let f = job(json!({"hasEquity": false, "minSalary": 5})).unwrap();
    assert_eq!(f.text(), "WHERE salary >= $1");
    assert_eq!(f.params(), &[SqlValue::Int(5)]);

    let f = job(json!({"title": "a", "hasEquity": false, "minSalary": 5})).unwrap();
    assert_eq!(f.text(), "WHERE title ILIKE $1 AND salary >= $2");
}

#[test]
fn all_job_filters() {
    let f = job(json!({"hasEquity": true, "minSalary": 1000, "title": "dev"})).unwrap();
    assert_eq!(
        f.text(),
        "WHERE title ILIKE $1 AND salary >= $2 AND equity >= $3"
    );
    assert_eq!(
        f.params(),
        &[SqlValue::from("%dev%"), SqlValue::Int(1000), SqlValue::Int(0)]
    );
}

#[test]
fn query_string_values_are_coerced() {
    let f = company(json!({"minEmployees": " 50 ", "maxEmployees": "60"})).unwrap();
    assert_eq!(f.params(), &[SqlValue::Int(50), SqlValue::Int(60)]);

    let f = job(json!({"hasEquity": "TRUE"})).unwrap();
    assert_eq!(f.text(), "WHERE equity >= $1");

    let f = job(json!({"hasEquity": "false"})).unwrap();
    assert!(f.is_empty());
}

#[test]
fn string_bounds_feed_the_rule() {
    let err = company(json!({"minEmployees": "100", "maxEmployees": "50"})).unwrap_err();
    assert!(err.is_invalid_combination());
}

#[test]
fn text_filter_stringifies_scalars() {
    let f = company(json!({"name": 3})).unwrap();
    assert_eq!(f.params(), &[SqlValue::from("%3%")]);
}

#[test]
fn invalid_values_are_rejected() {
    let err = company(json!({"minEmployees": "many"})).unwrap_err();
    assert!(matches!(
        err,
        SqlError::InvalidFilterValue { ref key, expected: "an integer" } if key == "minEmployees"
    ));

    assert!(company(json!({"minEmployees": 1.5})).is_err());
    assert!(company(json!({"name": ["a"]})).is_err());
    assert!(job(json!({"hasEquity": "yes"})).is_err());
    assert!(job(json!({"hasEquity": 1})).is_err());
}

#[test]
fn null_values_are_treated_as_absent() {
    let f = company(json!({"name": null, "minEmployees": 5})).unwrap();
    assert_eq!(f.text(), "WHERE num_employees >= $1");
    assert_eq!(f.params(), &[SqlValue::Int(5)]);
}

#[test]
fn wildcards_pass_through_by_default() {
    let f = company(json!({"name": "50%_off"})).unwrap();
    assert_eq!(f.params(), &[SqlValue::from("%50%_off%")]);
}

#[test]
fn wildcards_escaped_when_configured() {
    let config = CompileConfig::new().with_escape_like_wildcards(true);
    let raw = object(json!({"name": r"50%_off\"}));
    let f = compile_filter_with(&raw, &COMPANY_FILTERS, &config).unwrap();
    assert_eq!(f.params(), &[SqlValue::from(r"%50\%\_off\\%")]);
}

#[test]
fn values_never_reach_sql_text() {
    let f = company(json!({"name": "'; DROP TABLE companies; --"})).unwrap();
    assert_eq!(f.text(), "WHERE name ILIKE $1");
}

fn title_and_salary(raw: &Map<String, Value>) -> bool {
    raw.contains_key("title") && raw.contains_key("minSalary")
}

fn title_is_long(raw: &Map<String, Value>) -> bool {
    raw.get("title")
        .and_then(Value::as_str)
        .is_some_and(|t| t.len() >= 3)
}

static CUSTOM_KEYS: [FilterKey; 2] = [
    FilterKey::new("title", "title", FilterOp::Eq, FilterInput::Text),
    FilterKey::new("minSalary", "salary", FilterOp::Gte, FilterInput::Integer),
];

static CUSTOM_RULES: [CrossFieldRule; 1] = [CrossFieldRule::custom(
    title_and_salary,
    title_is_long,
    "title must be at least 3 characters when combined with minSalary",
)];

static CUSTOM_FILTERS: FilterSpec = FilterSpec::new("posting", &CUSTOM_KEYS, &CUSTOM_RULES);

#[test]
fn custom_rule_applies_only_when_predicate_holds() {
    CUSTOM_FILTERS.validate().unwrap();

    let f = compile_filter(&object(json!({"title": "ab"})), &CUSTOM_FILTERS).unwrap();
    assert_eq!(f.text(), "WHERE title = $1");
    assert_eq!(f.params(), &[SqlValue::from("ab")]);

    let err = compile_filter(&object(json!({"title": "ab", "minSalary": 1})), &CUSTOM_FILTERS)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "title must be at least 3 characters when combined with minSalary"
    );

    assert!(
        compile_filter(&object(json!({"title": "abc", "minSalary": 1})), &CUSTOM_FILTERS).is_ok()
    );
}

static BAD_KEYS: [FilterKey; 3] = [
    FilterKey::new("a", "col", FilterOp::Eq, FilterInput::Text),
    FilterKey::new("a", "col", FilterOp::Eq, FilterInput::Text),
    FilterKey::new("c", "col; DROP", FilterOp::Eq, FilterInput::Text),
];

static BAD_RULES: [CrossFieldRule; 1] = [CrossFieldRule::not_greater("a", "b", "a > b")];

#[test]
fn validate_catches_malformed_specs() {
    let duplicate = FilterSpec::new("bad", &BAD_KEYS[..2], &[]);
    assert!(duplicate.validate().unwrap_err().to_string().contains("declared twice"));

    let bad_column = FilterSpec::new("bad", &BAD_KEYS[2..], &[]);
    assert!(bad_column.validate().is_err());

    let dangling = FilterSpec::new("bad", &BAD_KEYS[..1], &BAD_RULES);
    let err = dangling.validate().unwrap_err();
    assert!(err.to_string().contains("undeclared filter 'b'"));
}

#[test]
fn escape_like_escapes_metacharacters() {
    assert_eq!(escape_like("plain"), "plain");
    assert_eq!(escape_like("a%b_c"), r"a\%b\_c");
    assert_eq!(escape_like(r"\"), r"\\");
}

#[test]
fn contains_only_wraps_text() {
    assert_eq!(contains(SqlValue::from("x")), SqlValue::from("%x%"));
    assert_eq!(contains(SqlValue::Int(1)), SqlValue::Int(1));
}
