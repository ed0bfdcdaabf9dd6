//! 정책 조건식 (AST)
//!
//! 정책 행에 JSON으로 직렬화되어 저장되는 조건식을 강타입 트리로 파싱하고,
//! 주체/리소스 속성에 대해 평가합니다.
//!
//! # 형식
//!
//! ```json
//! { "op": "eq",
//!   "left":  { "type": "user_attr", "key": "id" },
//!   "right": { "type": "resource_attr", "key": "ownerId" } }
//! ```
//!
//! - 속성 참조 축약형: `{ "user_attr": "id" }`, `{ "resource_attr": "id" }`
//! - 리터럴: `{ "type": "literal", "value": ... }` 또는 스칼라/배열 그대로
//! - 논리 결합: `{ "op": "and", "args": [...] }`, `{ "op": "or", "args": [...] }`,
//!   `{ "op": "not", "arg": {...} }`
//!
//! 트리는 로드 후 변경되지 않습니다. 한 번 파싱하고 여러 번 평가합니다.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};

use super::context::{AttributeBag, Subject};
use crate::error::{Error, Result};

/// 비교 연산자
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Neq,
    In,
    Gt,
    Gte,
    Lt,
    Lte,

    /// 알 수 없는 연산자
    ///
    /// 파싱은 통과시키고, 평가 시점에 설정 오류로 보고합니다.
    Unknown(String),
}

impl ComparisonOp {
    /// 문자열에서 파싱
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "eq" => ComparisonOp::Eq,
            "neq" => ComparisonOp::Neq,
            "in" => ComparisonOp::In,
            "gt" => ComparisonOp::Gt,
            "gte" => ComparisonOp::Gte,
            "lt" => ComparisonOp::Lt,
            "lte" => ComparisonOp::Lte,
            other => ComparisonOp::Unknown(other.to_string()),
        }
    }

    /// 문자열로 변환
    pub fn as_str(&self) -> &str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Neq => "neq",
            ComparisonOp::In => "in",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Gte => "gte",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Lte => "lte",
            ComparisonOp::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 속성 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSource {
    /// 주체(사용자) 속성
    User,
    /// 리소스 속성
    Resource,
}

impl AttributeSource {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "user_attr" => Some(AttributeSource::User),
            "resource_attr" => Some(AttributeSource::Resource),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeSource::User => "user_attr",
            AttributeSource::Resource => "resource_attr",
        }
    }
}

/// 속성 참조
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRef {
    pub source: AttributeSource,
    pub key: String,
}

impl AttributeRef {
    pub fn user(key: impl Into<String>) -> Self {
        Self {
            source: AttributeSource::User,
            key: key.into(),
        }
    }

    pub fn resource(key: impl Into<String>) -> Self {
        Self {
            source: AttributeSource::Resource,
            key: key.into(),
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            malformed(format!(
                "attribute reference must be an object, got {}",
                value
            ))
        })?;

        // 정식 형식: { type, key }
        if let Some(tag) = obj.get("type") {
            let tag = tag
                .as_str()
                .ok_or_else(|| malformed("attribute reference type must be a string"))?;
            let source = AttributeSource::from_tag(tag)
                .ok_or_else(|| malformed(format!("unknown attribute reference type '{}'", tag)))?;
            let key = obj
                .get("key")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("attribute reference requires a string 'key'"))?;
            return Self::checked(source, key);
        }

        // 축약형: { user_attr: key } / { resource_attr: key }
        if obj.len() == 1 {
            if let Some((tag, key)) = obj.iter().next() {
                if let (Some(source), Some(key)) = (AttributeSource::from_tag(tag), key.as_str()) {
                    return Self::checked(source, key);
                }
            }
        }

        Err(malformed(format!("malformed attribute reference {}", value)))
    }

    fn checked(source: AttributeSource, key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(malformed("attribute reference key must not be empty"));
        }
        Ok(Self {
            source,
            key: key.to_string(),
        })
    }

    fn to_value(&self) -> Value {
        json!({ "type": self.source.as_str(), "key": self.key })
    }

    /// 속성 값 조회. 없으면 `None`(undefined)
    fn resolve<'a>(
        &self,
        subject: &'a Subject,
        resource: Option<&'a AttributeBag>,
    ) -> Option<Cow<'a, Value>> {
        match self.source {
            AttributeSource::User => subject.attribute(&self.key).map(Cow::Owned),
            AttributeSource::Resource => resource
                .and_then(|bag| bag.lookup(&self.key))
                .map(Cow::Borrowed),
        }
    }
}

/// 비교 우변
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Attribute(AttributeRef),
    Literal(Value),
}

impl Operand {
    fn from_value(value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Ok(Operand::Literal(value.clone()));
        };

        if obj.get("type").and_then(Value::as_str) == Some("literal") {
            let literal = obj
                .get("value")
                .ok_or_else(|| malformed("literal operand requires 'value'"))?;
            return Ok(Operand::Literal(literal.clone()));
        }

        AttributeRef::from_value(value).map(Operand::Attribute)
    }

    fn to_value(&self) -> Value {
        match self {
            Operand::Attribute(attr) => attr.to_value(),
            Operand::Literal(value) => json!({ "type": "literal", "value": value }),
        }
    }

    fn resolve<'a>(
        &'a self,
        subject: &'a Subject,
        resource: Option<&'a AttributeBag>,
    ) -> Option<Cow<'a, Value>> {
        match self {
            Operand::Attribute(attr) => attr.resolve(subject, resource),
            Operand::Literal(value) => Some(Cow::Borrowed(value)),
        }
    }
}

/// 조건식
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// 이항 비교
    Compare {
        op: ComparisonOp,
        left: AttributeRef,
        right: Operand,
    },

    /// 모두 참
    All(Vec<Condition>),

    /// 하나 이상 참
    Any(Vec<Condition>),

    /// 부정
    Not(Box<Condition>),
}

impl Condition {
    /// 비교 조건 생성
    pub fn compare(op: ComparisonOp, left: AttributeRef, right: Operand) -> Self {
        Condition::Compare { op, left, right }
    }

    /// `left eq right` 생성
    pub fn equals(left: AttributeRef, right: Operand) -> Self {
        Self::compare(ComparisonOp::Eq, left, right)
    }

    /// 직렬화된 문자열에서 파싱
    pub fn parse(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| malformed(format!("condition is not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// JSON 값에서 파싱
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| malformed(format!("condition must be an object, got {}", value)))?;
        let op = obj
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("condition requires a string 'op'"))?;

        match op {
            "and" => Ok(Condition::All(Self::parse_args(obj, op)?)),
            "or" => Ok(Condition::Any(Self::parse_args(obj, op)?)),
            "not" => {
                let arg = obj
                    .get("arg")
                    .ok_or_else(|| malformed("'not' requires 'arg'"))?;
                Ok(Condition::Not(Box::new(Self::from_value(arg)?)))
            }
            _ => {
                let left = obj
                    .get("left")
                    .ok_or_else(|| malformed(format!("'{}' requires 'left'", op)))?;
                let right = obj
                    .get("right")
                    .ok_or_else(|| malformed(format!("'{}' requires 'right'", op)))?;
                Ok(Condition::Compare {
                    op: ComparisonOp::from_tag(op),
                    left: AttributeRef::from_value(left)?,
                    right: Operand::from_value(right)?,
                })
            }
        }
    }

    fn parse_args(obj: &Map<String, Value>, op: &str) -> Result<Vec<Condition>> {
        let args = obj
            .get("args")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed(format!("'{}' requires an 'args' array", op)))?;
        if args.is_empty() {
            return Err(malformed(format!("'{}' requires at least one argument", op)));
        }
        args.iter().map(Self::from_value).collect()
    }

    /// 정규 형식 JSON으로 변환
    pub fn to_value(&self) -> Value {
        match self {
            Condition::Compare { op, left, right } => json!({
                "op": op.as_str(),
                "left": left.to_value(),
                "right": right.to_value(),
            }),
            Condition::All(args) => json!({
                "op": "and",
                "args": args.iter().map(Condition::to_value).collect::<Vec<_>>(),
            }),
            Condition::Any(args) => json!({
                "op": "or",
                "args": args.iter().map(Condition::to_value).collect::<Vec<_>>(),
            }),
            Condition::Not(arg) => json!({ "op": "not", "arg": arg.to_value() }),
        }
    }

    /// 조건 평가
    ///
    /// 결합 노드는 단락 평가하지 않습니다. 뒤쪽 자식의 설정 오류가
    /// 앞쪽 결과에 가려지지 않도록 모든 자식을 평가합니다.
    pub fn evaluate(&self, subject: &Subject, resource: Option<&AttributeBag>) -> Result<bool> {
        match self {
            Condition::Compare { op, left, right } => {
                if let ComparisonOp::Unknown(tag) = op {
                    return Err(Error::configuration(format!(
                        "unknown comparison operator '{}'",
                        tag
                    )));
                }
                let lhs = left.resolve(subject, resource);
                let rhs = right.resolve(subject, resource);
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => Ok(compare(op, &lhs, &rhs)),
                    _ => Ok(false),
                }
            }
            Condition::All(args) => {
                let mut result = true;
                for arg in args {
                    if !arg.evaluate(subject, resource)? {
                        result = false;
                    }
                }
                Ok(result)
            }
            Condition::Any(args) => {
                let mut result = false;
                for arg in args {
                    if arg.evaluate(subject, resource)? {
                        result = true;
                    }
                }
                Ok(result)
            }
            Condition::Not(arg) => Ok(!arg.evaluate(subject, resource)?),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Condition::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// 조건 평가 진입점
///
/// 조건이 없으면 항상 참입니다.
pub fn evaluate(
    condition: Option<&Condition>,
    subject: &Subject,
    resource: Option<&AttributeBag>,
) -> Result<bool> {
    match condition {
        None => Ok(true),
        Some(condition) => condition.evaluate(subject, resource),
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::configuration(message)
}

fn compare(op: &ComparisonOp, lhs: &Value, rhs: &Value) -> bool {
    match op {
        ComparisonOp::Eq => values_equal(lhs, rhs),
        ComparisonOp::Neq => !values_equal(lhs, rhs),
        ComparisonOp::In => rhs
            .as_array()
            .map(|items| items.iter().any(|item| values_equal(lhs, item)))
            .unwrap_or(false),
        ComparisonOp::Gt => matches!(ordering(lhs, rhs), Some(Ordering::Greater)),
        ComparisonOp::Gte => matches!(
            ordering(lhs, rhs),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOp::Lt => matches!(ordering(lhs, rhs), Some(Ordering::Less)),
        ComparisonOp::Lte => matches!(ordering(lhs, rhs), Some(Ordering::Less | Ordering::Equal)),
        ComparisonOp::Unknown(_) => false,
    }
}

/// 타입을 구분하는 동등 비교 (암묵적 변환 없음)
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(_)) => ordering(lhs, rhs) == Some(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        _ => false,
    }
}

/// 숫자끼리, 문자열끼리만 순서가 정의됩니다.
fn ordering(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => number_ordering(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn exact_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// 정수가 섞이면 f64로 내리지 않고 정확히 비교합니다.
fn number_ordering(a: &Number, b: &Number) -> Option<Ordering> {
    match (exact_integer(a), exact_integer(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        (Some(x), None) => integer_float_ordering(x, b.as_f64()?),
        (None, Some(y)) => integer_float_ordering(y, a.as_f64()?).map(Ordering::reverse),
        (None, None) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn integer_float_ordering(int: i128, float: f64) -> Option<Ordering> {
    // i64/u64 정수는 ±2^64 안에 있으므로 그 밖의 실수는 크기만으로 결정
    const BOUND: f64 = 18_446_744_073_709_551_616.0;
    if float.is_nan() {
        return None;
    }
    if float >= BOUND {
        return Some(Ordering::Less);
    }
    if float <= -BOUND {
        return Some(Ordering::Greater);
    }
    let floor = float.floor();
    let whole = floor as i128;
    match int.cmp(&whole) {
        Ordering::Equal if floor != float => Some(Ordering::Less),
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::policy::Role;

    fn subject(id: &str) -> Subject {
        Subject::new(id, vec![Role::new(2, "user")])
    }

    fn bag(value: Value) -> AttributeBag {
        AttributeBag::try_from(value).unwrap()
    }

    fn owner_condition() -> Condition {
        Condition::parse(
            r#"{"op":"eq","left":{"user_attr":"id"},"right":{"resource_attr":"id"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_absent_condition_is_true() {
        let resource = bag(json!({"id": "u2"}));
        assert!(evaluate(None, &subject("u1"), Some(&resource)).unwrap());
        assert!(evaluate(None, &subject("u1"), None).unwrap());
    }

    #[test]
    fn test_eq_between_user_and_resource() {
        let condition = owner_condition();
        let own = bag(json!({"id": "u1"}));
        let other = bag(json!({"id": "u2"}));

        assert!(evaluate(Some(&condition), &subject("u1"), Some(&own)).unwrap());
        assert!(!evaluate(Some(&condition), &subject("u1"), Some(&other)).unwrap());
    }

    #[test]
    fn test_missing_attribute_is_non_matching() {
        let condition = Condition::parse(
            r#"{"op":"eq","left":{"user_attr":"missing"},"right":{"resource_attr":"id"}}"#,
        )
        .unwrap();
        let resource = bag(json!({"id": "u1"}));
        assert!(!evaluate(Some(&condition), &subject("u1"), Some(&resource)).unwrap());

        // 리소스가 아예 없어도 에러가 아닌 false
        assert!(!evaluate(Some(&owner_condition()), &subject("u1"), None).unwrap());

        // neq도 undefined에 대해서는 false
        let neq = Condition::compare(
            ComparisonOp::Neq,
            AttributeRef::user("missing"),
            Operand::Literal(json!("x")),
        );
        assert!(!neq.evaluate(&subject("u1"), None).unwrap());
    }

    #[test]
    fn test_eq_is_type_aware() {
        let subject = subject("u1").with_attributes(bag(json!({
            "level": 1,
            "flag": true,
            "code": "1"
        })));

        let check = |key: &str, literal: Value| {
            Condition::equals(AttributeRef::user(key), Operand::Literal(literal))
                .evaluate(&subject, None)
                .unwrap()
        };

        assert!(check("level", json!(1)));
        assert!(check("level", json!(1.0)));
        assert!(!check("level", json!("1")));
        assert!(!check("code", json!(1)));
        assert!(check("code", json!("1")));
        assert!(check("flag", json!(true)));
        assert!(!check("flag", json!("true")));
    }

    #[test]
    fn test_large_integer_compares_exactly_with_float() {
        let subject = subject("u1").with_attributes(bag(json!({
            "n": 9_007_199_254_740_993_i64,
            "m": 9_007_199_254_740_992_i64,
            "big": u64::MAX,
            "neg": -3
        })));

        let check = |op: &str, key: &str, literal: Value| {
            let raw = json!({"op": op, "left": {"user_attr": key}, "right": literal});
            Condition::from_value(&raw)
                .unwrap()
                .evaluate(&subject, None)
                .unwrap()
        };

        // 2^53 + 1 은 f64 2^53 과 같지 않다
        assert!(!check("eq", "n", json!(9_007_199_254_740_992.0)));
        assert!(check("neq", "n", json!(9_007_199_254_740_992.0)));
        assert!(check("gt", "n", json!(9_007_199_254_740_992.0)));
        assert!(check("eq", "m", json!(9_007_199_254_740_992.0)));

        // i64 범위를 넘는 u64 와 음수 정수
        assert!(check("gt", "big", json!(i64::MAX)));
        assert!(check("lt", "neg", json!(u64::MAX)));

        // 정수와 소수 사이
        assert!(check("lt", "neg", json!(-2.5)));
        assert!(check("gt", "neg", json!(-3.5)));
        assert!(!check("eq", "neg", json!(-3.5)));
        assert!(check("eq", "neg", json!(-3.0)));
        assert!(check("lt", "big", json!(1.0e20)));
    }

    #[test]
    fn test_ordering_and_membership_operators() {
        let resource = bag(json!({
            "priority": 5,
            "status": "open",
            "tags": ["a", "b"]
        }));
        let subject = subject("u1").with_attributes(bag(json!({
            "clearance": 7,
            "allowed": ["open", "pending"]
        })));

        let gt = Condition::compare(
            ComparisonOp::Gt,
            AttributeRef::user("clearance"),
            Operand::Attribute(AttributeRef::resource("priority")),
        );
        assert!(gt.evaluate(&subject, Some(&resource)).unwrap());

        let lte = Condition::compare(
            ComparisonOp::Lte,
            AttributeRef::resource("priority"),
            Operand::Literal(json!(5)),
        );
        assert!(lte.evaluate(&subject, Some(&resource)).unwrap());

        let lt_mixed = Condition::compare(
            ComparisonOp::Lt,
            AttributeRef::resource("priority"),
            Operand::Literal(json!("9")),
        );
        assert!(!lt_mixed.evaluate(&subject, Some(&resource)).unwrap());

        let member = Condition::compare(
            ComparisonOp::In,
            AttributeRef::resource("status"),
            Operand::Attribute(AttributeRef::user("allowed")),
        );
        assert!(member.evaluate(&subject, Some(&resource)).unwrap());

        let not_array = Condition::compare(
            ComparisonOp::In,
            AttributeRef::resource("status"),
            Operand::Literal(json!("open")),
        );
        assert!(!not_array.evaluate(&subject, Some(&resource)).unwrap());
    }

    #[test]
    fn test_role_membership_condition() {
        let condition = Condition::compare(
            ComparisonOp::In,
            AttributeRef::resource("owner_role"),
            Operand::Attribute(AttributeRef::user("roles")),
        );
        let resource = bag(json!({"owner_role": "user"}));
        assert!(condition.evaluate(&subject("u1"), Some(&resource)).unwrap());
    }

    #[test]
    fn test_unknown_operator_fails_at_evaluation() {
        let condition = Condition::parse(
            r#"{"op":"matches","left":{"user_attr":"id"},"right":{"resource_attr":"id"}}"#,
        )
        .unwrap();
        let resource = bag(json!({"id": "u1"}));

        let err = condition.evaluate(&subject("u1"), Some(&resource)).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_unknown_operator_not_hidden_by_combinator() {
        let condition = Condition::parse(
            r#"{"op":"and","args":[
                {"op":"eq","left":{"user_attr":"id"},"right":"nobody"},
                {"op":"regex","left":{"user_attr":"id"},"right":".*"}
            ]}"#,
        )
        .unwrap();

        assert!(condition.evaluate(&subject("u1"), None).is_err());
    }

    #[test]
    fn test_combinators() {
        let condition = Condition::parse(
            r#"{"op":"or","args":[
                {"op":"eq","left":{"user_attr":"id"},"right":{"resource_attr":"ownerId"}},
                {"op":"not","arg":{"op":"eq","left":{"resource_attr":"visibility"},"right":"private"}}
            ]}"#,
        )
        .unwrap();

        let own_private = bag(json!({"ownerId": "u1", "visibility": "private"}));
        let other_private = bag(json!({"ownerId": "u2", "visibility": "private"}));
        let other_public = bag(json!({"ownerId": "u2", "visibility": "public"}));

        assert!(condition.evaluate(&subject("u1"), Some(&own_private)).unwrap());
        assert!(!condition.evaluate(&subject("u1"), Some(&other_private)).unwrap());
        assert!(condition.evaluate(&subject("u1"), Some(&other_public)).unwrap());
    }

    #[test]
    fn test_malformed_conditions() {
        let cases = [
            r#"[]"#,
            r#"{"left":{"user_attr":"id"},"right":1}"#,
            r#"{"op":"eq","right":1}"#,
            r#"{"op":"eq","left":"id","right":1}"#,
            r#"{"op":"eq","left":{"type":"group_attr","key":"id"},"right":1}"#,
            r#"{"op":"eq","left":{"user_attr":""},"right":1}"#,
            r#"{"op":"eq","left":{"user_attr":"id"},"right":{"foo":"bar"}}"#,
            r#"{"op":"eq","left":{"user_attr":"id"},"right":{"type":"literal"}}"#,
            r#"{"op":"and","args":[]}"#,
            r#"{"op":"not"}"#,
        ];

        for case in cases {
            let err = Condition::parse(case).unwrap_err();
            assert!(
                matches!(err, Error::Configuration { .. }),
                "expected configuration error for {}",
                case
            );
        }
    }

    #[test]
    fn test_canonical_form_reparses() {
        let condition = Condition::parse(
            r#"{"op":"and","args":[
                {"op":"eq","left":{"user_attr":"id"},"right":{"resource_attr":"id"}},
                {"op":"gte","left":{"user_attr":"level"},"right":3}
            ]}"#,
        )
        .unwrap();

        let canonical = condition.to_value();
        assert_eq!(canonical["args"][0]["left"]["type"], "user_attr");
        assert_eq!(canonical["args"][1]["right"]["type"], "literal");
        assert_eq!(Condition::from_value(&canonical).unwrap(), condition);
    }

    #[test]
    fn test_evaluation_does_not_mutate_inputs() {
        let condition = owner_condition();
        let subject = subject("u1");
        let resource = bag(json!({"id": "u1"}));
        let before = (subject.id.clone(), resource.clone(), condition.clone());

        for _ in 0..3 {
            assert!(condition.evaluate(&subject, Some(&resource)).unwrap());
        }

        assert_eq!(before.0, subject.id);
        assert_eq!(before.1, resource);
        assert_eq!(before.2, condition);
    }
}
