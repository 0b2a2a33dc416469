// src/schema.rs
//
// Inbound request shapes ignore undeclared fields. Enums and strings are
// strict; integer and boolean fields accept the usual lax spellings
// ("5", 3.0, "true", "off", 1) and are forwarded in canonical form. The response shape is a loose, open view of what Tavily
// sends back.

use schemars::JsonSchema;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldError, ProxyError};

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    #[default]
    General,
    News,
}

/// Recency window. Single-letter forms are accepted as given and forwarded
/// unchanged.
#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "d")]
    D,
    #[serde(rename = "w")]
    W,
    #[serde(rename = "m")]
    M,
    #[serde(rename = "y")]
    Y,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractDepth {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
pub struct SearchRequest {
    /// Search query
    pub query: String,
    #[serde(default)]
    pub search_depth: SearchDepth,
    #[serde(default)]
    pub topic: Topic,
    /// Days back to search when topic is "news"
    #[serde(default = "default_days")]
    #[schemars(default = "default_days")]
    pub days: i64,
    #[serde(default)]
    pub time_range: TimeRange,
    #[serde(default = "default_max_results")]
    #[schemars(default = "default_max_results")]
    pub max_results: i64,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub include_image_descriptions: bool,
    #[serde(default)]
    pub include_raw_content: bool,
    #[serde(default)]
    pub include_domains: Vec<String>,
    #[serde(default)]
    pub exclude_domains: Vec<String>,
}

fn default_days() -> i64 {
    3
}

fn default_max_results() -> i64 {
    10
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_depth: SearchDepth::default(),
            topic: Topic::default(),
            days: default_days(),
            time_range: TimeRange::default(),
            max_results: default_max_results(),
            include_images: false,
            include_image_descriptions: false,
            include_raw_content: false,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }

    /// Validates a raw payload and fills in defaults.
    pub fn from_value(mut value: Value) -> Result<Self, ProxyError> {
        coerce(
            &mut value,
            &["days", "max_results"],
            &["include_images", "include_image_descriptions", "include_raw_content"],
        );
        let obj = expect_object(&value)?;
        let mut errors = Vec::new();
        require(obj, "query", &mut errors);
        check::<String>(obj, "query", &mut errors);
        check::<SearchDepth>(obj, "search_depth", &mut errors);
        check::<Topic>(obj, "topic", &mut errors);
        check::<i64>(obj, "days", &mut errors);
        check::<TimeRange>(obj, "time_range", &mut errors);
        check::<i64>(obj, "max_results", &mut errors);
        check::<bool>(obj, "include_images", &mut errors);
        check::<bool>(obj, "include_image_descriptions", &mut errors);
        check::<bool>(obj, "include_raw_content", &mut errors);
        check::<Vec<String>>(obj, "include_domains", &mut errors);
        check::<Vec<String>>(obj, "exclude_domains", &mut errors);
        finish(value, errors)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
pub struct ExtractRequest {
    /// URLs to extract content from
    pub urls: Vec<String>,
    #[serde(default)]
    pub extract_depth: ExtractDepth,
    #[serde(default)]
    pub include_images: bool,
}

impl ExtractRequest {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            extract_depth: ExtractDepth::default(),
            include_images: false,
        }
    }

    /// Validates a raw payload and fills in defaults. An empty `urls` list
    /// is allowed.
    pub fn from_value(mut value: Value) -> Result<Self, ProxyError> {
        coerce(&mut value, &[], &["include_images"]);
        let obj = expect_object(&value)?;
        let mut errors = Vec::new();
        require(obj, "urls", &mut errors);
        check::<Vec<String>>(obj, "urls", &mut errors);
        check::<ExtractDepth>(obj, "extract_depth", &mut errors);
        check::<bool>(obj, "include_images", &mut errors);
        finish(value, errors)
    }
}

/// Rewrites lax integer and boolean spellings in place. Values that don't
/// coerce are left alone for `check` to report.
fn coerce(value: &mut Value, ints: &[&str], bools: &[&str]) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    for field in ints {
        if let Some(n) = obj.get(*field).and_then(lax_int) {
            obj.insert((*field).to_string(), Value::from(n));
        }
    }
    for field in bools {
        if let Some(b) = obj.get(*field).and_then(lax_bool) {
            obj.insert((*field).to_string(), Value::Bool(b));
        }
    }
}

fn lax_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) if n.is_i64() => None,
        Value::Number(n) => n.as_f64().and_then(whole),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
}

// Floats only count as integers when nothing is lost.
fn whole(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn lax_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn expect_object(value: &Value) -> Result<&Map<String, Value>, ProxyError> {
    value.as_object().ok_or_else(|| {
        ProxyError::Validation(vec![FieldError::body(format!(
            "expected a JSON object, got {}",
            json_kind(value)
        ))])
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn require(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) {
    if !obj.contains_key(field) {
        errors.push(FieldError::missing(field));
    }
}

// Absent fields are fine here; defaults are applied by the final decode.
fn check<T: DeserializeOwned>(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) {
    if let Some(raw) = obj.get(field) {
        if let Err(e) = T::deserialize(raw) {
            errors.push(FieldError::invalid(field, &e));
        }
    }
}

fn finish<T: DeserializeOwned>(value: Value, errors: Vec<FieldError>) -> Result<T, ProxyError> {
    if !errors.is_empty() {
        return Err(ProxyError::Validation(errors));
    }
    serde_json::from_value(value).map_err(|e| ProxyError::Validation(vec![FieldError::body(e.to_string())]))
}

/// Best-effort shape of a Tavily search/extract reply.
#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub follow_up_questions: Vec<String>,
    #[serde(default = "empty_answer")]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<ImageRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<SearchResult>,
    /// Anything else the provider sends.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResponse {
    pub fn from_value(value: Value) -> Result<Self, ProxyError> {
        Ok(serde_json::from_value(value)?)
    }
}

fn empty_answer() -> Option<String> {
    Some(String::new())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Described(Image),
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq, Default)]
pub struct Image {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq, Default)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
