//! Argument extraction for verb methods.
//!
//! # Rules
//! - POST/PUT/PATCH/DELETE: a multipart body yields no arguments; a JSON or
//!   form body yields one argument, the parsed body; anything else falls
//!   through to the URL rules
//! - a URL containing `?` yields one argument, the query object
//! - otherwise the positional captures `a`..`z`, in order, up to the
//!   first one missing, each coerced to a bool or number when it looks
//!   like one

use serde_json::{Number, Value};

use super::Verb;
use crate::http::exchange::parse_query;
use crate::http::{Exchange, RequestInfo};

/// Capture names for positional path segments.
pub const POSITIONAL_KEYS: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
    "s", "t", "u", "v", "w", "x", "y", "z",
];

/// Ordered arguments passed to a verb method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Argument at `index`, or `null`.
    pub fn value(&self, index: usize) -> Value {
        self.0.get(index).cloned().unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

/// Builds the arguments for `verb` and projects positional values onto
/// `path_config` names in `ex.request.path_params`.
pub fn extract(verb: Verb, ex: &mut Exchange, path_config: &[String]) -> Args {
    if verb.carries_body() {
        if ex.request.content_type().starts_with("multipart/form-data") {
            return Args::default();
        }
        if let Some(body) = parse_body(&ex.request) {
            return Args(vec![body]);
        }
    }
    from_url(ex, path_config)
}

fn from_url(ex: &mut Exchange, path_config: &[String]) -> Args {
    if ex.request.original_url.contains('?') {
        return Args(vec![Value::Object(ex.request.query.clone())]);
    }

    let positional: Vec<Value> = POSITIONAL_KEYS
        .iter()
        .map_while(|key| ex.request.params.get(*key))
        .map(|raw| coerce(raw))
        .collect();

    for (name, value) in path_config.iter().zip(&positional) {
        ex.request.path_params.insert(name.clone(), value.clone());
    }
    Args(positional)
}

fn parse_body(request: &RequestInfo) -> Option<Value> {
    if request.body.is_empty() {
        return None;
    }
    if request
        .content_type()
        .starts_with("application/x-www-form-urlencoded")
    {
        let text = std::str::from_utf8(&request.body).ok()?;
        let form = parse_query(Some(text));
        return (!form.is_empty()).then_some(Value::Object(form));
    }
    serde_json::from_slice(&request.body).ok()
}

/// `"true"`/`"false"` become booleans, numeric strings become numbers,
/// everything else stays a string.
pub fn coerce(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ if looks_numeric(raw) => {
            if let Ok(int) = raw.parse::<i64>() {
                return Value::from(int);
            }
            raw.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string()))
        }
        _ => Value::String(raw.to_string()),
    }
}

fn looks_numeric(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Responder;
    use axum::body::Bytes;
    use axum::http::Request;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn exchange(method: &str, uri: &str, content_type: Option<&str>, body: &str, params: &[(&str, &str)]) -> Exchange {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        let params: BTreeMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Exchange::new(parts, Bytes::from(body.to_string()), params, Arc::new(Responder::default()))
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("true"), json!(true));
        assert_eq!(coerce("false"), json!(false));
        assert_eq!(coerce("42"), json!(42));
        assert_eq!(coerce("-7"), json!(-7));
        assert_eq!(coerce("1.5"), json!(1.5));
        assert_eq!(coerce("abc"), json!("abc"));
        assert_eq!(coerce("1-2"), json!("1-2"));
        assert_eq!(coerce("-"), json!("-"));
        assert_eq!(coerce(""), json!(""));
    }

    #[test]
    fn test_positional_stops_at_first_gap() {
        let mut ex = exchange("GET", "/apis/third/1/2", None, "", &[("a", "1"), ("b", "2"), ("d", "4")]);
        let args = extract(Verb::Get, &mut ex, &[]);
        assert_eq!(args.into_vec(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_query_wins_over_positional() {
        let mut ex = exchange("GET", "/apis/x/1?name=joe", None, "", &[("a", "1")]);
        let args = extract(Verb::Get, &mut ex, &[]);
        assert_eq!(args.into_vec(), vec![json!({"name": "joe"})]);
    }

    #[test]
    fn test_json_and_form_bodies() {
        let mut ex = exchange("POST", "/apis/x", Some("application/json"), r#"{"data":1}"#, &[]);
        assert_eq!(extract(Verb::Post, &mut ex, &[]).into_vec(), vec![json!({"data": 1})]);

        let mut ex = exchange("PUT", "/apis/x", Some("application/x-www-form-urlencoded"), "data=1&x=y", &[]);
        assert_eq!(
            extract(Verb::Put, &mut ex, &[]).into_vec(),
            vec![json!({"data": "1", "x": "y"})]
        );
    }

    #[test]
    fn test_multipart_yields_no_args() {
        let mut ex = exchange(
            "POST",
            "/apis/x/1",
            Some("multipart/form-data; boundary=xyz"),
            "--xyz--",
            &[("a", "1")],
        );
        assert!(extract(Verb::Post, &mut ex, &[]).is_empty());
    }

    #[test]
    fn test_empty_write_body_falls_back_to_url() {
        let mut ex = exchange("PATCH", "/apis/x/1/2/3", None, "", &[("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(extract(Verb::Patch, &mut ex, &[]).len(), 3);
    }

    #[test]
    fn test_get_ignores_body() {
        let mut ex = exchange("GET", "/apis/x/true", Some("application/json"), r#"{"a":1}"#, &[("a", "true")]);
        assert_eq!(extract(Verb::Get, &mut ex, &[]).into_vec(), vec![json!(true)]);
    }

    #[test]
    fn test_path_config_projection() {
        let mut ex = exchange("GET", "/apis/x/5/blue", None, "", &[("a", "5"), ("b", "blue")]);
        let names = vec!["id".to_string(), "color".to_string(), "unused".to_string()];
        extract(Verb::Get, &mut ex, &names);
        assert_eq!(ex.request.path_params["id"], json!(5));
        assert_eq!(ex.request.path_params["color"], json!("blue"));
        assert!(!ex.request.path_params.contains_key("unused"));
    }
}
