//! Which fields of a stored record hold credentials, and the copy-and-transform
//! walk over them.

use serde_json::{Map, Value};

/// Names of record fields that hold credentials.
///
/// The standard set covers provider integration records:
///
/// ```text
/// access_token, refresh_token, client_secret, api_key   (top level)
/// tokens.access_token, tokens.refresh_token             (token container)
/// oauth_data.*                                          (same rules, recursively)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveFieldSet {
    /// Fields transformed wherever the rules are applied.
    pub direct: Vec<String>,
    /// Name of the nested object holding token fields.
    pub token_container: String,
    /// Fields transformed inside the token container.
    pub token_fields: Vec<String>,
    /// Name of the nested object the whole rule set is reapplied to.
    pub recursive_container: String,
}

impl SensitiveFieldSet {
    pub fn standard() -> Self {
        Self {
            direct: to_owned(&["access_token", "refresh_token", "client_secret", "api_key"]),
            token_container: "tokens".into(),
            token_fields: to_owned(&["access_token", "refresh_token"]),
            recursive_container: "oauth_data".into(),
        }
    }
}

impl Default for SensitiveFieldSet {
    fn default() -> Self {
        Self::standard()
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

/// Copy `record`, replacing each non-empty sensitive string with `transform(value)`.
///
/// `null` and non-object values come back as clones. Fields that are absent,
/// empty, or not strings are left alone.
pub(crate) fn transform_record<F>(record: &Value, fields: &SensitiveFieldSet, transform: &F) -> Value
where
    F: Fn(&str) -> Value,
{
    let Value::Object(map) = record else {
        return record.clone();
    };
    let mut out = map.clone();

    for name in &fields.direct {
        transform_entry(&mut out, name, transform);
    }

    if let Some(Value::Object(tokens)) = out.get_mut(&fields.token_container) {
        for name in &fields.token_fields {
            transform_entry(tokens, name, transform);
        }
    }

    let nested = out
        .get(&fields.recursive_container)
        .filter(|v| v.is_object())
        .map(|v| transform_record(v, fields, transform));
    if let Some(nested) = nested {
        out.insert(fields.recursive_container.clone(), nested);
    }

    Value::Object(out)
}

fn transform_entry<F>(map: &mut Map<String, Value>, name: &str, transform: &F)
where
    F: Fn(&str) -> Value,
{
    let replacement = match map.get(name) {
        Some(Value::String(s)) if !s.is_empty() => transform(s.as_str()),
        _ => return,
    };
    map.insert(name.to_owned(), replacement);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upper(s: &str) -> Value {
        Value::String(s.to_uppercase())
    }

    #[test]
    fn direct_fields_are_transformed() {
        let rec = json!({"api_key": "k", "client_secret": "s", "name": "n"});
        let out = transform_record(&rec, &SensitiveFieldSet::standard(), &upper);
        assert_eq!(out, json!({"api_key": "K", "client_secret": "S", "name": "n"}));
    }

    #[test]
    fn token_container_is_one_level_deep() {
        let rec = json!({"tokens": {"access_token": "a", "refresh_token": "r", "id_token": "i"}});
        let out = transform_record(&rec, &SensitiveFieldSet::standard(), &upper);
        assert_eq!(
            out,
            json!({"tokens": {"access_token": "A", "refresh_token": "R", "id_token": "i"}})
        );
    }

    #[test]
    fn token_container_fields_only_apply_inside_it() {
        let rec = json!({"tokens": {"api_key": "k"}});
        let out = transform_record(&rec, &SensitiveFieldSet::standard(), &upper);
        assert_eq!(out, rec);
    }

    #[test]
    fn oauth_data_gets_full_rules() {
        let rec = json!({
            "oauth_data": {
                "access_token": "a",
                "tokens": {"refresh_token": "r"},
                "scope": "read"
            }
        });
        let out = transform_record(&rec, &SensitiveFieldSet::standard(), &upper);
        assert_eq!(
            out,
            json!({
                "oauth_data": {
                    "access_token": "A",
                    "tokens": {"refresh_token": "R"},
                    "scope": "read"
                }
            })
        );
    }

    #[test]
    fn falsy_and_non_string_values_untouched() {
        let rec = json!({
            "access_token": "",
            "refresh_token": null,
            "api_key": 42,
            "client_secret": false,
            "tokens": "not-an-object",
            "oauth_data": null
        });
        let out = transform_record(&rec, &SensitiveFieldSet::standard(), &upper);
        assert_eq!(out, rec);
    }

    #[test]
    fn non_objects_returned_as_is() {
        let set = SensitiveFieldSet::standard();
        assert_eq!(transform_record(&Value::Null, &set, &upper), Value::Null);
        assert_eq!(transform_record(&json!(["api_key"]), &set, &upper), json!(["api_key"]));
        assert_eq!(transform_record(&json!("api_key"), &set, &upper), json!("api_key"));
    }

    #[test]
    fn input_is_not_mutated() {
        let rec = json!({"api_key": "k", "oauth_data": {"access_token": "a"}});
        let before = rec.clone();
        let _ = transform_record(&rec, &SensitiveFieldSet::standard(), &upper);
        assert_eq!(rec, before);
    }

    #[test]
    fn custom_set() {
        let set = SensitiveFieldSet {
            direct: vec!["password".into()],
            ..SensitiveFieldSet::standard()
        };
        let rec = json!({"password": "p", "api_key": "k"});
        let out = transform_record(&rec, &set, &upper);
        assert_eq!(out, json!({"password": "P", "api_key": "k"}));
    }
}
