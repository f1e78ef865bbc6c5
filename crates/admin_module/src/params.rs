use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Flattens a JSON object into bracket keys: `{"SET":{"function":"debug"}}`
    /// becomes `SET[function]=debug`. Non-object roots yield no parameters.
    pub fn from_json(value: &Value) -> Self {
        let mut pairs = Vec::new();
        if let Value::Object(map) = value {
            for (key, child) in map {
                flatten_json(key.clone(), child, &mut pairs);
            }
        }
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn nested(&self, group: &str, key: &str) -> Option<&str> {
        self.get(&format!("{group}[{key}]"))
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.pairs.iter().any(|(k, _)| {
            k.strip_prefix(group)
                .is_some_and(|rest| rest.starts_with('['))
        })
    }
}

fn flatten_json(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_json(format!("{prefix}[{key}]"), child, out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten_json(format!("{prefix}[{idx}]"), child, out);
            }
        }
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Null => out.push((prefix, String::new())),
        other => out.push((prefix, other.to_string())),
    }
}
