//! In-memory collections served by the [`ApiServer`](crate::server::ApiServer).

use crate::framework::{ApiResponse, Query};
use crate::server::rules::Rules;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Describes a collection to register on the server.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    /// Path the collection is served under, e.g. `users` or `teams/7/members`.
    pub key: String,
    pub rules: Rules,
    /// Records present at startup. Ids are assigned in order.
    pub seed: Vec<Value>,
}

impl CollectionSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().trim_matches('/').to_string(),
            rules: Rules::new(),
            seed: Vec::new(),
        }
    }

    #[must_use]
    pub fn rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn seed(mut self, records: impl IntoIterator<Item = Value>) -> Self {
        self.seed.extend(records);
        self
    }
}

pub(crate) struct Collection {
    key: String,
    rules: Rules,
    records: BTreeMap<u64, Map<String, Value>>,
    next_id: u64,
}

impl Collection {
    pub(crate) fn from_spec(spec: CollectionSpec) -> Self {
        let mut collection = Self {
            key: spec.key,
            rules: spec.rules,
            records: BTreeMap::new(),
            next_id: 1,
        };
        for record in spec.seed {
            collection.insert(object(Some(record)));
        }
        collection
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    fn insert(&mut self, mut record: Map<String, Value>) -> Map<String, Value> {
        let id = self.next_id;
        self.next_id += 1;
        record.insert("id".into(), json!(id));
        self.records.insert(id, record.clone());
        record
    }

    fn not_found(&self, id: &str) -> ApiResponse {
        ApiResponse::new(
            404,
            json!({ "message": format!("No query results for {} {id}.", self.key) }),
        )
    }

    pub(crate) fn index(&self, query: &Query, default_per_page: usize) -> ApiResponse {
        let page = positive(query.get("page")).unwrap_or(1);
        let per_page = positive(query.get("per_page")).unwrap_or(default_per_page).max(1);
        let filters: Vec<(&String, &Value)> = query
            .iter()
            .filter(|(k, _)| k.as_str() != "page" && k.as_str() != "per_page")
            .collect();

        let matching: Vec<&Map<String, Value>> = self
            .records
            .values()
            .filter(|record| {
                filters
                    .iter()
                    .all(|(field, wanted)| record.get(field.as_str()).is_some_and(|v| matches(v, wanted)))
            })
            .collect();

        let total = matching.len();
        let data: Vec<Value> = matching
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .map(|record| Value::Object(record.clone()))
            .collect();

        ApiResponse::ok(json!({
            "data": data,
            "meta": {
                "current_page": page,
                "per_page": per_page,
                "total": total,
                "last_page": total.div_ceil(per_page).max(1),
            }
        }))
    }

    pub(crate) fn show(&self, id: &str) -> ApiResponse {
        match self.lookup(id) {
            Some(record) => ApiResponse::ok(json!({ "data": record })),
            None => self.not_found(id),
        }
    }

    pub(crate) fn store(&mut self, body: Option<Value>) -> ApiResponse {
        let body = Value::Object(object(body));
        if let Err(errors) = self.rules.validate(&body, false) {
            return ApiResponse::validation(errors);
        }
        let record = self.insert(object(Some(body)));
        ApiResponse::created(json!({ "data": record }))
    }

    pub(crate) fn update(&mut self, id: &str, body: Option<Value>) -> ApiResponse {
        let Some(key) = parse_id(id).filter(|key| self.records.contains_key(key)) else {
            return self.not_found(id);
        };
        let body = Value::Object(object(body));
        if let Err(errors) = self.rules.validate(&body, true) {
            return ApiResponse::validation(errors);
        }
        let Some(record) = self.records.get_mut(&key) else {
            return self.not_found(id);
        };
        for (field, value) in object(Some(body)) {
            if field != "id" {
                record.insert(field, value);
            }
        }
        ApiResponse::ok(json!({ "data": record }))
    }

    pub(crate) fn destroy(&mut self, id: &str) -> ApiResponse {
        match parse_id(id).and_then(|key| self.records.remove(&key)) {
            Some(_) => ApiResponse::no_content(),
            None => self.not_found(id),
        }
    }

    fn lookup(&self, id: &str) -> Option<&Map<String, Value>> {
        parse_id(id).and_then(|key| self.records.get(&key))
    }
}

fn parse_id(id: &str) -> Option<u64> {
    id.parse().ok()
}

fn object(body: Option<Value>) -> Map<String, Value> {
    match body {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn positive(value: Option<&Value>) -> Option<usize> {
    let n = match value? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    usize::try_from(n).ok().filter(|n| *n > 0)
}

/// Query values arrive as strings; compare them against the record's rendering too.
fn matches(value: &Value, wanted: &Value) -> bool {
    if value == wanted {
        return true;
    }
    match (value, wanted) {
        (Value::String(_), _) => false,
        (other, Value::String(s)) => other.to_string() == *s,
        _ => false,
    }
}
