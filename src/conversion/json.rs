//! Host `Value` <-> `serde_json::Value` conversion, used at the WASM
//! engine's serialised-bundle boundary.

use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Value as Json};

use crate::error::EvalError;
use crate::value::Value;

pub fn host_to_wasm_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Json::from(*f),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) | Value::Tuple(items) => {
            Json::Array(items.iter().map(host_to_wasm_json).collect())
        }
        Value::Map(m) => {
            let mut obj = JsonMap::new();
            for (k, v) in m {
                obj.insert(k.clone(), host_to_wasm_json(v));
            }
            Json::Object(obj)
        }
        Value::StringListMap(m) => {
            let mut obj = JsonMap::new();
            for (k, v) in m {
                obj.insert(
                    k.clone(),
                    Json::Array(v.iter().cloned().map(Json::String).collect()),
                );
            }
            Json::Object(obj)
        }
        Value::Set(s) => Json::Array(s.iter().cloned().map(Json::String).collect()),
        Value::Request(req) => host_to_wasm_json(&Value::Map(crate::provider::request::flatten(req))),
        Value::Function(name) => Json::String(name.clone()),
        Value::Error(msg) => Json::String(msg.clone()),
    }
}

pub fn wasm_json_to_host(json: Json) -> Result<Value, EvalError> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() {
                    Ok(Value::Float(f))
                } else {
                    Err(EvalError::ConversionFailed(format!(
                        "wasm output number is not finite: {n}"
                    )))
                }
            } else {
                Err(EvalError::ConversionFailed(format!(
                    "wasm output number out of range: {n}"
                )))
            }
        }
        Json::String(s) => Ok(Value::String(s)),
        Json::Array(items) => {
            let items = items
                .into_iter()
                .map(wasm_json_to_host)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(items))
        }
        Json::Object(obj) => {
            let mut out = BTreeMap::new();
            for (k, v) in obj {
                out.insert(k, wasm_json_to_host(v)?);
            }
            Ok(Value::Map(out))
        }
    }
}
