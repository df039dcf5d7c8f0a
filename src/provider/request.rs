//! Request flattening: the canonical conversion of an HTTP-request-shaped
//! value into the string-keyed map a script reads as `ctx["request"]`
//! (spec §4.2 / §6).

use std::collections::BTreeMap;

use crate::value::{RequestValue, Value};

/// Flatten a [`RequestValue`] into the map shape scripts expect. Missing
/// fields become zero values; if the request's URL doesn't parse, the
/// conversion fails *softly* — it returns an empty map rather than
/// propagating an error, so a malformed request never aborts the
/// evaluation it's attached to.
pub fn flatten(req: &RequestValue) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    let Some(parsed) = url::Url::parse(&req.url).ok() else {
        return map;
    };

    map.insert("method".to_string(), Value::String(req.method.clone()));
    map.insert("url-string".to_string(), Value::String(req.url.clone()));
    map.insert(
        "url-host".to_string(),
        Value::String(parsed.host_str().unwrap_or_default().to_string()),
    );
    map.insert(
        "url-scheme".to_string(),
        Value::String(parsed.scheme().to_string()),
    );
    map.insert(
        "url-path".to_string(),
        Value::String(parsed.path().to_string()),
    );
    map.insert("proto".to_string(), Value::String(req.proto.clone()));
    map.insert(
        "headers".to_string(),
        Value::StringListMap(req.headers.clone()),
    );
    map.insert("body".to_string(), Value::String(req.body.clone()));
    map.insert(
        "content-length".to_string(),
        Value::Int(req.content_length),
    );
    map.insert("host".to_string(), Value::String(req.host.clone()));
    map.insert(
        "remote-addr".to_string(),
        Value::String(req.remote_addr.clone()),
    );
    map.insert(
        "query-params".to_string(),
        Value::StringListMap(req.query_params.clone()),
    );

    map
}
