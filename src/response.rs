//! JSON body shapes shared by the API and error responses.

use serde::Serialize;

/// `{count, items}` page of results.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub count: usize,
    pub items: Vec<T>,
}

pub fn listing<T: Serialize>(items: Vec<T>) -> Listing<T> {
    Listing {
        count: items.len(),
        items,
    }
}

pub fn error_body(code: &str, message: String, details: Option<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}
