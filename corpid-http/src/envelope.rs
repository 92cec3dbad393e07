//! Request/response shape of the fetcher as seen by callers.
//!
//! Success bodies are `{ title, content, meta }`; failures are `{ error }`
//! with an HTTP-style status derived from the [`FetchError`] kind.

use serde::Serialize;

use crate::reduce::MetaMap;
use crate::{FetchError, FetchedDocument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlContent {
    pub title: String,
    pub content: String,
    pub meta: MetaMap,
}

impl From<&FetchedDocument> for HtmlContent {
    fn from(doc: &FetchedDocument) -> Self {
        Self {
            title: doc.title.clone(),
            content: doc.content.clone(),
            meta: doc.meta.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl FetchError {
    /// 400 for bad input, 504 for the time budget, 404 passed through, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::InvalidUrl { .. } => 400,
            FetchError::Timeout { .. } => 504,
            FetchError::HttpStatus { status: 404, .. } => 404,
            _ => 500,
        }
    }
}

/// Status code plus JSON body, ready to be written by whatever transport fronts the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl FetchResponse {
    pub fn from_result(result: &Result<FetchedDocument, FetchError>) -> Self {
        match result {
            Ok(doc) => Self {
                status: 200,
                body: to_json(&HtmlContent::from(doc)),
            },
            Err(err) => Self {
                status: err.status_code(),
                body: to_json(&ErrorBody {
                    error: err.to_string(),
                }),
            },
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
