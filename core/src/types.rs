//! Request parameters and the few response shapes the client knows about.
//!
//! # Design
//! Record bodies stay raw JSON text; the only payload decoded inside the
//! client is PocketBase's error envelope. `ListPage` is offered for callers
//! that want a typed view of a list body after the fact.

use serde::{Deserialize, Serialize};

/// Query options for `Collection::get_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
    /// Skip the total counts query; the server then reports `totalItems`
    /// and `totalPages` as -1.
    pub skip_total: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 30,
            sort: None,
            filter: None,
            expand: None,
            fields: None,
            skip_total: false,
        }
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn skip_total(mut self, skip_total: bool) -> Self {
        self.skip_total = skip_total;
        self
    }
}

/// Query options for `Collection::get_one`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordParams {
    pub expand: Option<String>,
    pub fields: Option<String>,
}

impl RecordParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// Options for `Collection::create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateParams {
    /// Explicit record id; PocketBase generates one when absent.
    pub id: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
}

impl CreateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// PocketBase's error body: `{"code":404,"message":"...","data":{}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ErrorEnvelope {
    /// Decode `body` as an error envelope. Any JSON object whose `code` is a
    /// whole number qualifies, whatever shape `message` and `data` have.
    /// Everything else yields `None`.
    pub fn decode(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let code = value.get("code")?;
        let code = match code.as_i64() {
            Some(code) => code,
            None => {
                let code = code.as_f64()?;
                if code.fract() != 0.0 || code.abs() > i64::MAX as f64 {
                    return None;
                }
                code as i64
            }
        };
        Some(Self {
            code,
            message: value.get("message").and_then(serde_json::Value::as_str).map(str::to_string),
            data: value.get("data").cloned().unwrap_or_default(),
        })
    }
}

/// A page of records as returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<serde_json::Value>,
}

impl ListPage {
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}
