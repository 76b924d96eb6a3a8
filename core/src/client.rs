//! Request builders and response interpreters for PocketBase records.
//!
//! # Design
//! `PocketbaseClient` holds only a `base_url`. `collection` hands out a
//! `Collection` borrowing the client, and each record operation on it is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. Nothing here performs
//! I/O; see `executor` for the blocking round-trip.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateParams, ErrorEnvelope, ListParams, RecordParams};

/// Entry point for a PocketBase server.
#[derive(Debug, Clone)]
pub struct PocketbaseClient {
    base_url: String,
}

impl PocketbaseClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Accessor for the records of `name`. The name is not validated.
    pub fn collection(&self, name: &str) -> Collection<'_> {
        Collection {
            client: self,
            name: name.to_string(),
        }
    }
}

/// Record operations on one collection.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    client: &'a PocketbaseClient,
    name: String,
}

impl Collection<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn records_url(&self) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.client.base_url,
            urlencoding::encode(&self.name)
        )
    }

    /// `GET .../records?page=..&perPage=..` followed by whichever optional
    /// parameters are set, always in the order sort, filter, expand, fields,
    /// skipTotal.
    pub fn build_get_list(&self, params: &ListParams) -> HttpRequest {
        let mut query = Query::default();
        query.push("page", &params.page.to_string());
        query.push("perPage", &params.per_page.to_string());
        query.push_opt("sort", params.sort.as_deref());
        query.push_opt("filter", params.filter.as_deref());
        query.push_opt("expand", params.expand.as_deref());
        query.push_opt("fields", params.fields.as_deref());
        if params.skip_total {
            query.push("skipTotal", "1");
        }

        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{}", self.records_url(), query.finish()),
            headers: Vec::new(),
            body: None,
        }
    }

    /// `GET .../records/{id}` with `?expand=..[&fields=..]`, or `?fields=..`
    /// alone when there is no expand.
    pub fn build_get_one(&self, record_id: &str, params: &RecordParams) -> HttpRequest {
        let mut query = Query::default();
        match (params.expand.as_deref(), params.fields.as_deref()) {
            (Some(expand), fields) => {
                query.push("expand", expand);
                query.push_opt("fields", fields);
            }
            (None, Some(fields)) => query.push("fields", fields),
            (None, None) => {}
        }

        HttpRequest {
            method: HttpMethod::Get,
            path: format!(
                "{}/{}{}",
                self.records_url(),
                urlencoding::encode(record_id),
                query.finish()
            ),
            headers: Vec::new(),
            body: None,
        }
    }

    /// `POST .../records` with `json_data` as the body. `json_data` must be
    /// a JSON object; `params.id`, when set, becomes its `"id"` member.
    pub fn build_create(&self, json_data: &str, params: &CreateParams) -> Result<HttpRequest, ApiError> {
        let mut record: serde_json::Value =
            serde_json::from_str(json_data).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let fields = record
            .as_object_mut()
            .ok_or_else(|| ApiError::SerializationError("record data must be a JSON object".to_string()))?;
        if let Some(id) = &params.id {
            fields.insert("id".to_string(), serde_json::Value::String(id.clone()));
        }
        let body = serde_json::to_string(&record).map_err(|e| ApiError::SerializationError(e.to_string()))?;

        let mut query = Query::default();
        query.push_opt("expand", params.expand.as_deref());
        query.push_opt("fields", params.fields.as_deref());

        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{}", self.records_url(), query.finish()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    /// The list body is handed back verbatim, whatever the status.
    pub fn parse_get_list(&self, response: HttpResponse) -> Result<String, ApiError> {
        Ok(response.body)
    }

    /// Map PocketBase 404/403 error envelopes to domain errors; any other
    /// body, including ones that are not JSON, is returned unchanged.
    pub fn parse_get_one(&self, response: HttpResponse) -> Result<String, ApiError> {
        match ErrorEnvelope::decode(&response.body) {
            Some(envelope) if envelope.code == 404 => Err(ApiError::NotFound {
                message: envelope.message.unwrap_or_default(),
            }),
            Some(envelope) if envelope.code == 403 => Err(ApiError::Forbidden {
                message: envelope.message.unwrap_or_default(),
            }),
            _ => Ok(response.body),
        }
    }

    /// Any 2xx is a created record; its body is returned.
    pub fn parse_create(&self, response: HttpResponse) -> Result<String, ApiError> {
        if response.is_success() {
            return Ok(response.body);
        }
        Err(ApiError::CreateFailed {
            status: response.status,
            body: response.body,
        })
    }
}

/// Query-string accumulator. Values are percent-encoded except for `,`,
/// which PocketBase uses to separate sort keys, relations and fields.
#[derive(Default)]
struct Query {
    buf: String,
}

impl Query {
    fn push(&mut self, key: &str, value: &str) {
        self.buf.push(if self.buf.is_empty() { '?' } else { '&' });
        self.buf.push_str(key);
        self.buf.push('=');
        for (i, part) in value.split(',').enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.buf.push_str(&urlencoding::encode(part));
        }
    }

    fn push_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8090";

    fn client() -> PocketbaseClient {
        PocketbaseClient::new(BASE)
    }

    #[test]
    fn build_get_list_defaults() {
        let req = client().collection("posts").build_get_list(&ListParams::default());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8090/api/collections/posts/records?page=1&perPage=30");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_get_list_every_option_in_fixed_order() {
        let params = ListParams::new()
            .page(2)
            .per_page(50)
            .sort("-created")
            .filter("status=true")
            .expand("author")
            .fields("id")
            .skip_total(true);
        let req = client().collection("posts").build_get_list(&params);
        assert_eq!(
            req.path,
            "http://localhost:8090/api/collections/posts/records\
             ?page=2&perPage=50&sort=-created&filter=status%3Dtrue&expand=author&fields=id&skipTotal=1"
        );
    }

    #[test]
    fn build_get_list_only_supplied_options_appear() {
        let c = client();
        let posts = c.collection("posts");

        // Every subset of the five optional parameters.
        for mask in 0u8..32 {
            let mut params = ListParams::new();
            let mut expected = String::from("?page=1&perPage=30");
            if mask & 1 != 0 {
                params = params.sort("title");
                expected.push_str("&sort=title");
            }
            if mask & 2 != 0 {
                params = params.filter("x");
                expected.push_str("&filter=x");
            }
            if mask & 4 != 0 {
                params = params.expand("author");
                expected.push_str("&expand=author");
            }
            if mask & 8 != 0 {
                params = params.fields("id");
                expected.push_str("&fields=id");
            }
            if mask & 16 != 0 {
                params = params.skip_total(true);
                expected.push_str("&skipTotal=1");
            }
            let req = posts.build_get_list(&params);
            assert!(req.path.ends_with(&expected), "mask {mask}: {}", req.path);
        }
    }

    #[test]
    fn skip_total_false_is_omitted() {
        let req = client()
            .collection("posts")
            .build_get_list(&ListParams::new().skip_total(false));
        assert!(!req.path.contains("skipTotal"));
    }

    #[test]
    fn build_get_list_encodes_filter_expression() {
        let params = ListParams::new().filter("(title~'abc' && created>'2022-01-01')");
        let req = client().collection("posts").build_get_list(&params);
        assert!(req
            .path
            .ends_with("&filter=%28title~%27abc%27%20%26%26%20created%3E%272022-01-01%27%29"));
    }

    #[test]
    fn commas_stay_literal_in_query_values() {
        let params = ListParams::new().sort("-created,id").expand("author,tags").fields("id,title");
        let req = client().collection("posts").build_get_list(&params);
        assert!(req
            .path
            .ends_with("?page=1&perPage=30&sort=-created,id&expand=author,tags&fields=id,title"));

        let params = ListParams::new().filter("title='a, b'");
        let req = client().collection("posts").build_get_list(&params);
        assert!(req.path.ends_with("&filter=title%3D%27a,%20b%27"));
    }

    #[test]
    fn build_get_one_query_rules() {
        let c = client();
        let posts = c.collection("posts");
        let prefix = "http://localhost:8090/api/collections/posts/records/abc";

        let req = posts.build_get_one("abc", &RecordParams::new());
        assert_eq!(req.path, prefix);

        let req = posts.build_get_one("abc", &RecordParams::new().expand("author"));
        assert_eq!(req.path, format!("{prefix}?expand=author"));

        let req = posts.build_get_one("abc", &RecordParams::new().fields("title"));
        assert_eq!(req.path, format!("{prefix}?fields=title"));

        let req = posts.build_get_one("abc", &RecordParams::new().expand("author").fields("title"));
        assert_eq!(req.path, format!("{prefix}?expand=author&fields=title"));
    }

    #[test]
    fn build_create_injects_id() {
        let req = client()
            .collection("sensors")
            .build_create(r#"{"temp":21.5}"#, &CreateParams::new().id("abc123"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8090/api/collections/sensors/records");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["id"], "abc123");
        assert_eq!(body["temp"], 21.5);
    }

    #[test]
    fn build_create_appends_expand_and_fields() {
        let params = CreateParams::new().expand("owner").fields("id");
        let req = client().collection("sensors").build_create("{}", &params).unwrap();
        assert!(req.path.ends_with("/records?expand=owner&fields=id"));

        let req = client()
            .collection("sensors")
            .build_create("{}", &CreateParams::new().fields("id"))
            .unwrap();
        assert!(req.path.ends_with("/records?fields=id"));
    }

    #[test]
    fn build_create_rejects_non_object() {
        let c = client();
        let sensors = c.collection("sensors");
        for payload in ["[1,2]", "42", "not json"] {
            let err = sensors.build_create(payload, &CreateParams::new()).unwrap_err();
            assert!(matches!(err, ApiError::SerializationError(_)), "{payload}");
        }
    }

    #[test]
    fn parse_get_list_is_verbatim() {
        let c = client();
        let body = r#"{"page":1,"perPage":30,"totalItems":0,"totalPages":0,"items":[]}"#;
        let result = c.collection("posts").parse_get_list(HttpResponse::new(200, body));
        assert_eq!(result.unwrap(), body);
    }

    #[test]
    fn parse_get_one_success() {
        let c = client();
        let result = c
            .collection("posts")
            .parse_get_one(HttpResponse::new(200, r#"{"id":"abc"}"#));
        assert_eq!(result.unwrap(), r#"{"id":"abc"}"#);
    }

    #[test]
    fn parse_get_one_not_found() {
        let c = client();
        let body = r#"{"code":404,"message":"The requested resource wasn't found.","data":{}}"#;
        let err = c
            .collection("posts")
            .parse_get_one(HttpResponse::new(404, body))
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::NotFound {
                message: "The requested resource wasn't found.".to_string()
            }
        );
    }

    #[test]
    fn parse_get_one_forbidden() {
        let c = client();
        let body = r#"{"code":403,"message":"Only superusers can perform this action.","data":{}}"#;
        let err = c
            .collection("posts")
            .parse_get_one(HttpResponse::new(403, body))
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }));
    }

    #[test]
    fn parse_get_one_loose_envelopes_are_domain_errors() {
        let c = client();
        let posts = c.collection("posts");

        let err = posts
            .parse_get_one(HttpResponse::new(404, r#"{"code":404,"message":null,"data":{}}"#))
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound { message: String::new() });

        let err = posts
            .parse_get_one(HttpResponse::new(404, r#"{"code":404.0}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));

        let err = posts
            .parse_get_one(HttpResponse::new(403, r#"{"code":403.0,"message":"nope"}"#))
            .unwrap_err();
        assert_eq!(err, ApiError::Forbidden { message: "nope".to_string() });
    }

    #[test]
    fn parse_get_one_other_envelope_passes_through() {
        let c = client();
        let body = r#"{"code":400,"message":"Something went wrong.","data":{}}"#;
        let result = c.collection("posts").parse_get_one(HttpResponse::new(400, body));
        assert_eq!(result.unwrap(), body);
    }

    #[test]
    fn parse_get_one_non_json_passes_through() {
        let c = client();
        let result = c
            .collection("posts")
            .parse_get_one(HttpResponse::new(502, "Bad Gateway"));
        assert_eq!(result.unwrap(), "Bad Gateway");
    }

    #[test]
    fn parse_create_success_returns_record() {
        let c = client();
        let result = c
            .collection("sensors")
            .parse_create(HttpResponse::new(200, r#"{"id":"abc123"}"#));
        assert_eq!(result.unwrap(), r#"{"id":"abc123"}"#);
    }

    #[test]
    fn parse_create_failure() {
        let c = client();
        let err = c
            .collection("sensors")
            .parse_create(HttpResponse::new(400, r#"{"code":400}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::CreateFailed { status: 400, .. }));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = PocketbaseClient::new("http://localhost:8090/");
        assert_eq!(client.base_url(), "http://localhost:8090");
        let req = client.collection("posts").build_get_one("a", &RecordParams::new());
        assert_eq!(req.path, "http://localhost:8090/api/collections/posts/records/a");
    }

    #[test]
    fn collections_are_independent() {
        let c = client();
        let x = c.collection("x");
        let y = c.collection("y");
        let params = ListParams::default();
        assert!(x.build_get_list(&params).path.contains("/collections/x/records"));
        assert!(y.build_get_list(&params).path.contains("/collections/y/records"));
        assert_eq!(x.name(), "x");
        assert_eq!(y.name(), "y");
    }
}
