//! Record lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every collection
//! operation over real HTTP through `UreqTransport`. Validates that request
//! building, the executor and response interpretation agree with a
//! PocketBase-shaped server end-to-end.

use std::net::SocketAddr;

use pocketbase_core::{
    ApiError, CreateParams, ListPage, ListParams, OrEmpty, Pocketbase, RecordParams, UreqTransport,
};

fn start_server(locked: &'static [&'static str]) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_locked(listener, locked).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn record_lifecycle() {
    let addr = start_server(&["secrets"]);
    let pb = Pocketbase::with_ureq(&format!("http://{addr}/"));
    let readings = pb.collection("readings");

    // Step 1: list is empty.
    let body = readings.get_list(&ListParams::default()).unwrap();
    let page = ListPage::from_body(&body).unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 30);
    assert!(page.items.is_empty());

    // Step 2: create with a generated id; the stored record comes back.
    let body = readings
        .create(r#"{"sensor":"greenhouse","temp":21.5}"#, &CreateParams::new())
        .unwrap();
    let created: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["sensor"], "greenhouse");
    let generated_id = created["id"].as_str().unwrap().to_string();

    // Step 3: create with an explicit id and a field projection.
    let body = readings
        .create(
            r#"{"sensor":"garage","temp":9}"#,
            &CreateParams::new().id("garage000000001").fields("id"),
        )
        .unwrap();
    assert_eq!(body, r#"{"id":"garage000000001"}"#);

    // Step 4: duplicate id is a failed create.
    let err = readings
        .create("{}", &CreateParams::new().id("garage000000001"))
        .unwrap_err();
    assert!(matches!(err, ApiError::CreateFailed { status: 400, .. }));

    // Step 5: get each record back.
    let body = readings.get_one(&generated_id, &RecordParams::new()).unwrap();
    let fetched: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(fetched, created);

    let body = readings
        .get_one("garage000000001", &RecordParams::new().fields("temp"))
        .unwrap();
    assert_eq!(body, r#"{"temp":9}"#);

    // Step 6: list sorted by temperature, without totals.
    let body = readings
        .get_list(&ListParams::new().sort("-temp").skip_total(true))
        .unwrap();
    let page = ListPage::from_body(&body).unwrap();
    assert_eq!(page.total_items, -1);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0]["sensor"], "greenhouse");
    assert_eq!(page.items[1]["sensor"], "garage");

    // Step 7: unknown id is NotFound, and collapses to "".
    let result = readings.get_one("doesnotexist00", &RecordParams::new());
    assert!(matches!(result, Err(ApiError::NotFound { .. })));
    assert_eq!(result.or_empty(), "");

    // Step 8: locked collection is Forbidden.
    let result = pb.collection("secrets").get_one("anything", &RecordParams::new());
    assert!(matches!(result, Err(ApiError::Forbidden { .. })));
    assert_eq!(result.or_empty(), "");
}

#[test]
fn offline_device_sends_nothing() {
    let addr = start_server(&[]);
    let pb = Pocketbase::with_connectivity(&format!("http://{addr}"), UreqTransport::new(), || false);

    let result = pb
        .collection("readings")
        .create(r#"{"temp":1}"#, &CreateParams::new());
    assert_eq!(result, Err(ApiError::Offline));

    // Nothing reached the server.
    let online = Pocketbase::with_ureq(&format!("http://{addr}"));
    let body = online.collection("readings").get_list(&ListParams::default()).unwrap();
    assert!(ListPage::from_body(&body).unwrap().items.is_empty());
}

#[test]
fn refused_connection_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let pb = Pocketbase::with_ureq(&format!("http://{addr}"));

    let result = pb.collection("readings").get_list(&ListParams::default());
    assert!(matches!(result, Err(ApiError::Transport { code, .. }) if code < 0));
    assert_eq!(result.or_empty(), "");
}
