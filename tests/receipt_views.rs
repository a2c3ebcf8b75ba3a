mod common;

use axum::http::{StatusCode, header};
use common::*;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn local_saves_list_newest_first_and_survive_restart() {
    let scratch = Scratch::new("order");
    let cfg = test_config(&scratch);
    let app = build_app(&cfg).await;

    for name in ["Cafe", "Pharmacy", "Cinema"] {
        let resp = send(
            &app,
            json_request("POST", "/api/receipts", json!({"store_name": name}), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    // a fresh process over the same directory
    let restarted = build_app(&cfg).await;
    let list = body_json(send(&restarted, get_request("/api/receipts", None)).await).await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["store_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cinema", "Pharmacy", "Cafe"]);
}

#[tokio::test]
async fn detail_and_export_views() {
    let scratch = Scratch::new("detail");
    let app = build_app(&test_config(&scratch)).await;

    let saved = body_json(
        send(
            &app,
            json_request(
                "POST",
                "/api/receipts",
                json!({
                    "store_name": "Shell",
                    "date": "02-02-2024",
                    "total_amount": 60.0,
                    "currency": "€",
                    "category": "Gas",
                    "items": [{"item_name": "Diesel", "price": 55.0}, {"item_name": "Coffee", "price": 5.0}]
                }),
                None,
            ),
        )
        .await,
    )
    .await;
    let id = saved["receipt"]["id"].as_str().unwrap().to_string();

    let detail = body_json(send(&app, get_request(&format!("/api/receipts/{id}"), None)).await).await;
    assert_eq!(detail["id"], id.as_str());
    assert_eq!(detail["store_name"], "Shell");
    assert_eq!(detail["display"]["icon"], "local_gas_station");
    assert_eq!(detail["items_display"][0]["price"], "€ 55");

    let export = send(&app, get_request(&format!("/api/receipts/{id}/export"), None)).await;
    assert_eq!(export.status(), StatusCode::OK);
    assert_eq!(
        export.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"receipt_02-02-2024.csv\""
    );
    let csv = body_text(export).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Store,Date,Category,Item,Price,Currency,Total");
    assert!(lines[1].starts_with("Shell,02-02-2024,Gas,Diesel,55.0,€"));

    let missing = send(&app, get_request("/api/receipts/nope", None)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_save_body_is_a_client_error() {
    let scratch = Scratch::new("badbody");
    let app = build_app(&test_config(&scratch)).await;

    let resp = send(
        &app,
        json_request("POST", "/api/receipts", json!({"items": "not a list"}), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "INVALID_BODY");
}

#[tokio::test]
async fn cloud_mode_routes_by_session() {
    let scratch = Scratch::new("cloud");
    let mut cfg = test_config(&scratch);
    cfg.database_url = Some(scratch.database_url());
    let app = build_app(&cfg).await;

    let health = body_json(send(&app, get_request("/healthz", None)).await).await;
    assert_eq!(health["cloud"], true);
    assert_eq!(health["view_source"], "cloud");

    // views need a signed-in user
    let anon = send(&app, get_request("/api/receipts", None)).await;
    assert_eq!(anon.status(), StatusCode::UNAUTHORIZED);

    let signed_in = body_json(
        send(
            &app,
            json_request("POST", "/api/receipts", json!({"store_name": "Cloudy"}), Some("uid-1")),
        )
        .await,
    )
    .await;
    assert_eq!(signed_in["destination"], "cloud");
    assert_eq!(signed_in["receipt"]["uid"], "uid-1");

    let anonymous = body_json(
        send(
            &app,
            json_request("POST", "/api/receipts", json!({"store_name": "Offline"}), None),
        )
        .await,
    )
    .await;
    assert_eq!(anonymous["destination"], "local");

    // the cloud view never merges local entries
    let list = body_json(send(&app, get_request("/api/receipts", Some("uid-2"))).await).await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["store_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cloudy"]);
}

#[tokio::test]
async fn feed_pushes_a_snapshot_after_each_save() {
    let scratch = Scratch::new("feed");
    let app = build_app(&test_config(&scratch)).await;

    let resp = send(&app, get_request("/api/receipts/feed", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
    let mut frames = resp.into_body().into_data_stream();

    let first = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("initial snapshot")
        .expect("stream open")
        .expect("frame");
    let first = String::from_utf8_lossy(&first).to_string();
    assert!(first.contains("event: snapshot"), "{first}");
    assert!(first.contains("data: []"), "{first}");

    send(
        &app,
        json_request("POST", "/api/receipts", json!({"store_name": "Bookshop"}), None),
    )
    .await;

    let next = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("snapshot after save")
        .expect("stream open")
        .expect("frame");
    let next = String::from_utf8_lossy(&next).to_string();
    assert!(next.contains("event: snapshot"), "{next}");
    assert!(next.contains("Bookshop"), "{next}");
}

#[tokio::test]
async fn lagged_feed_resnapshots_instead_of_closing() {
    let scratch = Scratch::new("lagged");
    let app = build_app(&test_config(&scratch)).await;

    let resp = send(&app, get_request("/api/receipts/feed", None)).await;
    let mut frames = resp.into_body().into_data_stream();
    tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("initial snapshot");

    // more writes than the feed buffers while nobody polls the stream
    for n in 0..70 {
        let resp = send(
            &app,
            json_request("POST", "/api/receipts", json!({"store_name": format!("Shop {n}")}), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let next = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("snapshot after lag")
        .expect("stream open")
        .expect("frame");
    let next = String::from_utf8_lossy(&next).to_string();
    assert!(next.contains("event: snapshot"), "{next}");
    assert!(!next.contains("event: error"), "{next}");
    assert!(next.contains("Shop 69"), "{next}");
    assert!(next.contains("Shop 0"), "{next}");
}
