//! HTTP API integration tests
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`.
//!
//! Run with: cargo test -p pairwatch-api --test http_api

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{call, room_token, send, site_token, test_state, CDN};
use serde_json::json;

const BOUNDARY: &str = "pairwatch-test-boundary";

fn multipart_upload(token: &str, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/content")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let state = test_state().await;
    let (status, body) = call(&state, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_site_auth() {
    let state = test_state().await;

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/site-auth",
        None,
        Some(json!({ "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid site password");

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/site-auth",
        None,
        Some(json!({ "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid password format");

    let token = site_token(&state).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_site_gate_protects_api() {
    let state = test_state().await;

    let (status, body) = call(&state, Method::GET, "/api/content", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = call(&state, Method::GET, "/api/content", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A room token is not a site token
    let site = site_token(&state).await;
    let (_, room) = room_token(&state, &site, "demo", "password").await;
    let (status, _) = call(&state, Method::GET, "/api/content", Some(&room), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_and_stream_content() {
    let state = test_state().await;
    let site = site_token(&state).await;

    let (status, body) = call(&state, Method::GET, "/api/content", Some(&site), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let content = body["content"].as_array().unwrap();
    assert_eq!(content.len(), 8);
    assert_eq!(content[0]["title"], "Big Buck Bunny");
    assert_eq!(content[0]["contentType"], "movie");

    let (status, body) = call(&state, Method::GET, "/api/content/1/stream", Some(&site), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], format!("{CDN}big_buck_bunny.mp4"));

    let (status, body) =
        call(&state, Method::GET, "/api/content/1/thumbnail", Some(&site), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], format!("{CDN}big_buck_bunny.jpg"));

    let (status, _) = call(&state, Method::GET, "/api/content/999/stream", Some(&site), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&state, Method::GET, "/api/content/abc/stream", Some(&site), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_and_delete_content() {
    let state = test_state().await;
    let site = site_token(&state).await;

    let (status, body) = send(
        &state,
        multipart_upload(
            &site,
            &[("contentType", "tv"), ("duration", "42")],
            Some(("holiday_clip.mp4", b"not really a video".as_slice())),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let video = &body["content"];
    assert_eq!(video["title"], "holiday_clip");
    assert_eq!(video["contentType"], "tv");
    assert_eq!(video["duration"], 42);
    assert!(video["fileKey"].as_str().unwrap().starts_with("media/"));
    let id = video["id"].as_u64().unwrap();

    // Uploads have no thumbnail
    let uri = format!("/api/content/{id}/thumbnail");
    let (status, _) = call(&state, Method::GET, &uri, Some(&site), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&state, Method::GET, "/api/content", Some(&site), None).await;
    assert_eq!(body["content"].as_array().unwrap().len(), 9);

    let uri = format!("/api/content/{id}");
    let (status, body) = call(&state, Method::DELETE, &uri, Some(&site), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = call(&state, Method::DELETE, &uri, Some(&site), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_rejections() {
    let state = test_state().await;
    let site = site_token(&state).await;

    let (status, body) = send(&state, multipart_upload(&site, &[("title", "x")], None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");

    let (status, _) = send(
        &state,
        multipart_upload(&site, &[], Some(("notes.txt", b"hello".as_slice()))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Configured limit is 1 KiB
    let big = vec![0_u8; 2048];
    let (status, _) = send(&state, multipart_upload(&site, &[], Some(("big.mp4", big.as_slice())))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_room() {
    let state = test_state().await;
    let site = site_token(&state).await;

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/rooms",
        Some(&site),
        Some(json!({ "name": "movie-night", "password": "popcorn", "contentId": "2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["name"], "movie-night");
    assert!(body["roomId"].as_u64().is_some());

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/rooms",
        Some(&site),
        Some(json!({ "name": "movie-night", "password": "other", "contentId": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Room name already exists");

    let (status, _) = call(
        &state,
        Method::POST,
        "/api/rooms",
        Some(&site),
        Some(json!({ "name": "ghost", "password": "boo", "contentId": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/rooms",
        Some(&site),
        Some(json!({ "name": "incomplete" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");

    // The new room shows Sintel
    let (room_id, room) = room_token(&state, &site, "movie-night", "popcorn").await;
    let uri = format!("/api/video/{room_id}/sintel.mp4");
    let (status, body) = call(&state, Method::GET, &uri, Some(&room), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], format!("{CDN}sintel.mp4"));
}

#[tokio::test]
async fn test_room_auth_errors_and_capacity() {
    let state = test_state().await;
    let site = site_token(&state).await;

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/room-auth",
        Some(&site),
        Some(json!({ "name": "nowhere", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Room not found");

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/room-auth",
        Some(&site),
        Some(json!({ "name": "demo", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid password");

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/room-auth",
        Some(&site),
        Some(json!({ "name": "", "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid room credentials");

    let (room_id, _) = room_token(&state, &site, "demo", "password").await;
    let (second_room_id, _) = room_token(&state, &site, "demo", "password").await;
    assert_eq!(room_id, second_room_id);

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/room-auth",
        Some(&site),
        Some(json!({ "name": "demo", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Room is full (maximum 2 users)");
}

#[tokio::test]
async fn test_room_leave_frees_seat() {
    let state = test_state().await;
    let site = site_token(&state).await;

    let (room_id, first) = room_token(&state, &site, "demo", "password").await;
    room_token(&state, &site, "demo", "password").await;

    let (status, body) = call(&state, Method::POST, "/api/room-leave", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // The released token no longer opens anything
    let uri = format!("/api/video/{room_id}/sintel.mp4");
    let (status, _) = call(&state, Method::GET, &uri, Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Seat is free again
    room_token(&state, &site, "demo", "password").await;
}

#[tokio::test]
async fn test_video_url_access() {
    let state = test_state().await;
    let site = site_token(&state).await;
    let (room_id, room) = room_token(&state, &site, "demo", "password").await;

    let uri = format!("/api/video/{room_id}/sintel.mp4");
    let (status, body) = call(&state, Method::GET, &uri, Some(&room), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["url"], format!("{CDN}sintel.mp4"));

    // Not this room's video
    let uri = format!("/api/video/{room_id}/big_buck_bunny.mp4");
    let (status, body) = call(&state, Method::GET, &uri, Some(&room), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    // Token for another room
    let (status, _) = call(
        &state,
        Method::POST,
        "/api/rooms",
        Some(&site),
        Some(json!({ "name": "other", "password": "secret", "contentId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (other_id, _) = room_token(&state, &site, "other", "secret").await;
    let uri = format!("/api/video/{other_id}/big_buck_bunny.mp4");
    let (status, _) = call(&state, Method::GET, &uri, Some(&room), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&state, Method::GET, "/api/video/999/sintel.mp4", Some(&room), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Site tokens do not open videos
    let uri = format!("/api/video/{room_id}/sintel.mp4");
    let (status, _) = call(&state, Method::GET, &uri, Some(&site), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
