//! In-app notifications: automatic notices, admin sends, per-user feed

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use canteen_server::api::build_app;
use canteen_server::db::repository::{notification as repo, user as user_repo};
use common::*;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use shared::models::{
    CartLine, NotificationKind, NotificationSend, NotificationSettingsUpdate, OrderStatus, Role,
    User,
};
use shared::{ErrorCode, Money};
use tower::ServiceExt;

async fn feed(ctx: &TestContext, user_id: i64) -> Vec<shared::models::Notification> {
    repo::find_for_user(ctx.state.pool(), user_id, false, 100, 0)
        .await
        .unwrap()
}

async fn place(ctx: &TestContext, user: &User, item_id: i64) -> i64 {
    ctx.state
        .coordinator
        .place_order(
            user.id,
            &[CartLine {
                item_id,
                quantity: 1,
            }],
        )
        .await
        .unwrap()
        .order
        .order
        .id
}

fn send_to(user_ids: Vec<i64>, kind: NotificationKind) -> NotificationSend {
    NotificationSend {
        title: "Canteen notice".into(),
        message: "Closed on Friday".into(),
        kind,
        user_ids: Some(user_ids),
        broadcast: false,
    }
}

#[tokio::test]
async fn test_ready_and_cancelled_orders_notify_owner() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 200).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 30, true).await;

    let first = place(&ctx, &student, item.id).await;
    let second = place(&ctx, &student, item.id).await;

    state
        .workflow
        .advance_order(first, Role::Staff, OrderStatus::Preparing)
        .await
        .unwrap();
    assert!(feed(&ctx, student.id).await.is_empty());

    state
        .workflow
        .advance_order(first, Role::Staff, OrderStatus::Ready)
        .await
        .unwrap();
    state
        .workflow
        .advance_order(second, Role::Admin, OrderStatus::Cancelled)
        .await
        .unwrap();
    state
        .workflow
        .advance_order(first, Role::Staff, OrderStatus::Delivered)
        .await
        .unwrap();

    let rows = feed(&ctx, student.id).await;
    assert_eq!(rows.len(), 2);
    // newest first
    assert_eq!(rows[0].title, "Order cancelled");
    assert_eq!(rows[1].title, "Order ready");
    assert!(rows.iter().all(|n| n.kind == NotificationKind::Order && !n.is_read));
}

#[tokio::test]
async fn test_muted_order_updates_drop_notice_but_not_info() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = funded_student(state, 100).await;
    let category = create_category(state).await;
    let item = create_item(state, &category, 20, true).await;

    let settings = state
        .notifier
        .update_settings(
            student.id,
            &NotificationSettingsUpdate {
                order_updates: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!settings.order_updates);
    assert!(settings.wallet_updates);

    let order_id = place(&ctx, &student, item.id).await;
    for status in [OrderStatus::Preparing, OrderStatus::Ready] {
        state
            .workflow
            .advance_order(order_id, Role::Staff, status)
            .await
            .unwrap();
    }
    assert!(feed(&ctx, student.id).await.is_empty());

    let stored = state
        .notifier
        .send(&send_to(vec![student.id], NotificationKind::Order))
        .await
        .unwrap();
    assert_eq!(stored, 0);

    let stored = state
        .notifier
        .send(&send_to(vec![student.id], NotificationKind::Info))
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn test_read_and_delete_are_scoped_to_owner() {
    let ctx = setup().await;
    let notifier = &ctx.state.notifier;
    let owner = insert_user(&ctx.state, Role::User).await;
    let other = insert_user(&ctx.state, Role::User).await;

    let first = notifier
        .notify(owner.id, NotificationKind::System, "One", "First")
        .await
        .unwrap()
        .unwrap();
    notifier
        .notify(owner.id, NotificationKind::System, "Two", "Second")
        .await
        .unwrap()
        .unwrap();

    let err = notifier.mark_read(other.id, first.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotificationNotFound);
    let err = notifier.delete(other.id, first.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotificationNotFound);

    let read = notifier.mark_read(owner.id, first.id).await.unwrap();
    assert!(read.is_read);
    assert_eq!(notifier.mark_all_read(owner.id).await.unwrap(), 1);
    assert_eq!(notifier.mark_all_read(owner.id).await.unwrap(), 0);

    notifier.delete(owner.id, first.id).await.unwrap();
    let err = notifier.delete(owner.id, first.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotificationNotFound);

    let rows = feed(&ctx, owner.id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Two");
}

#[tokio::test]
async fn test_broadcast_reaches_active_students_only() {
    let ctx = setup().await;
    let state = &ctx.state;
    let admin = insert_user(state, Role::Admin).await;
    let staff = insert_user(state, Role::Staff).await;
    let a = insert_user(state, Role::User).await;
    let b = insert_user(state, Role::User).await;
    let inactive = insert_user(state, Role::User).await;
    user_repo::update(
        state.pool(),
        inactive.id,
        user_repo::UserPatch {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let stored = state
        .notifier
        .send(&NotificationSend {
            title: "Holiday".into(),
            message: "Canteen closed on Friday".into(),
            kind: NotificationKind::System,
            user_ids: None,
            broadcast: true,
        })
        .await
        .unwrap();
    assert_eq!(stored, 2);

    for user in [&a, &b] {
        assert_eq!(feed(&ctx, user.id).await.len(), 1);
    }
    for user in [&admin, &staff, &inactive] {
        assert!(feed(&ctx, user.id).await.is_empty());
    }
}

#[tokio::test]
async fn test_targeted_send_dedups_and_rolls_back_on_unknown_user() {
    let ctx = setup().await;
    let state = &ctx.state;
    let student = insert_user(state, Role::User).await;
    let staff = insert_user(state, Role::Staff).await;

    let stored = state
        .notifier
        .send(&send_to(
            vec![student.id, student.id, staff.id],
            NotificationKind::Promotion,
        ))
        .await
        .unwrap();
    assert_eq!(stored, 2);

    let unknown = student.id.max(staff.id) + 1000;
    let err = state
        .notifier
        .send(&send_to(vec![student.id, unknown], NotificationKind::Info))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UserNotFound);
    assert_eq!(feed(&ctx, student.id).await.len(), 1);

    let err = state
        .notifier
        .send(&send_to(Vec::new(), NotificationKind::Info))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let mut blank = send_to(vec![student.id], NotificationKind::Info);
    blank.title = "   ".into();
    let err = state.notifier.send(&blank).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn test_stats_counts_by_kind() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = insert_user(state, Role::User).await;
    let b = insert_user(state, Role::User).await;

    state
        .notifier
        .send(&send_to(vec![a.id, b.id], NotificationKind::Promotion))
        .await
        .unwrap();
    let info = state
        .notifier
        .notify(a.id, NotificationKind::Info, "Hello", "Welcome")
        .await
        .unwrap()
        .unwrap();
    state.notifier.mark_read(a.id, info.id).await.unwrap();

    let stats = state.notifier.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.unread, 2);
    assert_eq!(stats.read_rate, 33.33);
    assert_eq!(stats.by_kind.get(&NotificationKind::Promotion), Some(&2));
    assert_eq!(stats.by_kind.get(&NotificationKind::Info), Some(&1));
    assert_eq!(stats.recent.first().map(|n| n.id), Some(info.id));
}

// ========== HTTP ==========

fn app(ctx: &TestContext) -> Router {
    build_app(&ctx.state).with_state(ctx.state.clone())
}

fn token_for(ctx: &TestContext, user: &User) -> String {
    ctx.state.jwt_service.generate_access_token(user).unwrap()
}

async fn call(app: &Router, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_feed_and_settings_over_http() {
    let ctx = setup().await;
    let student = insert_user(&ctx.state, Role::User).await;
    let token = token_for(&ctx, &student);
    let app = app(&ctx);

    let mut ids = Vec::new();
    for n in 0..3 {
        let row = ctx
            .state
            .notifier
            .notify(student.id, NotificationKind::System, &format!("Notice {n}"), "Body")
            .await
            .unwrap()
            .unwrap();
        ids.push(row.id);
    }

    let (status, _) = call(&app, "PUT", &format!("/api/notifications/{}/read", ids[0]), &token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "GET", "/api/notifications?unreadOnly=true&page=1&limit=1", &token, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["notifications"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["notifications"][0]["title"], "Notice 2");
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["pages"], 2);

    let (_, body) = call(&app, "GET", "/api/notifications", &token, None).await;
    assert_eq!(body["pagination"]["total"], 3);

    let (status, body) = call(&app, "PUT", "/api/notifications/read-all", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let (status, body) = call(&app, "DELETE", &format!("/api/notifications/{}", ids[1]), &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Bool(true));
    let (status, body) = call(&app, "DELETE", &format!("/api/notifications/{}", ids[1]), &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 7001);

    let (_, body) = call(&app, "GET", "/api/notifications/settings", &token, None).await;
    assert_eq!(body["order_updates"], true);
    assert_eq!(body["push_notifications"], false);

    let (status, body) = call(
        &app,
        "PUT",
        "/api/notifications/settings",
        &token,
        Some(json!({ "promotions": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["promotions"], false);
    assert_eq!(body["wallet_updates"], true);

    let (_, body) = call(&app, "GET", "/api/notifications/settings", &token, None).await;
    assert_eq!(body["promotions"], false);
}

#[tokio::test]
async fn test_send_and_stats_are_admin_only() {
    let ctx = setup().await;
    let admin = insert_user(&ctx.state, Role::Admin).await;
    let staff = insert_user(&ctx.state, Role::Staff).await;
    let student = insert_user(&ctx.state, Role::User).await;
    let app = app(&ctx);
    let payload = json!({ "title": "Menu", "message": "New items today", "broadcast": true });

    for user in [&student, &staff] {
        let token = token_for(&ctx, user);
        let (status, _) = call(&app, "POST", "/api/notifications/send", &token, Some(payload.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, "GET", "/api/notifications/stats", &token, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let token = token_for(&ctx, &admin);
    let (status, body) = call(&app, "POST", "/api/notifications/send", &token, Some(payload)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["count"], 1);

    let (status, body) = call(&app, "GET", "/api/notifications/stats", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["by_kind"]["INFO"], 1);
}

#[tokio::test]
async fn test_admin_recharge_notifies_student() {
    let ctx = setup().await;
    let admin = insert_user(&ctx.state, Role::Admin).await;
    let student = insert_user(&ctx.state, Role::User).await;
    let app = app(&ctx);

    let (status, body) = call(
        &app,
        "POST",
        "/api/wallet/recharge",
        &token_for(&ctx, &admin),
        Some(json!({ "user_code": student.user_code, "amount": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let rows = feed(&ctx, student.id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, NotificationKind::Wallet);
    assert!(rows[0].message.contains("150.00"));
    assert_eq!(balance_of(&ctx.state, student.id).await, Money::from_major(150));
}
