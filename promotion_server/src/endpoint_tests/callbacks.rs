//! Payment callbacks, end to end against a real SQLite backend.
use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use lpg_common::{Secret, Vnd};
use payos_tools::signature::callback_signature;
use promotion_engine::{
    db_types::{ListingId, NewPackage, PackageType, PaymentStatus, Promotion, PromotionId, PromotionStatus, SellerId},
    test_utils::prepare_env::seeded_database,
    PricingApi,
    PromotionFlowApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::{json, send_request};
use crate::{
    data_objects::CallbackResult,
    integrations::payos::{
        CallbackPayload,
        PaymentReconciler,
        WebhookPayload,
        MISSING_ORDER_CODE_MESSAGE,
        PROMOTION_NOT_FOUND_MESSAGE,
    },
    routes::{PaymentCallbackRoute, PaymentWebhookRoute},
};

const CHECKSUM_KEY: &str = "test-checksum-key";

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let reconciler = PaymentReconciler::new(db, Secret::new(CHECKSUM_KEY.to_string()));
        cfg.service(PaymentCallbackRoute::<SqliteDatabase>::new())
            .service(web::scope("/payment/webhook").service(PaymentWebhookRoute::<SqliteDatabase>::new()))
            .app_data(web::Data::new(reconciler));
    }
}

/// A seeded database with a pending seven-day promotion for L1, priced at 700 000₫.
async fn pending_promotion() -> (SqliteDatabase, Promotion) {
    let db = seeded_database().await;
    PricingApi::new(db.clone())
        .upsert_package(NewPackage::new(PackageType::SevenDays, Vnd::from(700_000), 7))
        .await
        .expect("Error updating catalog");
    let api = PromotionFlowApi::new(db.clone());
    let now = Utc::now();
    let result = api
        .create_request(&ListingId::new("L1"), PackageType::SevenDays, &SellerId::new("S1"))
        .await
        .expect("Error creating promotion");
    assert_eq!(result.amount, Vnd::from(700_000));
    assert_eq!(result.duration_days, 7);
    assert!((result.end_date - (now + Duration::days(7))).num_seconds().abs() < 5);
    let promotion = fetch(&db, &result.promotion_id).await;
    assert_eq!(promotion.status, PromotionStatus::Pending);
    (db, promotion)
}

async fn fetch(db: &SqliteDatabase, id: &PromotionId) -> Promotion {
    PromotionFlowApi::new(db.clone()).get_details(id, None).await.expect("Error fetching promotion")
}

fn webhook(body: Value) -> TestRequest {
    TestRequest::post().uri("/payment/webhook").set_json(body)
}

fn result(body: &str) -> CallbackResult {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Not a callback result ({e}): {body}"))
}

#[actix_web::test]
async fn webhook_activates_promotion() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let body = json!({"code": "00", "desc": "success", "data": {"orderCode": promotion.payment_reference, "status": "PAID"}});
    let (status, body) = send_request(webhook(body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let res = result(&body);
    assert!(res.success, "{body}");
    assert_eq!(res.promotion_id, promotion.id.to_string());
    assert_eq!(res.message, "Payment successful");
    let promotion = fetch(&db, &promotion.id).await;
    assert_eq!(promotion.status, PromotionStatus::Active);
    assert_eq!(promotion.payment_status, PaymentStatus::Completed);
    assert_eq!(promotion.payment_method.as_deref(), Some("payos"));
    let started = promotion.start_date.expect("Active promotions have a start date");
    assert!((Utc::now() - started).num_seconds().abs() < 5);
}

#[actix_web::test]
async fn signed_webhook_records_gateway_reference() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let data = json!({
        "orderCode": promotion.payment_reference,
        "amount": 700000,
        "reference": "FT24061000001",
        "status": "PAID"
    });
    let data = data.as_object().cloned().unwrap();
    let signature = callback_signature(CHECKSUM_KEY, "00", "success", &data).unwrap();
    let body = json!({"code": "00", "desc": "success", "data": data, "signature": signature});
    let (_, body) = send_request(webhook(body), configure(db.clone())).await;
    assert!(result(&body).success, "{body}");
    let promotion = fetch(&db, &promotion.id).await;
    assert_eq!(promotion.payment_transaction_id.as_deref(), Some("FT24061000001"));
}

#[actix_web::test]
async fn mismatched_signature_still_follows_declared_status() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let body = json!({
        "code": "00",
        "desc": "success",
        "data": {"orderCode": promotion.payment_reference, "amount": 1, "status": "PAID"},
        "signature": "00ff"
    });
    let (_, body) = send_request(webhook(body), configure(db.clone())).await;
    assert!(result(&body).success, "{body}");
    assert_eq!(fetch(&db, &promotion.id).await.status, PromotionStatus::Active);
}

#[actix_web::test]
async fn webhook_replays_are_harmless() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let body = json!({"code": "00", "desc": "success", "data": {"orderCode": promotion.payment_reference, "reference": "FT1"}});
    let (_, first) = send_request(webhook(body.clone()), configure(db.clone())).await;
    assert!(result(&first).success);
    let after_first = fetch(&db, &promotion.id).await;
    let (_, second) = send_request(webhook(body), configure(db.clone())).await;
    assert!(result(&second).success);
    let after_second = fetch(&db, &promotion.id).await;
    assert_eq!(after_first.start_date, after_second.start_date);
    assert_eq!(after_second.payment_transaction_id.as_deref(), Some("FT1"));
}

#[actix_web::test]
async fn return_redirect_activates_promotion() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let uri = format!(
        "/payment/callback?code=00&id=link-42&cancel=false&status=PAID&orderCode={}",
        promotion.payment_reference
    );
    let (status, body) = send_request(TestRequest::get().uri(&uri), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(result(&body).success, "{body}");
    let promotion = fetch(&db, &promotion.id).await;
    assert_eq!(promotion.status, PromotionStatus::Active);
    assert_eq!(promotion.payment_transaction_id.as_deref(), Some("link-42"));
}

#[actix_web::test]
async fn unsigned_return_redirect_without_status() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let uri = format!("/payment/callback?code=00&cancel=false&orderCode={}", promotion.payment_reference);
    let (_, body) = send_request(TestRequest::get().uri(&uri), configure(db.clone())).await;
    assert!(result(&body).success, "{body}");
    assert_eq!(fetch(&db, &promotion.id).await.status, PromotionStatus::Active);
}

#[actix_web::test]
async fn cancelled_return_redirect() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let uri = format!("/payment/callback?code=00&cancel=true&orderCode={}", promotion.payment_reference);
    let (status, body) = send_request(TestRequest::get().uri(&uri), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let res = result(&body);
    assert!(!res.success);
    assert_eq!(res.promotion_id, promotion.id.to_string());
    assert_eq!(res.message, "Payment failed. Status: CANCELLED");
    let promotion = fetch(&db, &promotion.id).await;
    assert_eq!(promotion.status, PromotionStatus::Cancelled);
    assert_eq!(promotion.payment_status, PaymentStatus::Failed);
}

#[actix_web::test]
async fn late_cancel_does_not_undo_payment() {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let body = json!({"code": "00", "desc": "success", "data": {"orderCode": promotion.payment_reference}});
    let _ = send_request(webhook(body), configure(db.clone())).await;
    let uri = format!("/payment/callback?cancel=true&orderCode={}", promotion.payment_reference);
    let (_, body) = send_request(TestRequest::get().uri(&uri), configure(db.clone())).await;
    assert!(!result(&body).success);
    let promotion = fetch(&db, &promotion.id).await;
    assert_eq!(promotion.status, PromotionStatus::Active);
    assert_eq!(promotion.payment_status, PaymentStatus::Completed);
}

#[actix_web::test]
async fn missing_order_code() {
    let _ = env_logger::try_init().ok();
    let db = seeded_database().await;
    let (status, body) =
        send_request(TestRequest::get().uri("/payment/callback?code=00&cancel=false"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let res = result(&body);
    assert!(!res.success);
    assert_eq!(res.promotion_id, "");
    assert_eq!(res.message, MISSING_ORDER_CODE_MESSAGE);
    assert!(res.message.contains("order code"));
}

#[actix_web::test]
async fn unknown_order_code() {
    let _ = env_logger::try_init().ok();
    let db = seeded_database().await;
    let body = json!({"code": "00", "desc": "success", "data": {"orderCode": 111111111, "status": "PAID"}});
    let (status, body) = send_request(webhook(body), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let res = result(&body);
    assert!(!res.success);
    assert_eq!(res.promotion_id, "111111111");
    assert_eq!(res.message, PROMOTION_NOT_FOUND_MESSAGE);
}

#[actix_web::test]
async fn unreadable_webhook_body() {
    let _ = env_logger::try_init().ok();
    let db = seeded_database().await;
    let req = TestRequest::post()
        .uri("/payment/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json");
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], false);
}

#[actix_web::test]
async fn late_payment_for_expired_promotion() -> anyhow::Result<()> {
    let _ = env_logger::try_init().ok();
    let (db, promotion) = pending_promotion().await;
    let reconciler = PaymentReconciler::new(db.clone(), Secret::new(CHECKSUM_KEY.to_string()));
    let paid = |order_code: i64| -> anyhow::Result<CallbackPayload> {
        let cb = serde_json::from_value(json!({"code": "00", "desc": "success", "data": {"orderCode": order_code}}))?;
        Ok(CallbackPayload::Webhook(WebhookPayload(cb)))
    };
    assert!(reconciler.reconcile(paid(promotion.payment_reference)?).await.success);
    let expired = PromotionFlowApi::new(db.clone()).sweep_expired(Utc::now() + Duration::days(8)).await?;
    assert_eq!(expired, 1);
    let res = reconciler.reconcile(paid(promotion.payment_reference)?).await;
    assert!(!res.success);
    assert!(res.message.contains("expired"), "{}", res.message);
    assert_eq!(fetch(&db, &promotion.id).await.status, PromotionStatus::Expired);
    Ok(())
}

#[actix_web::test]
async fn paying_a_second_request_keeps_it_pending() -> anyhow::Result<()> {
    let _ = env_logger::try_init().ok();
    let (db, first) = pending_promotion().await;
    let api = PromotionFlowApi::new(db.clone());
    let second = api.create_request(&ListingId::new("L1"), PackageType::OneDay, &SellerId::new("S1")).await?;
    let second = fetch(&db, &second.promotion_id).await;
    let paid = |order_code: i64| json!({"code": "00", "desc": "success", "data": {"orderCode": order_code}});
    let (_, body) = send_request(webhook(paid(first.payment_reference)), configure(db.clone())).await;
    assert!(result(&body).success, "{body}");
    let (status, body) = send_request(webhook(paid(second.payment_reference)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let res = result(&body);
    assert!(!res.success, "{body}");
    assert_eq!(res.promotion_id, second.id.to_string());
    assert!(res.message.contains("another active promotion"), "{}", res.message);
    assert_eq!(fetch(&db, &second.id).await.status, PromotionStatus::Pending);
    assert_eq!(api.active_promotions_for_listing(&ListingId::new("L1")).await?.len(), 1);
    Ok(())
}
