use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use lpg_common::Secret;
use promotion_engine::{db_types::PromotionStatus, PromotionFlowApi};

use super::{
    helpers::{json, send_request},
    mocks::{live_promotion, pending_promotion, MockBackend},
};
use crate::{
    helpers::calculate_hmac,
    middleware::{HmacMiddlewareFactory, INTERNAL_HMAC_HEADER},
    routes::ActivatePromotionRoute,
};

const SECRET: &str = "internal-test-secret";
const BODY: &str = r#"{"promotionId":"p1","transactionId":"FT0001"}"#;

fn configure(backend: MockBackend, checks: bool) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(
            web::scope("/internal")
                .wrap(HmacMiddlewareFactory::new(INTERNAL_HMAC_HEADER, Secret::new(SECRET.to_string()), checks))
                .service(ActivatePromotionRoute::<MockBackend>::new()),
        )
        .app_data(web::Data::new(PromotionFlowApi::new(backend)));
    }
}

fn activating_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_activate_promotion()
        .withf(|id, payment, _| id.as_str() == "p1" && payment.transaction_id.as_deref() == Some("FT0001"))
        .times(1)
        .returning(|id, _, _| Ok(Some(live_promotion(id.as_str()))));
    backend
}

fn activation_request(signature: Option<&str>) -> TestRequest {
    let mut req = TestRequest::post()
        .uri("/internal/promotions/activate")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(BODY);
    if let Some(sig) = signature {
        req = req.insert_header((INTERNAL_HMAC_HEADER, sig.to_string()));
    }
    req
}

#[actix_web::test]
async fn signed_activation() {
    let _ = env_logger::try_init().ok();
    let sig = calculate_hmac(SECRET, BODY.as_bytes()).unwrap();
    let (status, body) = send_request(activation_request(Some(&sig)), configure(activating_backend(), true)).await;
    assert_eq!(status, StatusCode::OK);
    let promotion = json(&body);
    assert_eq!(promotion["id"], "p1");
    assert_eq!(promotion["status"], "active");
    assert_eq!(promotion["isActive"], true);
}

#[actix_web::test]
async fn activating_an_active_promotion_returns_it() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_activate_promotion().returning(|_, _, _| Ok(None));
    backend.expect_fetch_promotion().returning(|id| Ok(Some(live_promotion(id.as_str()))));
    let sig = calculate_hmac(SECRET, BODY.as_bytes()).unwrap();
    let (status, body) = send_request(activation_request(Some(&sig)), configure(backend, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["paymentTransactionId"], "FT0001");
}

#[actix_web::test]
async fn expired_promotions_cannot_be_activated() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_activate_promotion().returning(|_, _, _| Ok(None));
    backend.expect_fetch_promotion().returning(|id| {
        let mut p = live_promotion(id.as_str());
        p.status = PromotionStatus::Expired;
        Ok(Some(p))
    });
    let sig = calculate_hmac(SECRET, BODY.as_bytes()).unwrap();
    let (status, body) = send_request(activation_request(Some(&sig)), configure(backend, true)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("expired"), "{body}");
}

#[actix_web::test]
async fn second_paid_request_for_a_promoted_listing_conflicts() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_activate_promotion().returning(|_, _, _| Ok(None));
    backend.expect_fetch_promotion().returning(|id| Ok(Some(pending_promotion(id.as_str()))));
    backend
        .expect_fetch_live_promotions()
        .withf(|listing, _| listing.as_ref().map(|l| l.as_str()) == Some("L1"))
        .returning(|_, _| Ok(vec![live_promotion("p0")]));
    let sig = calculate_hmac(SECRET, BODY.as_bytes()).unwrap();
    let (status, body) = send_request(activation_request(Some(&sig)), configure(backend, true)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("another active promotion"), "{body}");
}

#[actix_web::test]
async fn unsigned_activation_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_activate_promotion().never();
    let (status, _) = send_request(activation_request(None), configure(backend, true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn badly_signed_activation_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_activate_promotion().never();
    let sig = calculate_hmac("some-other-secret", BODY.as_bytes()).unwrap();
    let (status, _) = send_request(activation_request(Some(&sig)), configure(backend, true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn hmac_checks_can_be_disabled() {
    let _ = env_logger::try_init().ok();
    let (status, _) = send_request(activation_request(None), configure(activating_backend(), false)).await;
    assert_eq!(status, StatusCode::OK);
}
