use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use lpg_common::Vnd;
use payos_tools::{PayosApi, PayosConfig};
use promotion_engine::{
    db_types::{ListingId, NewPromotion, PackageType, Promotion, SellerId},
    PricingApi,
    PromotionError,
    PromotionFlowApi,
};
use serde_json::json;

use super::{
    helpers::{json, send_request},
    mocks::{listing, live_promotion, package, pending_promotion, MockBackend},
};
use crate::routes::{
    health,
    ActivePromotionsRoute,
    CreatePaymentUrlRoute,
    CreatePromotionRoute,
    MyPromotionsRoute,
    PricingRoute,
    PromotionDetailsRoute,
};

fn configure(backend: MockBackend, pricing: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let payos = PayosApi::new(PayosConfig::default()).unwrap();
        cfg.service(health)
            .service(PricingRoute::<MockBackend>::new())
            .service(ActivePromotionsRoute::<MockBackend>::new())
            .service(
                web::scope("/api")
                    .service(CreatePromotionRoute::<MockBackend>::new())
                    .service(MyPromotionsRoute::<MockBackend>::new())
                    .service(PromotionDetailsRoute::<MockBackend>::new())
                    .service(CreatePaymentUrlRoute::<MockBackend>::new()),
            )
            .app_data(web::Data::new(PromotionFlowApi::new(backend)))
            .app_data(web::Data::new(PricingApi::new(pricing)))
            .app_data(web::Data::new(payos));
    }
}

fn with_backend(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    configure(backend, MockBackend::new())
}

fn inserted(p: NewPromotion) -> Promotion {
    Promotion {
        listing_id: p.listing_id,
        seller_id: p.seller_id,
        package_type: p.package_type,
        amount: p.amount,
        end_date: p.end_date,
        ..pending_promotion("p-new")
    }
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/health"), with_backend(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn pricing_lists_price_per_day() {
    let _ = env_logger::try_init().ok();
    let mut pricing = MockBackend::new();
    pricing.expect_fetch_active_packages().returning(|| {
        Ok(vec![package(PackageType::OneDay, 50_000, 1), package(PackageType::ThreeDays, 300_000, 3)])
    });
    let (status, body) =
        send_request(TestRequest::get().uri("/promotions/pricing"), configure(MockBackend::new(), pricing)).await;
    assert_eq!(status, StatusCode::OK);
    let packages = json(&body);
    assert_eq!(packages[1]["packageType"], "three_days");
    assert_eq!(packages[1]["price"], 300_000);
    assert_eq!(packages[1]["durationDays"], 3);
    assert_eq!(packages[1]["pricePerDay"].as_f64(), Some(100_000.0));
}

#[actix_web::test]
async fn active_promotions_for_a_listing() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_live_promotions()
        .withf(|listing_id, _| listing_id == &Some(ListingId::new("L1")))
        .times(1)
        .returning(|_, _| Ok(vec![live_promotion("p1")]));
    let (status, body) =
        send_request(TestRequest::get().uri("/promotions/active?listing_id=L1"), with_backend(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let promotions = json(&body);
    assert_eq!(promotions.as_array().map(|a| a.len()), Some(1));
    assert_eq!(promotions[0]["id"], "p1");
    assert_eq!(promotions[0]["isActive"], true);
    assert_eq!(promotions[0]["daysRemaining"], 7);
}

#[actix_web::test]
async fn all_active_promotions() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_live_promotions().withf(|listing_id, _| listing_id.is_none()).returning(|_, _| Ok(vec![]));
    let (status, body) = send_request(TestRequest::get().uri("/promotions/active"), with_backend(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn create_promotion_requires_seller() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/promotions")
        .set_json(json!({"listingId": "L1", "packageType": "seven_days"}));
    let (status, body) = send_request(req, with_backend(MockBackend::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("X-Seller-Id"), "{body}");
}

#[actix_web::test]
async fn create_promotion_rejects_unknown_package() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/promotions")
        .insert_header(("X-Seller-Id", "S1"))
        .set_json(json!({"listingId": "L1", "packageType": "fortnight"}));
    let (status, body) = send_request(req, with_backend(MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("fortnight"), "{body}");
}

#[actix_web::test]
async fn create_promotion() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_listing().returning(|id| Ok(Some(listing(id.as_str(), "S1", "approved"))));
    backend
        .expect_fetch_package()
        .withf(|pt| *pt == PackageType::SevenDays)
        .returning(|pt| Ok(Some(package(pt, 700_000, 7))));
    backend
        .expect_insert_promotion()
        .withf(|p, now| {
            p.amount == Vnd::from(700_000) &&
                p.seller_id == SellerId::new("S1") &&
                p.end_date - *now == chrono::Duration::days(7)
        })
        .times(1)
        .returning(|p, _| Ok(inserted(p)));
    let req = TestRequest::post()
        .uri("/api/promotions")
        .insert_header(("X-Seller-Id", "S1"))
        .set_json(json!({"listingId": "L1", "packageType": "7_days"}));
    let (status, body) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::CREATED);
    let result = json(&body);
    assert_eq!(result["promotionId"], "p-new");
    assert_eq!(result["amount"], 700_000);
    assert_eq!(result["packageType"], "seven_days");
    assert_eq!(result["durationDays"], 7);
    assert_eq!(result["paymentUrl"], "/promotions/p-new/pay");
}

#[actix_web::test]
async fn create_promotion_for_someone_elses_listing() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_listing().returning(|id| Ok(Some(listing(id.as_str(), "S2", "approved"))));
    backend.expect_insert_promotion().never();
    let req = TestRequest::post()
        .uri("/api/promotions")
        .insert_header(("X-Seller-Id", "S1"))
        .set_json(json!({"listingId": "L3", "packageType": "one_day"}));
    let (status, _) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn create_promotion_for_unapproved_listing() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_listing().returning(|id| Ok(Some(listing(id.as_str(), "S1", "pending"))));
    backend.expect_insert_promotion().never();
    let req = TestRequest::post()
        .uri("/api/promotions")
        .insert_header(("X-Seller-Id", "S1"))
        .set_json(json!({"listingId": "L4", "packageType": "one_day"}));
    let (status, _) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn create_promotion_while_one_is_live() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_listing().returning(|id| Ok(Some(listing(id.as_str(), "S1", "approved"))));
    backend.expect_fetch_package().returning(|pt| Ok(Some(package(pt, 50_000, 1))));
    backend
        .expect_insert_promotion()
        .returning(|p, _| Err(PromotionError::ActivePromotionExists(p.listing_id)));
    let req = TestRequest::post()
        .uri("/api/promotions")
        .insert_header(("X-Seller-Id", "S1"))
        .set_json(json!({"listingId": "L1", "packageType": "one_day"}));
    let (status, body) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already has an active promotion"), "{body}");
}

#[actix_web::test]
async fn my_promotions() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_promotions_for_seller()
        .withf(|seller| seller.as_str() == "S1")
        .returning(|_| Ok(vec![live_promotion("p2"), pending_promotion("p1")]));
    let req = TestRequest::get().uri("/api/promotions/mine").insert_header(("X-Seller-Id", "S1"));
    let (status, body) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let promotions = json(&body);
    assert_eq!(promotions[0]["id"], "p2");
    assert_eq!(promotions[0]["status"], "active");
    assert_eq!(promotions[1]["id"], "p1");
    assert_eq!(promotions[1]["isActive"], false);
    assert_eq!(promotions[1]["daysRemaining"], 0);
}

#[actix_web::test]
async fn promotion_details() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_promotion().returning(|id| Ok(Some(live_promotion(id.as_str()))));
    let req = TestRequest::get().uri("/api/promotions/p1").insert_header(("X-Seller-Id", "S1"));
    let (status, body) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let promotion = json(&body);
    assert_eq!(promotion["id"], "p1");
    assert_eq!(promotion["paymentMethod"], "payos");
    assert_eq!(promotion["isExpired"], false);
}

#[actix_web::test]
async fn promotion_details_are_private() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_promotion().returning(|id| Ok(Some(live_promotion(id.as_str()))));
    let req = TestRequest::get().uri("/api/promotions/p1").insert_header(("X-Seller-Id", "S2"));
    let (status, _) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_promotion() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_promotion().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/promotions/nope").insert_header(("X-Seller-Id", "S1"));
    let (status, _) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn paid_promotions_cannot_be_paid_again() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_promotion().returning(|id| Ok(Some(live_promotion(id.as_str()))));
    backend.expect_fetch_listing().never();
    let req = TestRequest::post().uri("/api/payment/create/p1").insert_header(("X-Seller-Id", "S1"));
    let (status, body) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already been paid"), "{body}");
}

#[actix_web::test]
async fn payment_links_are_only_for_the_owner() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_promotion().returning(|id| Ok(Some(pending_promotion(id.as_str()))));
    let req = TestRequest::post().uri("/api/payment/create/p1").insert_header(("X-Seller-Id", "S2"));
    let (status, _) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_links_need_gateway_credentials() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_promotion().returning(|id| Ok(Some(pending_promotion(id.as_str()))));
    backend.expect_fetch_listing().returning(|id| Ok(Some(listing(id.as_str(), "S1", "approved"))));
    let req = TestRequest::post().uri("/api/payment/create/p1").insert_header(("X-Seller-Id", "S1"));
    let (status, body) = send_request(req, with_backend(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("credentials"), "{body}");
}
