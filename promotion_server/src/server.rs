use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::future::{ok, Either};
use log::*;
use payos_tools::PayosApi;
use promotion_engine::{PricingApi, PromotionFlowApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    helpers::get_remote_ip,
    integrations::payos::PaymentReconciler,
    middleware::{HmacMiddlewareFactory, INTERNAL_HMAC_HEADER},
    routes::{
        health,
        ActivatePromotionRoute,
        ActivePromotionsRoute,
        CreatePaymentUrlRoute,
        CreatePromotionRoute,
        MyPromotionsRoute,
        PaymentCallbackRoute,
        PaymentWebhookRoute,
        PricingRoute,
        PromotionDetailsRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    SqliteDatabase::create_if_missing(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if !config.payos.has_credentials() {
        warn!("🪛️ PayOS credentials are not configured. Payment links cannot be created until they are.");
    }
    let payos = PayosApi::new(config.payos.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    // The worker runs for the lifetime of the process
    let _worker = start_expiry_worker(db.clone(), config.sweep_interval);
    let srv = create_server_instance(config, db, payos)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase, payos: PayosApi) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let flow_api = PromotionFlowApi::new(db.clone());
        let pricing_api = PricingApi::new(db.clone());
        let reconciler = PaymentReconciler::new(db.clone(), config.payos.checksum_key.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(pricing_api))
            .app_data(web::Data::new(reconciler))
            .app_data(web::Data::new(payos.clone()));
        // Routes for sellers. Identity is forwarded by the authenticating proxy.
        let seller_scope = web::scope("/api")
            .service(CreatePromotionRoute::<SqliteDatabase>::new())
            .service(MyPromotionsRoute::<SqliteDatabase>::new())
            .service(PromotionDetailsRoute::<SqliteDatabase>::new())
            .service(CreatePaymentUrlRoute::<SqliteDatabase>::new());
        let internal_scope = web::scope("/internal")
            .wrap(HmacMiddlewareFactory::new(
                INTERNAL_HMAC_HEADER,
                config.internal_hmac_secret.clone(),
                config.internal_hmac_checks,
            ))
            .service(ActivatePromotionRoute::<SqliteDatabase>::new());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let payos_whitelist = config.payos_whitelist.clone();
        let webhook_scope = web::scope("/payment/webhook")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = match (peer_ip, &payos_whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        info!("💻️ PayOS webhook from {ip}");
                        whitelist.contains(&ip)
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("💻️ No IP address found in PayOS webhook request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    Either::Left(srv.call(req))
                } else {
                    warn!("💻️ Rejected PayOS webhook from {peer_ip:?}. The address is not whitelisted.");
                    let err = ServerError::InsufficientPermissions("Webhook caller is not whitelisted".into());
                    Either::Right(ok(req.error_response(err)))
                }
            })
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(PricingRoute::<SqliteDatabase>::new())
            .service(ActivePromotionsRoute::<SqliteDatabase>::new())
            .service(PaymentCallbackRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
            .service(seller_scope)
            .service(internal_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
