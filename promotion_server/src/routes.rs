//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! calls to the payment gateway) should be expressed as futures or asynchronous functions, so that worker threads can
//! handle other requests while they wait.
use std::collections::HashMap;

use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use payos_tools::{GatewayCallback, PayosApi};
use promotion_engine::{
    db_types::PromotionId,
    promotion_objects::PromotionView,
    PricingApi,
    PricingCatalog,
    PromotionBackend,
    PromotionFlowApi,
};

use crate::{
    auth::SellerIdentity,
    data_objects::{ActivationRequest, ActivePromotionsQuery, CallbackResult, PaymentUrlResponse, PromotionRequestParams},
    errors::ServerError,
    integrations::payos::{CallbackPayload, PaymentReconciler, ReturnChannelPayload, WebhookPayload},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Pricing  ----------------------------------------------------
route!(pricing => Get "/promotions/pricing" impl PricingCatalog);
/// The packages that are currently on sale, with their price per day.
pub async fn pricing<B: PricingCatalog>(api: web::Data<PricingApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received pricing request");
    let packages = api.list_active().await?;
    Ok(HttpResponse::Ok().json(packages))
}

//----------------------------------------------   Active promotions  ----------------------------------------------
route!(active_promotions => Get "/promotions/active" impl PromotionBackend);
/// Live promotions, optionally for a single listing (`?listing_id=`). Display layers use this to badge promoted
/// listings.
pub async fn active_promotions<B: PromotionBackend>(
    query: web::Query<ActivePromotionsQuery>,
    api: web::Data<PromotionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let listing_id = query.into_inner().listing_id;
    trace!("💻️ Received active promotions request. Listing: {listing_id:?}");
    let now = Utc::now();
    let promotions = match listing_id {
        Some(id) => api.active_promotions_for_listing(&id).await?,
        None => api.find_active(None).await?,
    };
    let views = promotions.into_iter().map(|p| PromotionView::new(p, now)).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(views))
}

//----------------------------------------------   Seller routes  ----------------------------------------------------
route!(create_promotion => Post "/promotions" impl PromotionBackend);
/// Request a promotion for one of the seller's listings. The promotion starts out pending; it becomes active once the
/// payment is confirmed.
pub async fn create_promotion<B: PromotionBackend>(
    seller: SellerIdentity,
    body: web::Json<PromotionRequestParams>,
    api: web::Data<PromotionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let package_type = params.package_type()?;
    debug!(
        "💻️ Seller {} requests a {package_type} promotion for listing {}",
        seller.seller_id(),
        params.listing_id
    );
    let result = api.create_request(&params.listing_id, package_type, seller.seller_id()).await?;
    Ok(HttpResponse::Created().json(result))
}

route!(my_promotions => Get "/promotions/mine" impl PromotionBackend);
pub async fn my_promotions<B: PromotionBackend>(
    seller: SellerIdentity,
    api: web::Data<PromotionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching promotions for seller {}", seller.seller_id());
    let now = Utc::now();
    let promotions = api.list_for_seller(seller.seller_id()).await?;
    let views = promotions.into_iter().map(|p| PromotionView::new(p, now)).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(views))
}

route!(promotion_details => Get "/promotions/{id}" impl PromotionBackend);
pub async fn promotion_details<B: PromotionBackend>(
    seller: SellerIdentity,
    path: web::Path<PromotionId>,
    api: web::Data<PromotionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ Seller {} requests details for promotion {id}", seller.seller_id());
    let promotion = api.get_details(&id, Some(seller.seller_id())).await?;
    Ok(HttpResponse::Ok().json(PromotionView::new(promotion, Utc::now())))
}

route!(create_payment_url => Post "/payment/create/{id}" impl PromotionBackend);
/// Opens a PayOS checkout for a pending promotion and returns the hosted checkout page URL.
pub async fn create_payment_url<B: PromotionBackend>(
    seller: SellerIdentity,
    path: web::Path<PromotionId>,
    api: web::Data<PromotionFlowApi<B>>,
    payos: web::Data<PayosApi>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ Seller {} requests a payment link for promotion {id}", seller.seller_id());
    let order = api.prepare_checkout(&id, seller.seller_id()).await?;
    let payment_url = payos.create_payment_link(order.order_code, order.amount, &order.description).await.map_err(|e| {
        warn!("💻️ Could not create a payment link for promotion {id}. {e}");
        e
    })?;
    info!("💻️ Payment link created for promotion {id} (order {})", order.order_code);
    Ok(HttpResponse::Ok().json(PaymentUrlResponse { payment_url }))
}

//----------------------------------------------   Internal  ----------------------------------------------------
route!(activate_promotion => Post "/promotions/activate" impl PromotionBackend);
/// Server-to-server activation trigger. Requests are authenticated by the HMAC middleware on the `/internal` scope.
/// Activating an active promotion returns it unchanged.
pub async fn activate_promotion<B: PromotionBackend>(
    body: web::Json<ActivationRequest>,
    api: web::Data<PromotionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    info!("💻️ Activation requested for promotion {}", request.promotion_id);
    let promotion = api.activate(&request.promotion_id, request.payment_details()).await?;
    Ok(HttpResponse::Ok().json(PromotionView::new(promotion, Utc::now())))
}

//----------------------------------------------   Payment callbacks  ----------------------------------------------
route!(payment_callback => Get "/payment/callback" impl PromotionBackend);
/// The PayOS return redirect. Always answers `200 OK`.
pub async fn payment_callback<B: PromotionBackend>(
    query: web::Query<HashMap<String, String>>,
    reconciler: web::Data<PaymentReconciler<B>>,
) -> HttpResponse {
    trace!("💻️ Received PayOS return redirect");
    let payload = CallbackPayload::Return(ReturnChannelPayload::from_query(query.into_inner()));
    let result = reconciler.reconcile(payload).await;
    HttpResponse::Ok().json(result)
}

route!(payment_webhook => Post "" impl PromotionBackend);
/// The PayOS webhook. Always answers `200 OK`, including for bodies that cannot be parsed.
pub async fn payment_webhook<B: PromotionBackend>(
    body: web::Bytes,
    reconciler: web::Data<PaymentReconciler<B>>,
) -> HttpResponse {
    trace!("💻️ Received PayOS webhook");
    let callback = match serde_json::from_slice::<GatewayCallback>(&body) {
        Ok(cb) => cb,
        Err(e) => {
            warn!("💻️ Could not parse PayOS webhook body. {e}");
            return HttpResponse::Ok().json(CallbackResult::failure("", "Invalid callback payload"));
        },
    };
    let result = reconciler.reconcile(CallbackPayload::Webhook(WebhookPayload(callback))).await;
    HttpResponse::Ok().json(result)
}
