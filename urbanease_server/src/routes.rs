//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they pull the caller out of the JWT claims, hand over
//! to the engine APIs, and wrap the result in a [`JsonResponse`]. Anything longer than a few lines belongs in the
//! engine.
//!
//! Every handler is async. Database work is awaited rather than blocking the worker thread, so a slow query on one
//! request never stalls the others being served by the same worker.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use urbanease_engine::{
    db_types::{OrderId, Role},
    order_objects::NewOrderRequest,
    realtime::RealtimePublisher,
    NotificationApi,
    NotificationManagement,
    OrderFlowApi,
    OrderManagement,
    OrderQueryApi,
    OrderStore,
    PaymentApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{
        ConfirmPaymentRequest,
        CreatedOrder,
        JsonResponse,
        MarkedRead,
        NotificationFeed,
        NotificationQuery,
        OrderList,
        PaymentOrderRequest,
        SingleNotification,
        SingleOrder,
        StatusUpdateRequest,
        UnreadCount,
        UpiLink,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

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

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
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
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
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

/// Catch-all for paths no route matches, so unknown routes get the usual JSON envelope.
pub async fn route_not_found(req: HttpRequest) -> Result<HttpResponse, ServerError> {
    debug!("💻️ No route for {} {}", req.method(), req.path());
    Err(ServerError::NoRecordFound("Route not found".into()))
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(check_token => Get "/check_token" requires [Role::User, Role::Moderator, Role::Admin]);
/// Echoes the decoded claims back to the caller. Handy for checking what the server makes of a token.
pub async fn check_token(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET check_token for {}", claims.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success(claims).with_message("Token is valid.")))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderStore, RealtimePublisher);
/// Checkout. The order is always created for the caller; any owner in the body is ignored.
///
/// Responds with `201 Created` and `{orderId, orderNumber, order}`.
pub async fn create_order<B: OrderStore, P: RealtimePublisher>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create_order for {}", claims.id);
    let order = api.create_order(&claims.id, body.into_inner()).await.map_err(|e| {
        debug!("💻️ Checkout for {} failed. {e}", claims.id);
        e
    })?;
    let result = JsonResponse::success(CreatedOrder::from(order)).with_message("Order placed");
    Ok(HttpResponse::Created().json(result))
}

route!(my_orders => Get "/orders/my-orders" impl OrderManagement);
/// The caller's own orders, newest first.
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.id);
    let orders = api.orders_for_user(&claims.id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(OrderList::from(orders))))
}

route!(all_orders => Get "/orders/admin/all" impl OrderManagement where requires [Role::Admin, Role::Moderator]);
/// Every order in the store, newest first. Staff only.
pub async fn all_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all_orders for {} ({})", claims.id, claims.role);
    let orders = api.all_orders(claims.role).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(OrderList::from(orders))))
}

route!(order_by_id => Get r"/orders/{id:\d+}" impl OrderManagement);
/// A single order. Customers only see their own orders; anyone else's is reported as not found, whether it exists or
/// not. Staff can see every order.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id}) for {}", claims.id);
    let order = api.order_for(order_id, &claims.id, claims.role).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(SingleOrder { order })))
}

route!(update_status => Patch r"/orders/{id:\d+}/status" impl OrderStore, RealtimePublisher where requires [Role::Admin, Role::Moderator]);
/// Moves an order to a new status, and tells the owner about it.
pub async fn update_status<B: OrderStore, P: RealtimePublisher>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let StatusUpdateRequest { status } = body.into_inner();
    info!("💻️ PATCH update_status({order_id}) to '{status}' by {} ({})", claims.id, claims.role);
    let order = api.set_status(order_id, &status, claims.role).await?;
    let result = JsonResponse::success(SingleOrder { order }).with_message("Order status updated");
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(initiate_payment => Post "/payments/initiate" impl OrderStore, RealtimePublisher);
/// Returns the UPI deep link for one of the caller's orders.
pub async fn initiate_payment<B: OrderStore, P: RealtimePublisher>(
    claims: JwtClaims,
    body: web::Json<PaymentOrderRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = body.into_inner().order_id;
    debug!("💻️ POST initiate_payment({order_id}) for {}", claims.id);
    let request = api.initiate_payment(order_id, &claims.id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(UpiLink::from(request))))
}

route!(confirm_payment => Post "/payments/confirm" impl OrderStore, RealtimePublisher);
pub async fn confirm_payment<B: OrderStore, P: RealtimePublisher>(
    claims: JwtClaims,
    body: web::Json<ConfirmPaymentRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let ConfirmPaymentRequest { order_id, confirmation } = body.into_inner();
    debug!("💻️ POST confirm_payment({order_id}) for {}", claims.id);
    let order = api.confirm_payment(order_id, &claims.id, confirmation).await?;
    let result = JsonResponse::success(SingleOrder { order }).with_message("Payment confirmed");
    Ok(HttpResponse::Ok().json(result))
}

route!(select_cod => Post "/payments/select-cod" impl OrderStore, RealtimePublisher);
pub async fn select_cod<B: OrderStore, P: RealtimePublisher>(
    claims: JwtClaims,
    body: web::Json<PaymentOrderRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = body.into_inner().order_id;
    debug!("💻️ POST select_cod({order_id}) for {}", claims.id);
    let order = api.select_cod(order_id, &claims.id).await?;
    let result = JsonResponse::success(SingleOrder { order }).with_message("Cash on delivery selected");
    Ok(HttpResponse::Ok().json(result))
}

route!(decline_payment => Post "/payments/decline" impl OrderStore, RealtimePublisher);
pub async fn decline_payment<B: OrderStore, P: RealtimePublisher>(
    claims: JwtClaims,
    body: web::Json<PaymentOrderRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = body.into_inner().order_id;
    debug!("💻️ POST decline_payment({order_id}) for {}", claims.id);
    let order = api.decline_payment(order_id, &claims.id).await?;
    let result = JsonResponse::success(SingleOrder { order }).with_message("Payment declined");
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Notifications  ----------------------------------------------
route!(notifications => Get "/notifications" impl NotificationManagement);
/// The caller's notification feed, newest first.
///
/// Query parameters: `page` (from 1), `limit` (1-100, default 20), and `userId`, which lets staff read another
/// user's feed. `userId` is ignored for everyone else.
pub async fn notifications<B: NotificationManagement>(
    claims: JwtClaims,
    query: web::Query<NotificationQuery>,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let paging = query.pagination();
    debug!("💻️ GET notifications for {} (page {}, size {})", claims.id, paging.page(), paging.page_size());
    let page = api.list(&claims.id, claims.role, query.requested_user(), paging).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(NotificationFeed::new(page, paging))))
}

route!(unread_count => Get "/notifications/unread-count" impl NotificationManagement);
pub async fn unread_count<B: NotificationManagement>(
    claims: JwtClaims,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET unread_count for {}", claims.id);
    let unread = api.unread_count(&claims.id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(UnreadCount { unread })))
}

route!(mark_read => Patch r"/notifications/{id:\d+}/read" impl NotificationManagement);
pub async fn mark_read<B: NotificationManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH mark_read({id}) for {}", claims.id);
    let notification = api.mark_read(id, &claims.id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(SingleNotification { notification })))
}

route!(mark_all_read => Post "/notifications/mark-all-read" impl NotificationManagement);
pub async fn mark_all_read<B: NotificationManagement>(
    claims: JwtClaims,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST mark_all_read for {}", claims.id);
    let updated = api.mark_all_read(&claims.id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(MarkedRead { updated })))
}
