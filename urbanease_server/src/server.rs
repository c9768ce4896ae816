use std::time::Duration;

use actix_web::{
    dev::Server,
    error::JsonPayloadError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use log::*;
use urbanease_engine::{
    events::{EventHandlers, EventProducers},
    realtime::ConnectionRegistry,
    NotificationApi,
    OrderFlowApi,
    OrderQueryApi,
    PaymentApi,
    SqliteDatabase,
};

use crate::{
    audit::audit_hooks,
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        route_not_found,
        AllOrdersRoute,
        CheckTokenRoute,
        ConfirmPaymentRoute,
        CreateOrderRoute,
        DeclinePaymentRoute,
        InitiatePaymentRoute,
        MarkAllReadRoute,
        MarkReadRoute,
        MyOrdersRoute,
        NotificationsRoute,
        OrderByIdRoute,
        SelectCodRoute,
        UnreadCountRoute,
        UpdateStatusRoute,
    },
    ws::ws_index,
};

/// The capacity of each lifecycle hook channel. Events raised while a channel is full are logged and dropped.
const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    } else {
        info!("🗃️ UE_AUTO_MIGRATE is off. Assuming the database schema is up to date.");
    }
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, audit_hooks());
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, ConnectionRegistry::new(), producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Builds the HTTP server. Every worker shares the one connection registry, so an event raised on any worker reaches
/// sockets held by all of them.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    registry: ConnectionRegistry,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let policy = config.status_policy();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), registry.clone(), producers.clone())
            .with_status_policy(policy)
            .with_total_verification(config.verify_order_total);
        let payments_api = PaymentApi::new(db.clone(), registry.clone(), producers.clone())
            .with_payee(config.upi_payee.clone())
            .with_timeout(config.payment_timeout);
        let query_api = OrderQueryApi::new(db.clone());
        let notifications_api = NotificationApi::new(db.clone());
        let validator = TokenValidator::new(&config.auth);
        // Everything under /api requires a valid access token
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(validator.clone()))
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase, ConnectionRegistry>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateStatusRoute::<SqliteDatabase, ConnectionRegistry>::new())
            .service(InitiatePaymentRoute::<SqliteDatabase, ConnectionRegistry>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase, ConnectionRegistry>::new())
            .service(SelectCodRoute::<SqliteDatabase, ConnectionRegistry>::new())
            .service(DeclinePaymentRoute::<SqliteDatabase, ConnectionRegistry>::new())
            .service(UnreadCountRoute::<SqliteDatabase>::new())
            .service(MarkAllReadRoute::<SqliteDatabase>::new())
            .service(MarkReadRoute::<SqliteDatabase>::new())
            .service(NotificationsRoute::<SqliteDatabase>::new())
            .service(CheckTokenRoute::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ue::access_log"))
            .app_data(json_config(config.max_body_bytes))
            .app_data(path_config())
            .app_data(query_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(notifications_api))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(validator))
            .app_data(web::Data::new(options))
            .service(health)
            .service(ws_index)
            .service(api_scope)
            .default_service(web::to(route_not_found))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Renders malformed and oversized JSON bodies through the usual error envelope.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(limit).error_handler(|err, req| {
        debug!("💻️ Rejected the body of {} {}. {err}", req.method(), req.path());
        match err {
            JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                ServerError::PayloadTooLarge(err.to_string()).into()
            },
            err => ServerError::InvalidRequestBody(err.to_string()).into(),
        }
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| ServerError::InvalidQuery(err.to_string()).into())
}
