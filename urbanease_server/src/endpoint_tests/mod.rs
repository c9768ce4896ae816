mod auth;
mod helpers;
mod mocks;
mod notifications;
mod orders;
mod payments;

mod misc {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use crate::routes::{health, route_not_found};

    #[actix_web::test]
    async fn health_check() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body.as_ref(), "👍️\n".as_bytes());
    }

    #[actix_web::test]
    async fn unknown_routes_get_a_json_404() {
        let app = test::init_service(App::new().service(health).default_service(web::to(route_not_found))).await;
        for uri in ["/api/nope", "/orders/abc", "/"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
            let body: Value = test::read_body_json(res).await;
            assert_eq!(body, json!({"success": false, "message": "Route not found"}));
        }
    }
}
