//! Router-level gate behavior. The pool is lazy and never touched: every request here is
//! decided by the gate or by handlers that only read the permission grid.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use zatch_backend::model::{default_grid, Domain, DomainType, Role, Tenant, TenantStatus, TenantUser};
use zatch_backend::{app, AppState, MemoryAccessStore, RuntimeEnv, Settings};

const ADMIN_HOST: &str = "painel.example.com";
const PUBLIC_HOST: &str = "www.example.com";

struct Harness {
    store: Arc<MemoryAccessStore>,
    tenant: Tenant,
    env: RuntimeEnv,
}

impl Harness {
    fn new(admin_verified: bool) -> Self {
        let tenant = Tenant::new("Imobiliária Exemplo", "exemplo", TenantStatus::Active);
        let mut admin = Domain::new(tenant.id, ADMIN_HOST, DomainType::Admin);
        admin.verified = admin_verified;
        let mut public = Domain::new(tenant.id, PUBLIC_HOST, DomainType::Public);
        public.verified = true;
        let store = MemoryAccessStore::new()
            .with_tenant(tenant.clone())
            .with_domain(admin)
            .with_domain(public)
            .with_permissions(default_grid());
        Harness {
            store: Arc::new(store),
            tenant,
            env: RuntimeEnv::Production,
        }
    }

    fn member(&self, role: Role) -> Uuid {
        let user_id = Uuid::new_v4();
        self.store.insert_member(TenantUser {
            tenant_id: self.tenant.id,
            user_id,
            role,
        });
        user_id
    }

    fn router(&self) -> Router {
        let settings = Settings {
            env: self.env,
            ..Settings::default()
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.database_url)
            .expect("lazy pool");
        let state = AppState::new(pool, settings).with_access_store(self.store.clone());
        app(state)
    }
}

fn get(uri: &str, host: &str, user: Option<Uuid>) -> Request<Body> {
    let mut b = Request::builder().uri(uri).header(header::HOST, host);
    if let Some(u) = user {
        b = b.header("X-User-ID", u.to_string());
    }
    b.body(Body::empty()).unwrap()
}

async fn json(res: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn member_on_verified_admin_domain_is_served() {
    let h = Harness::new(true);
    let user = h.member(Role::Agent);
    let res = h
        .router()
        .oneshot(get("/admin/api/v1/gate", ADMIN_HOST, Some(user)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with(&format!("active_tenant_id={}", h.tenant.id)));

    let body = json(res).await;
    assert_eq!(body["data"]["status"], "granted");
    assert_eq!(body["data"]["role"], "agent");
    assert_eq!(body["data"]["tenant"]["id"], h.tenant.id.to_string());
    assert_eq!(body["data"]["permissions"]["properties"], serde_json::json!(["view", "create", "edit"]));
    assert_eq!(body["data"]["permissions"]["users"], serde_json::json!([]));
}

#[tokio::test]
async fn unverified_admin_domain_renders_dns_instructions() {
    let h = Harness::new(false);
    let user = h.member(Role::Owner);
    let req = Request::builder()
        .uri("/admin/api/v1/gate")
        .header(header::HOST, ADMIN_HOST)
        .header(header::ACCEPT, "text/html,application/xhtml+xml")
        .header("X-User-ID", user.to_string())
        .body(Body::empty())
        .unwrap();
    let res = h.router().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let html = String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(html.contains("_zatch-verify.painel.example.com"));
    assert!(html.contains("DOMAIN_NOT_VERIFIED"));
}

#[tokio::test]
async fn unverified_admin_domain_json_for_api_clients() {
    let h = Harness::new(false);
    let res = h.router().oneshot(get("/admin/api/v1/gate", ADMIN_HOST, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = json(res).await;
    assert_eq!(body["error"]["code"], "DOMAIN_NOT_VERIFIED");
    assert_eq!(body["error"]["details"]["record_name"], "_zatch-verify.painel.example.com");
}

#[tokio::test]
async fn authenticated_stranger_gets_not_a_member() {
    let h = Harness::new(true);
    let res = h
        .router()
        .oneshot(get("/admin/api/v1/gate", ADMIN_HOST, Some(Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = json(res).await;
    assert_eq!(body["error"]["code"], "NOT_A_MEMBER");
    assert_eq!(body["error"]["details"]["logout"]["path"], "/auth/logout");
}

#[tokio::test]
async fn anonymous_admin_request_needs_login() {
    let h = Harness::new(true);
    let res = h.router().oneshot(get("/admin/api/v1/gate", ADMIN_HOST, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(res).await["error"]["code"], "LOGIN_REQUIRED");
}

#[tokio::test]
async fn public_hostname_on_admin_surface_is_wrong_type() {
    let h = Harness::new(true);
    let user = h.member(Role::Owner);
    let res = h
        .router()
        .oneshot(get("/admin/api/v1/gate", PUBLIC_HOST, Some(user)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(res).await["error"]["code"], "WRONG_DOMAIN_TYPE");
}

#[tokio::test]
async fn unknown_hostname_on_storefront() {
    let h = Harness::new(true);
    let res = h
        .router()
        .oneshot(get("/api/v1/gate", "outra.example.net", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(res).await["error"]["code"], "DOMAIN_NOT_FOUND");
}

#[tokio::test]
async fn storefront_gate_admits_anonymous_visitors() {
    let h = Harness::new(true);
    let res = h.router().oneshot(get("/api/v1/gate", PUBLIC_HOST, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["data"]["is_member"], false);
    assert_eq!(body["data"]["role"], serde_json::Value::Null);
}

#[tokio::test]
async fn store_outage_is_a_resolution_error() {
    let h = Harness::new(true);
    h.store.set_unavailable(true);
    let res = h.router().oneshot(get("/api/v1/gate", PUBLIC_HOST, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(res).await["error"]["code"], "RESOLUTION_ERROR");
}

#[tokio::test]
async fn permission_grid_is_enforced_on_admin_endpoints() {
    let h = Harness::new(true);
    let agent = h.member(Role::Agent);
    let res = h
        .router()
        .oneshot(get("/admin/api/v1/permissions", ADMIN_HOST, Some(agent)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(res).await["error"]["code"], "forbidden");

    let admin = h.member(Role::Admin);
    let res = h
        .router()
        .oneshot(get("/admin/api/v1/permissions", ADMIN_HOST, Some(admin)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["meta"]["count"], default_grid().len());
}

#[tokio::test]
async fn development_fallback_on_localhost_remembers_the_tenant() {
    let mut h = Harness::new(true);
    h.env = RuntimeEnv::Development;
    let user = h.member(Role::Owner);
    let res = h
        .router()
        .oneshot(get("/admin/api/v1/gate", "localhost:3000", Some(user)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_some());
    let body = json(res).await;
    assert_eq!(body["data"]["source"], "first_active_tenant");

    let req = Request::builder()
        .uri("/admin/api/v1/gate")
        .header(header::HOST, "localhost:3000")
        .header(header::COOKIE, format!("active_tenant_id={}", h.tenant.id))
        .header("X-User-ID", user.to_string())
        .body(Body::empty())
        .unwrap();
    let res = h.router().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(json(res).await["data"]["source"], "cached_tenant");
}

#[tokio::test]
async fn logout_clears_cookies_and_redirects_home() {
    let h = Harness::new(true);
    let req = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::HOST, ADMIN_HOST)
        .body(Body::empty())
        .unwrap();
    let res = h.router().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/");
    let cookies: Vec<String> = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("zatch_session=;") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("active_tenant_id=;") && c.contains("Max-Age=0")));
}
