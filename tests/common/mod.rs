//! In-memory users and accounts behind the full middleware chain.

#![allow(dead_code)]

use std::future::{Ready, ready};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tollgate::config::Config;
use tollgate::middleware::{Authenticate, Cors, Pipeline, Rbac, Recovery, Trace};
use tollgate::token::JwtAuthenticator;
use tollgate::{
    ApiError, App, AuthContext, Authenticator, Context, Envelope, FromParams, Method, Params,
    Request, Router,
};

pub const CONFIG: &str = r#"
[server]
addr = "127.0.0.1:0"

[auth]
secret = "integration secret"
token_ttl_secs = 300
ignore = ["POST /auth/login", "POST /users", "GET /users/{id}", "GET /panic"]

[rbac]
"PUT /users/{id}"               = ["SUPER_ADMIN", "ADMIN", "USER"]
"GET /users/{user_id}/accounts" = ["SUPER_ADMIN", "ADMIN", "USER"]
"POST /users/{user_id}/accounts" = ["SUPER_ADMIN", "ADMIN"]
"GET /accounts/{id}"            = ["SUPER_ADMIN", "ADMIN"]
"#;

pub fn config() -> Config {
    Config::from_toml(CONFIG).unwrap()
}

// ── Domain ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum DomainError {
    NotFound(&'static str),
    Invalid(&'static str),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(what) => ApiError::not_found(what),
            DomainError::Invalid(why) => ApiError::bad_request(why),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub name: String,
    pub role: String,
    #[serde(skip)]
    password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i64,
    pub name: String,
    pub token: String,
    pub role: String,
}

#[derive(Default)]
pub struct CreateUser {
    user_name: String,
    password: String,
    name: String,
    role: String,
}

impl FromParams for CreateUser {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            user_name: p.field("user_name")?,
            password: p.field("password")?,
            name: p.field("name")?,
            role: p.field("role")?,
        })
    }
}

pub struct ById {
    id: i64,
}

impl FromParams for ById {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { id: p.field("id")? })
    }
}

pub struct UpdateUser {
    id: i64,
    name: String,
}

impl FromParams for UpdateUser {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { id: p.field("id")?, name: p.field("name")? })
    }
}

pub struct ByUserId {
    user_id: i64,
}

impl FromParams for ByUserId {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { user_id: p.field("user_id")? })
    }
}

pub struct CreateAccount {
    user_id: i64,
    name: String,
    balance: i64,
}

impl FromParams for CreateAccount {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { user_id: p.field("user_id")?, name: p.field("name")?, balance: p.field("balance")? })
    }
}

pub struct Login {
    user_name: String,
    password: String,
}

impl FromParams for Login {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { user_name: p.field("user_name")?, password: p.field("password")? })
    }
}

pub struct Store {
    users: Mutex<Vec<User>>,
    accounts: Mutex<Vec<Account>>,
    next_id: AtomicI64,
    tokens: Arc<dyn Authenticator>,
    ttl: Duration,
}

impl Store {
    pub fn seeded(tokens: Arc<dyn Authenticator>, ttl: Duration) -> Self {
        let user = |id, user_name: &str, role: &str| User {
            id,
            user_name: user_name.to_owned(),
            name: user_name.to_uppercase(),
            role: role.to_owned(),
            password: format!("{user_name}-pass"),
        };
        Self {
            users: Mutex::new(vec![user(1, "root", "SUPER_ADMIN"), user(2, "alice", "ADMIN"), user(3, "bob", "USER")]),
            accounts: Mutex::new(vec![Account { id: 4, user_id: 3, name: "savings".into(), balance: 100 }]),
            next_id: AtomicI64::new(5),
            tokens,
            ttl,
        }
    }

    fn create_user(&self, _: &Context, req: CreateUser) -> Result<User, DomainError> {
        if req.user_name.is_empty() || req.password.is_empty() {
            return Err(DomainError::Invalid("user name and password are required"));
        }
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.user_name == req.user_name) {
            return Err(DomainError::Invalid("user name is taken"));
        }
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_name: req.user_name,
            name: req.name,
            role: if req.role.is_empty() { "USER".to_owned() } else { req.role },
            password: req.password,
        };
        users.push(user.clone());
        Ok(user)
    }

    fn get_user(&self, _: &Context, req: ById) -> Result<User, DomainError> {
        let users = self.users.lock().unwrap();
        users.iter().find(|u| u.id == req.id).cloned().ok_or(DomainError::NotFound("user not found"))
    }

    fn update_user(&self, _: &Context, req: UpdateUser) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == req.id).ok_or(DomainError::NotFound("user not found"))?;
        user.name = req.name;
        Ok(user.clone())
    }

    fn me(&self, ctx: &Context, (): ()) -> Result<User, DomainError> {
        let id = ctx.auth().map(|a| a.user_id).ok_or(DomainError::NotFound("user not found"))?;
        self.get_user(ctx, ById { id })
    }

    fn list_accounts(&self, _: &Context, req: ByUserId) -> Result<Vec<Account>, DomainError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().filter(|a| a.user_id == req.user_id).cloned().collect())
    }

    fn create_account(&self, ctx: &Context, req: CreateAccount) -> Result<Account, DomainError> {
        self.get_user(ctx, ById { id: req.user_id })?;
        let account = Account {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: req.user_id,
            name: req.name,
            balance: req.balance,
        };
        self.accounts.lock().unwrap().push(account.clone());
        Ok(account)
    }

    fn get_account(&self, _: &Context, req: ById) -> Result<Account, DomainError> {
        let accounts = self.accounts.lock().unwrap();
        accounts.iter().find(|a| a.id == req.id).cloned().ok_or(DomainError::NotFound("account not found"))
    }

    fn login(&self, _: &Context, req: Login) -> Result<LoginResponse, DomainError> {
        let invalid = DomainError::Invalid("user name or password is not valid");
        let user = {
            let users = self.users.lock().unwrap();
            users.iter().find(|u| u.user_name == req.user_name).cloned()
        };
        let user = user.filter(|u| u.password == req.password).ok_or(invalid)?;
        let token = self
            .tokens
            .generate(AuthContext::new(user.id, user.role.clone()), self.ttl)
            .map_err(|_| DomainError::Invalid("unable to issue token"))?;
        Ok(LoginResponse { id: user.id, name: user.name, token, role: user.role })
    }

    fn panic(&self, _: &Context, (): ()) -> Result<(), DomainError> {
        panic!("handler exploded")
    }
}

/// Adapts a synchronous store method to an async handler.
fn handler<Req, Res>(
    store: &Arc<Store>,
    f: fn(&Store, &Context, Req) -> Result<Res, DomainError>,
) -> impl Fn(Context, Req) -> Ready<Result<Res, DomainError>> + Send + Sync + 'static
where
    Req: 'static,
    Res: 'static,
{
    let store = Arc::clone(store);
    move |ctx, req| ready(f(&store, &ctx, req))
}

// ── Assembly ─────────────────────────────────────────────────────────────────

pub fn router(store: &Arc<Store>) -> Router {
    Router::new()
        .on(Method::Post, "/auth/login",                  handler(store, Store::login))
        .on(Method::Get,  "/auth/me",                     handler(store, Store::me))
        .on(Method::Post, "/users",                       handler(store, Store::create_user))
        .on(Method::Get,  "/users/{id}",                  handler(store, Store::get_user))
        .on(Method::Put,  "/users/{id}",                  handler(store, Store::update_user))
        .on(Method::Get,  "/users/{user_id}/accounts",    handler(store, Store::list_accounts))
        .on(Method::Post, "/users/{user_id}/accounts",    handler(store, Store::create_account))
        .on(Method::Get,  "/accounts/{id}",               handler(store, Store::get_account))
        .on(Method::Get,  "/panic",                       handler(store, Store::panic))
}

pub fn pipeline(config: &Config, tokens: Arc<dyn Authenticator>, recovery: bool) -> Pipeline {
    let pipeline = if recovery { Pipeline::new().layer(Recovery::new()) } else { Pipeline::new() };
    pipeline
        .layer(Trace::new())
        .layer(Cors::from_config(&config.cors).unwrap())
        .layer(Authenticate::from_config(&config.auth, tokens).unwrap())
        .layer(Rbac::from_config(&config.rbac).unwrap())
}

pub fn app_with(config: Config, recovery: bool) -> App {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let tokens: Arc<dyn Authenticator> = Arc::new(JwtAuthenticator::new(config.auth.secret.as_bytes()));
    let store = Arc::new(Store::seeded(Arc::clone(&tokens), config.token_ttl()));
    App::new(router(&store), pipeline(&config, tokens, recovery)).unwrap()
}

pub fn app() -> App {
    app_with(config(), true)
}

// ── Client helpers ───────────────────────────────────────────────────────────

pub async fn send(app: &App, method: Method, uri: &str, token: Option<&str>, body: &str) -> (u16, Envelope) {
    let mut req = Request::new(method, uri.parse().unwrap()).with_body(body.to_owned());
    if let Some(token) = token {
        req = req.with_header("authorization", &format!("Bearer {token}"));
    }
    let res = app.handle(req).await;
    (res.status().as_u16(), res.envelope().unwrap())
}

pub async fn login(app: &App, user_name: &str) -> String {
    let body = format!(r#"{{"user_name":"{user_name}","password":"{user_name}-pass"}}"#);
    let (status, env) = send(app, Method::Post, "/auth/login", None, &body).await;
    assert_eq!(status, 200, "login failed: {env:?}");
    env.data.unwrap()["token"].as_str().unwrap().to_owned()
}
