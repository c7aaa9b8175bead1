//! Users and accounts service, kept in memory.
//!
//! ```text
//! cargo run --example users                # defaults, overridable by env
//! cargo run --example users -- app.toml    # load a config file first
//!
//! curl -XPOST localhost:8080/auth/login -d '{"user_name":"root","password":"root"}'
//! curl localhost:8080/accounts/2 -H "authorization: Bearer <token>"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tollgate::config::{Config, load_config};
use tollgate::middleware::{Authenticate, Cors, Pipeline, Rbac, Recovery, Trace};
use tollgate::token::JwtAuthenticator;
use tollgate::{
    ApiError, App, AuthContext, Authenticator, Context, FromParams, Method, Params, Router, Server,
};

const SUPER_ADMIN: &str = "SUPER_ADMIN";
const ADMIN: &str = "ADMIN";
const USER: &str = "USER";

// ── Requests ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct CreateUserRequest {
    user_name: String,
    password: String,
    name: String,
    role: String,
}

impl FromParams for CreateUserRequest {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            user_name: p.field("user_name")?,
            password: p.field("password")?,
            name: p.field("name")?,
            role: p.field("role")?,
        })
    }
}

struct GetByIdRequest {
    id: i64,
}

impl FromParams for GetByIdRequest {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { id: p.field("id")? })
    }
}

struct UpdateUserRequest {
    id: i64,
    name: String,
}

impl FromParams for UpdateUserRequest {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { id: p.field("id")?, name: p.field("name")? })
    }
}

struct ListAccountByUserIdRequest {
    user_id: i64,
}

impl FromParams for ListAccountByUserIdRequest {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { user_id: p.field("user_id")? })
    }
}

struct CreateAccountByUserIdRequest {
    user_id: i64,
    name: String,
    balance: i64,
}

impl FromParams for CreateAccountByUserIdRequest {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            user_id: p.field("user_id")?,
            name: p.field("name")?,
            balance: p.field("balance")?,
        })
    }
}

struct LoginRequest {
    user_name: String,
    password: String,
}

impl FromParams for LoginRequest {
    fn from_params(p: &Params) -> Result<Self, ApiError> {
        Ok(Self { user_name: p.field("user_name")?, password: p.field("password")? })
    }
}

// ── Models ───────────────────────────────────────────────────────────────────

#[derive(Clone, Serialize)]
struct User {
    id: i64,
    user_name: String,
    name: String,
    role: String,
    #[serde(skip)]
    password: String,
}

#[derive(Clone, Serialize)]
struct Account {
    id: i64,
    user_id: i64,
    name: String,
    balance: i64,
}

#[derive(Serialize)]
struct LoginResponse {
    id: i64,
    name: String,
    token: String,
    role: String,
}

// ── Service ──────────────────────────────────────────────────────────────────

struct Service {
    users: RwLock<Vec<User>>,
    accounts: RwLock<Vec<Account>>,
    next_id: AtomicI64,
    tokens: Arc<dyn Authenticator>,
    ttl: Duration,
}

impl Service {
    fn new(tokens: Arc<dyn Authenticator>, ttl: Duration) -> Self {
        let root = User {
            id: 1,
            user_name: "root".into(),
            name: "Root".into(),
            role: SUPER_ADMIN.into(),
            password: "root".into(),
        };
        let savings = Account { id: 2, user_id: 1, name: "savings".into(), balance: 1_000 };
        Self {
            users: RwLock::new(vec![root]),
            accounts: RwLock::new(vec![savings]),
            next_id: AtomicI64::new(3),
            tokens,
            ttl,
        }
    }

    fn id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn user(&self, id: i64) -> Result<User, ApiError> {
        let users = self.users.read().map_err(|_| ApiError::internal("user store poisoned"))?;
        users.iter().find(|u| u.id == id).cloned().ok_or_else(|| ApiError::not_found("user not found"))
    }

    async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError> {
        if req.user_name.is_empty() || req.password.is_empty() {
            return Err("user_name and password are required".into());
        }
        let role = match req.role.as_str() {
            "" => USER.to_owned(),
            SUPER_ADMIN | ADMIN | USER => req.role,
            _ => return Err("role is not valid".into()),
        };
        let mut users = self.users.write().map_err(|_| ApiError::internal("user store poisoned"))?;
        if users.iter().any(|u| u.user_name == req.user_name) {
            return Err("user_name is already taken".into());
        }
        let user = User { id: self.id(), user_name: req.user_name, name: req.name, role, password: req.password };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, req: UpdateUserRequest) -> Result<User, ApiError> {
        let mut users = self.users.write().map_err(|_| ApiError::internal("user store poisoned"))?;
        let user = users
            .iter_mut()
            .find(|u| u.id == req.id)
            .ok_or_else(|| ApiError::not_found("user not found"))?;
        user.name = req.name;
        Ok(user.clone())
    }

    async fn accounts_of(&self, user_id: i64) -> Result<Vec<Account>, ApiError> {
        let accounts = self.accounts.read().map_err(|_| ApiError::internal("account store poisoned"))?;
        Ok(accounts.iter().filter(|a| a.user_id == user_id).cloned().collect())
    }

    async fn create_account(&self, req: CreateAccountByUserIdRequest) -> Result<Account, ApiError> {
        self.user(req.user_id)?;
        let account = Account { id: self.id(), user_id: req.user_id, name: req.name, balance: req.balance };
        self.accounts
            .write()
            .map_err(|_| ApiError::internal("account store poisoned"))?
            .push(account.clone());
        Ok(account)
    }

    async fn account(&self, id: i64) -> Result<Account, ApiError> {
        let accounts = self.accounts.read().map_err(|_| ApiError::internal("account store poisoned"))?;
        accounts.iter().find(|a| a.id == id).cloned().ok_or_else(|| ApiError::not_found("account not found"))
    }

    async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        let user = {
            let users = self.users.read().map_err(|_| ApiError::internal("user store poisoned"))?;
            users.iter().find(|u| u.user_name == req.user_name && u.password == req.password).cloned()
        };
        let user = user.ok_or("user name or password is not valid")?;
        let token = self
            .tokens
            .generate(AuthContext::new(user.id, user.role.clone()), self.ttl)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        Ok(LoginResponse { id: user.id, name: user.name, token, role: user.role })
    }
}

// ── Wiring ───────────────────────────────────────────────────────────────────

fn router(svc: Arc<Service>) -> Router {
    let s = Arc::clone(&svc);
    let create_user = move |_: Context, req: CreateUserRequest| {
        let s = Arc::clone(&s);
        async move { s.create_user(req).await }
    };
    let s = Arc::clone(&svc);
    let get_user = move |_: Context, req: GetByIdRequest| {
        let s = Arc::clone(&s);
        async move { s.user(req.id) }
    };
    let s = Arc::clone(&svc);
    let update_user = move |_: Context, req: UpdateUserRequest| {
        let s = Arc::clone(&s);
        async move { s.update_user(req).await }
    };
    let s = Arc::clone(&svc);
    let list_accounts = move |_: Context, req: ListAccountByUserIdRequest| {
        let s = Arc::clone(&s);
        async move { s.accounts_of(req.user_id).await }
    };
    let s = Arc::clone(&svc);
    let create_account = move |_: Context, req: CreateAccountByUserIdRequest| {
        let s = Arc::clone(&s);
        async move { s.create_account(req).await }
    };
    let s = Arc::clone(&svc);
    let get_account = move |_: Context, req: GetByIdRequest| {
        let s = Arc::clone(&s);
        async move { s.account(req.id).await }
    };
    let s = Arc::clone(&svc);
    let login = move |_: Context, req: LoginRequest| {
        let s = Arc::clone(&s);
        async move { s.login(req).await }
    };

    Router::new()
        .on(Method::Post, "/users",                     create_user)
        .on(Method::Get,  "/users/{id}",                get_user)
        .on(Method::Put,  "/users/{id}",                update_user)
        .on(Method::Get,  "/users/{user_id}/accounts",  list_accounts)
        .on(Method::Post, "/users/{user_id}/accounts",  create_account)
        .on(Method::Get,  "/accounts/{id}",             get_account)
        .on(Method::Post, "/auth/login",                login)
}

/// Used when no file is given.
fn default_config() -> Config {
    let everyone = vec![SUPER_ADMIN.to_owned(), ADMIN.to_owned(), USER.to_owned()];
    let admins = vec![SUPER_ADMIN.to_owned(), ADMIN.to_owned()];

    let mut config = Config::default();
    config.auth.secret = "demo secret, set SYMMETRIC_KEY".to_owned();
    config.auth.ignore = vec!["POST /auth/login".to_owned(), "POST /users".to_owned()];
    config.rbac = BTreeMap::from([
        ("GET /users/{id}".to_owned(), everyone.clone()),
        ("PUT /users/{id}".to_owned(), everyone.clone()),
        ("GET /users/{user_id}/accounts".to_owned(), everyone),
        ("POST /users/{user_id}/accounts".to_owned(), admins.clone()),
        ("GET /accounts/{id}".to_owned(), admins),
    ]);
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => {
            let config = default_config().with_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            config
        }
    };

    let tokens: Arc<dyn Authenticator> = Arc::new(JwtAuthenticator::new(config.auth.secret.as_bytes()));
    let service = Arc::new(Service::new(Arc::clone(&tokens), config.token_ttl()));

    let pipeline = Pipeline::new()
        .layer(Recovery::new())
        .layer(Trace::new())
        .layer(Cors::from_config(&config.cors)?)
        .layer(Authenticate::from_config(&config.auth, tokens)?)
        .layer(Rbac::from_config(&config.rbac)?);
    let app = App::new(router(service), pipeline)?;

    Server::bind(&config.server.addr).await?.serve(app).await?;
    Ok(())
}
