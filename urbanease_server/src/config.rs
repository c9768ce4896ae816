use std::{env, io::Write, time::Duration};

use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;
use ue_common::{
    helpers::{env_flag, env_parse},
    Secret,
};
use urbanease_engine::{
    helpers::{UpiPayee, DEFAULT_UPI_NAME, DEFAULT_UPI_VPA},
    order_objects::StatusPolicy,
    DEFAULT_DATABASE_URL,
};

use crate::errors::ServerError;

const DEFAULT_UE_HOST: &str = "127.0.0.1";
const DEFAULT_UE_PORT: u16 = 8360;
const DEFAULT_PAYMENT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
/// HS256 secrets shorter than this are rejected.
const MIN_JWT_SECRET_LENGTH: usize = 16;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// The merchant account that UPI payments are made out to.
    pub upi_payee: UpiPayee,
    /// How long payment initiation may take before the client is told to retry.
    pub payment_timeout: Duration,
    /// When true, checkout totals must agree with the line items.
    pub verify_order_total: bool,
    /// When true, staff may only move orders forward along the fulfilment path.
    pub strict_status_transitions: bool,
    /// When true, WebSocket clients must present a token for the room they join.
    pub ws_require_token: bool,
    /// Run the embedded migrations at startup.
    pub auto_migrate: bool,
    /// The largest JSON body the server will accept. Payment proofs are sent inline, so this is fairly generous.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_UE_HOST.to_string(),
            port: DEFAULT_UE_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            upi_payee: UpiPayee::default(),
            payment_timeout: Duration::from_millis(DEFAULT_PAYMENT_TIMEOUT_MS),
            verify_order_total: true,
            strict_status_transitions: false,
            ws_require_token: true,
            auto_migrate: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("UE_HOST").ok().unwrap_or_else(|| DEFAULT_UE_HOST.into());
        let port = env_parse::<u16, _>("UE_PORT", |s, e| {
            error!("🪛️ {s} is not a valid port for UE_PORT. {e} Using the default, {DEFAULT_UE_PORT}, instead.");
        })
        .unwrap_or(DEFAULT_UE_PORT);
        let database_url = env::var("UE_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ UE_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let upi_payee = UpiPayee {
            vpa: env::var("UE_UPI_VPA").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
                info!("🪛️ UE_UPI_VPA is not set. Payments will be made out to {DEFAULT_UPI_VPA}.");
                DEFAULT_UPI_VPA.to_string()
            }),
            name: env::var("UE_UPI_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UPI_NAME.to_string()),
        };
        let payment_timeout = env_parse::<u64, _>("UE_PAYMENT_TIMEOUT_MS", |s, e| {
            warn!("🪛️ Invalid configuration value for UE_PAYMENT_TIMEOUT_MS ({s}). {e}");
        })
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_PAYMENT_TIMEOUT_MS));
        let max_body_bytes = env_parse::<usize, _>("UE_MAX_BODY_BYTES", |s, e| {
            warn!("🪛️ Invalid configuration value for UE_MAX_BODY_BYTES ({s}). {e}");
        })
        .unwrap_or(DEFAULT_MAX_BODY_BYTES);
        let verify_order_total = env_flag("UE_VERIFY_ORDER_TOTAL", true);
        if !verify_order_total {
            warn!("🚨️ Order totals will not be checked against the line items. Customers set their own prices.");
        }
        let strict_status_transitions = env_flag("UE_STRICT_STATUS_TRANSITIONS", false);
        let ws_require_token = env_flag("UE_WS_REQUIRE_TOKEN", true);
        if !ws_require_token {
            warn!("🚨️ WebSocket joins are not authenticated. Anyone can listen in on any user's room.");
        }
        let auto_migrate = env_flag("UE_AUTO_MIGRATE", true);
        Self {
            host,
            port,
            database_url,
            auth,
            upi_payee,
            payment_timeout,
            verify_order_total,
            strict_status_transitions,
            ws_require_token,
            auto_migrate,
            max_body_bytes,
        }
    }

    pub fn status_policy(&self) -> StatusPolicy {
        if self.strict_status_transitions {
            StatusPolicy::ForwardOnly
        } else {
            StatusPolicy::Permissive
        }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared HS256 secret. Tokens are issued by the storefront's auth service with the same secret.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No token issued \
             elsewhere will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                     you are doing it wrong! Set the UE_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("UE_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [UE_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "UE_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the configuration that request handlers need at runtime. Secrets are deliberately left out.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub ws_require_token: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { ws_require_token: config.ws_require_token }
    }
}
