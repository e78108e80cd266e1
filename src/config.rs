use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub storage: StorageConfig,
    pub naver_map_client_id: String,
    pub deep_link_timeout_ms: u64,
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Clone)]
pub struct StorageConfig {
    /// Base URL of the storage API, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            storage: StorageConfig {
                base_url: env::var("STORAGE_URL")
                    .expect("STORAGE_URL must be set")
                    .trim_end_matches('/')
                    .to_string(),
                service_key: env::var("STORAGE_SERVICE_KEY")
                    .expect("STORAGE_SERVICE_KEY must be set"),
                bucket: env::var("STORAGE_BUCKET")
                    .unwrap_or_else(|_| "source-pins".to_string()),
            },
            naver_map_client_id: env::var("NAVER_MAP_CLIENT_ID").unwrap_or_default(),
            deep_link_timeout_ms: env::var("DEEP_LINK_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .expect("DEEP_LINK_TIMEOUT_MS must be a number"),
            admin_seed,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn deep_link_timeout(&self) -> Duration {
        Duration::from_millis(self.deep_link_timeout_ms)
    }
}
