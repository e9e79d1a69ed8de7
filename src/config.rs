use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub bookings_file: PathBuf,
    pub backup_dir: PathBuf,
    pub backup_keep: usize,
    pub backup_hour: u32,
    pub public_dir: PathBuf,
    pub admin_user: String,
    pub admin_pass: String,
    /// Bearer token for scripted admin access; empty disables it.
    pub admin_token: String,
    pub session_secret: String,
    pub production: bool,
    pub apartment_name: String,
    pub daily_rate: i64,
    pub payment_timeout_secs: u64,
    pub max_pending_reservations: usize,
    pub swish_api_url: String,
    pub swish_cert_path: String,
    pub swish_cert_password: String,
    pub swish_payee_alias: String,
    pub swish_callback_url: String,
    pub swish_return_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub mail_from: String,
    pub admin_email: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            bookings_file: PathBuf::from("data/bookings.json"),
            backup_dir: PathBuf::from("backups"),
            backup_keep: 30,
            backup_hour: 2,
            public_dir: PathBuf::from("public"),
            admin_user: "admin".to_string(),
            admin_pass: "admin123".to_string(),
            admin_token: String::new(),
            session_secret: String::new(),
            production: false,
            apartment_name: "the apartment".to_string(),
            daily_rate: 550,
            payment_timeout_secs: 300,
            max_pending_reservations: 64,
            swish_api_url: "https://cpc.getswish.net/swish-cpcapi".to_string(),
            swish_cert_path: String::new(),
            swish_cert_password: String::new(),
            swish_payee_alias: String::new(),
            swish_callback_url: String::new(),
            swish_return_url: String::new(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            mail_from: "Bookings <no-reply@example.com>".to_string(),
            admin_email: String::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            port: parse_env("PORT", d.port),
            bookings_file: env::var("BOOKINGS_FILE").map(PathBuf::from).unwrap_or(d.bookings_file),
            backup_dir: env::var("BACKUP_DIR").map(PathBuf::from).unwrap_or(d.backup_dir),
            backup_keep: parse_env("BACKUP_KEEP", d.backup_keep),
            backup_hour: parse_env("BACKUP_HOUR", d.backup_hour),
            public_dir: env::var("PUBLIC_DIR").map(PathBuf::from).unwrap_or(d.public_dir),
            admin_user: env::var("ADMIN_USER").unwrap_or(d.admin_user),
            admin_pass: env::var("ADMIN_PASS").unwrap_or(d.admin_pass),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_default(),
            // sessions do not survive a restart without a configured secret
            session_secret: env::var("SESSION_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "{}{}",
                        uuid::Uuid::new_v4().simple(),
                        uuid::Uuid::new_v4().simple()
                    )
                }),
            production: env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
            apartment_name: env::var("APARTMENT_NAME").unwrap_or(d.apartment_name),
            daily_rate: parse_env("DAILY_RATE_SEK", d.daily_rate),
            payment_timeout_secs: parse_env("PAYMENT_TIMEOUT_SECS", d.payment_timeout_secs),
            max_pending_reservations: parse_env(
                "MAX_PENDING_RESERVATIONS",
                d.max_pending_reservations,
            ),
            swish_api_url: env::var("SWISH_API_URL").unwrap_or(d.swish_api_url),
            swish_cert_path: env::var("SWISH_CERT_PATH").unwrap_or_default(),
            swish_cert_password: env::var("SWISH_CERT_PASSWORD").unwrap_or_default(),
            swish_payee_alias: env::var("SWISH_PAYEE_ALIAS").unwrap_or_default(),
            swish_callback_url: env::var("SWISH_CALLBACK_URL").unwrap_or_default(),
            swish_return_url: env::var("SWISH_RETURN_URL").unwrap_or_default(),
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: parse_env("SMTP_PORT", d.smtp_port),
            smtp_user: env::var("SMTP_USER").unwrap_or_default(),
            smtp_pass: env::var("SMTP_PASS").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM").unwrap_or(d.mail_from),
            admin_email: env::var("ADMIN_EMAIL")
                .or_else(|_| env::var("SMTP_USER"))
                .unwrap_or_default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
