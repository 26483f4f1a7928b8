use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Public base URL used when building links embedded in emails.
    pub site_url: String,
    /// Shared secret behind the moderation links, the OTP codes and the
    /// contract tokens. Required: main refuses to start without it.
    pub signing_secret: String,
    pub resend_api_key: String,
    pub mail_from: String,
    /// Host address receiving booking/review notifications.
    pub notify_email: String,
    pub reply_to: Option<String>,
    pub property_name: String,
    pub host_name: String,
    pub bank_holder: String,
    pub bank_iban: String,
    pub bank_bic: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bergerie.db".to_string()),
            site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            signing_secret: env::var("SIGNING_SECRET").unwrap_or_default(),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "onboarding@resend.dev".to_string()),
            notify_email: env::var("NOTIFY_EMAIL").unwrap_or_default(),
            reply_to: env::var("REPLY_TO").ok().filter(|v| !v.trim().is_empty()),
            property_name: env::var("PROPERTY_NAME").unwrap_or_else(|_| {
                "Superbe bergerie en cœur de forêt – piscine & lac".to_string()
            }),
            host_name: env::var("HOST_NAME").unwrap_or_else(|_| "Coralie".to_string()),
            bank_holder: env::var("BANK_HOLDER").unwrap_or_default(),
            bank_iban: env::var("BANK_IBAN").unwrap_or_default(),
            bank_bic: env::var("BANK_BIC").unwrap_or_default(),
        }
    }
}
