use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use eventbook::config::AppConfig;
use eventbook::db;
use eventbook::handlers;
use eventbook::services::messaging::brevo::BrevoEmailProvider;
use eventbook::services::messaging::fast2sms::Fast2SmsProvider;
use eventbook::services::messaging::whatsapp::WhatsAppApiProvider;
use eventbook::services::messaging::MessagingProvider;
use eventbook::services::notify::{EmailChannel, Notifier, SmsChannel, WhatsAppChannel};
use eventbook::services::reminder;
use eventbook::state::AppState;

fn build_notifier(config: &AppConfig, db: db::Db, client: reqwest::Client) -> Notifier {
    let email = match (&config.brevo_api_key, &config.admin_email) {
        (Some(key), Some(admin_email)) => {
            tracing::info!("email notifications enabled (Brevo)");
            let provider = BrevoEmailProvider::new(
                client.clone(),
                key.clone(),
                config.business_name.clone(),
                admin_email.clone(),
            );
            Some(EmailChannel::new(
                Box::new(provider),
                admin_email.clone(),
                config.business_name.clone(),
            ))
        }
        _ => {
            tracing::warn!("BREVO_API_KEY or ADMIN_EMAIL not set, email notifications disabled");
            None
        }
    };

    let whatsapp_api: Option<Box<dyn MessagingProvider>> =
        match (&config.whatsapp_instance_id, &config.whatsapp_token) {
            (Some(instance), Some(token)) => {
                tracing::info!("WhatsApp API enabled (instance: {instance})");
                Some(Box::new(WhatsAppApiProvider::new(
                    client.clone(),
                    instance.clone(),
                    token.clone(),
                )))
            }
            _ => {
                tracing::info!("WhatsApp API not configured, using wa.me links");
                None
            }
        };
    let whatsapp = WhatsAppChannel::new(
        whatsapp_api,
        config.admin_whatsapp.clone(),
        config.country_code.clone(),
        config.business_name.clone(),
    );

    let sms = match &config.fast2sms_api_key {
        Some(key) => {
            tracing::info!("SMS notifications enabled (Fast2SMS)");
            Some(SmsChannel::new(
                Box::new(Fast2SmsProvider::new(client, key.clone())),
                config.country_code.clone(),
                config.business_name.clone(),
            ))
        }
        None => {
            tracing::warn!("FAST2SMS_API_KEY not set, SMS notifications disabled");
            None
        }
    };

    Notifier::new(db, email, whatsapp, sms)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.warn_on_defaults();

    let conn = db::init_db(&config.database_url)?;
    let db: db::Db = Arc::new(Mutex::new(conn));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.notify_timeout_secs))
        .build()?;

    let notifier = Arc::new(build_notifier(&config, Arc::clone(&db), client));

    reminder::spawn_daily(Arc::clone(&db), Arc::clone(&notifier), config.reminder_at);
    tracing::info!("daily reminders scheduled at {}", config.reminder_at.format("%H:%M"));

    let state = Arc::new(AppState::new(db, config.clone(), notifier));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
