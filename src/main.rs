use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

use switchboard::api::{configure_routes, AppState};
use switchboard::config::Settings;
use switchboard::mail::{ImapFetcher, SmtpMailer};
use switchboard::store::SqliteStore;
use switchboard::telephony::TwilioRestClient;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let settings = Settings::new(None)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?
        .normalized();

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log.level.clone()))
        .init();

    let store = SqliteStore::connect(&settings.store.database_url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let bind_addr = (settings.http.host.clone(), settings.http.port);
    let settings = Arc::new(settings);

    let state = web::Data::new(AppState {
        settings: settings.clone(),
        fetcher: Arc::new(ImapFetcher::new(settings.imap.clone())),
        sender: Arc::new(SmtpMailer::new(settings.smtp.clone())),
        telephony: Arc::new(TwilioRestClient::new(settings.telephony.clone())),
        store: Arc::new(store),
    });

    info!("Starting server at http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
