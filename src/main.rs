mod config;
mod db;
mod error;
mod middleware;
mod migrations;
mod models;
mod routes;
mod services;
mod telemetry;
mod utils;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};

use crate::config::AppConfig;
use crate::services::mail_service::{LogMailer, Mailer};
use crate::services::payment_service::{KonnectGateway, PaymentGateway};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load().map_err(std::io::Error::other)?;
    telemetry::init(&config);
    if config.uses_default_jwt_secret() {
        tracing::warn!("JWT_SECRET not set, using the insecure default key");
    }

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    tracing::info!("database connected, migrations applied");

    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.mail_from.clone()));
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(KonnectGateway::new(config.konnect.clone()).map_err(std::io::Error::other)?);

    let (host, port) = config.bind_address();
    tracing::info!(%host, port, "starting server");

    let config = web::Data::new(config);
    let mailer = web::Data::from(mailer);
    let gateway = web::Data::from(gateway);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(db.clone()))
            .app_data(config.clone())
            .app_data(mailer.clone())
            .app_data(gateway.clone())
            .configure(routes::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
