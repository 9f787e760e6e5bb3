use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::{Compress, Logger};
use actix_web::{App, HttpServer, web};

use crate::integrations::datajud::DataJudClient;
use crate::models::config::ServerConfig;
use crate::queue::ZmqSender;
use crate::repository::DieselRepository;
use crate::services::auth::AuthSettings;
use crate::services::campaigns::WebhookSettings;

pub mod db;
pub mod domain;
pub mod dto;
pub mod forms;
pub mod integrations;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod queue;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
///
/// The DataJud client wraps a blocking reqwest client, so the caller builds
/// it outside the async runtime.
pub async fn run(server_config: ServerConfig, court: Arc<DataJudClient>) -> std::io::Result<()> {
    // Publisher consumed by the notifier worker.
    let zmq_sender = ZmqSender::bind(&server_config.zmq_notifications_pub)
        .map_err(|e| std::io::Error::other(format!("Failed to start ZMQ sender: {e}")))?;
    let zmq_sender = web::Data::new(zmq_sender);

    // Establish Diesel connection pool for the SQLite database.
    let pool = db::establish_connection_pool(&server_config.database_url).map_err(|e| {
        std::io::Error::other(format!("Failed to establish database connection: {e}"))
    })?;

    let repo = DieselRepository::new(pool);
    let auth_settings = AuthSettings::from(&server_config);
    let webhook_settings = WebhookSettings::from(&server_config);
    let court = web::Data::from(court);

    let bind_address = (server_config.address.clone(), server_config.port);
    log::info!("Starting HTTP server on {}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Compress::default())
            .wrap(Logger::default())
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(auth_settings.clone()))
            .app_data(web::Data::new(webhook_settings.clone()))
            .app_data(zmq_sender.clone())
            .app_data(court.clone())
            .configure(routes::configure)
            .service(Files::new("/uploads", &server_config.static_dir))
    })
    .bind(bind_address)?
    .run()
    .await
}
