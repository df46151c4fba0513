use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::io::{Error, ErrorKind};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::notifications::EmailWelcomeNotifier;
use crate::routes::{
    handle_create_subscription, handle_download_resource, handle_unsubscribe, health_check,
    json_error_handler,
};
use crate::services::byte_source::{ByteSource, LocalFileSource, RemoteSource};
use crate::services::resource_fetcher::ResourceFetcher;
use crate::services::subscription_manager::SubscriptionManager;
use crate::store::postgres::{PgResourceStore, PgSubscriberStore};
use crate::store::{ResourceStore, SubscriberStore};

/// The content collections the application reads and writes.
pub struct Stores {
    pub subscribers: Arc<dyn SubscriberStore>,
    pub resources: Arc<dyn ResourceStore>,
}

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let stores = Stores {
            subscribers: Arc::new(PgSubscriberStore::new(db_pool.clone())),
            resources: Arc::new(PgResourceStore::new(db_pool)),
        };

        Self::build_with_stores(config, stores).await
    }

    /// HTTP clients are created here, once, and handed to the services that use them.
    pub async fn build_with_stores(config: Settings, stores: Stores) -> Result<Self, Error> {
        let sender_email = config
            .get_email_client_sender()
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.get_email_client_api(),
            Some(config.get_email_client_timeout()),
        )
        .map_err(|err| Error::new(ErrorKind::Other, err))?;
        let notifier = EmailWelcomeNotifier::new(email_client, config.get_app_base_url());
        let subscription_manager = SubscriptionManager::new(stores.subscribers, Arc::new(notifier));

        let storage_client = reqwest::Client::builder()
            .timeout(config.get_storage_timeout())
            .build()
            .map_err(|err| Error::new(ErrorKind::Other, err))?;
        let sources: Vec<Box<dyn ByteSource>> = vec![
            Box::new(LocalFileSource::new(config.get_media_directory())) as Box<dyn ByteSource>,
            Box::new(RemoteSource::new(storage_client)),
        ];
        let resource_fetcher = ResourceFetcher::new(stores.resources, sources);

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, subscription_manager, resource_fetcher)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    subscription_manager: SubscriptionManager,
    resource_fetcher: ResourceFetcher,
) -> Result<Server, Error> {
    let subscription_manager = web::Data::new(subscription_manager);
    let resource_fetcher = web::Data::new(resource_fetcher);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscriptions", web::post().to(handle_create_subscription))
            .route(
                "/subscriptions/unsubscribe",
                web::post().to(handle_unsubscribe),
            )
            .route(
                "/resources/{id}/download",
                web::get().to(handle_download_resource),
            )
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(subscription_manager.clone())
            .app_data(resource_fetcher.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
