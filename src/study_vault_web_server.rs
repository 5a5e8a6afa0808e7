use crate::core::{AppConfig, BlobStore, RedisHelper};
use crate::routes::study_vault_routes;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;

pub struct StudyVaultWebServer {
    port: u16,
    server: Server,
}

impl StudyVaultWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.study_vault_server_config.host,
            configuration.study_vault_server_config.port
        );

        let pg_pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect_lazy_with(configuration.postgres.connect());

        let redis = configuration.redis.connect();
        let blob_store = BlobStore::new(&configuration.storage);

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, pg_pool, redis, blob_store).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub async fn run(
    listener: TcpListener,
    pg_pool: PgPool,
    redis_client: redis::Client,
    blob_store: BlobStore,
) -> Result<Server, anyhow::Error> {
    sqlx::migrate!("./migrations").run(&pg_pool).await?;

    let pg_pool = Data::new(pg_pool);
    let redis_client = Data::new(redis_client);
    let redis_helper = Data::new(RedisHelper::new(redis_client.clone()));
    let blob_store = Data::new(blob_store);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .configure(study_vault_routes)
            .app_data(pg_pool.clone())
            .app_data(redis_client.clone())
            .app_data(redis_helper.clone())
            .app_data(blob_store.clone())
            .wrap(cors)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
