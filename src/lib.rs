#[macro_use]
extern crate rocket;

pub mod cache;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod request_logger;
pub mod routes;

use crate::cache::ListingCache;
use crate::db::CatalogDb;
use crate::import::ImportLock;
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    // Configure CORS
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(CatalogDb::init())
        .attach(cors)
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match CatalogDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        match db::run_migrations(&pool).await {
                            Ok(_) => {
                                log::info!("database migrations successful");
                                Ok(rocket)
                            }
                            Err(e) => {
                                log::error!("database migrations failed: {}", e);
                                Err(rocket)
                            }
                        }
                    }
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        // Clone the pool into managed state for the handlers, alongside the
        // listing cache and the import run lock.
        .attach(AdHoc::try_on_ignite(
            "Manage DB Pool and Import State",
            |rocket| async move {
                match CatalogDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();

                        Ok(rocket
                            .manage(pool)
                            .manage(ListingCache::new())
                            .manage(ImportLock::default()))
                    }
                    None => Err(rocket),
                }
            },
        ))
        .mount(
            "/api/v1",
            openapi_get_routes![
                routes::health::health_check,
                routes::products::list_products,
                routes::products::import_catalog,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Catalog API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use crate::cache::ListingCache;
    use crate::import::ImportLock;
    use log::LevelFilter;
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
    use testcontainers_modules::postgres::Postgres;
    use testcontainers_modules::testcontainers::core::error::TestcontainersError;
    use testcontainers_modules::testcontainers::runners::AsyncRunner;
    use testcontainers_modules::testcontainers::{ContainerAsync, ImageExt};
    use thiserror::Error;

    static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

    const POSTGRES_TAG: &str = "16-alpine";

    #[derive(Debug, Error)]
    pub enum TestDatabaseError {
        #[error("container error: {0}")]
        Container(#[from] TestcontainersError),
        #[error("database error: {0}")]
        Sqlx(#[from] sqlx::Error),
        #[error("migration error: {0}")]
        Migration(#[from] sqlx::migrate::MigrateError),
    }

    /// One disposable Postgres instance per test, schema migrated.
    ///
    /// Every test gets its own container, so there is no shared server to
    /// clean up: dropping this (or calling [`TestDatabase::close`]) tears
    /// the whole instance down, database and all.
    pub struct TestDatabase {
        pool: PgPool,
        _container: ContainerAsync<Postgres>,
    }

    impl TestDatabase {
        /// Launch a Postgres container, connect, and migrate the schema.
        pub async fn new() -> Result<Self, TestDatabaseError> {
            let container = Postgres::default().with_tag(POSTGRES_TAG).start().await?;

            let host = container.get_host().await?;
            let port = container.get_host_port_ipv4(5432).await?;

            let options: PgConnectOptions =
                format!("postgres://postgres:postgres@{host}:{port}/postgres")
                    .parse()
                    .map_err(TestDatabaseError::Sqlx)?;
            // Statement logging drowns out test output.
            let options = options.log_statements(LevelFilter::Off);

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?;

            MIGRATOR.run(&pool).await?;

            Ok(Self {
                pool,
                _container: container,
            })
        }

        /// Cloneable connection pool for use in tests and Rocket state.
        pub fn pool(&self) -> &PgPool {
            &self.pool
        }

        /// Convenience method returning a clone of the pooled connection handle.
        pub fn pool_clone(&self) -> PgPool {
            self.pool.clone()
        }

        /// Close the pool and discard the container.
        pub async fn close(self) {
            self.pool.close().await;
        }
    }

    /// Convenience helpers for seeding the products table in tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        /// Create a fixture helper bound to the provided pool.
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a product row directly, bypassing the import pipeline.
        pub async fn insert_product(
            &self,
            code: &str,
            description: &str,
            price: f64,
            unit: &str,
        ) -> Result<i64, sqlx::Error> {
            let id: i64 = code.parse().unwrap_or_default();
            sqlx::query(
                "INSERT INTO products (id, code, description, price, unit) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(code)
            .bind(description)
            .bind(price)
            .bind(unit)
            .execute(self.pool)
            .await?;

            Ok(id)
        }

        /// Fetch the stored codes in ascending order for assertions.
        pub async fn stored_codes(&self) -> Result<Vec<String>, sqlx::Error> {
            sqlx::query_scalar("SELECT code FROM products ORDER BY code ASC")
                .fetch_all(self.pool)
                .await
        }
    }

    /// Builds Rocket instances for route-level tests: quiet logging, random
    /// port, routes mounted under `/api/v1`, and the listing cache plus
    /// import lock the product handlers require.
    pub struct TestRocketBuilder {
        figment: Figment,
        api_routes: Vec<Route>,
        pg_pool: Option<PgPool>,
    }

    impl TestRocketBuilder {
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                api_routes: Vec::new(),
                pg_pool: None,
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.api_routes.extend(routes);
            self
        }

        /// Manage a `PgPool` instance for tests that exercise database-backed routes.
        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment)
                .mount("/api/v1", self.api_routes)
                .manage(ListingCache::new())
                .manage(ImportLock::default());

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }

            rocket
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
