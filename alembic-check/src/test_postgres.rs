#![allow(dead_code)]

//! PostgreSQL test infrastructure module.
//!
//! One PostgreSQL container is started for the whole test run; every test gets its own
//! freshly created database inside it.

use std::sync::{Mutex, OnceLock};

use postgres::{Client, NoTls};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// Default credentials for testcontainers-modules postgres
const PG_USER: &str = "postgres";
const PG_PASSWORD: &str = "postgres";
const PG_DB: &str = "postgres";

struct SharedPostgres {
    /// Kept alive for the container's lifetime
    runtime: tokio::runtime::Runtime,
    container: Mutex<Option<ContainerAsync<Postgres>>>,
    port: u16,
}

static POSTGRES: OnceLock<SharedPostgres> = OnceLock::new();

fn shared_postgres() -> &'static SharedPostgres {
    POSTGRES.get_or_init(|| {
        let runtime = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        let (container, port) = runtime.block_on(async {
            let container = Postgres::default()
                .start()
                .await
                .expect("failed to start postgres container");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("failed to get postgres port");
            (container, port)
        });
        SharedPostgres {
            runtime,
            container: Mutex::new(Some(container)),
            port,
        }
    })
}

/// Connection URL for a database in the shared container.
pub fn url_with_db(db: &str) -> String {
    format!(
        "postgresql://{}:{}@127.0.0.1:{}/{}",
        PG_USER,
        PG_PASSWORD,
        shared_postgres().port,
        db
    )
}

/// Settings pointing at a database in the shared container.
pub fn settings_for_db(db: &str) -> crate::settings::ConnectionSettings {
    crate::settings::ConnectionSettings {
        db_type: "postgresql".to_string(),
        host: "127.0.0.1".to_string(),
        port: shared_postgres().port.to_string(),
        user: PG_USER.to_string(),
        password: PG_PASSWORD.to_string(),
        name: db.to_string(),
    }
}

/// Create a uniquely named database and connect to it.
pub fn fresh_postgres_db() -> (Client, String) {
    let mut admin =
        Client::connect(&url_with_db(PG_DB), NoTls).expect("failed to connect as admin");
    let db_name = format!("test_{}", Uuid::new_v4().simple());
    admin
        .execute(&format!("CREATE DATABASE \"{}\"", db_name), &[])
        .expect("failed to create test database");
    drop(admin);

    let client =
        Client::connect(&url_with_db(&db_name), NoTls).expect("failed to connect to test database");
    (client, db_name)
}

/// A client connected to a fresh, isolated database.
pub fn get_test_client() -> Client {
    let (client, _db_name) = fresh_postgres_db();
    client
}

#[ctor::dtor]
fn stop_shared_postgres() {
    let Some(shared) = POSTGRES.get() else {
        return;
    };
    let container = shared.container.lock().ok().and_then(|mut c| c.take());
    if let Some(container) = container {
        let _ = shared.runtime.block_on(container.rm());
    }
}
