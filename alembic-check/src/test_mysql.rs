#![allow(dead_code)]

//! MySQL test infrastructure module.
//!
//! One MySQL container is started for the whole test run; every test gets its own freshly
//! created database inside it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use mysql::prelude::*;
use mysql::{Conn, Opts, Pool};
use testcontainers::core::logs::LogFrame;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use uuid::Uuid;

const ROOT_PASSWORD: &str = "rootpw";

struct SharedMysql {
    /// Kept alive for the container's lifetime
    runtime: tokio::runtime::Runtime,
    container: Mutex<Option<ContainerAsync<GenericImage>>>,
    port: u16,
}

static MYSQL: OnceLock<SharedMysql> = OnceLock::new();

fn shared_mysql() -> &'static SharedMysql {
    MYSQL.get_or_init(|| {
        let runtime = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        let (container, port) = runtime.block_on(start_mysql());
        SharedMysql {
            runtime,
            container: Mutex::new(Some(container)),
            port,
        }
    })
}

/// Start MySQL 8.4 and wait until the real server (not the init-time temporary one) accepts
/// connections.
async fn start_mysql() -> (ContainerAsync<GenericImage>, u16) {
    let temporary_server_started = Arc::new(AtomicBool::new(false));
    let mysql_ready = Arc::new(AtomicBool::new(false));
    let temporary = Arc::clone(&temporary_server_started);
    let ready = Arc::clone(&mysql_ready);

    let log_consumer = move |log: &LogFrame| {
        let msg = format!("{:?}", log);
        if msg.contains("Temporary server started") {
            temporary.store(true, Ordering::SeqCst);
        } else if temporary.load(Ordering::SeqCst)
            && msg.contains("/usr/sbin/mysqld: ready for connections")
        {
            ready.store(true, Ordering::SeqCst);
        }
    };

    let image = GenericImage::new("mysql", "8.4")
        .with_log_consumer(log_consumer)
        .with_env_var("MYSQL_ROOT_PASSWORD", ROOT_PASSWORD)
        .with_env_var("MYSQL_DATABASE", "bootstrap");

    let container = AsyncRunner::start(image)
        .await
        .expect("failed to start mysql docker image");

    while !mysql_ready.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let port = container
        .get_host_port_ipv4(3306)
        .await
        .expect("failed to get mysql port");
    (container, port)
}

/// Connection URL for a database in the shared container.
pub fn url_with_db(db: &str) -> String {
    format!(
        "mysql://root:{}@127.0.0.1:{}/{}",
        ROOT_PASSWORD,
        shared_mysql().port,
        db
    )
}

/// Settings pointing at a database in the shared container.
pub fn settings_for_db(db: &str) -> crate::settings::ConnectionSettings {
    crate::settings::ConnectionSettings {
        db_type: "mysql".to_string(),
        host: "127.0.0.1".to_string(),
        port: shared_mysql().port.to_string(),
        user: "root".to_string(),
        password: ROOT_PASSWORD.to_string(),
        name: db.to_string(),
    }
}

/// Create a uniquely named database and return a pool connected to it.
pub fn fresh_mysql_db() -> (Pool, String) {
    let admin_pool = Pool::new(Opts::from_url(&url_with_db("bootstrap")).expect("parse admin url"))
        .expect("create admin pool");
    let mut admin = admin_pool.get_conn().expect("failed to get admin conn");

    let db_name = format!("test_{}", Uuid::new_v4().simple());
    admin
        .query_drop(format!(
            "CREATE DATABASE `{}` CHARACTER SET utf8mb4",
            db_name
        ))
        .expect("failed to create test database");

    let pool = Pool::new(Opts::from_url(&url_with_db(&db_name)).expect("parse test url"))
        .expect("create test pool");
    (pool, db_name)
}

/// A connection to a fresh, isolated database, along with the pool keeping it alive.
pub fn get_test_conn() -> (Pool, Conn) {
    let (pool, _db_name) = fresh_mysql_db();
    let conn = pool.get_conn().unwrap().unwrap();
    (pool, conn)
}

#[ctor::dtor]
fn stop_shared_mysql() {
    let Some(shared) = MYSQL.get() else {
        return;
    };
    let container = shared.container.lock().ok().and_then(|mut c| c.take());
    if let Some(container) = container {
        let _ = shared.runtime.block_on(container.rm());
    }
}
