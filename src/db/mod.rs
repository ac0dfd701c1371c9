use actix_web::web;
use chrono::naive::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sql_types::BigInt;
use diesel::sqlite::SqliteConnection;
use std::path::Path;

use super::config::Config;
use super::error::{Error, Result};
use super::models::{BeverageFields, NewLocation};
use super::schema;

pub mod beverages;
pub mod locations;
pub mod query;

pub use self::beverages::{
    CreateBeverage, DeleteBeverage, FinishBeverage, GetBeverage, ListBeverages, UpdateBeverage,
};
pub use self::locations::{
    CreateLocation, DeleteLocation, GetLocation, ListLocations, RenameLocation,
};

pub type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type Connection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

const SCHEMA: &str = include_str!("../schema.sql");

/// A single logical operation against the store.
///
/// Each implementation runs on exactly one connection; anything that reads and
/// then writes does so inside one transaction.
pub trait Query {
    type Item: Send + 'static;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item>;
}

/// Run `query` on the blocking pool with its own pooled connection. The
/// connection goes back to the pool when the closure returns, whatever the outcome.
pub async fn execute<T>(pool: &Pool, query: T) -> Result<T::Item>
where
    T: Query + Send + 'static,
{
    let pool = pool.clone();

    web::block(move || {
        let mut conn = open(&pool)?;
        query.execute(&mut conn)
    })
    .await?
}

/// Check a connection out of the pool, waiting at most the configured timeout.
pub fn open(pool: &Pool) -> Result<Connection> {
    Ok(pool.get()?)
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// Build the connection pool and make sure the schema exists.
///
/// The parent directory of the database file is created if needed. Sample data
/// is only seeded when `config.seed_sample_data` is set and the store had no
/// tables yet.
pub fn connect(config: &Config) -> Result<Pool> {
    let url = config.database_url.as_str();
    let on_disk = !url.starts_with("file:") && !url.contains(":memory:");

    if on_disk {
        if let Some(parent) = Path::new(url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::StorageUnavailable(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
    }

    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.pool_timeout)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(ConnectionManager::<SqliteConnection>::new(url))?;

    let mut conn = open(&pool)?;
    bootstrap(&mut conn, config.seed_sample_data)?;
    info!("Database ready at {}", url);

    Ok(pool)
}

/// Create the tables if they don't exist yet. A store that already has both
/// tables is left exactly as it is. `seed` only applies to a store with no
/// tables at all.
pub fn bootstrap(conn: &mut SqliteConnection, seed: bool) -> Result<()> {
    conn.immediate_transaction::<_, Error, _>(|conn| {
        let existing = diesel::select(sql::<BigInt>(
            "(SELECT COUNT(*) FROM sqlite_master \
              WHERE type = 'table' AND name IN ('locations', 'beverages'))",
        ))
        .get_result::<i64>(conn)?;

        if existing == 2 {
            return Ok(());
        }

        conn.batch_execute(SCHEMA)?;
        if existing == 0 && seed {
            seed_sample_data(conn)?;
        }
        Ok(())
    })
}

fn seed_sample_data(conn: &mut SqliteConnection) -> Result<()> {
    let cellar = diesel::insert_into(schema::locations::table)
        .values(&NewLocation {
            name: "Wine cellar",
        })
        .returning(schema::locations::id)
        .get_result::<i32>(conn)?;
    diesel::insert_into(schema::locations::table)
        .values(&NewLocation { name: "Kitchen" })
        .execute(conn)?;

    let barolo = BeverageFields {
        name: "Serralunga d'Alba Fontanafredda".to_owned(),
        location_id: Some(cellar),
        year: Some(2014),
        purchase_date: NaiveDate::from_ymd_opt(2019, 10, 22),
        drink_before: NaiveDate::from_ymd_opt(2029, 1, 1),
        notes: Some("Barolo, gifted to me.".to_owned()),
    };
    diesel::insert_into(schema::beverages::table)
        .values(&barolo.validate()?)
        .execute(conn)?;

    info!("Seeded sample locations and beverages");
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_connection() -> SqliteConnection {
    use diesel::Connection as _;

    let mut conn = SqliteConnection::establish(":memory:").unwrap();
    bootstrap(&mut conn, false).unwrap();
    conn
}
