#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

mod api;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod schema;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http, web, App, HttpServer};

use self::config::Config;
use self::error::Result;

fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec![http::Method::GET, http::Method::POST])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    // Create a connection pool to the database, creating the schema on first run.
    let pool = db::connect(&config)?;
    let pool = web::Data::new(pool);

    let listen_addr = config.listen_addr;
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .wrap(Logger::default())
            .wrap(cors())
            .configure(routes::configure)
    })
    .bind(listen_addr)?;

    info!("Listening on {}", listen_addr);

    server.run().await?;
    Ok(())
}
