mod config;
mod error;
mod import;
mod services;
mod spreadsheet;
mod state;
mod store;

use crate::config::Settings;
use crate::state::AppState;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(io::Error::other)?;
    let state = AppState::from_settings(&settings).map_err(io::Error::other)?;
    let json_limit = settings.max_upload_bytes;

    let stored = state.store.count().map_err(io::Error::other)?;
    info!(
        "Lead store at {} ({} leads), uploads in {}",
        settings.database_path.display(),
        stored,
        settings.upload_dir.display()
    );
    info!("Server running at {}", settings.server_url());

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .service(services::leads::configure_routes(json_limit))
    })
    .bind(settings.bind_address())?
    .run()
    .await
}
