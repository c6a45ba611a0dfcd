use actix_cors::Cors;
use actix_web::{App, HttpServer};

use server::config::ServerConfig;
use server::handlers;
use server::live::LiveConnections;
use server::server::spawn_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let (config, errors) = ServerConfig::from_env();
    for e in errors {
        log::warn!("{}, falling back to default", e);
    }

    let live = LiveConnections::new();
    let srv_tx = spawn_server(&config, live.clone());

    let bind_address = config.bind_address();
    log::info!("Server running on {}", bind_address);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header();
        App::new()
            .wrap(cors)
            .data(srv_tx.clone())
            .data(live.clone())
            .data(config.clone())
            .configure(handlers::root)
    })
    .bind(bind_address)?
    .run()
    .await
}
