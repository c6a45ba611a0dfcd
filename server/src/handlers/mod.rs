use crate::connection::ws_index;
use crate::handlers::health::health;
use actix_web::web;

mod health;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws/").route(web::get().to(ws_index)));
    cfg.service(web::resource("/health").route(web::get().to(health)));
}
