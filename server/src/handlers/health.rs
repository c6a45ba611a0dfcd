use crate::live::LiveConnections;
use actix_web::{web, HttpResponse};
use sharedraw_system::serde_json::json;

pub async fn health(live: web::Data<LiveConnections>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "userCount": live.len(),
    }))
}
