use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, StreamHandler};
use actix_web::{error, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;

use sharedraw_system::uuid::Uuid;
use sharedraw_system::{ClientMessage, Frame, ServerMessage, SessionId, WireFormat};

use crate::config::ServerConfig;
use crate::live::LiveConnections;
use crate::server::{ConnectionCommand, ServerTx};
use crate::session::Session;

#[derive(Message)]
#[rtype(result = "()")]
struct Egress(ServerMessage);

#[derive(Debug, Clone, Copy)]
struct Heartbeat {
    interval: Duration,
    timeout: Duration,
}

/// One WebSocket participant. Decodes ingress for the server task and encodes egress.
struct ConnectionActor {
    session_id: SessionId,
    format: WireFormat,
    srv_tx: ServerTx,
    live: LiveConnections,
    heartbeat: Heartbeat,
    last_seen: Instant,
}

impl ConnectionActor {
    fn new(
        format: WireFormat,
        srv_tx: ServerTx,
        live: LiveConnections,
        config: &ServerConfig,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            format,
            srv_tx,
            live,
            heartbeat: Heartbeat {
                interval: config.heartbeat_interval,
                timeout: config.client_timeout,
            },
            last_seen: Instant::now(),
        }
    }

    fn send_to_server(&self, command: ConnectionCommand) {
        // Fails only once the server task is gone.
        if let Err(e) = self.srv_tx.send(command) {
            log::warn!("Dropping command of session {}: {}", self.session_id, e);
        }
    }

    fn send_to_client(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match self.format.encode(message) {
            Ok(Frame::Binary(bytes)) => ctx.binary(bytes),
            Ok(Frame::Text(text)) => ctx.text(text),
            Err(e) => log::error!("Cannot encode {:?}: {}", message, e),
        }
    }

    fn handle_frame(&mut self, frame: Frame, ctx: &mut ws::WebsocketContext<Self>) {
        log::debug!("Ingress size: {}", frame.len());
        let message = match frame.decode::<ClientMessage>() {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Ignoring frame from session {}: {}", self.session_id, e);
                return;
            }
        };
        log::debug!("Ingress {:?}", message);
        let from = self.session_id;
        match message {
            ClientMessage::Draw(segment) => {
                self.send_to_server(ConnectionCommand::Draw { from, segment })
            }
            ClientMessage::Clear => self.send_to_server(ConnectionCommand::Clear { from }),
            ClientMessage::PongCheck => log::trace!("Pong check from session {}", from),
            ClientMessage::Leave => {
                log::info!("Session {} is leaving", from);
                ctx.close(None);
                ctx.stop();
            }
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let Heartbeat { interval, timeout } = self.heartbeat;
        ctx.run_interval(interval, move |act, ctx| {
            if Instant::now().duration_since(act.last_seen) > timeout {
                log::info!("Session {} missed heartbeat, disconnecting", act.session_id);
                ctx.stop();
                return;
            }
            act.send_to_client(&ServerMessage::PingCheck, ctx);
        });
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ServerMessage>();
        let session = Session::new(self.session_id, tx);

        self.live.insert(session.clone());
        self.send_to_server(ConnectionCommand::Connect { session });

        let addr = ctx.address().recipient();
        let session_id = self.session_id;
        tokio::spawn(async move {
            log::debug!("connection green thread - started ({})", session_id);
            while let Some(message) = rx.recv().await {
                if addr.do_send(Egress(message)).is_err() {
                    break;
                }
            }
            log::debug!("connection green thread - terminated ({})", session_id);
        });

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        self.live.remove(&self.session_id);
        let from = self.session_id;
        self.send_to_server(ConnectionCommand::Disconnect { from });
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        self.last_seen = Instant::now();
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => (),
            Ok(ws::Message::Binary(bin)) => self.handle_frame(Frame::Binary(bin.to_vec()), ctx),
            Ok(ws::Message::Text(text)) => {
                let text: &str = &text;
                self.handle_frame(Frame::Text(text.to_owned()), ctx)
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => (),
            Err(e) => {
                log::warn!("Protocol error on session {}: {}", self.session_id, e);
                ctx.stop();
            }
        }
    }
}

/// Egress
impl Handler<Egress> for ConnectionActor {
    type Result = ();

    fn handle(&mut self, msg: Egress, ctx: &mut ws::WebsocketContext<Self>) -> Self::Result {
        log::debug!("Egress {:?}", msg.0);
        self.send_to_client(&msg.0, ctx);
    }
}

#[derive(Deserialize)]
pub struct WsQuery {
    format: Option<String>,
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    srv_tx: web::Data<ServerTx>,
    live: web::Data<LiveConnections>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, Error> {
    let format = match query.format.as_deref() {
        None => WireFormat::default(),
        Some(name) => name
            .parse::<WireFormat>()
            .map_err(|_| error::ErrorBadRequest(format!("unknown wire format {:?}", name)))?,
    };
    ws::start(
        ConnectionActor::new(
            format,
            srv_tx.get_ref().clone(),
            live.get_ref().clone(),
            config.get_ref(),
        ),
        &req,
        stream,
    )
}
