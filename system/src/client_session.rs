use crate::capture::{canvas_point, InputEvent, PointerInput, StrokeCapture};
use crate::message::{ClientMessage, Frame, ServerMessage};
use crate::renderer::{apply_clear, apply_remote};
use crate::supervisor::{ConnectionStatus, Connector, Supervisor, SupervisorConfig};
use crate::surface::DrawingSurface;
use crate::tool::ToolConfig;
use crate::types::Point;
use std::time::Duration;

/// Client side of the shared canvas: local capture, remote rendering and the connection.
pub struct ClientSession<C: Connector, S: DrawingSurface> {
    supervisor: Supervisor<C>,
    surface: S,
    tool: ToolConfig,
    capture: StrokeCapture,
    user_count: u32,
}

impl<C: Connector, S: DrawingSurface> ClientSession<C, S> {
    pub fn new(connector: C, surface: S, config: SupervisorConfig) -> Self {
        Self {
            supervisor: Supervisor::new(connector, config),
            surface,
            tool: ToolConfig::new(),
            capture: StrokeCapture::new(),
            user_count: 0,
        }
    }

    pub fn mount(&mut self, now: Duration) {
        self.supervisor.mount(now);
    }

    pub fn poll(&mut self, now: Duration) -> bool {
        self.supervisor.poll(now)
    }

    pub fn retry(&mut self, now: Duration) {
        self.supervisor.retry(now);
    }

    pub fn teardown(&mut self) {
        self.supervisor.teardown();
    }

    pub fn on_connected(&mut self, now: Duration) {
        self.supervisor.on_connected(now);
    }

    /// A failed attempt closes right after its error; the failure stays visible.
    pub fn on_disconnected(&mut self) {
        if !matches!(self.supervisor.status(), ConnectionStatus::Failed(_)) {
            self.supervisor.on_disconnected();
        }
    }

    /// Only a connect that is still pending fails; errors on a live link are logged.
    pub fn on_transport_error(&mut self, reason: &str) {
        match self.supervisor.status() {
            ConnectionStatus::Connecting { .. } => self.supervisor.on_connect_error(reason),
            _ => log::warn!("Transport error: {}", reason),
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        self.supervisor.status()
    }

    pub fn user_count(&self) -> u32 {
        self.user_count
    }

    pub fn tool(&self) -> &ToolConfig {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut ToolConfig {
        &mut self.tool
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Maps a mouse or touch position onto the canvas.
    pub fn locate(&self, input: &PointerInput) -> Option<Point> {
        canvas_point(input, &self.surface.bounds())
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        if let Some(segment) = self.capture.handle(event, &self.tool, &mut self.surface) {
            // Already on the local canvas; a segment lost here only misses the peers.
            if let Err(e) = self.supervisor.send(&ClientMessage::Draw(segment)) {
                log::debug!("Segment not sent: {}", e);
            }
        }
    }

    /// Asks everyone, this client included, to clear. The local canvas clears when the
    /// server echoes `clear` back.
    pub fn request_clear(&mut self) {
        if let Err(e) = self.supervisor.send(&ClientMessage::Clear) {
            log::warn!("Clear not sent: {}", e);
        }
    }

    pub fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Draw(segment) => apply_remote(&mut self.surface, &segment),
            ServerMessage::Clear => apply_clear(&mut self.surface),
            ServerMessage::UserCount(count) => {
                log::debug!("User count received: {}", count);
                self.user_count = count;
            }
            ServerMessage::PingCheck => self.supervisor.on_ping(),
        }
    }

    pub fn handle_frame(&mut self, frame: &Frame) {
        match frame.decode::<ServerMessage>() {
            Ok(message) => self.handle_server_message(message),
            Err(e) => log::warn!("Ignoring server frame: {}", e),
        }
    }
}
