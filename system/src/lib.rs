pub mod capture;
mod client_session;
mod message;
pub mod renderer;
pub mod supervisor;
pub mod surface;
pub mod tool;
mod types;

pub use capture::{CaptureState, InputEvent, PointerInput, StrokeCapture};
pub use client_session::*;
pub use message::*;
pub use supervisor::{
    ConnectError, ConnectionStatus, Connector, Supervisor, SupervisorConfig, Transport,
    TransportError, TransportState,
};
pub use surface::{CanvasBounds, CompositeMode, DrawingSurface, RecordingSurface};
pub use tool::{Tool, ToolConfig, ToolError};
pub use types::*;

pub extern crate bincode;
pub extern crate euclid;
pub extern crate serde;
pub extern crate serde_json;
pub extern crate uuid;
