use std::rc::Rc;

use sharedraw_system::{
    ClientMessage, Connector, Frame, Transport, TransportError, TransportState, WireFormat,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, Event, MessageEvent, WebSocket};

/// What a socket reports back to the application.
#[derive(Debug)]
pub enum SocketEvent {
    Open,
    Close,
    Error(String),
    Frame(Frame),
}

pub type EventSink = Rc<dyn Fn(SocketEvent)>;

pub struct WebSocketConnector {
    url: String,
    format: WireFormat,
    sink: EventSink,
}

impl WebSocketConnector {
    pub fn new(server_url: &str, format: WireFormat, sink: EventSink) -> Self {
        let base = server_url.trim_end_matches('/');
        let url = match format {
            WireFormat::Binary => format!("{}/ws/", base),
            WireFormat::Json => format!("{}/ws/?format=json", base),
        };
        Self { url, format, sink }
    }
}

impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    fn open(&mut self) -> Result<WebSocketTransport, TransportError> {
        log::debug!("Opening websocket to {}", self.url);
        let socket = WebSocket::new(&self.url).map_err(|e| TransportError::Open(describe(&e)))?;
        socket.set_binary_type(BinaryType::Arraybuffer);
        let handlers = Handlers::attach(&socket, &self.sink);
        Ok(WebSocketTransport {
            socket,
            format: self.format,
            handlers: Some(handlers),
        })
    }
}

struct Handlers {
    _onopen: Closure<dyn FnMut(Event)>,
    _onclose: Closure<dyn FnMut(Event)>,
    _onerror: Closure<dyn FnMut(Event)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
}

impl Handlers {
    fn attach(socket: &WebSocket, sink: &EventSink) -> Self {
        let s = sink.clone();
        let onopen = Closure::wrap(Box::new(move |_: Event| s(SocketEvent::Open))
            as Box<dyn FnMut(Event)>);
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let s = sink.clone();
        let onclose = Closure::wrap(Box::new(move |_: Event| s(SocketEvent::Close))
            as Box<dyn FnMut(Event)>);
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let s = sink.clone();
        let onerror = Closure::wrap(Box::new(move |_: Event| {
            // Browsers deliver a bare `Event` here with no detail about the failure.
            s(SocketEvent::Error("websocket connection failed".to_owned()))
        }) as Box<dyn FnMut(Event)>);
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        let s = sink.clone();
        let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
            let data = e.data();
            let frame = if let Some(buf) = data.dyn_ref::<js_sys::ArrayBuffer>() {
                Frame::Binary(js_sys::Uint8Array::new(buf).to_vec())
            } else if let Some(text) = data.as_string() {
                Frame::Text(text)
            } else {
                log::warn!("Ignoring websocket message of unknown type");
                return;
            };
            s(SocketEvent::Frame(frame))
        }) as Box<dyn FnMut(MessageEvent)>);
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        Self {
            _onopen: onopen,
            _onclose: onclose,
            _onerror: onerror,
            _onmessage: onmessage,
        }
    }
}

pub struct WebSocketTransport {
    socket: WebSocket,
    format: WireFormat,
    handlers: Option<Handlers>,
}

impl WebSocketTransport {
    fn detach(&mut self) {
        if self.handlers.take().is_some() {
            self.socket.set_onopen(None);
            self.socket.set_onclose(None);
            self.socket.set_onerror(None);
            self.socket.set_onmessage(None);
        }
    }
}

impl Transport for WebSocketTransport {
    fn state(&self) -> TransportState {
        if self.handlers.is_none() {
            return TransportState::Disconnected;
        }
        match self.socket.ready_state() {
            WebSocket::CONNECTING => TransportState::Connecting,
            WebSocket::OPEN => TransportState::Connected,
            _ => TransportState::Disconnected,
        }
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let frame = self
            .format
            .encode(message)
            .map_err(|e| TransportError::Send(e.to_string()))?;
        let sent = match &frame {
            Frame::Binary(bytes) => self.socket.send_with_u8_array(bytes),
            Frame::Text(text) => self.socket.send_with_str(text),
        };
        log::debug!("Egress size: {}", frame.len());
        sent.map_err(|e| TransportError::Send(describe(&e)))
    }

    fn disconnect(&mut self) {
        self.detach();
        if let Err(e) = self.socket.close() {
            log::warn!("Cannot close websocket: {}", describe(&e));
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        // Closures die with this struct; the socket must not call into them afterwards.
        self.detach();
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
