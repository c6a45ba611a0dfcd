mod surface;
mod transport;
mod utils;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use sharedraw_system::{
    ClientSession, ConnectionStatus, InputEvent, Point, PointerInput, SupervisorConfig, Tool,
    WireFormat,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent,
};

use surface::CanvasSurface;
use transport::{EventSink, SocketEvent, WebSocketConnector};

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

type Session = ClientSession<WebSocketConnector, CanvasSurface>;

struct AppState {
    session: Session,
    on_change: Option<js_sys::Function>,
}

/// What the page shows about the session; the change listener fires when it moves.
#[derive(PartialEq)]
struct Summary {
    status: &'static str,
    user_count: u32,
}

fn summarize(session: &Session) -> Summary {
    Summary {
        status: status_label(session.status()),
        user_count: session.user_count(),
    }
}

fn status_label(status: &ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connecting { .. } => "connecting",
        ConnectionStatus::Connected { .. } => "connected",
        ConnectionStatus::Disconnected => "disconnected",
        ConnectionStatus::Failed(_) => "failed",
    }
}

/// Runs `f` on the session and notifies the page if the summary changed. The listener is
/// invoked after the borrow ends so it may call back into `CanvasApp`.
fn update(state: &Rc<RefCell<AppState>>, f: impl FnOnce(&mut Session)) {
    let listener = match state.try_borrow_mut() {
        Ok(mut app) => {
            let before = summarize(&app.session);
            f(&mut app.session);
            if summarize(&app.session) == before {
                None
            } else {
                app.on_change.clone()
            }
        }
        Err(_) => {
            log::warn!("Dropping event raised during another update");
            return;
        }
    };
    if let Some(listener) = listener {
        if let Err(e) = listener.call0(&JsValue::NULL) {
            log::warn!("Change listener failed: {:?}", e);
        }
    }
}

fn update_weak(state: &Weak<RefCell<AppState>>, f: impl FnOnce(&mut Session)) {
    if let Some(state) = state.upgrade() {
        update(&state, f);
    }
}

fn on_socket_event(session: &mut Session, event: SocketEvent) {
    match event {
        SocketEvent::Open => session.on_connected(utils::now()),
        SocketEvent::Close => session.on_disconnected(),
        SocketEvent::Error(reason) => session.on_transport_error(&reason),
        SocketEvent::Frame(frame) => session.handle_frame(&frame),
    }
}

fn listen(
    target: &EventTarget,
    name: &str,
    state: &Rc<RefCell<AppState>>,
    handler: impl Fn(&mut Session, Event) + 'static,
) -> Result<(), JsValue> {
    let state = Rc::downgrade(state);
    let closure = Closure::wrap(Box::new(move |event: Event| {
        update_weak(&state, |session| handler(session, event))
    }) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn mouse_point(session: &Session, event: &Event) -> Option<Point> {
    let event = event.dyn_ref::<MouseEvent>()?;
    session.locate(&PointerInput::Mouse {
        client: Point::new(event.client_x() as f32, event.client_y() as f32),
    })
}

fn touch_point(session: &Session, event: &Event) -> Option<Point> {
    let event = event.dyn_ref::<TouchEvent>()?;
    let list = event.touches();
    let touches = (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| Point::new(t.client_x() as f32, t.client_y() as f32))
        .collect();
    session.locate(&PointerInput::Touch { touches })
}

fn attach_pointer_listeners(
    canvas: &HtmlCanvasElement,
    state: &Rc<RefCell<AppState>>,
) -> Result<(), JsValue> {
    let target: &EventTarget = canvas.as_ref();

    listen(target, "mousedown", state, |session, event| {
        if let Some(point) = mouse_point(session, &event) {
            session.handle_input(InputEvent::PointerDown(point));
        }
    })?;
    listen(target, "mousemove", state, |session, event| {
        if let Some(point) = mouse_point(session, &event) {
            session.handle_input(InputEvent::PointerMove(point));
        }
    })?;
    listen(target, "mouseup", state, |session, _| {
        session.handle_input(InputEvent::PointerUp)
    })?;
    listen(target, "mouseleave", state, |session, _| {
        session.handle_input(InputEvent::PointerLeave)
    })?;

    listen(target, "touchstart", state, |session, event| {
        event.prevent_default();
        if let Some(point) = touch_point(session, &event) {
            session.handle_input(InputEvent::PointerDown(point));
        }
    })?;
    listen(target, "touchmove", state, |session, event| {
        event.prevent_default();
        if let Some(point) = touch_point(session, &event) {
            session.handle_input(InputEvent::PointerMove(point));
        }
    })?;
    listen(target, "touchend", state, |session, event| {
        event.prevent_default();
        session.handle_input(InputEvent::PointerUp);
    })?;
    listen(target, "touchcancel", state, |session, event| {
        event.prevent_default();
        session.handle_input(InputEvent::TouchCancel);
    })?;
    Ok(())
}

fn attach_window_listeners(
    window: &web_sys::Window,
    state: &Rc<RefCell<AppState>>,
) -> Result<(), JsValue> {
    let target: &EventTarget = window.as_ref();
    listen(target, "resize", state, |session, _| {
        session.surface_mut().resize()
    })?;
    listen(target, "beforeunload", state, |session, _| session.teardown())?;
    Ok(())
}

/// Fires once the connect deadline has passed so a stalled attempt surfaces as failed.
fn schedule_connect_check(
    state: &Rc<RefCell<AppState>>,
    timeout: Duration,
) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let state = Rc::downgrade(state);
    let callback = Closure::once_into_js(move || {
        update_weak(&state, |session| {
            session.poll(utils::now());
        })
    });
    let delay = timeout.as_millis() as i32 + 50;
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay,
    )?;
    Ok(())
}

#[wasm_bindgen]
pub struct CanvasApp {
    state: Rc<RefCell<AppState>>,
    connect_timeout: Duration,
}

#[wasm_bindgen]
impl CanvasApp {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, server_url: &str) -> Result<CanvasApp, JsValue> {
        utils::set_panic_hook();
        console_log::init_with_level(log::Level::Info).ok();

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id {:?}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let config = SupervisorConfig::default();
        let connect_timeout = config.connect_timeout;
        let surface = CanvasSurface::new(canvas.clone(), ctx);
        let server_url = server_url.to_owned();

        let state = Rc::new_cyclic(|weak: &Weak<RefCell<AppState>>| {
            let weak = weak.clone();
            let sink: EventSink = Rc::new(move |event: SocketEvent| {
                update_weak(&weak, |session| on_socket_event(session, event))
            });
            let connector = WebSocketConnector::new(&server_url, WireFormat::Binary, sink);
            RefCell::new(AppState {
                session: ClientSession::new(connector, surface, config),
                on_change: None,
            })
        });

        attach_pointer_listeners(&canvas, &state)?;
        attach_window_listeners(&window, &state)?;

        update(&state, |session| session.mount(utils::now()));
        schedule_connect_check(&state, connect_timeout)?;

        Ok(CanvasApp {
            state,
            connect_timeout,
        })
    }

    pub fn set_brush(&self) {
        update(&self.state, |session| session.tool_mut().set_tool(Tool::Brush));
    }

    pub fn set_eraser(&self) {
        update(&self.state, |session| session.tool_mut().set_tool(Tool::Eraser));
    }

    pub fn set_color(&self, color: &str) -> Result<(), JsValue> {
        let mut result = Ok(());
        update(&self.state, |session| {
            result = session.tool_mut().set_color(color);
        });
        result.map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_size(&self, size: f32) -> Result<(), JsValue> {
        let mut result = Ok(());
        update(&self.state, |session| {
            result = session.tool_mut().set_size(size);
        });
        result.map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn clear(&self) {
        update(&self.state, |session| session.request_clear());
    }

    /// Manual refresh after a failed connect.
    pub fn retry(&self) -> Result<(), JsValue> {
        update(&self.state, |session| session.retry(utils::now()));
        schedule_connect_check(&self.state, self.connect_timeout)
    }

    pub fn user_count(&self) -> u32 {
        self.state.borrow().session.user_count()
    }

    pub fn status(&self) -> String {
        status_label(self.state.borrow().session.status()).to_owned()
    }

    pub fn status_message(&self) -> String {
        match self.state.borrow().session.status() {
            ConnectionStatus::Connecting { .. } => "Connecting...".to_owned(),
            ConnectionStatus::Connected { .. } => String::new(),
            ConnectionStatus::Disconnected => "Disconnected".to_owned(),
            ConnectionStatus::Failed(e) => e.to_string(),
        }
    }

    /// `listener` is called with no arguments whenever status or user count changes.
    pub fn set_on_change(&self, listener: Option<js_sys::Function>) {
        self.state.borrow_mut().on_change = listener;
    }
}
