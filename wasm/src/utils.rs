use std::time::Duration;

pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Wall clock in milliseconds since the epoch, as the supervisor's time origin.
pub fn now() -> Duration {
    Duration::from_millis(js_sys::Date::now() as u64)
}
