//! Diagnostics sink.
//!
//! Browser builds write to `web_sys::console` with a `[Component]` prefix.
//! Native builds (tests, non-browser hosts) go through `tracing`, since
//! calling into the console import off-wasm panics.

pub(crate) fn warn(component: &str, message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&format!("[{}] {}", component, message).into());

    #[cfg(not(target_arch = "wasm32"))]
    tracing::warn!(component = component, "{}", message);
}

pub(crate) fn debug(component: &str, message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::debug_1(&format!("[{}] {}", component, message).into());

    #[cfg(not(target_arch = "wasm32"))]
    tracing::debug!(component = component, "{}", message);
}
