#![forbid(unsafe_code)]
//! Browser host for the courier protocol engine: `localStorage` persistence,
//! `Date.now()` time, console logging, and the `CourierApp` JS facade.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod app;
pub mod bridge;
pub mod clock;
pub mod dom;
pub mod logger;
pub mod storage;

pub use app::CourierApp;
pub use clock::BrowserClock;
pub use storage::{LocalStorageProgress, WebStorageError};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);
}
