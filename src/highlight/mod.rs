pub mod change;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod highlighter;
pub mod locator;
pub(crate) mod log;
pub mod pattern;
pub mod range;
pub mod registry;
pub mod style;
pub mod text;
pub mod wasm;

pub use change::*;
pub use config::*;
pub use dom::*;
pub use engine::*;
pub use error::*;
pub use highlighter::*;
pub use locator::*;
pub use pattern::*;
pub use range::*;
pub use registry::*;
pub use style::*;
pub use text::*;
pub use wasm::*;
