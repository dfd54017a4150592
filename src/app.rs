//! Application module: exposes the view model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the active tab, the
//! cursor, popups and the uploads waiting to be saved.

mod model;

pub use model::*;
