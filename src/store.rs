//! Persistence adapters: the per-user local store for private tracks and the
//! optional shared feed used for global sharing.

mod cloud;
mod local;

pub use cloud::{CloudFeed, CloudPublisher, DirCloud};
pub use local::{DirStore, LocalStore, record_for_upload};
