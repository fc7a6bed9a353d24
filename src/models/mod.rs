//! Data models
//!
//! This module contains the data structures used throughout the site:
//! - `Locale`, the display language selected by the URL
//! - `BlogPost` and its localized views

mod locale;
mod post;

pub use locale::Locale;
pub use post::{BlogPost, Localized, PostCard, PostView};
