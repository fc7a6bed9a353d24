//! OddsPress - multilingual sports-odds blog
//!
//! Static posts and UI strings in six languages, rendered server-side with
//! locale-aware Markdown and a shared page shell.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod content;
pub mod models;
pub mod services;
pub mod theme;
