//! Analytics news digest: fetch vendor and industry feeds, normalize and
//! deduplicate the stories, annotate them, rank them, and render an HTML
//! report, a JSON feed and a plain-text email digest from one ordered list.

pub mod config;
pub mod error;
pub mod history;
pub mod news;
pub mod notify;
pub mod pipeline;
pub mod render;
mod util;
