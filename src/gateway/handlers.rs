//! HTTP handlers, one per resource and verb

mod health;
mod helpers;
mod item;
mod store;
mod tag;

pub use health::*;
pub use helpers::{ItemView, StoreView, TagLinkResponse, TagView};
pub use item::*;
pub use store::*;
pub use tag::*;
