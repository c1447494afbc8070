//! Chat widget support: response tokenizing, rendering and input screening.
//!
//! - [`tokenizer`] splits assistant text into typed segments
//! - [`render`] turns segments into escaped HTML with localized button labels
//! - [`navigation`] dispatches button actions to the page environment
//! - [`guard`] screens user messages before they reach the assistant
//! - [`rate_limit`] caps requests per client

pub mod guard;
pub mod navigation;
pub mod rate_limit;
pub mod render;
pub mod tokenizer;

pub use self::render::Locale;
pub use self::tokenizer::{tokenize, ButtonAction, Segment, SegmentKind};
