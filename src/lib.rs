//! Folio: the engine behind a bilingual portfolio site's chat widget and
//! persona-rewritten blog posts.
//!
//! - [`chat`]: tokenizes assistant responses into typed segments, renders them
//!   as escaped HTML, dispatches in-app navigation, screens and rate-limits input
//! - [`p13n`]: rewrites posts for a reader persona with a cache in front
//! - [`providers`]: the rewrite service trait and its OpenAI implementation
//! - [`storage`]: injectable key-value storage (in-memory and SQLite)
//! - [`analytics`]: bot screening, rate limiting and fingerprints for analytics events

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod storage;

pub mod analytics;
pub mod chat;
pub mod p13n;
pub mod providers;
