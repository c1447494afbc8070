//! Persona-based rewriting of blog posts ("p13n").
//!
//! A reader picks a persona; the post's Markdown is rewritten by an LLM for
//! that audience. Rewrites are cached per (post, persona) so switching back to
//! an earlier persona is instant.

pub mod cache;
pub mod persona;
pub mod personalizer;

pub use self::cache::PersonalizationCache;
pub use self::persona::{CacheKey, Persona, PersonaRequest};
pub use self::personalizer::{Personalized, Personalizer, Source};
