//! Dispatch of button actions to the page environment.
//!
//! The tokenizer only labels buttons. Whoever renders them owns a
//! [`NavigationHost`] and calls [`dispatch`] when a button is pressed.

use tracing::debug;

use super::tokenizer::ButtonAction;

/// Locale assumed when the current path carries none.
pub const DEFAULT_LOCALE_SEGMENT: &str = "pl";

/// Page environment able to scroll and navigate.
pub trait NavigationHost {
    /// Whether an element with `id` exists on the current page.
    fn element_exists(&self, id: &str) -> bool;

    /// Smoothly scroll the element with `id` into view.
    fn scroll_into_view(&mut self, id: &str);

    /// Navigate to `href`.
    fn navigate(&mut self, href: &str);

    /// Path of the current page, e.g. `/en/blog`.
    fn current_path(&self) -> String;
}

/// What [`dispatch`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Scrolled to the element with this id on the current page.
    Scrolled(String),
    /// Navigated to the home route with the section as fragment.
    Navigated(String),
}

/// First path segment of `path`, or the default locale when it is empty.
pub fn locale_from_path(path: &str) -> &str {
    match path.split('/').nth(1) {
        Some(segment) if !segment.is_empty() => segment,
        _ => DEFAULT_LOCALE_SEGMENT,
    }
}

/// Home route with `action`'s section as fragment, e.g. `/pl#contact`.
pub fn fallback_href(action: ButtonAction, current_path: &str) -> String {
    format!(
        "/{}#{}",
        locale_from_path(current_path),
        action.target_id()
    )
}

/// Perform `action` against `host`.
///
/// Scrolls when the target section is on the current page, otherwise
/// navigates to the localized home route with the section as fragment.
pub fn dispatch(action: ButtonAction, host: &mut dyn NavigationHost) -> NavigationOutcome {
    let id = action.target_id();
    if host.element_exists(id) {
        host.scroll_into_view(id);
        debug!(id, "scrolled to section");
        return NavigationOutcome::Scrolled(id.to_owned());
    }

    let href = fallback_href(action, &host.current_path());
    host.navigate(&href);
    debug!(%href, "navigated to home section");
    NavigationOutcome::Navigated(href)
}
