// src/templates/mod.rs
pub mod home;
pub mod pages;
pub mod register;

mod layout;

pub use layout::render_page;

/// Escapes text for use in element bodies and quoted attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
