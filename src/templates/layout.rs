// src/templates/layout.rs
use crate::models::Page;

const NAV_PAGES: [Page; 3] = [Page::Home, Page::Product, Page::Solutions];

/// Wraps page content in the site shell. `overlay` is rendered after the
/// main content (the registration modal, when open).
pub fn render_page(page: Page, content: &str, overlay: &str) -> String {
    let nav: String = NAV_PAGES
        .iter()
        .map(|item| nav_link(item.path(), item.title(), *item == page))
        .collect::<Vec<_>>()
        .join("\n                    ");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - GlitchHunt</title>
    <link rel="stylesheet" href="/static/css/main.css">
</head>
<body>
    <header class="header">
        <div class="container">
            <div class="header-content">
                <div class="logo">
                    <a href="/">GlitchHunt</a>
                </div>
                <nav class="nav">
                    {nav}
                    <a href="/register" class="btn btn-dark">Register</a>
                </nav>
            </div>
        </div>
    </header>

    <main class="main">
        {content}
    </main>

    <footer class="footer">
        <div class="container">
            <p>GlitchHunt · © 2024 GlitchHunt Inc.</p>
            <p>
                <a href="/privacy">Privacy Policy</a> ·
                <a href="/terms">Terms of Service</a>
            </p>
        </div>
    </footer>
    {overlay}
</body>
</html>"#,
        title = page.title(),
        nav = nav,
        content = content,
        overlay = overlay,
    )
}

pub fn nav_link(href: &str, text: &str, active: bool) -> String {
    let class = if active { "nav-link active" } else { "nav-link" };
    format!(r#"<a href="{}" class="{}">{}</a>"#, href, class, text)
}
