// src/templates/pages.rs
use crate::models::Page;

/// Body of one of the static marketing pages.
pub fn render(page: Page) -> String {
    let body = match page {
        Page::Product => PRODUCT,
        Page::Solutions => SOLUTIONS,
        Page::Privacy => PRIVACY,
        Page::Terms => TERMS,
        Page::Home => "",
    };
    format!(r#"<div class="container content-page">{}</div>"#, body)
}

const PRODUCT: &str = r#"<h1>Product Overview</h1>
<p class="lead">GlitchHunt is the premier platform for community-driven software quality assurance. We bridge the gap between observant users and responsive development teams.</p>
<div class="feature-grid">
    <div class="feature-card">
        <h3>Bug Reporting</h3>
        <p>Intuitive tools to capture and report bugs with rich context, including screenshots and environment data.</p>
    </div>
    <div class="feature-card">
        <h3>Community Voting</h3>
        <p>Democratized prioritization ensures the most critical issues get the attention they deserve.</p>
    </div>
</div>"#;

const SOLUTIONS: &str = r#"<h1>Solutions</h1>
<section>
    <h2>For Startups</h2>
    <p>Launch with confidence. Use GlitchHunt to crowd-source your QA process and find critical bugs before they impact your growth metrics.</p>
</section>
<section>
    <h2>For Enterprise</h2>
    <p>Maintain your reputation. Our enterprise tier allows for private bug bounties and integration with your existing Jira or Linear workflows.</p>
</section>"#;

const PRIVACY: &str = r#"<h1>Privacy Policy</h1>
<p class="muted">Last updated: October 2024</p>
<p>At GlitchHunt, we take your privacy seriously. This Privacy Policy explains how we collect, use, disclose, and safeguard your information when you visit our website.</p>
<h3>Data Collection</h3>
<p>We collect personal information that you voluntarily provide to us when you register on the website, express an interest in obtaining information about us or our products and services.</p>
<h3>Use of Information</h3>
<p>We use the information we collect to provide, maintain, and improve our services, to develop new ones, and to protect GlitchHunt and our users.</p>"#;

const TERMS: &str = r#"<h1>Terms of Service</h1>
<p>Please read these Terms of Service ("Terms", "Terms of Service") carefully before using the GlitchHunt website operated by GlitchHunt Inc.</p>
<h3>Accounts</h3>
<p>When you create an account with us, you must provide us information that is accurate, complete, and current at all times. Failure to do so constitutes a breach of the Terms.</p>
<h3>Content</h3>
<p>Our Service allows you to post, link, store, share and otherwise make available certain information, text, graphics, videos, or other material. You are responsible for the Content that you post to the Service.</p>"#;
