// src/templates/home.rs
use super::html_escape;
use crate::models::{CopySuggestion, DemoState, DemoView};

struct MockIssue {
    title: &'static str,
    app: &'static str,
    votes: u32,
    comments: u32,
}

const MOCK_ISSUES: [MockIssue; 3] = [
    MockIssue {
        title: "Login button overlaps on iPhone 14",
        app: "FoodDash",
        votes: 432,
        comments: 24,
    },
    MockIssue {
        title: "Dark mode causes text to be invisible",
        app: "BankSafe",
        votes: 210,
        comments: 15,
    },
    MockIssue {
        title: "API rate limit incorrect in documentation",
        app: "DevCloud",
        votes: 89,
        comments: 45,
    },
];

const FEATURES: [(&str, &str); 3] = [
    (
        "Bug Posting",
        "Submit detailed bug reports with screenshots, logs, and reproduction steps in seconds to get them fixed faster.",
    ),
    (
        "Issue Tracking",
        "Follow the lifecycle of a bug from discovery to resolution with real-time status updates and notifications.",
    ),
    (
        "User Conversation",
        "Connect with other hunters, share workarounds, and collaborate on fixes in thread-based discussions.",
    ),
];

const STYLES: [(&str, &str); 3] = [
    ("clean-saas", "Clean SaaS"),
    ("feed", "Community Feed"),
    ("workspace", "Unified Workspace"),
];

pub struct HomeView<'a> {
    pub copy: &'a CopySuggestion,
    pub email_draft: &'a str,
    pub demo: DemoState,
    pub notice: Option<&'a str>,
}

pub fn render(view: &HomeView) -> String {
    let notice = view
        .notice
        .map(|text| format!(r#"<p class="notice">{}</p>"#, html_escape(text)))
        .unwrap_or_default();

    format!(
        r#"<section class="hero container">
    <div class="hero-copy">
        <h1>{headline}</h1>
        <p class="lead">{subheadline}</p>
        {notice}
        <form method="POST" action="/start" class="email-capture">
            <input id="email-input" type="email" name="email" value="{email}" placeholder="name@work-email.com">
            <button type="submit" class="btn btn-dark">{cta} &rarr;</button>
        </form>
        <p class="perk">Early hunters get lifetime free access <span>(LIMITED SEATS)</span></p>
        <p class="social-proof">★★★★★ Trusted by 734+ testers</p>
    </div>
    {demo}
</section>

<section class="features">
    <div class="container">
        <h2>Everything you need to squash bugs</h2>
        <p class="lead">Powerful tools designed for the modern developer community.</p>
        <div class="feature-grid">
            {features}
        </div>
    </div>
</section>

{settings}"#,
        headline = html_escape(&view.copy.headline),
        subheadline = html_escape(&view.copy.subheadline),
        notice = notice,
        email = html_escape(view.email_draft),
        cta = html_escape(&view.copy.cta),
        demo = render_demo(view.demo),
        features = render_features(),
        settings = render_copy_settings(),
    )
}

/// Tabs, the three panels and the script that follows the server-side
/// rotation while it is on.
fn render_demo(state: DemoState) -> String {
    let tabs: String = DemoView::CYCLE
        .iter()
        .map(|view| {
            let class = if *view == state.view { "tab active" } else { "tab" };
            format!(
                r#"<form method="POST" action="/demo/select" class="inline-form">
                <input type="hidden" name="view" value="{value}">
                <button type="submit" class="{class}" data-tab="{value}">{label}</button>
            </form>"#,
                value = view.as_str(),
                class = class,
                label = view.label(),
            )
        })
        .collect();

    let panels: String = DemoView::CYCLE
        .iter()
        .map(|view| {
            let hidden = if *view == state.view { "" } else { " hidden" };
            format!(
                r#"<div class="demo-panel" data-view="{}"{}>{}</div>"#,
                view.as_str(),
                hidden,
                render_panel(*view)
            )
        })
        .collect();

    format!(
        r#"<div class="demo" data-auto-rotate="{auto}">
        <div class="demo-tabs">{tabs}</div>
        <div class="demo-body">{panels}</div>
    </div>
    <script>
    (function () {{
        var demo = document.querySelector('.demo');
        if (!demo || demo.dataset.autoRotate !== 'true') return;
        var timer = setInterval(function () {{
            fetch('/api/demo', {{ credentials: 'same-origin' }})
                .then(function (r) {{ return r.json(); }})
                .then(function (state) {{
                    demo.querySelectorAll('.demo-panel').forEach(function (panel) {{
                        panel.hidden = panel.dataset.view !== state.view;
                    }});
                    demo.querySelectorAll('.tab').forEach(function (tab) {{
                        tab.classList.toggle('active', tab.dataset.tab === state.view);
                    }});
                    if (!state.autoRotate) clearInterval(timer);
                }})
                .catch(function () {{ clearInterval(timer); }});
        }}, 1000);
    }})();
    </script>"#,
        auto = state.auto_rotate,
        tabs = tabs,
        panels = panels,
    )
}

fn render_panel(view: DemoView) -> String {
    match view {
        DemoView::Docs => r#"<article class="mock-docs">
            <h4>Reporting a bug</h4>
            <ol>
                <li>Describe what you expected and what happened.</li>
                <li>Attach a screenshot or a console log.</li>
                <li>List the steps to reproduce it.</li>
            </ol>
        </article>"#
            .to_string(),
        DemoView::Feed => {
            let items: String = MOCK_ISSUES
                .iter()
                .map(|issue| {
                    format!(
                        r#"<li class="issue">
                <span class="votes">▲ {}</span>
                <div><h4>{}</h4><span class="app">{}</span> · {} comments</div>
            </li>"#,
                        issue.votes, issue.title, issue.app, issue.comments
                    )
                })
                .collect();
            format!(r#"<ul class="mock-feed">{}</ul>"#, items)
        }
        DemoView::Forum => r#"<div class="mock-forum">
            <div class="thread"><strong>@devcloud_team</strong> Thanks for the report, the rate limit docs are fixed in v2.3.</div>
            <div class="thread"><strong>@nightowl</strong> Workaround for the BankSafe dark mode bug: switch the system theme twice.</div>
            <div class="thread"><strong>@foodie_qa</strong> Confirmed on iPhone 14 Pro too, upvoted.</div>
        </div>"#
            .to_string(),
    }
}

fn render_features() -> String {
    FEATURES
        .iter()
        .map(|(title, description)| {
            format!(
                r#"<div class="feature-card"><h3>{}</h3><p>{}</p></div>"#,
                title, description
            )
        })
        .collect()
}

fn render_copy_settings() -> String {
    let options: String = STYLES
        .iter()
        .map(|(value, label)| format!(r#"<option value="{}">{}</option>"#, value, label))
        .collect();

    format!(
        r#"<details class="page-settings">
    <summary>Page Settings</summary>
    <h3>AI Copywriter</h3>
    <form method="POST" action="/copy">
        <label for="niche">Target niche</label>
        <input id="niche" name="niche" type="text" maxlength="120" placeholder="e.g. Fintech apps" required>
        <label for="style">Design style</label>
        <select id="style" name="style">{}</select>
        <button type="submit" class="btn">Generate Copy</button>
    </form>
    <p class="settings-footer">GlitchHunt Landing Page</p>
</details>"#,
        options
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(view: DemoView, auto_rotate: bool) -> DemoState {
        DemoState { view, auto_rotate }
    }

    #[test]
    fn test_only_active_panel_is_visible() {
        let html = render_demo(state(DemoView::Feed, true));
        assert!(html.contains(r#"data-view="feed">"#));
        assert!(html.contains(r#"data-view="docs" hidden>"#));
        assert!(html.contains(r#"data-view="forum" hidden>"#));
        assert!(html.contains(r#"data-auto-rotate="true""#));
    }

    #[test]
    fn test_copy_and_email_are_escaped() {
        let copy = CopySuggestion {
            headline: "<b>Bugs</b>".to_string(),
            subheadline: "Sub".to_string(),
            cta: "Go".to_string(),
        };
        let html = render(&HomeView {
            copy: &copy,
            email_draft: "\"a@b.com",
            demo: state(DemoView::Docs, false),
            notice: None,
        });
        assert!(html.contains("&lt;b&gt;Bugs&lt;/b&gt;"));
        assert!(html.contains(r#"value="&quot;a@b.com""#));
        assert!(!html.contains("<b>Bugs</b>"));
    }
}
