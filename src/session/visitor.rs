// src/session/visitor.rs
use std::time::Duration;

use crate::controllers::registration::RegistrationForm;
use crate::controllers::rotator::DemoRotator;
use crate::models::{CopySuggestion, DemoState, DemoView, Page};
use crate::services::analytics::Tracker;
use crate::utils::validation::is_plausible_email;

pub const REGISTRATION_MODAL: &str = "registration";

/// Everything one visitor sees: the current page, the hero email box, the
/// hero copy, the registration modal and the mounted demo.
pub struct VisitorSession {
    tracker: Tracker,
    page: Option<Page>,
    email_draft: String,
    copy: CopySuggestion,
    registration: RegistrationForm,
    modal_open: bool,
    demo: Option<DemoRotator>,
    rotation_interval: Duration,
}

impl VisitorSession {
    pub fn new(tracker: Tracker, rotation_interval: Duration) -> Self {
        Self {
            registration: RegistrationForm::new(tracker.clone()),
            tracker,
            page: None,
            email_draft: String::new(),
            copy: CopySuggestion::landing_default(),
            modal_open: false,
            demo: None,
            rotation_interval,
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn page(&self) -> Page {
        self.page.unwrap_or_default()
    }

    pub fn email_draft(&self) -> &str {
        &self.email_draft
    }

    pub fn copy(&self) -> &CopySuggestion {
        &self.copy
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn registration(&self) -> &RegistrationForm {
        &self.registration
    }

    pub fn registration_mut(&mut self) -> &mut RegistrationForm {
        &mut self.registration
    }

    pub fn demo_state(&self) -> Option<DemoState> {
        self.demo.as_ref().map(DemoRotator::state)
    }

    /// Shows `page`. The demo is mounted while the home page is showing and
    /// torn down as soon as the visitor leaves it.
    pub fn visit(&mut self, page: Page) {
        if let Some(previous) = self.page {
            if previous != page {
                self.tracker.track_navigation(page.path());
            }
        }
        self.page = Some(page);
        self.tracker.track_page_view(page.path(), Some(page.title()));

        if page == Page::Home {
            if self.demo.is_none() {
                self.demo = Some(DemoRotator::mount(self.rotation_interval, self.tracker.clone()));
            }
        } else {
            self.demo = None;
        }
    }

    pub fn set_email_draft(&mut self, email: &str) {
        self.email_draft = email.trim().to_string();
    }

    /// The hero button. Opens the modal only for a usable email, since the
    /// modal locks whatever was prefilled.
    pub fn start_hunting(&mut self, email: &str) -> bool {
        self.set_email_draft(email);
        self.tracker.track_button_click("Start Hunting", Some("hero"));
        if !is_plausible_email(&self.email_draft) {
            return false;
        }
        self.open_registration();
        true
    }

    /// Seeds (and locks) the modal email only with a plausible hero draft.
    pub fn open_registration(&mut self) {
        let prefilled = if is_plausible_email(&self.email_draft) {
            self.email_draft.as_str()
        } else {
            ""
        };
        self.registration.reopen(prefilled);
        self.modal_open = true;
        self.tracker.track_modal_open(REGISTRATION_MODAL);
    }

    pub fn close_registration(&mut self) {
        if !self.modal_open {
            return;
        }
        self.registration.discard();
        self.modal_open = false;
        self.tracker.track_modal_close(REGISTRATION_MODAL);
    }

    pub fn apply_copy(&mut self, copy: CopySuggestion) {
        self.copy = copy;
    }

    /// Returns the new demo state, or None when the demo is not mounted.
    pub fn select_view(&mut self, view: DemoView) -> Option<DemoState> {
        let demo = self.demo.as_mut()?;
        demo.select(view);
        Some(demo.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::registration::SubmissionState;
    use crate::models::RegistrationOutcome;
    use crate::services::analytics::tests::{drain, event};
    use crate::services::analytics::{Analytics, AnalyticsEvent};

    fn visitor() -> VisitorSession {
        VisitorSession::new(Analytics::disabled().tracker("t"), Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_start_hunting_requires_email() {
        let mut session = visitor();
        assert!(!session.start_hunting("   "));
        assert!(!session.start_hunting("not-an-email"));
        assert!(!session.is_modal_open());

        assert!(session.start_hunting(" a@b.com "));
        assert!(session.is_modal_open());
        assert_eq!(session.registration().draft().email, "a@b.com");
        assert!(session.registration().email_locked());
    }

    #[tokio::test]
    async fn test_register_link_ignores_implausible_draft() {
        let mut session = visitor();
        assert!(!session.start_hunting("jane"));
        assert_eq!(session.email_draft(), "jane");

        session.open_registration();
        let form = session.registration_mut();
        assert!(!form.email_locked());
        assert_eq!(form.draft().email, "");

        assert!(form.set_email("jane@example.com"));
        form.set_name("Jane");
        form.set_date_of_birth("1990-01-01");
        form.set_referral_source("friend");
        let (_, request) = form.begin_submit().unwrap();
        assert_eq!(request.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_close_discards_in_flight_result() {
        let mut session = visitor();
        session.start_hunting("a@b.com");
        let form = session.registration_mut();
        form.set_name("Jane");
        form.set_date_of_birth("1990-01-01");
        form.set_referral_source("friend");
        let (ticket, _) = form.begin_submit().unwrap();

        session.close_registration();
        assert!(!session.registration_mut().complete(ticket, &RegistrationOutcome::success()));

        session.open_registration();
        assert_eq!(session.registration().state(), &SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_lives_only_on_home() {
        let mut session = visitor();
        session.visit(Page::Home);
        assert_eq!(
            session.select_view(DemoView::Forum),
            Some(DemoState {
                view: DemoView::Forum,
                auto_rotate: false
            })
        );

        // Reloading home keeps the manual pick
        session.visit(Page::Home);
        assert_eq!(session.demo_state().map(|s| s.view), Some(DemoView::Forum));

        session.visit(Page::Product);
        assert_eq!(session.demo_state(), None);
        assert_eq!(session.select_view(DemoView::Docs), None);

        session.visit(Page::Home);
        assert_eq!(
            session.demo_state(),
            Some(DemoState {
                view: DemoView::Docs,
                auto_rotate: true
            })
        );
    }

    #[tokio::test]
    async fn test_transitions_emit_events() {
        let (analytics, mut receiver) = Analytics::channel();
        let mut session = VisitorSession::new(analytics.tracker("v"), Duration::from_secs(3));

        session.visit(Page::Home);
        session.visit(Page::Terms);
        session.start_hunting("a@b.com");
        session.close_registration();
        session.close_registration();

        assert_eq!(
            drain(&mut receiver),
            vec![
                AnalyticsEvent::PageView {
                    path: "/".to_string(),
                    title: Some("Home".to_string())
                },
                event("Navigation", "Click", Some("/terms")),
                AnalyticsEvent::PageView {
                    path: "/terms".to_string(),
                    title: Some("Terms of Service".to_string())
                },
                event("Button", "Click", Some("Start Hunting - hero")),
                event("Modal", "Open", Some(REGISTRATION_MODAL)),
                event("Modal", "Close", Some(REGISTRATION_MODAL)),
            ]
        );
    }
}
