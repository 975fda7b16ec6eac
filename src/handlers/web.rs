// src/handlers/web.rs
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::controllers::registration::{FormError, RegistrationDraft};
use crate::controllers::rotator::ViewSelection;
use crate::models::{CopyRequest, Page, SelectViewRequest};
use crate::session::visitor::VisitorSession;
use crate::session::Visitor;
use crate::templates::{self, home::HomeView};
use crate::utils::validation::validate_niche;
use crate::AppState;

/// Renders whatever the visitor is currently looking at, modal included.
fn render_visitor(session: &VisitorSession, notice: Option<&str>, hint: Option<&str>) -> String {
    let page = session.page();
    let content = match page {
        Page::Home => templates::home::render(&HomeView {
            copy: session.copy(),
            email_draft: session.email_draft(),
            demo: session
                .demo_state()
                .unwrap_or_else(|| ViewSelection::new().into()),
            notice,
        }),
        other => templates::pages::render(other),
    };

    let overlay = if session.is_modal_open() {
        templates::register::render_modal(session.registration(), hint)
    } else {
        String::new()
    };

    templates::render_page(page, &content, &overlay)
}

async fn show_page(visitor: Visitor, page: Page) -> Response {
    let html = {
        let mut session = visitor.session.lock().await;
        session.visit(page);
        render_visitor(&session, None, None)
    };
    (visitor.jar, Html(html)).into_response()
}

/// Sends the browser back to the page it was on.
async fn back(visitor: Visitor) -> Response {
    let path = visitor.session.lock().await.page().path();
    (visitor.jar, Redirect::to(path)).into_response()
}

pub async fn index(visitor: Visitor) -> Response {
    show_page(visitor, Page::Home).await
}

pub async fn product(visitor: Visitor) -> Response {
    show_page(visitor, Page::Product).await
}

pub async fn solutions(visitor: Visitor) -> Response {
    show_page(visitor, Page::Solutions).await
}

pub async fn privacy(visitor: Visitor) -> Response {
    show_page(visitor, Page::Privacy).await
}

pub async fn terms(visitor: Visitor) -> Response {
    show_page(visitor, Page::Terms).await
}

#[derive(Debug, Deserialize)]
pub struct StartForm {
    #[serde(default)]
    pub email: String,
}

pub async fn start_hunting(visitor: Visitor, Form(form): Form<StartForm>) -> Response {
    let notice = {
        let mut session = visitor.session.lock().await;
        if session.start_hunting(&form.email) || session.email_draft().is_empty() {
            None
        } else {
            Some(render_visitor(
                &session,
                Some("Enter a valid email address to start hunting."),
                None,
            ))
        }
    };

    match notice {
        Some(html) => (visitor.jar, Html(html)).into_response(),
        None => back(visitor).await,
    }
}

pub async fn open_registration(visitor: Visitor) -> Response {
    let html = {
        let mut session = visitor.session.lock().await;
        session.open_registration();
        render_visitor(&session, None, None)
    };
    (visitor.jar, Html(html)).into_response()
}

pub async fn close_registration(visitor: Visitor) -> Response {
    visitor.session.lock().await.close_registration();
    back(visitor).await
}

/// The session lock is released while the gateway call is in flight so the
/// visitor can keep browsing (or close the modal) meanwhile.
pub async fn submit_registration(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
    Form(input): Form<RegistrationDraft>,
) -> Response {
    let started = {
        let mut session = visitor.session.lock().await;
        if !session.is_modal_open() {
            None
        } else {
            let form = session.registration_mut();
            form.apply(&input);
            match form.begin_submit() {
                Ok(started) => Some(Ok(started)),
                Err(FormError::Invalid(message)) => {
                    Some(Err(render_visitor(&session, None, Some(&message))))
                }
                Err(e) => {
                    debug!(error = %e, "Ignoring registration submit");
                    None
                }
            }
        }
    };

    let (ticket, request) = match started {
        Some(Ok(started)) => started,
        Some(Err(html)) => {
            return (visitor.jar, (StatusCode::UNPROCESSABLE_ENTITY, Html(html))).into_response()
        }
        None => return back(visitor).await,
    };

    let outcome = state.registrations.save_registration(&request).await;

    visitor
        .session
        .lock()
        .await
        .registration_mut()
        .complete(ticket, &outcome);

    back(visitor).await
}

pub async fn generate_copy(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
    Form(request): Form<CopyRequest>,
) -> Response {
    let niche = match validate_niche(&request.niche) {
        Ok(niche) => niche,
        Err(message) => {
            debug!(reason = %message, "Ignoring copy request");
            return back(visitor).await;
        }
    };

    let generated = state.copywriter.generate(&niche, &request.style).await;
    info!(niche = %niche, fallback = generated.from_fallback, "Hero copy updated");

    {
        let mut session = visitor.session.lock().await;
        session
            .tracker()
            .track_form_submission("ai-copy", !generated.from_fallback);
        session.apply_copy(generated.suggestion);
    }

    back(visitor).await
}

pub async fn select_demo_view(visitor: Visitor, Form(request): Form<SelectViewRequest>) -> Response {
    visitor.session.lock().await.select_view(request.view);
    back(visitor).await
}
