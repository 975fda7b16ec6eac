// src/templates/register.rs
use super::html_escape;
use crate::controllers::registration::RegistrationForm;
use crate::models::ReferralSource;

/// The registration modal. `hint` carries a validation message for a
/// submission that never reached the server-side state machine.
pub fn render_modal(form: &RegistrationForm, hint: Option<&str>) -> String {
    let body = if form.shows_form() {
        render_form(form, hint)
    } else {
        render_success()
    };

    format!(
        r#"<div class="modal-backdrop" role="dialog" aria-modal="true" aria-labelledby="modal-title">
    <div class="modal">
        <form method="POST" action="/register/close" class="modal-close">
            <button type="submit" aria-label="Close">&times;</button>
        </form>
        {}
    </div>
</div>"#,
        body
    )
}

fn render_success() -> String {
    r#"<div class="modal-success">
            <h2 id="modal-title">You're on the list!</h2>
            <p>Thanks for joining the hunt. We've sent a welcome email with everything you need to get started.</p>
            <form method="POST" action="/register/close">
                <button type="submit" class="btn btn-dark">Back to the site</button>
            </form>
        </div>"#
        .to_string()
}

fn render_form(form: &RegistrationForm, hint: Option<&str>) -> String {
    let draft = form.draft();

    let error = hint
        .or(form.error_message())
        .map(|message| format!(r#"<p class="form-error" role="alert">{}</p>"#, html_escape(message)))
        .unwrap_or_default();

    let referral_options: String = ReferralSource::ALL
        .iter()
        .map(|source| {
            let selected = if draft.referral_source == source.as_str() {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                source.as_str(),
                selected,
                source.label()
            )
        })
        .collect();

    let email_attrs = if form.email_locked() { " readonly" } else { "" };
    let (submit_attrs, submit_label) = if form.is_submit_disabled() {
        (" disabled", "Registering...")
    } else {
        ("", "Complete Registration")
    };

    format!(
        r#"<h2 id="modal-title">Join the Hunt</h2>
        <p class="lead">Secure your spot in the GlitchHunt beta.</p>
        {error}
        <form method="POST" action="/register" class="registration-form">
            <label for="modal-name">Full Name</label>
            <input id="modal-name" name="name" type="text" value="{name}" placeholder="Jane Doe" required>

            <label for="modal-email">Email Address</label>
            <input id="modal-email" name="email" type="email" value="{email}" placeholder="name@work-email.com" required{email_attrs}>

            <label for="modal-dob">Date of Birth</label>
            <input id="modal-dob" name="date_of_birth" type="date" value="{dob}" required>

            <label for="modal-referral">How did you hear about us?</label>
            <select id="modal-referral" name="referral_source" required>
                <option value="">Select an option</option>
                {referral_options}
            </select>

            <button type="submit" class="btn btn-dark"{submit_attrs}>{submit_label}</button>
        </form>"#,
        error = error,
        name = html_escape(&draft.name),
        email = html_escape(&draft.email),
        email_attrs = email_attrs,
        dob = html_escape(&draft.date_of_birth),
        referral_options = referral_options,
        submit_attrs = submit_attrs,
        submit_label = submit_label,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrationOutcome;
    use crate::services::analytics::Analytics;

    fn open_form(prefilled: &str) -> RegistrationForm {
        let mut form = RegistrationForm::new(Analytics::disabled().tracker("t"));
        form.reopen(prefilled);
        form
    }

    #[test]
    fn test_prefilled_email_is_readonly() {
        let html = render_modal(&open_form("a@b.com"), None);
        assert!(html.contains(r#"value="a@b.com" placeholder="name@work-email.com" required readonly>"#));

        let html = render_modal(&open_form(""), None);
        assert!(!html.contains("readonly"));
    }

    #[test]
    fn test_failure_message_is_shown() {
        let mut form = open_form("a@b.com");
        form.set_name("Jane");
        form.set_date_of_birth("1990-01-01");
        form.set_referral_source("blog");
        let (ticket, _) = form.begin_submit().unwrap();

        let html = render_modal(&form, None);
        assert!(html.contains("Registering..."));
        assert!(html.contains(" disabled>"));

        form.complete(ticket, &RegistrationOutcome::duplicate("This email is already registered."));
        let html = render_modal(&form, None);
        assert!(html.contains("This email is already registered."));
        assert!(html.contains(r#"<option value="blog" selected>"#));
    }

    #[test]
    fn test_validation_hint_replaces_earlier_failure() {
        let mut form = open_form("a@b.com");
        form.set_name("Jane");
        form.set_date_of_birth("1990-01-01");
        form.set_referral_source("blog");
        let (ticket, _) = form.begin_submit().unwrap();
        form.complete(ticket, &RegistrationOutcome::duplicate("This email is already registered."));

        form.set_name("");
        form.begin_submit().unwrap_err();

        let html = render_modal(&form, Some("Full name is required"));
        assert!(html.contains("Full name is required"));
        assert!(!html.contains("This email is already registered."));
    }

    #[test]
    fn test_success_replaces_form() {
        let mut form = open_form("a@b.com");
        form.set_name("Jane");
        form.set_date_of_birth("1990-01-01");
        form.set_referral_source("friend");
        let (ticket, _) = form.begin_submit().unwrap();
        form.complete(ticket, &RegistrationOutcome::success());

        let html = render_modal(&form, None);
        assert!(html.contains("You're on the list!"));
        assert!(!html.contains("registration-form"));
    }
}
