//! Plain-text rendering of the dashboard for terminal output.

use std::fmt::Write;

use crate::content::{RenderSection, SectionBody};
use crate::edit_buffer::{ProfileEditBuffer, ProfileField};
use crate::models::{coerce_text, Profile};
use crate::orchestrator::{
    DashboardState, RecommendationTab, ViewPhase, EXPLANATION_TITLE, RECOMMENDATIONS_TITLE,
};

pub const LOADING_TEXT: &str = "Loading...";
pub const PROFILE_ERROR_TEXT: &str = "Connection error please refresh the page";
pub const LOGIN_REDIRECT_TEXT: &str = "No active session. Please sign in again.";

/// Renders the whole dashboard for the current phase.
pub fn render_dashboard(state: &DashboardState) -> String {
    match state.phase() {
        ViewPhase::Init | ViewPhase::Loading => format!("{}\n", LOADING_TEXT),
        ViewPhase::RedirectToLogin => format!("{}\n", LOGIN_REDIRECT_TEXT),
        ViewPhase::Failed => format!("[!] {}\n", PROFILE_ERROR_TEXT),
        ViewPhase::Ready => render_ready(state),
    }
}

fn render_ready(state: &DashboardState) -> String {
    let mut out = String::new();

    if let Some(profile) = &state.profile {
        out.push_str(&render_profile(profile, &ProfileEditBuffer::seeded(profile)));
        out.push('\n');
    }

    let health = state.health();
    let _ = writeln!(out, "Credit Health Status : {}", health.label());
    if let Some(limit) = state
        .explanation
        .as_ref()
        .and_then(|e| e.allowed_credit_limit())
    {
        let _ = writeln!(out, "Allowed credit limit: ${:.0}", limit);
    }
    out.push('\n');

    let _ = writeln!(out, "== {} ==", EXPLANATION_TITLE);
    for section in state.explanation_sections() {
        out.push_str(&render_section(&section));
    }

    out.push('\n');
    match state.recommendation_tab() {
        RecommendationTab::Disabled => {
            let _ = writeln!(out, "== {} (disabled) ==", RECOMMENDATIONS_TITLE);
        }
        RecommendationTab::Enabled => {
            let _ = writeln!(out, "== {} ==", RECOMMENDATIONS_TITLE);
            for section in state.recommendation_sections() {
                out.push_str(&render_section(&section));
            }
        }
    }

    out
}

/// Sidebar: identity lines, editable fields, then read-only categorical fields.
pub fn render_profile(profile: &Profile, buffer: &ProfileEditBuffer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", profile.name.as_deref().unwrap_or("Unknown client"));
    if let Some(occupation) = &profile.occupation {
        let _ = writeln!(out, "{}", occupation);
    }
    if let Some(age) = profile.age {
        let _ = writeln!(out, "{} years", age);
    }

    for field in ProfileField::PERSISTED {
        let value = buffer
            .value(field)
            .and_then(coerce_text)
            .unwrap_or_else(|| "-".to_string());
        let marker = if buffer.is_dirty(field) { " *" } else { "" };
        match field.slider_max() {
            Some(max) => {
                let _ = writeln!(out, "{}: {} (max {}){}", field.label(), value, max, marker);
            }
            None => {
                let _ = writeln!(out, "{}: {}{}", field.label(), value, marker);
            }
        }
    }

    for field in [
        ProfileField::CreditMix,
        ProfileField::TypeOfLoan,
        ProfileField::PaymentBehaviour,
    ] {
        let value = buffer
            .value(field)
            .and_then(coerce_text)
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "{}: {}", field.label(), value);
    }

    out
}

pub fn render_section(section: &RenderSection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", section.icon().glyph(), section.title);
    match &section.body {
        SectionBody::Scalar(text) => {
            for line in text.lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }
        SectionBody::ItemList(items) => {
            for item in items {
                if !item.title.is_empty() {
                    let _ = writeln!(out, "  - {}", item.title);
                }
                for line in item.description.lines() {
                    let _ = writeln!(out, "      {}", line);
                }
            }
        }
        SectionBody::KeyValueList(pairs) => {
            for (key, value) in pairs {
                let _ = writeln!(out, "    {}: {}", key, value);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExplanationPayload;
    use serde_json::json;

    #[test]
    fn test_loading_and_redirect() {
        let mut state = DashboardState {
            started: true,
            profile_loading: true,
            ..DashboardState::default()
        };
        assert_eq!(render_dashboard(&state), "Loading...\n");

        state.redirected = true;
        assert_eq!(render_dashboard(&state), format!("{}\n", LOGIN_REDIRECT_TEXT));
    }

    #[test]
    fn test_ready_dashboard() {
        let state = DashboardState {
            started: true,
            profile: Some(Profile {
                name: Some("Aaron".to_string()),
                interest_rate: Some(3.0),
                ..Profile::default()
            }),
            explanation: Some(
                ExplanationPayload::from_response(json!({
                    "userProfile": "Solid history.",
                    "userCreditProfile": "Standard",
                    "allowedCreditLimit": 4200
                }))
                .unwrap(),
            ),
            recommendations_enabled: true,
            recommendations: Some(json!({"Gold Card": "Cashback.-No fee"})),
            ..DashboardState::default()
        };
        let out = render_dashboard(&state);

        assert!(out.contains("Aaron"));
        assert!(out.contains("Interest Rate: 3.0 (max 100)"));
        assert!(out.contains("Credit Health Status : STANDARD"));
        assert!(out.contains("Allowed credit limit: $4200"));
        assert!(out.contains("    Solid history."));
        assert!(out.contains("== Product recommendations =="));
        assert!(out.contains("[card] Gold Card"));
    }

    #[test]
    fn test_disabled_tab_hides_sections() {
        let state = DashboardState {
            started: true,
            profile: Some(Profile::default()),
            ..DashboardState::default()
        };
        let out = render_dashboard(&state);

        assert!(out.contains("(disabled)"));
        assert!(!out.contains("No Credit Card Recommended"));
    }

    #[test]
    fn test_section_bodies() {
        let section = RenderSection::scalar("No Credit Card Recommended", "A.\n-B");
        assert_eq!(
            render_section(&section),
            "[x] No Credit Card Recommended\n    A.\n    -B\n"
        );
    }
}
