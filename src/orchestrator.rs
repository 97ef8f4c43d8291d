//! Sequencing of the dashboard's backend fetches.
//!
//! On load the profile and the explanation are requested concurrently. The
//! view stays on its loading indicator until both have resolved, successfully
//! or not. A successful explanation with a non-empty narrative then triggers
//! the recommendation request, which only gates the recommendation tab.
//!
//! State lives in a [`DashboardState`] published through a `watch` channel;
//! every fetch resolution updates it in place so a subscribed view re-renders
//! as results arrive.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;

use crate::client::CreditApiClient;
use crate::content::{self, RenderSection};
use crate::edit_buffer::{PreparedUpdate, ProfileEditBuffer};
use crate::errors::{AppError, ResultExt};
use crate::health::HealthStatus;
use crate::models::{ClientId, ExplanationPayload, Profile};
use crate::session::IdentityProvider;

/// Title of the explanation tab.
pub const EXPLANATION_TITLE: &str = "Status explanation";
/// Title of the recommendation tab.
pub const RECOMMENDATIONS_TITLE: &str = "Product recommendations";

/// What the content area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Init,
    Loading,
    Ready,
    /// The profile could not be fetched; the content area shows an error.
    Failed,
    RedirectToLogin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationTab {
    Disabled,
    Enabled,
}

/// Session-scoped snapshot of everything the dashboard renders.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub started: bool,
    pub redirected: bool,
    pub profile_loading: bool,
    pub explanation_loading: bool,
    pub recommendations_pending: bool,
    pub recommendations_enabled: bool,
    pub profile: Option<Profile>,
    pub profile_error: Option<String>,
    pub explanation: Option<ExplanationPayload>,
    pub explanation_error: Option<String>,
    pub recommendations: Option<Value>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn phase(&self) -> ViewPhase {
        if self.redirected {
            ViewPhase::RedirectToLogin
        } else if !self.started {
            ViewPhase::Init
        } else if self.profile_loading || self.explanation_loading {
            ViewPhase::Loading
        } else if self.profile.is_none() {
            ViewPhase::Failed
        } else {
            ViewPhase::Ready
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::classify(
            self.explanation
                .as_ref()
                .and_then(ExplanationPayload::health_signal),
        )
    }

    pub fn recommendation_tab(&self) -> RecommendationTab {
        if self.recommendations_enabled {
            RecommendationTab::Enabled
        } else {
            RecommendationTab::Disabled
        }
    }

    /// Explanation tab content; a failed explanation shows the error section.
    pub fn explanation_sections(&self) -> Vec<RenderSection> {
        match &self.explanation {
            Some(explanation) => {
                content::narrative_sections(EXPLANATION_TITLE, &explanation.narrative())
            }
            None => vec![content::content_error_section()],
        }
    }

    pub fn recommendation_sections(&self) -> Vec<RenderSection> {
        content::normalize_or_fallback(self.recommendations.as_ref())
    }
}

pub struct FetchOrchestrator {
    client: CreditApiClient,
    identity: Arc<dyn IdentityProvider>,
    state: watch::Sender<DashboardState>,
}

impl FetchOrchestrator {
    pub fn new(client: CreditApiClient, identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            client,
            identity,
            state,
        }
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Runs the initial load for the session's identity.
    ///
    /// Returns once the view barrier is satisfied (profile and explanation
    /// resolved) and any recommendation request it triggered has resolved.
    pub async fn load(&self) -> ViewPhase {
        let Some(client_id) = self.identity.client_id() else {
            self.redirect("no stored client identity");
            return self.state.borrow().phase();
        };

        self.state.send_modify(|s| {
            s.started = true;
            s.profile_loading = true;
            s.explanation_loading = true;
        });

        tokio::join!(self.load_profile(client_id), self.load_explanation(client_id));

        let phase = self.state.borrow().phase();
        tracing::info!("Dashboard load for client {} finished: {:?}", client_id, phase);
        phase
    }

    /// Discards the current snapshot and loads again from scratch.
    pub async fn reload(&self) -> ViewPhase {
        self.state.send_replace(DashboardState::default());
        self.load().await
    }

    pub async fn load_profile(&self, client_id: ClientId) {
        match self.client.find_profile(client_id).await {
            Ok(Some(profile)) => {
                tracing::info!("✓ Profile loaded for client {}", client_id);
                self.state.send_modify(|s| {
                    s.profile = Some(profile);
                    s.profile_error = None;
                    s.profile_loading = false;
                    s.loaded_at = Some(Utc::now());
                });
            }
            Ok(None) => {
                tracing::warn!("Profile lookup for client {} returned nothing", client_id);
                self.redirect("empty profile result");
            }
            Err(e) => {
                tracing::error!("Failed to load profile for client {}: {}", client_id, e);
                self.state.send_modify(|s| {
                    s.profile_error = Some(e.to_string());
                    s.profile_loading = false;
                });
            }
        }
    }

    /// Fetches the explanation and, when it carries a narrative, the
    /// recommendations that depend on it.
    ///
    /// A redirect taken while the request was in flight is terminal: the
    /// result is dropped and no recommendation request is issued.
    pub async fn load_explanation(&self, client_id: ClientId) {
        let result = self.client.fetch_explanation(client_id).await;
        if self.is_redirected() {
            tracing::info!("Session redirected, discarding explanation for client {}", client_id);
            return;
        }

        match result {
            Ok(explanation) => {
                let wants_recommendations = explanation.has_narrative();
                self.state.send_modify(|s| {
                    s.explanation = Some(explanation.clone());
                    s.explanation_error = None;
                    s.explanation_loading = false;
                    s.recommendations_pending = wants_recommendations;
                });

                if wants_recommendations {
                    self.load_recommendations(&explanation).await;
                } else {
                    tracing::info!("Explanation narrative is empty, not requesting recommendations");
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load explanation for client {}: {}", client_id, e);
                self.state.send_modify(|s| {
                    s.explanation_error = Some(e.to_string());
                    s.explanation_loading = false;
                });
            }
        }
    }

    /// Requests recommendations for an explanation. Failures only leave the
    /// recommendation tab disabled.
    pub async fn load_recommendations(&self, explanation: &ExplanationPayload) {
        if self.is_redirected() {
            return;
        }
        self.state.send_modify(|s| s.recommendations_pending = true);

        let result = self.client.fetch_recommendations(explanation).await;
        if self.is_redirected() {
            self.state.send_modify(|s| s.recommendations_pending = false);
            return;
        }

        match result {
            Ok(recommendations) => {
                tracing::info!("✓ Product recommendations loaded");
                self.state.send_modify(|s| {
                    s.recommendations = Some(recommendations);
                    s.recommendations_pending = false;
                    s.recommendations_enabled = true;
                });
            }
            Err(e) => {
                tracing::warn!("Failed to load product recommendations: {}", e);
                self.state.send_modify(|s| s.recommendations_pending = false);
            }
        }
    }

    /// Edit buffer seeded from the loaded profile.
    pub fn edit_buffer(&self) -> Option<ProfileEditBuffer> {
        self.state
            .borrow()
            .profile
            .as_ref()
            .map(ProfileEditBuffer::seeded)
    }

    /// Persists the buffer's edits and reloads the dashboard on success.
    ///
    /// On failure the buffer keeps its edits and nothing is reloaded.
    pub async fn save_profile(
        &self,
        buffer: &mut ProfileEditBuffer,
    ) -> Result<PreparedUpdate, AppError> {
        let Some(client_id) = self.identity.client_id() else {
            self.redirect("no stored client identity");
            return Err(AppError::SessionInvalid(
                "no stored client identity".to_string(),
            ));
        };

        let prepared = buffer
            .save(client_id, &self.client)
            .await
            .with_context(|| format!("Saving profile for client {}", client_id))?;
        self.reload().await;
        Ok(prepared)
    }

    fn is_redirected(&self) -> bool {
        self.state.borrow().redirected
    }

    fn redirect(&self, reason: &str) {
        tracing::warn!("Session invalid ({}), redirecting to login", reason);
        self.identity.redirect_to_login();
        self.state.send_modify(|s| {
            s.redirected = true;
            s.profile_loading = false;
            s.explanation_loading = false;
        });
    }
}
