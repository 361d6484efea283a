//! The ficha record and the single place where its fields change.
//!
//! Every store applies updates through [`Ficha::apply`] while holding its
//! write lock, so the lifecycle rules live here rather than in each backend:
//!
//! - `contacted_at` is set if and only if `state == contacted`
//! - `updated_at` is refreshed on every patch and never precedes `created_at`
//! - any ficha may be discarded; only pending ones may be contacted
//! - nothing returns to pending

use crate::error::{FichaError, Result};
use crate::types::{FichaState, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Ficha
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ficha {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub has_contact_form: Option<bool>,
    #[serde(default)]
    pub social_platform: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub facebook_group: Option<String>,
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub recommended_channel: Option<String>,
    #[serde(default)]
    pub proposal_text: Option<String>,
    pub state: FichaState,
    pub processed: bool,
    #[serde(default)]
    pub contacted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generate an id of the form `SIG-YYYYMMDD-xxxxxxxx`.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("SIG-{}-{}", now.format("%Y%m%d"), &suffix[..8])
}

impl Ficha {
    /// Apply `patch` in place. On error the ficha is left untouched.
    pub fn apply(&mut self, patch: &FichaPatch, now: DateTime<Utc>) -> Result<()> {
        if let Some(target) = patch.state {
            self.check_transition(target)?;
            self.transition(target, now);
        }

        set_if_some(&mut self.institution, &patch.institution);
        set_if_some(&mut self.email, &patch.email);
        set_if_some(&mut self.phone, &patch.phone);
        set_if_some(&mut self.username, &patch.username);
        set_if_some(&mut self.recommended_channel, &patch.recommended_channel);
        set_if_some(&mut self.proposal_text, &patch.proposal_text);
        if patch.has_contact_form.is_some() {
            self.has_contact_form = patch.has_contact_form;
        }
        if patch.priority.is_some() {
            self.priority = patch.priority;
        }
        if let Some(processed) = patch.processed {
            self.processed = processed;
        }

        self.touch(now);
        Ok(())
    }

    fn check_transition(&self, target: FichaState) -> Result<()> {
        if !self.state.can_move_to(target) {
            return Err(FichaError::InvalidTransition {
                id: self.id.clone(),
                from: self.state,
                to: target,
            });
        }
        Ok(())
    }

    fn transition(&mut self, target: FichaState, now: DateTime<Utc>) {
        match target {
            // Re-contacting keeps the first contact time.
            FichaState::Contacted => {
                if self.contacted_at.is_none() {
                    self.contacted_at = Some(now.max(self.created_at));
                }
            }
            FichaState::Pending | FichaState::Discarded => self.contacted_at = None,
        }
        self.state = target;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

fn set_if_some(field: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *field = Some(v.clone());
    }
}

// ---------------------------------------------------------------------------
// FichaPatch
// ---------------------------------------------------------------------------

/// Partial update accepted by [`crate::store::FichaStore::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FichaPatch {
    #[serde(default)]
    pub state: Option<FichaState>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub has_contact_form: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub recommended_channel: Option<String>,
    #[serde(default)]
    pub proposal_text: Option<String>,
    #[serde(default)]
    pub processed: Option<bool>,
}

impl FichaPatch {
    pub fn transition(state: FichaState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// NewFicha
// ---------------------------------------------------------------------------

/// Ingestion payload. Only `url` is required; `priority` and `state` are
/// free text and normalized by [`NewFicha::into_ficha`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFicha {
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub has_contact_form: Option<bool>,
    #[serde(default)]
    pub social_platform: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub facebook_group: Option<String>,
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub recommended_channel: Option<String>,
    #[serde(default)]
    pub proposal_text: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub processed: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewFicha {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Normalize into a stored record, generating an id when none was given.
    pub fn into_ficha(self, now: DateTime<Utc>) -> Result<Ficha> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(FichaError::InvalidRecord("url is required".into()));
        }
        let created_at = self.created_at.unwrap_or(now);
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            Some(_) => return Err(FichaError::InvalidRecord("id must not be blank".into())),
            None => generate_id(created_at),
        };
        let state = match self.state.as_deref() {
            Some(raw) => raw.parse::<FichaState>()?,
            None => FichaState::Pending,
        };
        let contacted_at = (state == FichaState::Contacted).then_some(created_at);

        Ok(Ficha {
            id,
            url,
            kind: self.kind,
            keyword: self.keyword,
            title: self.title,
            snippet: self.snippet,
            domain: self.domain,
            institution: self.institution,
            email: self.email,
            phone: self.phone,
            has_contact_form: self.has_contact_form,
            social_platform: self.social_platform,
            username: self.username,
            subreddit: self.subreddit,
            facebook_group: self.facebook_group,
            detected_at: self.detected_at,
            priority: self.priority.as_deref().and_then(Priority::normalize),
            recommended_channel: self.recommended_channel,
            proposal_text: self.proposal_text,
            state,
            processed: self.processed.unwrap_or(false),
            contacted_at,
            created_at,
            updated_at: created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending(now: DateTime<Utc>) -> Ficha {
        NewFicha::new("https://example.org/housing")
            .into_ficha(now)
            .unwrap()
    }

    #[test]
    fn generated_id_encodes_date() {
        let now = DateTime::parse_from_rfc3339("2026-02-03T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = generate_id(now);
        assert!(id.starts_with("SIG-20260203-"), "{id}");
        assert_eq!(id.len(), "SIG-20260203-".len() + 8);
        assert_ne!(generate_id(now), id);
    }

    #[test]
    fn new_ficha_defaults_to_pending_unprocessed() {
        let now = Utc::now();
        let f = pending(now);
        assert_eq!(f.state, FichaState::Pending);
        assert!(!f.processed);
        assert!(f.contacted_at.is_none());
        assert_eq!(f.created_at, f.updated_at);
    }

    #[test]
    fn new_ficha_normalizes_priority_and_state() {
        let mut raw = NewFicha::new("https://example.org");
        raw.priority = Some("Alta".into());
        raw.state = Some("Contactado".into());
        let f = raw.into_ficha(Utc::now()).unwrap();
        assert_eq!(f.priority, Some(Priority::High));
        assert_eq!(f.state, FichaState::Contacted);
        assert!(f.contacted_at.is_some());
    }

    #[test]
    fn new_ficha_rejects_blank_url() {
        let err = NewFicha::new("   ").into_ficha(Utc::now()).unwrap_err();
        assert!(matches!(err, FichaError::InvalidRecord(_)));
    }

    #[test]
    fn unrecognized_priority_is_none() {
        let mut raw = NewFicha::new("https://example.org");
        raw.priority = Some("whenever".into());
        assert_eq!(raw.into_ficha(Utc::now()).unwrap().priority, None);
    }

    #[test]
    fn contact_sets_timestamp_and_keeps_first_one() {
        let now = Utc::now();
        let mut f = pending(now);
        let first = now + Duration::seconds(5);
        f.apply(&FichaPatch::transition(FichaState::Contacted), first)
            .unwrap();
        assert_eq!(f.state, FichaState::Contacted);
        assert_eq!(f.contacted_at, Some(first));

        let second = now + Duration::seconds(10);
        f.apply(&FichaPatch::transition(FichaState::Contacted), second)
            .unwrap();
        assert_eq!(f.contacted_at, Some(first));
        assert_eq!(f.updated_at, second);
    }

    #[test]
    fn discarded_is_terminal() {
        let now = Utc::now();
        let mut f = pending(now);
        f.apply(&FichaPatch::transition(FichaState::Discarded), now)
            .unwrap();
        let before = f.clone();

        let err = f
            .apply(&FichaPatch::transition(FichaState::Contacted), now)
            .unwrap_err();
        assert!(matches!(err, FichaError::InvalidTransition { .. }));
        assert_eq!(f, before);

        let err = f
            .apply(&FichaPatch::transition(FichaState::Pending), now)
            .unwrap_err();
        assert!(matches!(err, FichaError::InvalidTransition { .. }));
    }

    #[test]
    fn contacted_can_still_be_discarded() {
        let now = Utc::now();
        let mut f = pending(now);
        f.apply(&FichaPatch::transition(FichaState::Contacted), now)
            .unwrap();
        assert!(f.contacted_at.is_some());

        let later = now + Duration::seconds(30);
        f.apply(&FichaPatch::transition(FichaState::Discarded), later)
            .unwrap();
        assert_eq!(f.state, FichaState::Discarded);
        assert_eq!(f.contacted_at, None);
        assert_eq!(f.updated_at, later);

        let err = f
            .apply(&FichaPatch::transition(FichaState::Pending), later)
            .unwrap_err();
        assert!(matches!(err, FichaError::InvalidTransition { .. }));
    }

    #[test]
    fn updated_at_never_precedes_created_at() {
        let now = Utc::now();
        let mut f = pending(now);
        f.apply(&FichaPatch::default(), now - Duration::hours(1))
            .unwrap();
        assert!(f.updated_at >= f.created_at);
    }

    #[test]
    fn enrichment_fields_do_not_touch_state() {
        let now = Utc::now();
        let mut f = pending(now);
        let patch = FichaPatch {
            institution: Some("Universidad de Valencia".into()),
            email: Some("housing@uv.es".into()),
            processed: Some(true),
            ..FichaPatch::default()
        };
        f.apply(&patch, now).unwrap();
        assert_eq!(f.state, FichaState::Pending);
        assert!(f.processed);
        assert_eq!(f.institution.as_deref(), Some("Universidad de Valencia"));
    }
}
