//! Generation context building.
//!
//! The generation context is the JSON tree a template is rendered against. It
//! is assembled fresh for every generation attempt from a case record and the
//! entities it references, and is never persisted.
//!
//! # Context Structure
//!
//! ```json
//! {
//!   "client": {
//!     "id": "c-1", "name": "Jan Kowalski", "last_activity_date": "2024-05-01",
//!     "case_description": "...", "payment_plan": "Full Payment",
//!     "phone": "+48 600 000 000", "email": "jan@example.com",
//!     "nationality": "Ukrainian", "passport_number": "FA123456"
//!   },
//!   "questionnaire": { "personal_data": { ... }, "family_members_in_poland": [ ... ] },
//!   "case": {
//!     "office_id": "o-1", "case_number": "WSC-II-S.6151.1.2024", "case_password": null,
//!     "is_transferring": false, "transfer_office_id": null,
//!     "office_name": "Mazowiecki Urząd Wojewódzki", "office_address": "ul. Marszałkowska 3/5"
//!   },
//!   "assignees": [ { "id": "u-1", "name": "Anna", ... } ],
//!   "primary_assignee": { "id": "u-1", "name": "Anna", ... },
//!   "date": { "today": "19.10.2026", "iso": "2026-10-19" }
//! }
//! ```
//!
//! The `client` keys are deliberately independent of the record's own nesting
//! (`contact.email` becomes `client.email`) so the record can evolve without
//! breaking template tags.

use chrono::{Local, NaiveDate};
use serde_json::{Map, Value, json};
use std::fmt::Write as _;

use crate::models::{CaseRecord, Office, User};

/// Short date format of the Polish locale, used for `date.today`.
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Source of the current date.
///
/// The `date` block is the only non-deterministic part of a context; tests
/// inject a [`FixedClock`] to get byte-identical contexts.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock frozen at one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Entities referenced by a case record, resolved by the record store.
#[derive(Debug, Clone, Default)]
pub struct RelatedEntities {
    /// Users listed in the record's `assignee_ids`
    pub users: Vec<User>,
    /// The office the case is filed with
    pub office: Option<Office>,
    /// The office the case is moving to, while a transfer is in progress
    pub transfer_office: Option<Office>,
}

/// Builds generation contexts from case records.
#[derive(Debug, Clone)]
pub struct ContextBuilder<C: Clock = SystemClock> {
    clock: C,
    date_format: String,
}

impl Default for ContextBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder<SystemClock> {
    /// Create a builder reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> ContextBuilder<C> {
    /// Create a builder with an injected clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Override the `strftime` format of `date.today`.
    #[must_use]
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    /// Build the context for `record`.
    ///
    /// Pure apart from reading the clock: inputs are not mutated and no I/O
    /// happens. Unknown assignee ids are skipped; an unresolved office yields
    /// `null` office name and address.
    ///
    /// `primary_assignee` is always present. When the record has no assignees,
    /// or its first assignee id does not resolve to a user, it is an empty
    /// object rather than being left out, so `{#primary_assignee}` blocks are
    /// simply skipped. A scalar tag below it such as `{primary_assignee.name}`
    /// still fails rendering as an unknown tag.
    pub fn build(&self, record: &CaseRecord, related: &RelatedEntities) -> Value {
        let assignees: Vec<&User> = record
            .assignee_ids
            .iter()
            .filter_map(|id| related.users.iter().find(|u| &u.id == id))
            .collect();

        let primary_assignee = record
            .assignee_ids
            .first()
            .and_then(|id| assignees.iter().find(|u| &u.id == id))
            .map_or_else(|| Value::Object(Map::new()), |u| json!(u));

        json!({
            "client": {
                "id": record.id,
                "name": record.name,
                "last_activity_date": record.last_activity_date,
                "case_description": record.case_description,
                "payment_plan": record.payment_plan,
                "phone": record.contact.phone,
                "email": record.contact.email,
                "nationality": record.details.nationality,
                "passport_number": record.details.passport_number,
            },
            "questionnaire": record.questionnaire,
            "case": self.case_block(record, related),
            "assignees": assignees,
            "primary_assignee": primary_assignee,
            "date": self.date_block(),
        })
    }

    fn case_block(&self, record: &CaseRecord, related: &RelatedEntities) -> Value {
        let mut block = json!(record.immigration_case);
        let office = related.office.as_ref().filter(|o| o.id == record.immigration_case.office_id);

        if let Value::Object(map) = &mut block {
            map.insert("office_name".into(), json!(office.map(|o| &o.name)));
            map.insert("office_address".into(), json!(office.map(|o| &o.address)));

            if record.immigration_case.is_transferring == Some(true) {
                let transfer = related.transfer_office.as_ref();
                map.insert("transfer_office_name".into(), json!(transfer.map(|o| &o.name)));
                map.insert("transfer_office_address".into(), json!(transfer.map(|o| &o.address)));
            }
        }
        block
    }

    fn date_block(&self) -> Value {
        let today = self.clock.today();
        let mut formatted = String::new();
        if write!(formatted, "{}", today.format(&self.date_format)).is_err() {
            tracing::warn!(
                "Invalid date format '{}', falling back to {}",
                self.date_format,
                DEFAULT_DATE_FORMAT
            );
            formatted = today.format(DEFAULT_DATE_FORMAT).to_string();
        }

        json!({
            "today": formatted,
            "iso": today.format("%Y-%m-%d").to_string(),
        })
    }
}
