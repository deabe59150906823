//! Inbox scanner
//!
//! Two sequential passes over one mailbox, both writing through the same
//! [`SubscriptionStore`]:
//!
//! 1. receipts: billing vocabulary in the subject, upserts an active record
//!    per sender and backfills unknown amounts
//! 2. dormancy: re-engagement vocabulary ("we miss you"), demotes active
//!    records to zombie or creates zero-cost zombie records
//!
//! Each pass produces its own [`PassReport`]; [`run_scan`] merges them and
//! reports whether the mailbox rotated its access token along the way.
//! Persisting and committing is the caller's job (see `services::scan`).

mod amount;
mod dormancy;
mod receipts;
mod sender;
pub mod store;

pub use amount::extract_amount;
pub use sender::derive_sender_name;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{Subscription, SubscriptionCreate};
use thiserror::Error;

/// Mailbox result cap for the receipt pass
pub const RECEIPT_MAX_RESULTS: u32 = 100;
/// Mailbox result cap for the dormancy pass
pub const DORMANCY_MAX_RESULTS: u32 = 10;

const RECEIPT_TERMS: &[&str] = &["receipt", "invoice", "subscription", "your order"];
const DORMANCY_TERMS: &[&str] = &["miss you", "come back", "inactive account", "log back in"];

/// Gmail search expression: any of `terms` in the subject, excluding mail
/// the user sent to themselves. Multi-word terms are quoted.
pub fn subject_query(terms: &[&str]) -> String {
    let joined = terms
        .iter()
        .map(|t| {
            if t.contains(' ') {
                format!("\"{t}\"")
            } else {
                (*t).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("subject:({joined}) -to:me")
}

pub fn receipt_query() -> String {
    subject_query(RECEIPT_TERMS)
}

pub fn dormancy_query() -> String {
    subject_query(DORMANCY_TERMS)
}

// ── Mailbox ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// Metadata of one inbox message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxMessage {
    pub id: String,
    pub headers: Vec<MessageHeader>,
    pub snippet: String,
}

impl InboxMessage {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MailboxError {
    /// Credential rejected and could not be refreshed
    #[error("mailbox authorization failed: {0}")]
    Unauthorized(String),
    #[error("mailbox request failed: {0}")]
    Transport(String),
    #[error("malformed mailbox response: {0}")]
    Malformed(String),
}

impl MailboxError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Search and fetch access to one user's inbox
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Message ids matching `query`, in provider order, at most `max_results`
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<String>, MailboxError>;

    async fn fetch(&self, id: &str) -> Result<InboxMessage, MailboxError>;

    /// Access token currently in use (may differ from the stored one after a refresh)
    async fn current_access_token(&self) -> String;
}

// ── Store ──

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("subscription store: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Name-keyed subscription persistence used by the passes
#[async_trait]
pub trait SubscriptionStore: Send {
    async fn find_by_name(&mut self, name: &str) -> StoreResult<Option<Subscription>>;

    async fn insert(&mut self, new: SubscriptionCreate) -> StoreResult<Subscription>;

    /// Overwrite the mutable fields of an existing record
    async fn save(&mut self, sub: &Subscription) -> StoreResult<()>;
}

// ── Reports ──

/// What a pass did to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    /// Unknown amount replaced by one found in the inbox
    AmountBackfilled,
    /// Already known, nothing to change
    Seen,
    /// Active record turned zombie
    Demoted,
    /// Matched but left alone and not reported
    Unchanged,
}

impl Change {
    /// Whether the record belongs in the scan result list
    pub fn is_reported(self) -> bool {
        matches!(self, Self::Created | Self::AmountBackfilled | Self::Seen)
    }
}

/// A record touched by a pass, as it stood when the pass finished with it
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub record: Subscription,
    pub change: Change,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub findings: Vec<Finding>,
    /// Messages dropped for a fetch failure or a missing/unnamed sender
    pub skipped: u32,
}

impl PassReport {
    pub fn reported(&self) -> impl Iterator<Item = &Subscription> {
        self.findings
            .iter()
            .filter(|f| f.change.is_reported())
            .map(|f| &f.record)
    }
}

/// Merged result of both passes
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub records: Vec<Subscription>,
    /// Set when the mailbox ended the scan with a different access token
    pub rotated_access_token: Option<String>,
    pub skipped_messages: u32,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Mailbox(#[from] MailboxError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScanError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Mailbox(e) if e.is_auth())
    }
}

// ── Orchestration ──

/// Run the receipt pass, then the dormancy pass, against `mailbox` and `store`.
///
/// `stored_access_token` is the token the credential held before the scan.
/// Nothing is committed here; on `Err` the caller drops its transaction.
/// With a SQLite-backed store that transaction holds the write lock from
/// the first insert until commit, so other writers queue behind the whole
/// scan (see `db::BUSY_TIMEOUT`).
pub async fn run_scan<M, S>(
    mailbox: &M,
    store: &mut S,
    stored_access_token: &str,
    today: NaiveDate,
) -> Result<ScanOutcome, ScanError>
where
    M: Mailbox + ?Sized,
    S: SubscriptionStore + ?Sized,
{
    let receipts = receipts::run(mailbox, store, today).await?;
    let dormancy = dormancy::run(mailbox, store).await?;

    let current = mailbox.current_access_token().await;
    let rotated_access_token = (!current.is_empty() && current != stored_access_token).then_some(current);

    let skipped_messages = receipts.skipped + dormancy.skipped;
    let records = merge(receipts, dormancy);

    tracing::info!(
        found = records.len(),
        skipped = skipped_messages,
        token_rotated = rotated_access_token.is_some(),
        "Inbox scan finished"
    );

    Ok(ScanOutcome {
        records,
        rotated_access_token,
        skipped_messages,
    })
}

/// Receipt-pass records in order, then new dormancy records.
///
/// A dormancy finding for a record already listed replaces the listed
/// snapshot (so a demotion shows up), but demoted or unchanged records are
/// never added on their own.
fn merge(receipts: PassReport, dormancy: PassReport) -> Vec<Subscription> {
    let mut records: Vec<Subscription> = receipts
        .findings
        .into_iter()
        .filter(|f| f.change.is_reported())
        .map(|f| f.record)
        .collect();

    for finding in dormancy.findings {
        if let Some(slot) = records.iter_mut().find(|r| r.id == finding.record.id) {
            *slot = finding.record;
        } else if finding.change.is_reported() {
            records.push(finding.record);
        }
    }
    records
}

/// Fetch a message and derive its sender name.
///
/// `Ok(None)` means "skip": the fetch failed for a non-auth reason, or the
/// sender is missing or has no display name. Auth failures propagate.
pub(crate) async fn fetch_named<M: Mailbox + ?Sized>(
    mailbox: &M,
    id: &str,
    pass: &'static str,
) -> Result<Option<(String, InboxMessage)>, ScanError> {
    let message = match mailbox.fetch(id).await {
        Ok(m) => m,
        Err(e) if e.is_auth() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(pass, message_id = %id, "Skipping message: {e}");
            return Ok(None);
        }
    };
    let Some(from) = message.header("From") else {
        tracing::warn!(pass, message_id = %id, "Skipping message without From header");
        return Ok(None);
    };
    let name = derive_sender_name(from);
    if name.is_empty() {
        tracing::debug!(pass, message_id = %id, "Skipping message without sender name");
        return Ok(None);
    }
    Ok(Some((name, message)))
}


#[cfg(test)]
mod tests {
    use shared::models::SubscriptionStatus;

    use super::testing::*;
    use super::*;

    fn names(records: &[Subscription]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn queries_match_gmail_syntax() {
        assert_eq!(
            receipt_query(),
            r#"subject:(receipt OR invoice OR subscription OR "your order") -to:me"#
        );
        assert_eq!(
            dormancy_query(),
            r#"subject:("miss you" OR "come back" OR "inactive account" OR "log back in") -to:me"#
        );
    }

    #[test]
    fn header_lookup_ignores_case() {
        let msg = InboxMessage {
            id: "m".into(),
            headers: vec![MessageHeader {
                name: "from".into(),
                value: "Acme <a@acme.io>".into(),
            }],
            snippet: String::new(),
        };
        assert_eq!(msg.header("From"), Some("Acme <a@acme.io>"));
        assert_eq!(msg.header("Subject"), None);
    }

    #[tokio::test]
    async fn scan_uses_both_queries_with_their_limits() {
        let mailbox = FakeMailbox::with_token("t");
        let mut store = MemoryStore::default();
        run_scan(&mailbox, &mut store, "t", today()).await.unwrap();

        let searches = mailbox.searches.lock().unwrap().clone();
        assert_eq!(
            searches,
            vec![
                (receipt_query(), RECEIPT_MAX_RESULTS),
                (dormancy_query(), DORMANCY_MAX_RESULTS),
            ]
        );
    }

    #[tokio::test]
    async fn receipt_and_dormancy_results_are_merged() {
        let mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "\"Netflix\" <billing@netflix.com>", "Your receipt $15.49", "")
            .dormant("d1", "Ghostly <hi@ghostly.app>");
        let mut store = MemoryStore::default();

        let outcome = run_scan(&mailbox, &mut store, "t", today()).await.unwrap();
        assert_eq!(names(&outcome.records), vec!["Netflix", "Ghostly"]);
        assert_eq!(outcome.records[0].amount, 15.49);
        assert_eq!(outcome.records[1].status, SubscriptionStatus::Zombie);
        assert_eq!(outcome.rotated_access_token, None);
        assert_eq!(outcome.skipped_messages, 0);
    }

    /// Demotion of a record outside the receipt list is applied but not
    /// listed, while a new zombie is listed.
    #[tokio::test]
    async fn demoted_records_are_not_listed() {
        let mailbox = FakeMailbox::with_token("t")
            .dormant("d1", "Acme <news@acme.io>")
            .dormant("d2", "Ghostly <hi@ghostly.app>");
        let mut store = MemoryStore::default().with("Acme", 50.0, 4, SubscriptionStatus::Active);

        let outcome = run_scan(&mailbox, &mut store, "t", today()).await.unwrap();
        assert_eq!(names(&outcome.records), vec!["Ghostly"]);

        let acme = store.get("Acme").unwrap();
        assert_eq!(acme.status, SubscriptionStatus::Zombie);
        assert_eq!(acme.seats_unused, 4);
    }

    #[tokio::test]
    async fn demotion_updates_a_record_listed_by_the_receipt_pass() {
        let mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "Acme <billing@acme.io>", "Invoice $20.00", "")
            .dormant("d1", "Acme <news@acme.io>");
        let mut store = MemoryStore::default();

        let outcome = run_scan(&mailbox, &mut store, "t", today()).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].status, SubscriptionStatus::Zombie);
        assert_eq!(outcome.records[0].seats_unused, 1);
        assert_eq!(store.rows.len(), 1);
    }

    #[tokio::test]
    async fn rotated_token_is_reported_only_when_changed() {
        let mut mailbox = FakeMailbox::with_token("old")
            .receipt("r1", "Acme <billing@acme.io>", "Invoice", "");
        let mut store = MemoryStore::default();
        let outcome = run_scan(&mailbox, &mut store, "old", today()).await.unwrap();
        assert_eq!(outcome.rotated_access_token, None);

        mailbox.refresh_to = Some("new".to_string());
        let outcome = run_scan(&mailbox, &mut store, "old", today()).await.unwrap();
        assert_eq!(outcome.rotated_access_token.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn dormancy_search_failure_keeps_receipt_results() {
        let mut mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "Acme <billing@acme.io>", "Invoice $9.99", "");
        mailbox.dormancy_search_error = Some(MailboxError::Transport("503".into()));
        let mut store = MemoryStore::default();

        let outcome = run_scan(&mailbox, &mut store, "t", today()).await.unwrap();
        assert_eq!(names(&outcome.records), vec!["Acme"]);
    }

    #[tokio::test]
    async fn dormancy_search_auth_failure_is_fatal() {
        let mut mailbox = FakeMailbox::with_token("t");
        mailbox.dormancy_search_error = Some(MailboxError::Unauthorized("revoked".into()));
        let mut store = MemoryStore::default();

        let err = run_scan(&mailbox, &mut store, "t", today()).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn auth_failure_while_fetching_is_fatal() {
        let mut mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "Acme <billing@acme.io>", "Invoice", "");
        mailbox
            .fetch_errors
            .insert("r1".into(), MailboxError::Unauthorized("expired".into()));
        let mut store = MemoryStore::default();

        let err = run_scan(&mailbox, &mut store, "t", today()).await.unwrap_err();
        assert!(matches!(err, ScanError::Mailbox(MailboxError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn skipped_messages_are_counted_across_passes() {
        let mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "<noreply@x.com>", "Receipt", "")
            .dormant("d1", "Acme <a@acme.io>");
        let mut mailbox = mailbox;
        mailbox.dormancy.push("missing".into());
        let mut store = MemoryStore::default();

        let outcome = run_scan(&mailbox, &mut store, "t", today()).await.unwrap();
        assert_eq!(outcome.skipped_messages, 2);
        assert_eq!(names(&outcome.records), vec!["Acme"]);
    }
}
