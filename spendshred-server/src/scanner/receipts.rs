//! Receipt pass: billing mail → active subscriptions

use chrono::NaiveDate;
use shared::models::{DEFAULT_TEAM, SubscriptionCreate, SubscriptionStatus};

use super::{
    Change, Finding, Mailbox, PassReport, RECEIPT_MAX_RESULTS, ScanError, SubscriptionStore,
    extract_amount, fetch_named, receipt_query,
};

const PASS: &str = "receipts";

pub(super) async fn run<M, S>(
    mailbox: &M,
    store: &mut S,
    today: NaiveDate,
) -> Result<PassReport, ScanError>
where
    M: Mailbox + ?Sized,
    S: SubscriptionStore + ?Sized,
{
    let ids = mailbox.search(&receipt_query(), RECEIPT_MAX_RESULTS).await?;
    tracing::debug!(matches = ids.len(), "Receipt search returned");

    let mut report = PassReport::default();
    for id in &ids {
        let Some((name, message)) = fetch_named(mailbox, id, PASS).await? else {
            report.skipped += 1;
            continue;
        };

        let subject = message.header("Subject").unwrap_or_default();
        let mut amount = extract_amount(subject);
        if amount == 0.0 {
            amount = extract_amount(&message.snippet);
        }

        match store.find_by_name(&name).await? {
            None => {
                let created = store
                    .insert(SubscriptionCreate {
                        name,
                        team: Some(DEFAULT_TEAM.to_string()),
                        amount,
                        seats_total: 1,
                        seats_unused: 0,
                        status: Some(SubscriptionStatus::Active),
                        last_used: Some(today.format("%Y-%m-%d").to_string()),
                    })
                    .await?;
                tracing::info!(name = %created.name, amount, "New subscription from receipt");
                report.findings.push(Finding {
                    record: created,
                    change: Change::Created,
                });
            }
            Some(mut existing) => {
                let backfill = existing.amount == 0.0 && amount > 0.0;
                if backfill {
                    existing.amount = amount;
                    store.save(&existing).await?;
                    tracing::info!(name = %existing.name, amount, "Backfilled subscription amount");
                }

                // One entry per record; a later message may still backfill it
                if let Some(prior) = report
                    .findings
                    .iter_mut()
                    .find(|f| f.record.id == existing.id)
                {
                    if backfill && prior.change == Change::Seen {
                        prior.change = Change::AmountBackfilled;
                    }
                    prior.record = existing;
                } else {
                    report.findings.push(Finding {
                        record: existing,
                        change: if backfill {
                            Change::AmountBackfilled
                        } else {
                            Change::Seen
                        },
                    });
                }
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use shared::models::SubscriptionStatus;

    use super::super::MailboxError;
    use super::super::testing::*;
    use super::*;

    #[tokio::test]
    async fn creates_active_record_with_defaults() {
        let mailbox = FakeMailbox::with_token("t").receipt(
            "r1",
            "\"Netflix\" <billing@netflix.com>",
            "Your Netflix receipt",
            "You paid $15.49 this month",
        );
        let mut store = MemoryStore::default();

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.change, Change::Created);

        let sub = &finding.record;
        assert_eq!(sub.name, "Netflix");
        assert_eq!(sub.amount, 15.49);
        assert_eq!(sub.team, "Unassigned");
        assert_eq!(sub.seats_total, 1);
        assert_eq!(sub.seats_unused, 0);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.last_used, "2024-05-01");
    }

    #[tokio::test]
    async fn subject_amount_wins_over_snippet() {
        let mailbox = FakeMailbox::with_token("t").receipt(
            "r1",
            "Acme <a@acme.io>",
            "Invoice for $20.00",
            "Previous balance $5.00",
        );
        let mut store = MemoryStore::default();

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert_eq!(report.findings[0].record.amount, 20.0);
    }

    #[tokio::test]
    async fn rerun_over_same_inbox_is_idempotent() {
        let mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "Acme <a@acme.io>", "Invoice $9.99", "")
            .receipt("r2", "Zed <z@zed.dev>", "Receipt", "");
        let mut store = MemoryStore::default();

        run(&mailbox, &mut store, today()).await.unwrap();
        let snapshot = store.rows.clone();

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert_eq!(store.rows, snapshot);
        assert!(report.findings.iter().all(|f| f.change == Change::Seen));
        assert_eq!(report.findings.len(), 2);
    }

    #[tokio::test]
    async fn backfills_unknown_amount() {
        let mailbox = FakeMailbox::with_token("t").receipt("r1", "Acme <a@acme.io>", "Invoice $12.50", "");
        let mut store = MemoryStore::default().with("Acme", 0.0, 1, SubscriptionStatus::Active);

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert_eq!(report.findings[0].change, Change::AmountBackfilled);
        assert_eq!(store.get("Acme").unwrap().amount, 12.5);
    }

    #[tokio::test]
    async fn known_amount_is_not_overwritten() {
        let mailbox = FakeMailbox::with_token("t").receipt("r1", "Acme <a@acme.io>", "Invoice $99.00", "");
        let mut store = MemoryStore::default().with("Acme", 40.0, 1, SubscriptionStatus::Active);

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert_eq!(report.findings[0].change, Change::Seen);
        assert_eq!(store.get("Acme").unwrap().amount, 40.0);
    }

    #[tokio::test]
    async fn record_is_listed_once_per_pass() {
        let mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "Acme <a@acme.io>", "Receipt", "")
            .receipt("r2", "Acme <billing@acme.io>", "Receipt $7.00", "")
            .receipt("r3", "Acme <a@acme.io>", "Receipt $8.00", "");
        let mut store = MemoryStore::default();

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].change, Change::Created);
        assert_eq!(report.findings[0].record.amount, 7.0);
        assert_eq!(store.rows.len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_skipped() {
        let mut mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "One <1@one.io>", "Receipt", "")
            .receipt("r2", "Two <2@two.io>", "Receipt", "")
            .receipt("r3", "Three <3@three.io>", "Receipt", "");
        mailbox
            .fetch_errors
            .insert("r2".into(), MailboxError::Transport("500".into()));
        let mut store = MemoryStore::default();

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        let names: Vec<_> = report.reported().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Three"]);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn unnamed_or_missing_sender_is_skipped() {
        let mut mailbox = FakeMailbox::with_token("t")
            .receipt("r1", "<noreply@x.com>", "Receipt $5.00", "")
            .message("r2", None, "Invoice", "");
        mailbox.receipts.push("r2".into());
        let mut store = MemoryStore::default();

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.skipped, 2);
        assert!(store.rows.is_empty());
    }

    #[tokio::test]
    async fn missing_subject_falls_back_to_snippet() {
        let mut mailbox = FakeMailbox::with_token("t").receipt("r1", "Acme <a@acme.io>", "", "Total $3.50");
        mailbox
            .messages
            .get_mut("r1")
            .unwrap()
            .headers
            .retain(|h| h.name != "Subject");
        let mut store = MemoryStore::default();

        let report = run(&mailbox, &mut store, today()).await.unwrap();
        assert_eq!(report.findings[0].record.amount, 3.5);
    }

    #[tokio::test]
    async fn search_failure_is_fatal() {
        struct Down;

        #[async_trait::async_trait]
        impl Mailbox for Down {
            async fn search(&self, _: &str, _: u32) -> Result<Vec<String>, MailboxError> {
                Err(MailboxError::Transport("connection reset".into()))
            }
            async fn fetch(&self, _: &str) -> Result<super::super::InboxMessage, MailboxError> {
                unreachable!()
            }
            async fn current_access_token(&self) -> String {
                String::new()
            }
        }

        let mut store = MemoryStore::default();
        assert!(run(&Down, &mut store, today()).await.is_err());
    }
}
