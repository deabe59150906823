//! Dormancy pass: re-engagement mail → zombie subscriptions

use shared::models::{DEFAULT_TEAM, SubscriptionCreate, SubscriptionStatus};

use super::{
    Change, DORMANCY_MAX_RESULTS, Finding, Mailbox, PassReport, ScanError, SubscriptionStore,
    dormancy_query, fetch_named,
};

const PASS: &str = "dormancy";

/// `last_used` marker for accounts discovered through a dormancy notice
pub const DORMANT_LAST_USED: &str = "Long time ago";

pub(super) async fn run<M, S>(mailbox: &M, store: &mut S) -> Result<PassReport, ScanError>
where
    M: Mailbox + ?Sized,
    S: SubscriptionStore + ?Sized,
{
    let ids = match mailbox.search(&dormancy_query(), DORMANCY_MAX_RESULTS).await {
        Ok(ids) => ids,
        Err(e) if e.is_auth() => return Err(e.into()),
        Err(e) => {
            tracing::warn!("Dormancy search failed, pass skipped: {e}");
            return Ok(PassReport::default());
        }
    };

    let mut report = PassReport::default();
    for id in &ids {
        let Some((name, _)) = fetch_named(mailbox, id, PASS).await? else {
            report.skipped += 1;
            continue;
        };
        tracing::debug!(name = %name, "Dormancy signal");

        match store.find_by_name(&name).await? {
            Some(mut existing) if existing.is_active() => {
                existing.status = SubscriptionStatus::Zombie;
                existing.seats_unused = existing.seats_total;
                store.save(&existing).await?;
                tracing::info!(name = %existing.name, "Subscription demoted to zombie");
                report.findings.push(Finding {
                    record: existing,
                    change: Change::Demoted,
                });
            }
            Some(existing) => report.findings.push(Finding {
                record: existing,
                change: Change::Unchanged,
            }),
            None => {
                let created = store
                    .insert(SubscriptionCreate {
                        name,
                        team: Some(DEFAULT_TEAM.to_string()),
                        amount: 0.0,
                        seats_total: 1,
                        seats_unused: 1,
                        status: Some(SubscriptionStatus::Zombie),
                        last_used: Some(DORMANT_LAST_USED.to_string()),
                    })
                    .await?;
                tracing::info!(name = %created.name, "New zombie subscription");
                report.findings.push(Finding {
                    record: created,
                    change: Change::Created,
                });
            }
        }
    }
    Ok(report)
}
