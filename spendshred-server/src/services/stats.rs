//! Spend and waste aggregation

use std::collections::HashMap;

use shared::models::{AnalysisSummary, DEFAULT_TEAM, SpendStats, Subscription, TeamSpend};

/// Aggregate spend, waste and team breakdown.
///
/// Active records waste their per-seat cost times unused seats; zombie and
/// critical records waste their whole amount; cancelled records are ignored.
pub fn compute_stats(subs: &[Subscription]) -> SpendStats {
    let mut stats = SpendStats::default();
    let mut by_team: HashMap<&str, f64> = HashMap::new();

    for sub in subs {
        if sub.status.is_wasteful() {
            stats.zombie_count += 1;
            stats.wasted_spend += sub.amount;
            continue;
        }
        if !sub.is_active() {
            continue;
        }

        stats.total_spend += sub.amount;
        if sub.seats_total > 0 && sub.seats_unused > 0 {
            stats.active_with_waste += 1;
            stats.wasted_spend +=
                sub.amount / f64::from(sub.seats_total) * f64::from(sub.seats_unused);
        } else {
            stats.active_fully_used += 1;
        }

        let team = if sub.team.is_empty() { DEFAULT_TEAM } else { sub.team.as_str() };
        *by_team.entry(team).or_default() += sub.amount;
    }

    stats.active_subs = stats.active_fully_used + stats.active_with_waste;
    stats.health_score = health_score(stats.total_spend, stats.wasted_spend);

    let mut teams: Vec<TeamSpend> = by_team
        .into_iter()
        .map(|(team, amount)| TeamSpend {
            team: team.to_string(),
            amount,
        })
        .collect();
    teams.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.team.cmp(&b.team)));
    stats.spend_by_team = teams;

    stats
}

/// 100 minus the waste share of (spend + waste), floored at 0
fn health_score(total_spend: f64, wasted_spend: f64) -> u8 {
    if total_spend <= 0.0 {
        return 100;
    }
    let waste_ratio = wasted_spend / (total_spend + wasted_spend);
    (100 - (waste_ratio * 100.0) as i64).clamp(0, 100) as u8
}

/// Portfolio review: records analyzed, wasteful records, recoverable spend
pub fn analyze(subs: &[Subscription]) -> AnalysisSummary {
    let stats = compute_stats(subs);
    AnalysisSummary {
        analyzed_count: subs.len() as u32,
        zombies_found: stats.zombie_count,
        potential_savings: stats.wasted_spend,
    }
}

#[cfg(test)]
mod tests {
    use shared::models::SubscriptionStatus;

    use super::*;

    fn sub(team: &str, amount: f64, seats: (i32, i32), status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: 0,
            name: format!("{team}-{amount}"),
            team: team.to_string(),
            amount,
            seats_total: seats.0,
            seats_unused: seats.1,
            status,
            last_used: "Unknown".to_string(),
        }
    }

    #[test]
    fn empty_portfolio_is_healthy() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_spend, 0.0);
        assert_eq!(stats.health_score, 100);
        assert!(stats.spend_by_team.is_empty());
    }

    #[test]
    fn demo_portfolio() {
        use SubscriptionStatus::*;
        let subs = vec![
            sub("Engineering", 120.0, (12, 0), Active),
            sub("Design", 450.0, (10, 3), Zombie),
            sub("Marketing", 200.0, (10, 8), Critical),
            sub("Product", 80.0, (8, 0), Active),
            sub("Design", 600.0, (5, 1), Zombie),
        ];
        let stats = compute_stats(&subs);

        assert_eq!(stats.total_spend, 200.0);
        assert_eq!(stats.wasted_spend, 1250.0);
        assert_eq!(stats.active_subs, 2);
        assert_eq!(stats.active_fully_used, 2);
        assert_eq!(stats.active_with_waste, 0);
        assert_eq!(stats.zombie_count, 3);
        // 1250 / 1450 = 86.2% waste
        assert_eq!(stats.health_score, 14);
        assert_eq!(
            stats.spend_by_team,
            vec![
                TeamSpend { team: "Engineering".into(), amount: 120.0 },
                TeamSpend { team: "Product".into(), amount: 80.0 },
            ]
        );
    }

    #[test]
    fn partial_seat_waste() {
        let subs = vec![sub("Ops", 100.0, (4, 1), SubscriptionStatus::Active)];
        let stats = compute_stats(&subs);
        assert_eq!(stats.wasted_spend, 25.0);
        assert_eq!(stats.active_with_waste, 1);
        assert_eq!(stats.health_score, 80);
    }

    #[test]
    fn cancelled_is_ignored_and_blank_team_is_unassigned() {
        let subs = vec![
            sub("", 10.0, (1, 0), SubscriptionStatus::Active),
            sub("Ops", 99.0, (1, 1), SubscriptionStatus::Cancelled),
        ];
        let stats = compute_stats(&subs);
        assert_eq!(stats.total_spend, 10.0);
        assert_eq!(stats.wasted_spend, 0.0);
        assert_eq!(stats.spend_by_team[0].team, "Unassigned");
    }

    #[test]
    fn waste_without_spend_keeps_full_score() {
        let subs = vec![sub("Ops", 50.0, (1, 1), SubscriptionStatus::Zombie)];
        assert_eq!(compute_stats(&subs).health_score, 100);
    }

    #[test]
    fn analysis_counts_zombies_and_savings() {
        let subs = vec![
            sub("Ops", 50.0, (1, 1), SubscriptionStatus::Zombie),
            sub("Ops", 40.0, (2, 1), SubscriptionStatus::Active),
        ];
        let summary = analyze(&subs);
        assert_eq!(summary.analyzed_count, 2);
        assert_eq!(summary.zombies_found, 1);
        assert_eq!(summary.potential_savings, 70.0);
    }
}
