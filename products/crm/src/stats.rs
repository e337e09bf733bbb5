//! Summary figures derived from whatever page of records is loaded.
//!
//! Nothing here fetches; totals cover only the rows passed in.

use chrono::{DateTime, NaiveDate, Utc};
use entity::{Choice, account, campaign, carepack, deal, lead, task};

/// Default look-ahead for "expiring soon" carepacks.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// Count `items` per choice, in declaration order, including zero counts.
pub fn count_by<T, C: Choice>(items: &[T], key: impl Fn(&T) -> C) -> Vec<(C, usize)> {
    C::ALL
        .iter()
        .map(|choice| (*choice, items.iter().filter(|item| key(item) == *choice).count()))
        .collect()
}

/// Saturating sum of cent amounts.
pub(crate) fn sum_cents(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

fn ratio(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccountStats {
    pub total: usize,
    pub by_status: Vec<(account::Status, usize)>,
    pub annual_revenue_cents: i64,
}

pub fn account_stats(accounts: &[account::Model]) -> AccountStats {
    AccountStats {
        total: accounts.len(),
        by_status: count_by(accounts, |a| a.status),
        annual_revenue_cents: sum_cents(accounts.iter().filter_map(|a| a.annual_revenue_cents)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageTotal {
    pub stage: deal::Stage,
    pub count: usize,
    pub amount_cents: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DealStats {
    pub open: usize,
    pub won: usize,
    pub lost: usize,
    /// Sum over open deals.
    pub pipeline_cents: i64,
    /// Open deal amounts scaled by stage probability.
    pub weighted_cents: i64,
    pub won_cents: i64,
    pub by_stage: Vec<StageTotal>,
}

impl DealStats {
    /// Won over closed, `None` until something has closed.
    pub fn win_rate(&self) -> Option<f64> {
        ratio(self.won as u64, (self.won + self.lost) as u64)
    }
}

pub fn deal_stats(deals: &[deal::Model]) -> DealStats {
    let amount = |d: &deal::Model| d.amount_cents.unwrap_or(0);
    let open: Vec<&deal::Model> = deals.iter().filter(|d| !d.stage.is_closed()).collect();
    let weighted_sum: i128 = open
        .iter()
        .map(|d| i128::from(amount(d)) * i128::from(d.stage.probability()))
        .sum();
    let weighted_cents = i64::try_from(weighted_sum / 100).unwrap_or(i64::MAX);
    let by_stage = deal::Stage::ALL
        .iter()
        .map(|stage| {
            let in_stage = deals.iter().filter(|d| d.stage == *stage);
            StageTotal {
                stage: *stage,
                count: in_stage.clone().count(),
                amount_cents: sum_cents(in_stage.map(amount)),
            }
        })
        .collect();
    DealStats {
        open: open.len(),
        won: deals.iter().filter(|d| d.stage == deal::Stage::Won).count(),
        lost: deals.iter().filter(|d| d.stage == deal::Stage::Lost).count(),
        pipeline_cents: sum_cents(open.iter().map(|d| amount(d))),
        weighted_cents,
        won_cents: sum_cents(
            deals
                .iter()
                .filter(|d| d.stage == deal::Stage::Won)
                .map(amount),
        ),
        by_stage,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CarepackStats {
    pub active: usize,
    pub expiring_soon: usize,
    pub expired: usize,
}

/// `expiring_soon` counts active carepacks ending within `window_days` of
/// `today`. A pack past its end date counts as expired whatever its status.
pub fn carepack_stats(packs: &[carepack::Model], today: NaiveDate, window_days: i64) -> CarepackStats {
    let mut stats = CarepackStats::default();
    for pack in packs {
        let days = pack.days_until_expiry(today);
        if pack.status == carepack::Status::Expired || days < 0 {
            stats.expired += 1;
            continue;
        }
        if pack.status == carepack::Status::Active {
            stats.active += 1;
            if days <= window_days {
                stats.expiring_soon += 1;
            }
        }
    }
    stats
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CampaignStats {
    pub running: usize,
    pub sent: u64,
    pub opens: u64,
    pub clicks: u64,
}

impl CampaignStats {
    pub fn open_rate(&self) -> Option<f64> {
        ratio(self.opens, self.sent)
    }

    /// Clicks over opens.
    pub fn click_rate(&self) -> Option<f64> {
        ratio(self.clicks, self.opens)
    }
}

pub fn campaign_stats(campaigns: &[campaign::Model]) -> CampaignStats {
    campaigns.iter().fold(CampaignStats::default(), |mut acc, c| {
        if c.status == campaign::Status::Running {
            acc.running += 1;
        }
        acc.sent = acc.sent.saturating_add(c.sent_count);
        acc.opens = acc.opens.saturating_add(c.open_count);
        acc.clicks = acc.clicks.saturating_add(c.click_count);
        acc
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub open: usize,
    pub overdue: usize,
    pub done: usize,
}

pub fn task_stats(tasks: &[task::Model], now: DateTime<Utc>) -> TaskStats {
    let mut stats = TaskStats::default();
    for item in tasks {
        if item.status.is_open() {
            stats.open += 1;
        }
        if item.is_overdue(now) {
            stats.overdue += 1;
        }
        if item.status == task::Status::Done {
            stats.done += 1;
        }
    }
    stats
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeadStats {
    pub total: usize,
    pub by_status: Vec<(lead::Status, usize)>,
    pub value_cents: i64,
}

impl LeadStats {
    pub fn count(&self, status: lead::Status) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }
}

pub fn lead_stats(leads: &[lead::Model]) -> LeadStats {
    LeadStats {
        total: leads.len(),
        by_status: count_by(leads, |l| l.status),
        value_cents: sum_cents(leads.iter().filter_map(|l| l.value_cents)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account, deal, ts};
    use chrono::Duration;
    use entity::deal::Stage;
    use uuid::Uuid;

    #[test]
    fn deal_pipeline_is_weighted_by_stage() {
        let deals = vec![
            deal("a", Stage::New, 10_000),
            deal("b", Stage::Proposal, 20_000),
            deal("c", Stage::Won, 5_000),
            deal("d", Stage::Lost, 7_000),
            deal("e", Stage::Lost, 1_000),
        ];
        let stats = deal_stats(&deals);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.pipeline_cents, 30_000);
        assert_eq!(stats.weighted_cents, 1_000 + 10_000);
        assert_eq!(stats.won_cents, 5_000);
        assert_eq!(stats.win_rate(), Some(1.0 / 3.0));
        let lost = stats.by_stage.iter().find(|s| s.stage == Stage::Lost).unwrap();
        assert_eq!((lost.count, lost.amount_cents), (2, 8_000));
        assert_eq!(stats.by_stage.len(), Stage::ALL.len());
    }

    #[test]
    fn empty_pages_have_no_rates() {
        assert_eq!(deal_stats(&[]).win_rate(), None);
        assert_eq!(campaign_stats(&[]).open_rate(), None);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let half = i64::MAX / 2;
        let deals = vec![
            deal("a", Stage::Negotiate, half),
            deal("b", Stage::Negotiate, half),
            deal("c", Stage::Proposal, half),
            deal("d", Stage::Won, half),
            deal("e", Stage::Won, half),
            deal("f", Stage::Won, half),
        ];
        let stats = deal_stats(&deals);
        assert_eq!(stats.pipeline_cents, i64::MAX);
        assert_eq!(stats.won_cents, i64::MAX);
        // 75% + 75% + 50% of half fits.
        assert_eq!(stats.weighted_cents, (i128::from(half) * 200 / 100) as i64);
        let won = stats.by_stage.iter().find(|s| s.stage == Stage::Won).unwrap();
        assert_eq!(won.amount_cents, i64::MAX);
    }

    fn campaign(status: campaign::Status, sent: u64, opens: u64, clicks: u64) -> campaign::Model {
        campaign::Model {
            id: Uuid::new_v4(),
            name: "spring".into(),
            status,
            channel: None,
            budget_cents: None,
            starts_on: None,
            ends_on: None,
            sent_count: sent,
            open_count: opens,
            click_count: clicks,
            created_at: ts(),
        }
    }

    #[test]
    fn campaign_rates_use_sent_then_opens() {
        let stats = campaign_stats(&[
            campaign(campaign::Status::Running, 800, 200, 50),
            campaign(campaign::Status::Completed, 200, 50, 0),
            campaign(campaign::Status::Draft, 0, 0, 0),
        ]);
        assert_eq!(stats.running, 1);
        assert_eq!((stats.sent, stats.opens, stats.clicks), (1_000, 250, 50));
        assert_eq!(stats.open_rate(), Some(0.25));
        assert_eq!(stats.click_rate(), Some(0.2));

        let unopened = campaign_stats(&[campaign(campaign::Status::Running, 10, 0, 0)]);
        assert_eq!(unopened.open_rate(), Some(0.0));
        assert_eq!(unopened.click_rate(), None);
    }

    #[test]
    fn accounts_count_every_status() {
        let mut inactive = account("b");
        inactive.status = account::Status::Inactive;
        inactive.annual_revenue_cents = Some(900);
        let stats = account_stats(&[account("a"), inactive]);
        assert_eq!(
            stats.by_status,
            vec![
                (account::Status::Prospect, 0),
                (account::Status::Active, 1),
                (account::Status::Inactive, 1),
            ]
        );
        assert_eq!(stats.annual_revenue_cents, 900);
    }

    fn pack(status: carepack::Status, end: NaiveDate) -> carepack::Model {
        carepack::Model {
            id: Uuid::new_v4(),
            name: "pack".into(),
            account_id: None,
            product_id: None,
            serial_number: None,
            start_date: end - Duration::days(365),
            end_date: end,
            status,
            price_cents: None,
            currency: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn carepacks_split_by_expiry_window() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let packs = vec![
            pack(carepack::Status::Active, today + Duration::days(10)),
            pack(carepack::Status::Active, today + Duration::days(30)),
            pack(carepack::Status::Active, today + Duration::days(90)),
            pack(carepack::Status::Active, today - Duration::days(1)),
            pack(carepack::Status::Expired, today + Duration::days(5)),
            pack(carepack::Status::Pending, today + Duration::days(5)),
        ];
        let stats = carepack_stats(&packs, today, EXPIRY_WINDOW_DAYS);
        assert_eq!(
            stats,
            CarepackStats {
                active: 3,
                expiring_soon: 2,
                expired: 2,
            }
        );
    }

    #[test]
    fn tasks_overdue_only_while_open() {
        let make = |status, due: Option<i64>| task::Model {
            id: Uuid::new_v4(),
            title: "t".into(),
            notes: None,
            status,
            priority: task::Priority::Medium,
            due_at: due.map(|h| ts() + Duration::hours(h)),
            assigned_user_id: None,
            account_id: None,
            deal_id: None,
            lead_id: None,
            completed_at: None,
            created_at: ts(),
            updated_at: ts(),
        };
        let tasks = vec![
            make(task::Status::Open, Some(-2)),
            make(task::Status::InProgress, Some(4)),
            make(task::Status::Done, Some(-2)),
            make(task::Status::Cancelled, None),
        ];
        assert_eq!(
            task_stats(&tasks, ts()),
            TaskStats {
                open: 2,
                overdue: 1,
                done: 1,
            }
        );
    }
}
