//! Daily login bucketing

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailyLoginCount, UserRecord};

/// Count `"login"` log entries per calendar day, ascending by date.
///
/// Every login counts, including several by the same user on the same day.
pub fn active_users_per_day(records: &[UserRecord]) -> Vec<DailyLoginCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for entry in records.iter().flat_map(|r| &r.logs).filter(|e| e.is_login()) {
        *days.entry(entry.date).or_default() += 1;
    }

    days.into_iter()
        .map(|(date, total)| DailyLoginCount { date, total })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogEntry, Team};
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn with_logs(id: u128, logs: &[(u32, &str)]) -> UserRecord {
        UserRecord {
            id: Uuid::from_u128(id),
            name: "u".to_string(),
            age: 40,
            score: 0,
            active: false,
            country: "BR".to_string(),
            team: Team {
                name: "T".to_string(),
                leader: false,
                projects: vec![],
            },
            logs: logs
                .iter()
                .map(|(d, action)| LogEntry {
                    date: day(*d),
                    action: action.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_only_login_actions_count() {
        let records = vec![with_logs(1, &[(1, "login"), (1, "login"), (2, "logout")])];
        assert_eq!(
            active_users_per_day(&records),
            vec![DailyLoginCount { date: day(1), total: 2 }]
        );
    }

    #[test]
    fn test_buckets_across_users_ascending() {
        let records = vec![
            with_logs(1, &[(3, "login"), (1, "login")]),
            with_logs(2, &[(1, "login"), (3, "Login"), (2, "update")]),
        ];
        assert_eq!(
            active_users_per_day(&records),
            vec![
                DailyLoginCount { date: day(1), total: 2 },
                DailyLoginCount { date: day(3), total: 1 },
            ]
        );
    }

    #[test]
    fn test_no_logs_yields_empty() {
        assert!(active_users_per_day(&[with_logs(1, &[])]).is_empty());
    }
}
