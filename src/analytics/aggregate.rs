//! Record-level aggregations: superusers, country ranking, team insights

use std::collections::{BTreeMap, HashMap};

use crate::models::{CountryTally, TeamInsight, UserRecord};

/// Minimum score for a superuser
pub const SUPERUSER_MIN_SCORE: i64 = 900;

/// Default number of countries returned by [`top_countries`]
pub const DEFAULT_TOP_COUNTRIES: usize = 5;

pub fn is_superuser(record: &UserRecord) -> bool {
    record.score >= SUPERUSER_MIN_SCORE && record.active
}

/// Every active record scoring at least [`SUPERUSER_MIN_SCORE`], ordered by id
pub fn superusers(records: &[UserRecord]) -> Vec<UserRecord> {
    let mut found: Vec<UserRecord> = records.iter().filter(|r| is_superuser(r)).cloned().collect();
    found.sort_by_key(|r| r.id);
    found
}

/// Countries with the most superusers, highest count first.
///
/// Equal counts are ordered by country code so truncation to `limit` is
/// deterministic.
pub fn top_countries(records: &[UserRecord], limit: usize) -> Vec<CountryTally> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|r| is_superuser(r)) {
        *counts.entry(record.country.as_str()).or_default() += 1;
    }

    let mut tallies: Vec<CountryTally> = counts
        .into_iter()
        .map(|(country, total)| CountryTally {
            country: country.to_string(),
            total,
        })
        .collect();

    tallies.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.country.cmp(&b.country)));
    tallies.truncate(limit);
    tallies
}

#[derive(Default)]
struct TeamTotals {
    members: usize,
    leaders: usize,
    active: usize,
    completed_projects: usize,
}

/// Per-team statistics, ordered by team name.
///
/// Completed projects are summed across members as listed on each record;
/// two members listing the same project both count it.
pub fn team_insights(records: &[UserRecord]) -> Vec<TeamInsight> {
    let mut teams: BTreeMap<&str, TeamTotals> = BTreeMap::new();

    for record in records {
        let totals = teams.entry(record.team.name.as_str()).or_default();
        totals.members += 1;
        if record.team.leader {
            totals.leaders += 1;
        }
        if record.active {
            totals.active += 1;
        }
        totals.completed_projects += record.team.projects.iter().filter(|p| p.completed).count();
    }

    teams
        .into_iter()
        .map(|(team, totals)| TeamInsight {
            team: team.to_string(),
            total_members: totals.members,
            leaders: totals.leaders,
            completed_projects: totals.completed_projects,
            // members >= 1: a team only exists once a record references it
            active_percentage: 100.0 * totals.active as f64 / totals.members as f64,
        })
        .collect()
}
