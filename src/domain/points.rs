//! Renewable-usage points and leaderboard

use serde::{Deserialize, Serialize};

/// kWh of renewable energy needed for one point.
pub const KWH_PER_POINT: f64 = 10.0;

/// Points earned for `kwh` of renewable energy used. Partial points are dropped.
pub fn points_for_renewable_kwh(kwh: f64) -> u32 {
    if !kwh.is_finite() || kwh <= 0.0 {
        return 0;
    }
    (kwh / KWH_PER_POINT).floor() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPoints {
    pub user_id: String,
    pub user_name: String,
    pub campus: String,
    pub points: u32,
    pub renewable_usage: f64,
    pub rank: u32,
}

impl UserPoints {
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        campus: impl Into<String>,
        points: u32,
        renewable_usage: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            campus: campus.into(),
            points,
            renewable_usage,
            rank: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<UserPoints>,
}

impl Leaderboard {
    /// Sort by points (highest first) and assign ranks 1..=n.
    /// Ties keep their input order.
    pub fn ranked(mut entries: Vec<UserPoints>) -> Self {
        entries.sort_by(|a, b| b.points.cmp(&a.points));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i as u32 + 1;
        }
        Self { entries }
    }

    /// Technician leaderboard; the signed-in user takes the second slot.
    pub fn technician_seed(user_id: &str, user_name: &str, campus: &str) -> Self {
        Self::ranked(vec![
            UserPoints::new("sarah", "Sarah Johnson", "Main Campus", 1450, 289.2),
            UserPoints::new(user_id, user_name, campus, 1250, 245.5),
            UserPoints::new("mike", "Mike Chen", "North Campus", 980, 198.7),
        ])
    }

    pub fn admin_seed(user_id: &str, user_name: &str) -> Self {
        Self::ranked(vec![UserPoints::new(user_id, user_name, "Main Campus", 2000, 350.2)])
    }

    pub fn entries(&self) -> &[UserPoints] {
        &self.entries
    }

    pub fn find(&self, user_id: &str) -> Option<&UserPoints> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }

    /// Credit renewable usage to a user and re-rank.
    ///
    /// Non-finite or negative `kwh` is ignored. Points saturate at `u32::MAX`.
    pub fn record_usage(&mut self, user_id: &str, kwh: f64) -> Option<u32> {
        let entry = self.entries.iter_mut().find(|e| e.user_id == user_id)?;
        if !kwh.is_finite() || kwh <= 0.0 {
            return Some(0);
        }
        let before = points_for_renewable_kwh(entry.renewable_usage);
        let total = entry.renewable_usage + kwh;
        if total.is_finite() {
            entry.renewable_usage = total;
        }
        let earned = points_for_renewable_kwh(entry.renewable_usage).saturating_sub(before);
        entry.points = entry.points.saturating_add(earned);

        let entries = std::mem::take(&mut self.entries);
        *self = Self::ranked(entries);
        Some(earned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_point_per_ten_kwh() {
        assert_eq!(points_for_renewable_kwh(0.0), 0);
        assert_eq!(points_for_renewable_kwh(9.99), 0);
        assert_eq!(points_for_renewable_kwh(10.0), 1);
        assert_eq!(points_for_renewable_kwh(245.5), 24);
        assert_eq!(points_for_renewable_kwh(-5.0), 0);
        assert_eq!(points_for_renewable_kwh(f64::NAN), 0);
    }

    #[test]
    fn ranking_orders_by_points() {
        let board = Leaderboard::ranked(vec![
            UserPoints::new("a", "A", "Main", 10, 0.0),
            UserPoints::new("b", "B", "Main", 30, 0.0),
            UserPoints::new("c", "C", "Main", 20, 0.0),
        ]);
        let order: Vec<_> = board.entries().iter().map(|e| (e.user_id.as_str(), e.rank)).collect();
        assert_eq!(order, vec![("b", 1), ("c", 2), ("a", 3)]);
    }

    #[test]
    fn ties_keep_input_order() {
        let board = Leaderboard::ranked(vec![
            UserPoints::new("first", "F", "Main", 5, 0.0),
            UserPoints::new("second", "S", "Main", 5, 0.0),
        ]);
        assert_eq!(board.find("first").unwrap().rank, 1);
        assert_eq!(board.find("second").unwrap().rank, 2);
    }

    #[test]
    fn technician_seed_places_user_second() {
        let board = Leaderboard::technician_seed("1", "John Smith", "Main Campus");
        assert_eq!(board.find("1").unwrap().rank, 2);
        assert_eq!(board.entries()[0].user_name, "Sarah Johnson");
    }

    #[test]
    fn record_usage_can_change_rank() {
        let mut board = Leaderboard::technician_seed("1", "John Smith", "Main Campus");
        // 245.5 + 2004.5 = 2250 kWh: 225 usage points, 24 already counted
        let earned = board.record_usage("1", 2004.5).unwrap();
        assert_eq!(earned, 201);
        assert_eq!(board.find("1").unwrap().rank, 1);
        assert!(board.record_usage("ghost", 10.0).is_none());
    }

    #[test]
    fn record_usage_ignores_bad_input_and_saturates() {
        let mut board = Leaderboard::technician_seed("1", "John Smith", "Main Campus");
        assert_eq!(board.record_usage("1", f64::INFINITY), Some(0));
        assert_eq!(board.record_usage("1", f64::NAN), Some(0));
        assert_eq!(board.record_usage("1", -50.0), Some(0));
        assert_eq!(board.find("1").unwrap().points, 1250);

        board.record_usage("1", 1e12).unwrap();
        let me = board.find("1").unwrap();
        assert_eq!(me.points, u32::MAX);
        assert_eq!(me.rank, 1);

        assert_eq!(board.record_usage("1", 1e12), Some(0));
        assert_eq!(board.find("1").unwrap().points, u32::MAX);
    }
}
