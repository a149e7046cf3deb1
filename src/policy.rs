use crate::models::Threshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Safe,
    Danger,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Info => "info",
            Status::Safe => "safe",
            Status::Danger => "danger",
        }
    }
}

/// What the student should do next. Only `Bunk` and `Attend` carry a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    NoClasses,
    Bunk(u64),
    Attend(u64),
    /// 0% goal: every ratio clears it.
    NoLimit,
    StayPerfect,
    /// 100% goal with at least one miss.
    Unrecoverable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub current_percent: f64,
    pub status: Status,
    pub recommendation: Recommendation,
}

impl Assessment {
    pub fn action_count(&self) -> Option<u64> {
        match self.recommendation {
            Recommendation::Bunk(count) | Recommendation::Attend(count) => Some(count),
            _ => None,
        }
    }
}

/// Classifies an attendance record against its goal.
///
/// All comparisons are done in integer hundredths of a percent so the
/// returned counts are exact: a bunk count `k` is the largest value with
/// `attended / (total + k) >= goal`, and an attend count `k` is the smallest
/// with `(attended + k) / (total + k) >= goal`.
pub fn assess(attended: u32, missed: u32, min_required: Threshold) -> Assessment {
    let attended = u64::from(attended);
    let missed = u64::from(missed);
    let total = attended + missed;

    if total == 0 {
        return Assessment {
            current_percent: 0.0,
            status: Status::Info,
            recommendation: Recommendation::NoClasses,
        };
    }

    let current_percent = attended as f64 * 100.0 / total as f64;
    let goal = u64::from(min_required.basis_points());
    let scale = u64::from(Threshold::SCALE);

    if goal == scale {
        let (status, recommendation) = if missed > 0 {
            (Status::Danger, Recommendation::Unrecoverable)
        } else {
            (Status::Safe, Recommendation::StayPerfect)
        };
        return Assessment {
            current_percent,
            status,
            recommendation,
        };
    }

    if goal == 0 {
        return Assessment {
            current_percent,
            status: Status::Safe,
            recommendation: Recommendation::NoLimit,
        };
    }

    let earned = attended * scale;
    let needed = goal * total;

    if earned >= needed {
        Assessment {
            current_percent,
            status: Status::Safe,
            recommendation: Recommendation::Bunk((earned - needed) / goal),
        }
    } else {
        let shortfall = needed - earned;
        let gain_per_class = scale - goal;
        Assessment {
            current_percent,
            status: Status::Danger,
            recommendation: Recommendation::Attend(shortfall.div_ceil(gain_per_class)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pct(value: u8) -> Threshold {
        Threshold::from_percent(value).expect("valid percent")
    }

    fn bp(value: u32) -> Threshold {
        Threshold::from_basis_points(value).expect("valid basis points")
    }

    /// Any goal strictly between 0% and 100%, with both edges drawn often.
    fn partial_goal() -> impl Strategy<Value = u32> {
        prop_oneof![Just(1u32), Just(9_999u32), 1u32..10_000]
    }

    /// `attended / total >= goal`, exact.
    fn meets(attended: u64, total: u64, goal: Threshold) -> bool {
        attended * u64::from(Threshold::SCALE) >= u64::from(goal.basis_points()) * total
    }

    #[test]
    fn no_classes_is_info() {
        let result = assess(0, 0, pct(75));
        assert_eq!(result.status, Status::Info);
        assert_eq!(result.current_percent, 0.0);
        assert_eq!(result.action_count(), None);
    }

    #[test]
    fn exactly_at_threshold_has_no_slack() {
        let result = assess(30, 10, pct(75));
        assert_eq!(result.status, Status::Safe);
        assert!((result.current_percent - 75.0).abs() < 1e-9);
        assert_eq!(result.recommendation, Recommendation::Bunk(0));
    }

    #[test]
    fn safe_zone_counts_bunkable_classes() {
        let result = assess(30, 5, pct(75));
        assert_eq!(result.status, Status::Safe);
        assert!((result.current_percent - 85.714).abs() < 0.001);
        assert_eq!(result.recommendation, Recommendation::Bunk(5));
    }

    #[test]
    fn danger_zone_counts_classes_to_attend() {
        let result = assess(10, 10, pct(75));
        assert_eq!(result.status, Status::Danger);
        assert!((result.current_percent - 50.0).abs() < 1e-9);
        assert_eq!(result.recommendation, Recommendation::Attend(20));
    }

    #[test]
    fn perfect_goal_without_misses_is_safe() {
        let result = assess(5, 0, pct(100));
        assert_eq!(result.status, Status::Safe);
        assert_eq!(result.recommendation, Recommendation::StayPerfect);
    }

    #[test]
    fn perfect_goal_with_a_miss_is_unrecoverable() {
        let result = assess(5, 1, pct(100));
        assert_eq!(result.status, Status::Danger);
        assert_eq!(result.recommendation, Recommendation::Unrecoverable);
        assert_eq!(result.action_count(), None);
    }

    #[test]
    fn zero_goal_has_no_limit() {
        let result = assess(0, 12, pct(0));
        assert_eq!(result.status, Status::Safe);
        assert_eq!(result.recommendation, Recommendation::NoLimit);
    }

    #[test]
    fn fractional_goal_is_exact() {
        // 72.5% of 40 is 29.
        let goal = "72.5".parse::<Threshold>().expect("valid percent");
        assert_eq!(assess(29, 11, goal).recommendation, Recommendation::Bunk(0));
        assert_eq!(assess(28, 12, goal).status, Status::Danger);
    }

    #[test]
    fn seventy_percent_goal_does_not_drift() {
        // 7 / 10 is exactly 70%, so nothing left to skip.
        assert_eq!(assess(7, 3, pct(70)).recommendation, Recommendation::Bunk(0));
        assert_eq!(assess(14, 5, pct(70)).recommendation, Recommendation::Bunk(1));
    }

    #[test]
    fn hundredth_goals_at_the_edges() {
        // A 99.99% goal is not the perfect-attendance case.
        assert_eq!(assess(9_999, 1, bp(9_999)).recommendation, Recommendation::Bunk(0));
        assert_eq!(assess(99, 1, bp(9_999)).recommendation, Recommendation::Attend(9_900));
        assert_eq!(assess(1, 9_999, bp(1)).recommendation, Recommendation::Bunk(0));
        assert_eq!(assess(0, 1, bp(1)).recommendation, Recommendation::Attend(1));
    }

    proptest! {
        #[test]
        fn empty_record_is_info_for_any_goal(goal in 0u32..=10_000) {
            let result = assess(0, 0, bp(goal));
            prop_assert_eq!(result.status, Status::Info);
            prop_assert_eq!(result.current_percent, 0.0);
        }

        #[test]
        fn bunk_count_is_tight(attended in 0u32..2_000, missed in 0u32..2_000, goal in partial_goal()) {
            prop_assume!(attended + missed > 0);
            let goal = bp(goal);
            if let Recommendation::Bunk(k) = assess(attended, missed, goal).recommendation {
                let attended = u64::from(attended);
                let total = attended + u64::from(missed);
                prop_assert!(meets(attended, total + k, goal));
                prop_assert!(!meets(attended, total + k + 1, goal));
            }
        }

        #[test]
        fn attend_count_is_tight(attended in 0u32..2_000, missed in 0u32..2_000, goal in partial_goal()) {
            prop_assume!(attended + missed > 0);
            let goal = bp(goal);
            if let Recommendation::Attend(k) = assess(attended, missed, goal).recommendation {
                let attended = u64::from(attended);
                let total = attended + u64::from(missed);
                prop_assert!(k > 0);
                prop_assert!(meets(attended + k, total + k, goal));
                prop_assert!(!meets(attended + k - 1, total + k - 1, goal));
            }
        }

        #[test]
        fn status_matches_current_ratio(attended in 0u32..2_000, missed in 0u32..2_000, goal in partial_goal()) {
            prop_assume!(attended + missed > 0);
            let goal = bp(goal);
            let result = assess(attended, missed, goal);
            let total = u64::from(attended) + u64::from(missed);
            let expected = if meets(u64::from(attended), total, goal) {
                Status::Safe
            } else {
                Status::Danger
            };
            prop_assert_eq!(result.status, expected);
        }

        #[test]
        fn raising_the_goal_never_helps(
            attended in 0u32..2_000,
            missed in 1u32..2_000,
            low in 1u32..9_999,
            bump in 1u32..5_000,
        ) {
            let high = (low + bump).min(9_999);
            let before = assess(attended, missed, bp(low)).recommendation;
            let after = assess(attended, missed, bp(high)).recommendation;
            match (before, after) {
                (Recommendation::Bunk(a), Recommendation::Bunk(b)) => prop_assert!(b <= a),
                (Recommendation::Attend(a), Recommendation::Attend(b)) => prop_assert!(b >= a),
                (Recommendation::Attend(_), Recommendation::Bunk(_)) => {
                    prop_assert!(false, "higher goal moved record into the safe zone")
                }
                _ => {}
            }
        }
    }
}
