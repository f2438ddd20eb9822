use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::models::{CalorieLevel, DietRecord, MealType};

pub const TOP_TAGS: usize = 10;

/// Half-open reporting window `[start, end)` plus the day count the
/// completion rate is measured against.
#[derive(Debug, Clone, Copy)]
pub struct StatsWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub expected_days: u32,
}

impl StatsWindow {
    fn contains(&self, t: OffsetDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MealDistribution {
    pub breakfast: u32,
    pub lunch: u32,
    pub dinner: u32,
    pub snack: u32,
}

impl MealDistribution {
    fn bump(&mut self, m: MealType) {
        match m {
            MealType::Breakfast => self.breakfast += 1,
            MealType::Lunch => self.lunch += 1,
            MealType::Dinner => self.dinner += 1,
            MealType::Snack => self.snack += 1,
        }
    }
}

/// Percentages are rounded one by one and may not add up to exactly 100.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalorieDistribution {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_records: u32,
    pub total_unique_days: u32,
    pub continuous_days: u32,
    pub completion_rate_percent: u32,
    pub average_per_day: f64,
    pub meal_distribution: MealDistribution,
    pub calorie_distribution: CalorieDistribution,
    pub most_used_tags: Vec<TagCount>,
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
}

/// Calendar day of a record in the offset its timestamp carries.
fn local_day(r: &DietRecord) -> Date {
    r.created_at.date()
}

pub fn unique_days(records: &[&DietRecord]) -> BTreeSet<Date> {
    records.iter().map(|r| local_day(r)).collect()
}

/// Consecutive days with at least one record, ending today or yesterday.
pub fn current_streak(days: &BTreeSet<Date>, today: Date) -> u32 {
    let mut desc = days.iter().rev();
    let Some(&latest) = desc.next() else {
        return 0;
    };
    if latest != today && Some(latest) != today.previous_day() {
        return 0;
    }
    let mut streak = 1;
    let mut prev = latest;
    for &day in desc {
        if (prev - day).whole_days() != 1 {
            break;
        }
        streak += 1;
        prev = day;
    }
    streak
}

/// Top tags by count; ties keep the order in which tags were first seen.
pub fn top_tags(records: &[&DietRecord], k: usize) -> Vec<TagCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tally: Vec<TagCount> = Vec::new();
    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        match index.get(tag.as_str()) {
            Some(&i) => tally[i].count += 1,
            None => {
                index.insert(tag.as_str(), tally.len());
                tally.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    tally.sort_by(|a, b| b.count.cmp(&a.count));
    tally.truncate(k);
    tally
}

pub fn summarize(records: &[DietRecord], window: &StatsWindow) -> StatsSummary {
    let today = OffsetDateTime::now_utc().to_offset(window.end.offset()).date();
    summarize_at(records, window, today)
}

/// Pure and repeatable: same records, window and day give the same summary.
pub fn summarize_at(records: &[DietRecord], window: &StatsWindow, today: Date) -> StatsSummary {
    let in_window: Vec<&DietRecord> = records
        .iter()
        .filter(|r| window.contains(r.created_at))
        .collect();
    if in_window.is_empty() {
        return StatsSummary::default();
    }

    let days = unique_days(&in_window);
    let total_records = in_window.len() as u32;
    let total_unique_days = days.len() as u32;

    let mut meal_distribution = MealDistribution::default();
    let mut calorie_counts: HashMap<CalorieLevel, u32> = HashMap::new();
    for r in &in_window {
        meal_distribution.bump(r.meal_type);
        if let Some(level) = r.calorie_level {
            *calorie_counts.entry(level).or_default() += 1;
        }
    }
    let declared: u32 = calorie_counts.values().sum();
    let share = |level: CalorieLevel| percent(calorie_counts.get(&level).copied().unwrap_or(0), declared);

    let average_per_day = if total_unique_days > 0 {
        (f64::from(total_records) / f64::from(total_unique_days) * 10.0).round() / 10.0
    } else {
        0.0
    };

    StatsSummary {
        total_records,
        total_unique_days,
        continuous_days: current_streak(&days, today),
        completion_rate_percent: percent(total_unique_days, window.expected_days),
        average_per_day,
        meal_distribution,
        calorie_distribution: CalorieDistribution {
            low: share(CalorieLevel::Low),
            medium: share(CalorieLevel::Medium),
            high: share(CalorieLevel::High),
        },
        most_used_tags: top_tags(&in_window, TOP_TAGS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use time::{Duration, UtcOffset};
    use uuid::Uuid;

    const TODAY: Date = date!(2025 - 03 - 10);

    fn record_at(created_at: OffsetDateTime) -> DietRecord {
        DietRecord {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            meal_type: MealType::Lunch,
            photo_refs: vec![],
            tags: vec![],
            satisfaction: 4,
            description: None,
            location: None,
            calorie_level: None,
            occurred_at: created_at.date(),
            created_at,
        }
    }

    fn days_ago(n: i64) -> DietRecord {
        record_at(datetime!(2025-03-10 12:00 +8) - Duration::days(n))
    }

    fn wide_window(expected_days: u32) -> StatsWindow {
        StatsWindow {
            start: datetime!(2025-01-01 0:00 +8),
            end: datetime!(2025-04-01 0:00 +8),
            expected_days,
        }
    }

    fn streak_of(records: &[DietRecord]) -> u32 {
        summarize_at(records, &wide_window(7), TODAY).continuous_days
    }

    #[test]
    fn streak_examples() {
        assert_eq!(streak_of(&[days_ago(0), days_ago(1), days_ago(2)]), 3);
        assert_eq!(streak_of(&[days_ago(0), days_ago(3)]), 1);
        assert_eq!(streak_of(&[days_ago(2), days_ago(3)]), 0);
        assert_eq!(streak_of(&[days_ago(1), days_ago(2), days_ago(4)]), 2);
        assert_eq!(streak_of(&[days_ago(0), days_ago(0), days_ago(1)]), 2);
    }

    #[test]
    fn streak_uses_local_calendar_day() {
        // 01:30 at +08:00 is still the previous day in UTC
        let late = record_at(datetime!(2025-03-10 01:30 +8));
        let utc = record_at(late.created_at.to_offset(UtcOffset::UTC));
        assert_eq!(streak_of(&[late]), 1);
        assert_eq!(summarize_at(&[utc.clone()], &wide_window(7), TODAY).total_unique_days, 1);
        assert_eq!(local_day(&utc), date!(2025 - 03 - 09));
    }

    #[test]
    fn calorie_distribution_is_percent_of_declared() {
        let mut records = Vec::new();
        for (level, n) in [(CalorieLevel::Low, 3), (CalorieLevel::Medium, 5), (CalorieLevel::High, 2)] {
            for _ in 0..n {
                let mut r = days_ago(0);
                r.calorie_level = Some(level);
                records.push(r);
            }
        }
        records.push(days_ago(0));
        let s = summarize_at(&records, &wide_window(7), TODAY);
        assert_eq!(s.calorie_distribution, CalorieDistribution { low: 30, medium: 50, high: 20 });
        assert_eq!(s.total_records, 11);
    }

    #[test]
    fn independent_rounding_may_not_sum_to_100() {
        let records: Vec<DietRecord> = CalorieLevel::ALL
            .into_iter()
            .map(|level| {
                let mut r = days_ago(0);
                r.calorie_level = Some(level);
                r
            })
            .collect();
        let c = summarize_at(&records, &wide_window(7), TODAY).calorie_distribution;
        assert_eq!((c.low, c.medium, c.high), (33, 33, 33));
    }

    #[test]
    fn top_tags_by_count_then_first_seen() {
        let mut r = days_ago(0);
        r.tags = ["a", "b", "a", "c", "b", "a"].iter().map(|s| s.to_string()).collect();
        let mut r2 = days_ago(1);
        r2.tags = vec!["d".into(), "c".into()];
        let s = summarize_at(&[r, r2], &wide_window(7), TODAY);
        let got: Vec<(&str, u32)> = s.most_used_tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
        assert_eq!(got, vec![("a", 3), ("b", 2), ("c", 2), ("d", 1)]);
    }

    #[test]
    fn top_tags_keeps_ten() {
        let mut r = days_ago(0);
        r.tags = (0..15).map(|i| format!("t{i}")).collect();
        let tags = top_tags(&[&r], TOP_TAGS);
        assert_eq!(tags.len(), 10);
        assert_eq!(tags[0].tag, "t0");
        assert_eq!(tags[9].tag, "t9");
    }

    #[test]
    fn rates_and_distribution() {
        let mut breakfast = days_ago(0);
        breakfast.meal_type = MealType::Breakfast;
        let records = vec![breakfast, days_ago(0), days_ago(1), days_ago(5)];
        let s = summarize_at(&records, &wide_window(7), TODAY);
        assert_eq!(s.total_unique_days, 3);
        assert_eq!(s.completion_rate_percent, 43);
        assert_eq!(s.average_per_day, 1.3);
        assert_eq!(s.meal_distribution, MealDistribution { breakfast: 1, lunch: 3, dinner: 0, snack: 0 });

        let month = summarize_at(&records, &wide_window(30), TODAY);
        assert_eq!(month.completion_rate_percent, 10);
    }

    #[test]
    fn records_outside_window_are_ignored() {
        let window = StatsWindow {
            start: datetime!(2025-03-09 0:00 +8),
            end: datetime!(2025-03-10 0:00 +8),
            expected_days: 1,
        };
        let s = summarize_at(&[days_ago(0), days_ago(1), days_ago(2)], &window, TODAY);
        assert_eq!(s.total_records, 1);
        assert_eq!(s.continuous_days, 1);
        assert_eq!(s.completion_rate_percent, 100);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let s = summarize_at(&[], &wide_window(7), TODAY);
        assert_eq!(s, StatsSummary::default());
        assert!(s.most_used_tags.is_empty());
    }

    #[test]
    fn summarize_is_idempotent() {
        let mut r = days_ago(0);
        r.tags = vec!["x".into()];
        r.calorie_level = Some(CalorieLevel::High);
        let records = vec![r, days_ago(1), days_ago(3)];
        let w = wide_window(7);
        assert_eq!(summarize(&records, &w), summarize(&records, &w));
        assert_eq!(summarize_at(&records, &w, TODAY), summarize_at(&records, &w, TODAY));
    }

    #[test]
    fn summary_wire_field_names() {
        let mut r = days_ago(0);
        r.tags = vec!["home".into()];
        r.calorie_level = Some(CalorieLevel::Low);
        let v = serde_json::to_value(summarize_at(&[r], &wide_window(7), TODAY)).unwrap();
        let mut keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "averagePerDay",
                "calorieDistribution",
                "completionRatePercent",
                "continuousDays",
                "mealDistribution",
                "mostUsedTags",
                "totalRecords",
                "totalUniqueDays",
            ]
        );
        assert_eq!(v["mealDistribution"]["lunch"], 1);
        assert_eq!(v["calorieDistribution"]["low"], 100);
        assert_eq!(v["mostUsedTags"][0], serde_json::json!({"tag": "home", "count": 1}));
    }
}

