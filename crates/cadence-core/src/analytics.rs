//! Analytics computation
//!
//! Pure functions deriving streaks, completion rates, and weekly goal
//! progress from the habit and completion collections. No I/O and no
//! hidden clock: `today` is always an explicit parameter, so every
//! function is deterministic given its inputs.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::models::{Analytics, Completion, Habit, WeekStart};

/// A streak pair: the live run ending today/yesterday, and the best ever
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
}

/// Per-day completion summary used by weekly views
#[derive(Debug, Clone, PartialEq)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub completed: usize,
    pub total: usize,
    pub progress: f64,
}

/// Compute the full analytics snapshot
///
/// - Streaks walk the distinct dates carrying at least one completed
///   completion; a 1-day gap extends the run, anything larger resets it.
///   The current streak is only live if the last completed date is today
///   or yesterday.
/// - Weekly goal progress divides this week's completed completions by the
///   sum of scheduled days across active habits (0 when that sum is 0,
///   uncapped when over-performing).
/// - Completion rate covers the (active habit x last 7 days) grid.
pub fn compute_analytics(
    habits: &[Habit],
    completions: &[Completion],
    today: NaiveDate,
    week_start: WeekStart,
) -> Analytics {
    let active: Vec<&Habit> = habits.iter().filter(|h| !h.archived).collect();
    let completed: Vec<&Completion> = completions.iter().filter(|c| c.completed).collect();

    let dates = distinct_sorted_dates(completed.iter().map(|c| c.date));
    let streak = streak_over_dates(&dates, today);

    // Weekly goal progress
    let (week_begin, week_end) = week_window(today, week_start);
    let in_week = completed
        .iter()
        .filter(|c| c.date >= week_begin && c.date <= week_end)
        .count();
    let total_weekly_goal: usize = active.iter().map(|h| h.schedule.scheduled_days()).sum();
    let weekly_goal_progress = if total_weekly_goal == 0 {
        0.0
    } else {
        in_week as f64 / total_weekly_goal as f64 * 100.0
    };

    // Completion rate over the last 7 days
    let window_start = today - Duration::days(6);
    let active_ids: HashSet<Uuid> = active.iter().map(|h| h.id).collect();
    let recent = completed
        .iter()
        .filter(|c| {
            active_ids.contains(&c.habit_id) && c.date >= window_start && c.date <= today
        })
        .count();
    let slots = active.len() * 7;
    let completion_rate = if slots == 0 {
        0.0
    } else {
        recent as f64 / slots as f64 * 100.0
    };

    Analytics {
        total_habits: habits.len(),
        active_habits: active.len(),
        total_completions: completed.len(),
        current_streak: streak.current,
        longest_streak: streak.longest,
        completion_rate,
        weekly_goal_progress,
    }
}

/// Streak for a single habit: the global algorithm restricted to its
/// completions
pub fn habit_streak(completions: &[Completion], habit_id: Uuid, today: NaiveDate) -> Streak {
    let dates = distinct_sorted_dates(
        completions
            .iter()
            .filter(|c| c.habit_id == habit_id && c.completed)
            .map(|c| c.date),
    );
    streak_over_dates(&dates, today)
}

/// The calendar window of the week containing `today`
pub fn week_window(today: NaiveDate, week_start: WeekStart) -> (NaiveDate, NaiveDate) {
    let offset = today
        .weekday()
        .days_since(week_start.as_weekday()) as i64;
    let begin = today - Duration::days(offset);
    (begin, begin + Duration::days(6))
}

/// Completed/total summary for active habits scheduled on one day
pub fn daily_progress(
    habits: &[Habit],
    completions: &[Completion],
    date: NaiveDate,
) -> DayProgress {
    let scheduled: HashSet<Uuid> = habits
        .iter()
        .filter(|h| !h.archived && h.schedule.is_scheduled(date.weekday()))
        .map(|h| h.id)
        .collect();
    let completed = completions
        .iter()
        .filter(|c| c.completed && c.date == date && scheduled.contains(&c.habit_id))
        .count();
    let total = scheduled.len();
    let progress = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    };
    DayProgress {
        date,
        completed,
        total,
        progress,
    }
}

fn distinct_sorted_dates(dates: impl Iterator<Item = NaiveDate>) -> Vec<NaiveDate> {
    dates.collect::<BTreeSet<_>>().into_iter().collect()
}

fn streak_over_dates(dates: &[NaiveDate], today: NaiveDate) -> Streak {
    let Some(&last) = dates.last() else {
        return Streak::default();
    };

    let mut run: u32 = 1;
    let mut longest: u32 = 1;
    for pair in dates.windows(2) {
        let gap = (pair[1] - pair[0]).num_days();
        if gap == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    // The run only counts as current while it is live
    let yesterday = today - Duration::days(1);
    let current = if last == today || last == yesterday {
        run
    } else {
        0
    };

    Streak { current, longest }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HabitDraft, Schedule};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_with_schedule(schedule: Schedule) -> Habit {
        let mut draft = HabitDraft::new("Test", "✓");
        draft.schedule = schedule;
        Habit::new(draft)
    }

    fn completed_on(habit_id: Uuid, d: NaiveDate) -> Completion {
        Completion::new(habit_id, d)
    }

    #[test]
    fn test_empty_state_is_all_zero() {
        let analytics = compute_analytics(&[], &[], date(2024, 1, 3), WeekStart::Monday);
        assert_eq!(analytics, Analytics::default());
    }

    #[test]
    fn test_consecutive_streak() {
        let habit = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            completed_on(habit.id, date(2024, 1, 1)),
            completed_on(habit.id, date(2024, 1, 2)),
            completed_on(habit.id, date(2024, 1, 3)),
        ];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        assert_eq!(analytics.current_streak, 3);
        assert_eq!(analytics.longest_streak, 3);
    }

    #[test]
    fn test_gap_resets_streak() {
        let habit = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            completed_on(habit.id, date(2024, 1, 1)),
            completed_on(habit.id, date(2024, 1, 3)),
        ];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        assert_eq!(analytics.longest_streak, 1);
        // Last date is today, so the (length 1) run is live
        assert_eq!(analytics.current_streak, 1);
    }

    #[test]
    fn test_stale_streak_is_not_current() {
        let habit = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            completed_on(habit.id, date(2024, 1, 1)),
            completed_on(habit.id, date(2024, 1, 2)),
        ];

        // Two days later the run is no longer live
        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 4),
            WeekStart::Monday,
        );
        assert_eq!(analytics.current_streak, 0);
        assert_eq!(analytics.longest_streak, 2);
    }

    #[test]
    fn test_yesterday_keeps_streak_live() {
        let habit = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            completed_on(habit.id, date(2024, 1, 1)),
            completed_on(habit.id, date(2024, 1, 2)),
        ];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        assert_eq!(analytics.current_streak, 2);
    }

    #[test]
    fn test_future_completion_does_not_extend_current_streak() {
        let habit = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            completed_on(habit.id, date(2024, 1, 3)),
            completed_on(habit.id, date(2024, 1, 10)),
        ];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        // The future date is counted in totals but the streak is not live
        assert_eq!(analytics.total_completions, 2);
        assert_eq!(analytics.current_streak, 0);
    }

    #[test]
    fn test_uncompleted_records_are_ignored() {
        let habit = habit_with_schedule(Schedule::every_day());
        let mut off = completed_on(habit.id, date(2024, 1, 2));
        off.set_completed(false);
        let completions = vec![completed_on(habit.id, date(2024, 1, 1)), off];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 1),
            WeekStart::Monday,
        );
        assert_eq!(analytics.total_completions, 1);
        assert_eq!(analytics.current_streak, 1);
    }

    #[test]
    fn test_weekly_goal_progress() {
        // One active habit scheduled 5 days/week, 3 completions this week
        let habit = habit_with_schedule(Schedule::weekdays());
        // 2024-01-03 is a Wednesday; the Monday-start week is Jan 1-7
        let completions = vec![
            completed_on(habit.id, date(2024, 1, 1)),
            completed_on(habit.id, date(2024, 1, 2)),
            completed_on(habit.id, date(2024, 1, 3)),
        ];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        assert_eq!(analytics.weekly_goal_progress, 60.0);
    }

    #[test]
    fn test_weekly_goal_progress_zero_when_no_schedule() {
        let habit = habit_with_schedule(Schedule::default());
        let completions = vec![completed_on(habit.id, date(2024, 1, 3))];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        assert_eq!(analytics.weekly_goal_progress, 0.0);
    }

    #[test]
    fn test_weekly_goal_can_exceed_100() {
        let mut draft = HabitDraft::new("Sprint", "🏃");
        draft.schedule = Schedule {
            monday: true,
            ..Schedule::default()
        };
        let habit = Habit::new(draft);
        let completions = vec![
            completed_on(habit.id, date(2024, 1, 1)),
            completed_on(habit.id, date(2024, 1, 2)),
        ];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        assert_eq!(analytics.weekly_goal_progress, 200.0);
    }

    #[test]
    fn test_completion_rate_window() {
        let habit = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            // Inside the 7-day window ending 2024-01-10
            completed_on(habit.id, date(2024, 1, 10)),
            completed_on(habit.id, date(2024, 1, 4)),
            // Outside it
            completed_on(habit.id, date(2024, 1, 3)),
        ];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 10),
            WeekStart::Monday,
        );
        // 2 of 7 slots
        assert!((analytics.completion_rate - 2.0 / 7.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_archived_habits_excluded_from_rate_and_goal() {
        let mut habit = habit_with_schedule(Schedule::every_day());
        habit.set_archived(true);
        let completions = vec![completed_on(habit.id, date(2024, 1, 3))];

        let analytics = compute_analytics(
            &[habit],
            &completions,
            date(2024, 1, 3),
            WeekStart::Monday,
        );
        assert_eq!(analytics.total_habits, 1);
        assert_eq!(analytics.active_habits, 0);
        assert_eq!(analytics.completion_rate, 0.0);
        assert_eq!(analytics.weekly_goal_progress, 0.0);
        // Archived history still counts toward totals and streaks
        assert_eq!(analytics.total_completions, 1);
        assert_eq!(analytics.current_streak, 1);
    }

    #[test]
    fn test_habit_streak_is_per_habit() {
        let first = habit_with_schedule(Schedule::every_day());
        let second = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            completed_on(first.id, date(2024, 1, 1)),
            completed_on(first.id, date(2024, 1, 2)),
            completed_on(first.id, date(2024, 1, 3)),
            completed_on(second.id, date(2024, 1, 3)),
        ];

        let today = date(2024, 1, 3);
        assert_eq!(
            habit_streak(&completions, first.id, today),
            Streak {
                current: 3,
                longest: 3
            }
        );
        assert_eq!(
            habit_streak(&completions, second.id, today),
            Streak {
                current: 1,
                longest: 1
            }
        );
        assert_eq!(
            habit_streak(&completions, Uuid::new_v4(), today),
            Streak::default()
        );
    }

    #[test]
    fn test_duplicate_dates_collapse() {
        // Two habits completed on the same days still form one date chain
        let first = habit_with_schedule(Schedule::every_day());
        let second = habit_with_schedule(Schedule::every_day());
        let completions = vec![
            completed_on(first.id, date(2024, 1, 1)),
            completed_on(second.id, date(2024, 1, 1)),
            completed_on(first.id, date(2024, 1, 2)),
        ];

        let analytics = compute_analytics(
            &[first, second],
            &completions,
            date(2024, 1, 2),
            WeekStart::Monday,
        );
        assert_eq!(analytics.current_streak, 2);
        assert_eq!(analytics.longest_streak, 2);
    }

    #[test]
    fn test_week_window_monday_start() {
        // 2024-01-03 is a Wednesday
        let (begin, end) = week_window(date(2024, 1, 3), WeekStart::Monday);
        assert_eq!(begin, date(2024, 1, 1));
        assert_eq!(end, date(2024, 1, 7));
    }

    #[test]
    fn test_week_window_sunday_start() {
        let (begin, end) = week_window(date(2024, 1, 3), WeekStart::Sunday);
        assert_eq!(begin, date(2023, 12, 31));
        assert_eq!(end, date(2024, 1, 6));
    }

    #[test]
    fn test_week_window_on_boundary() {
        // A Monday with Monday start is its own week begin
        let (begin, _) = week_window(date(2024, 1, 1), WeekStart::Monday);
        assert_eq!(begin, date(2024, 1, 1));
    }

    #[test]
    fn test_daily_progress() {
        let scheduled = habit_with_schedule(Schedule::every_day());
        let unscheduled = habit_with_schedule(Schedule::default());
        let completions = vec![completed_on(scheduled.id, date(2024, 1, 3))];

        let progress = daily_progress(
            &[scheduled, unscheduled],
            &completions,
            date(2024, 1, 3),
        );
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 1);
        assert_eq!(progress.progress, 100.0);
    }

    #[test]
    fn test_daily_progress_empty_day() {
        let progress = daily_progress(&[], &[], date(2024, 1, 3));
        assert_eq!(progress.total, 0);
        assert_eq!(progress.progress, 0.0);
    }
}
