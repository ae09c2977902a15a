//! Urgency tiers derived from a contract's next-due date.
//!
//! Classification is a pure function of the due date and the evaluation day. The same
//! result drives dashboard ordering and the reminder marks consumed by the external
//! reminder scheduler.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Last day offset (inclusive) still classified as urgent.
pub const URGENT_WINDOW_DAYS: i64 = 7;
/// Last day offset (inclusive) still classified as upcoming.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;
/// Days-before-due at which reminders are sent when nothing else is configured.
pub const DEFAULT_REMINDER_MARKS: [i64; 3] = [30, 15, 7];

/// Ordered from most to least urgent, so the derived `Ord` sorts the most pressing tier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Overdue,
    Urgent,
    Upcoming,
    Future,
}

impl UrgencyTier {
    pub const fn ordered() -> [Self; 4] {
        [Self::Overdue, Self::Urgent, Self::Upcoming, Self::Future]
    }

    pub const fn for_offset(days_offset: i64) -> Self {
        if days_offset < 0 {
            Self::Overdue
        } else if days_offset <= URGENT_WINDOW_DAYS {
            Self::Urgent
        } else if days_offset <= UPCOMING_WINDOW_DAYS {
            Self::Upcoming
        } else {
            Self::Future
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Urgent => "urgent",
            Self::Upcoming => "upcoming",
            Self::Future => "future",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::Urgent => "Urgent",
            Self::Upcoming => "Upcoming",
            Self::Future => "Scheduled",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Overdue => "#dc2626",
            Self::Urgent => "#ea580c",
            Self::Upcoming => "#ca8a04",
            Self::Future => "#16a34a",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Urgency {
    pub tier: UrgencyTier,
    /// Whole days from the evaluation day to the due date; negative once overdue.
    pub days_offset: i64,
}

impl Urgency {
    pub fn label(&self) -> String {
        match self.tier {
            UrgencyTier::Overdue => format!("{} overdue", day_count(self.days_offset.unsigned_abs())),
            UrgencyTier::Urgent | UrgencyTier::Upcoming if self.days_offset == 0 => {
                "due today".to_string()
            }
            UrgencyTier::Urgent | UrgencyTier::Upcoming => {
                format!("{} remaining", day_count(self.days_offset.unsigned_abs()))
            }
            UrgencyTier::Future => "on schedule".to_string(),
        }
    }
}

fn day_count(days: u64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

pub fn classify(next_due_date: NaiveDate, today: NaiveDate) -> Urgency {
    let days_offset = (next_due_date - today).num_days();
    Urgency {
        tier: UrgencyTier::for_offset(days_offset),
        days_offset,
    }
}

/// Returns the reminder mark hit exactly on this day, if any.
pub fn reminder_mark(urgency: &Urgency, marks: &[i64]) -> Option<i64> {
    marks
        .iter()
        .copied()
        .find(|mark| *mark == urgency.days_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date")
    }

    fn due_in(days: i64) -> Urgency {
        classify(today() + Duration::days(days), today())
    }

    #[test]
    fn overdue_contract_reports_magnitude() {
        let urgency = due_in(-3);
        assert_eq!(urgency.tier, UrgencyTier::Overdue);
        assert_eq!(urgency.days_offset, -3);
        assert_eq!(urgency.label(), "3 days overdue");
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(due_in(-1).tier, UrgencyTier::Overdue);
        assert_eq!(due_in(0).tier, UrgencyTier::Urgent);
        assert_eq!(due_in(7).tier, UrgencyTier::Urgent);
        assert_eq!(due_in(8).tier, UrgencyTier::Upcoming);
        assert_eq!(due_in(30).tier, UrgencyTier::Upcoming);
        assert_eq!(due_in(31).tier, UrgencyTier::Future);
    }

    #[test]
    fn labels_render_remaining_days() {
        assert_eq!(due_in(0).label(), "due today");
        assert_eq!(due_in(1).label(), "1 day remaining");
        assert_eq!(due_in(5).label(), "5 days remaining");
        assert_eq!(due_in(20).label(), "20 days remaining");
        assert_eq!(due_in(-1).label(), "1 day overdue");
        assert_eq!(due_in(90).label(), "on schedule");
    }

    #[test]
    fn tiers_never_get_less_urgent_as_the_due_date_approaches() {
        let mut previous = due_in(-60);
        for days in -59..=400 {
            let current = due_in(days);
            assert!(
                previous.tier <= current.tier,
                "offset {} ({:?}) ranked after offset {} ({:?})",
                previous.days_offset,
                previous.tier,
                current.days_offset,
                current.tier
            );
            previous = current;
        }
    }

    #[test]
    fn reminder_marks_only_fire_on_exact_days() {
        assert_eq!(reminder_mark(&due_in(30), &DEFAULT_REMINDER_MARKS), Some(30));
        assert_eq!(reminder_mark(&due_in(15), &DEFAULT_REMINDER_MARKS), Some(15));
        assert_eq!(reminder_mark(&due_in(7), &DEFAULT_REMINDER_MARKS), Some(7));
        assert_eq!(reminder_mark(&due_in(14), &DEFAULT_REMINDER_MARKS), None);
        assert_eq!(reminder_mark(&due_in(-7), &DEFAULT_REMINDER_MARKS), None);
    }

    #[test]
    fn every_tier_has_a_label_and_color() {
        for tier in UrgencyTier::ordered() {
            assert!(!tier.label().is_empty());
            assert!(tier.color().starts_with('#'));
        }
    }
}
