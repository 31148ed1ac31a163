use std::collections::BTreeSet;

use stream_pager::{CountHint, PageSource};
use tracing::info;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Page content for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPage {
    pub title: String,
}

/// Endless calendar keyed by days relative to today.
#[derive(Debug, Default)]
pub struct Calendar {
    live: BTreeSet<i64>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    fn weekday(day: i64) -> usize {
        // Day 0 is a Monday.
        day.rem_euclid(7) as usize
    }
}

impl PageSource for Calendar {
    type Key = i64;
    type Handle = DayPage;

    fn initial_key(&self) -> i64 {
        0
    }

    fn next_key(&self, day: &i64) -> Option<i64> {
        day.checked_add(1)
    }

    fn prev_key(&self, day: &i64) -> Option<i64> {
        day.checked_sub(1)
    }

    fn count_hint(&self) -> CountHint {
        CountHint::Infinite
    }

    fn instantiate(&mut self, day: &i64) -> Option<DayPage> {
        self.live.insert(*day);
        let title = format!("{} ({day:+})", WEEKDAYS[Self::weekday(*day)]);
        info!(live = self.live.len(), "Opened {title}");
        Some(DayPage { title })
    }

    fn destroy(&mut self, day: &i64, page: DayPage) {
        self.live.remove(day);
        info!(live = self.live.len(), "Closed {}", page.title);
    }

    fn page_width_fraction(&self, day: &i64) -> f32 {
        if Self::weekday(*day) >= 5 { 0.5 } else { 1.0 }
    }
}
