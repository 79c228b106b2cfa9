//! Availability aggregation.
//!
//! Participants report the ten-minute slots they are free. A slot is choosable
//! when at most one of the reporting participants is missing from it, and that
//! participant's name is attached to the slot.

use crate::{
    slot::{DayBucket, Slot, SlotDetail},
    window::{expand, MeetingWindow},
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAvailability {
    pub name: String,
    pub available_times: Vec<Slot>,
}

struct DayTally<'a> {
    date: NaiveDate,
    slots: Vec<(NaiveTime, Vec<&'a str>)>,
    index: HashMap<NaiveTime, usize>,
}

impl<'a> DayTally<'a> {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, time: NaiveTime, name: &'a str) {
        match self.index.get(&time) {
            Some(&position) => self.slots[position].1.push(name),
            None => {
                self.index.insert(time, self.slots.len());
                self.slots.push((time, vec![name]));
            }
        }
    }
}

/// Slots where at least `member_count - 1` participants are free, grouped by
/// date in first-seen order. Participants without slots are not counted.
pub fn aggregate(participants: &[ParticipantAvailability]) -> Vec<DayBucket> {
    let mut days: Vec<DayTally> = Vec::new();
    let mut day_index: HashMap<NaiveDate, usize> = HashMap::new();
    let mut members: Vec<&str> = Vec::new();

    for participant in participants {
        if participant.available_times.is_empty() {
            continue;
        }
        for slot in &participant.available_times {
            let position = *day_index.entry(slot.date).or_insert_with(|| {
                days.push(DayTally::new(slot.date));
                days.len() - 1
            });
            days[position].add(slot.time, &participant.name);
        }
        members.push(&participant.name);
    }

    let member_count = members.len();
    let buckets: Vec<DayBucket> = days
        .into_iter()
        .filter_map(|day| {
            let detail: Vec<SlotDetail> = day
                .slots
                .into_iter()
                .filter(|(_, present)| present.len() + 1 >= member_count)
                .map(|(time, present)| SlotDetail {
                    time,
                    unavailable_member: single_absentee(&members, &present),
                })
                .collect();
            (!detail.is_empty()).then_some(DayBucket {
                date: day.date,
                detail,
            })
        })
        .collect();

    debug!(
        members = member_count,
        days = buckets.len(),
        "Aggregated availability"
    );
    buckets
}

// Name of the only member not present, if exactly one is missing.
fn single_absentee(members: &[&str], present: &[&str]) -> Option<String> {
    let present: HashSet<&str> = present.iter().copied().collect();
    let absent: HashSet<&str> = members
        .iter()
        .copied()
        .filter(|name| !present.contains(name))
        .collect();

    match absent.len() {
        1 => absent.into_iter().next().map(String::from),
        _ => None,
    }
}

/// Choosable times of a meeting: the whole window while nobody has reported
/// availability, otherwise the aggregated slots.
pub fn choosable_times(
    window: &MeetingWindow,
    participants: &[ParticipantAvailability],
) -> Vec<DayBucket> {
    if participants
        .iter()
        .all(|participant| participant.available_times.is_empty())
    {
        return expand(window);
    }
    aggregate(participants)
}
