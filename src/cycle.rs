//! Cycle-phase prediction.
//!
//! Everything here is a pure function of a [`CycleProfile`] and the current
//! time supplied by a [`Clock`]. Phase boundaries are defined against a
//! 28-day reference cycle and scaled for other lengths.

use crate::clock::Clock;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_CYCLE_LENGTH: u32 = 28;
pub const MAX_CYCLE_LENGTH: u32 = 365;

const REFERENCE_CYCLE_LENGTH: u32 = 28;
const MENSTRUAL_LAST_DAY: u32 = 5;
const FOLLICULAR_LAST_DAY: u32 = 13;
const OVULATION_LAST_DAY: u32 = 16;
const EARLY_LUTEAL_LAST_DAY: u32 = 22;
const URGENT_DAYS_BEFORE_PERIOD: u32 = 3;
const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProfile {
    #[error("cycle length must be between 1 and {max} days, got {0}", max = MAX_CYCLE_LENGTH)]
    CycleLength(i64),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    Date(String),
    #[error("date {0} is outside the supported range")]
    DateOutOfRange(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    EarlyLuteal,
    LateLuteal,
}

/// Static presentation data attached to each phase.
#[derive(Debug, Serialize)]
pub struct PhaseInfo {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub mood: &'static str,
    pub user_message: &'static str,
    pub partner_message: &'static str,
    pub partner_tip: &'static str,
}

static PHASES: [PhaseInfo; 5] = [
    PhaseInfo {
        name: "Menstrual",
        icon: "rest",
        color: "#FF6B8A",
        mood: "low-energy",
        user_message: "Take it easy and prioritize self-care today",
        partner_message: "Extra comfort and rest will be appreciated today",
        partner_tip: "Bring a favorite comfort food, offer a cozy movie night, or simply say you're there.",
    },
    PhaseInfo {
        name: "Follicular",
        icon: "energy",
        color: "#10B981",
        mood: "rising",
        user_message: "You're entering your power phase, energy is building",
        partner_message: "Energy is rising, a great time for activities together",
        partner_tip: "Plan something active or creative: an adventure, a new hobby, or a shared project.",
    },
    PhaseInfo {
        name: "Ovulation",
        icon: "peak",
        color: "#8B5CF6",
        mood: "peak",
        user_message: "You're at your peak with high energy and confidence today",
        partner_message: "Peak energy and mood, perfect time for a special date",
        partner_tip: "Plan a surprise date, have a meaningful conversation, or enjoy a social evening together.",
    },
    PhaseInfo {
        name: "Early Luteal",
        icon: "stable",
        color: "#F59E0B",
        mood: "stable",
        user_message: "Steady energy, a good time for productivity",
        partner_message: "Still feeling good, enjoy some quality time together",
        partner_tip: "Cozy home activities and small gestures of affection land well now.",
    },
    PhaseInfo {
        name: "Late Luteal (PMS)",
        icon: "gentle",
        color: "#E84A6F",
        mood: "sensitive",
        user_message: "PMS phase, be gentle with yourself, it's okay to feel emotional",
        partner_message: "Extra patience and sweetness go a long way right now",
        partner_tip: "Be understanding, postpone difficult conversations, and give space when it's asked for.",
    },
];

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Menstrual,
        Phase::Follicular,
        Phase::Ovulation,
        Phase::EarlyLuteal,
        Phase::LateLuteal,
    ];

    pub fn info(self) -> &'static PhaseInfo {
        &PHASES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Stable identifier used as the message catalog key.
    pub fn key(self) -> &'static str {
        match self {
            Phase::Menstrual => "menstrual",
            Phase::Follicular => "follicular",
            Phase::Ovulation => "ovulation",
            Phase::EarlyLuteal => "early_luteal",
            Phase::LateLuteal => "late_luteal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCycleProfile")]
pub struct CycleProfile {
    last_period_date: NaiveDate,
    cycle_length: u32,
}

#[derive(Deserialize)]
struct StoredCycleProfile {
    last_period_date: NaiveDate,
    #[serde(default)]
    cycle_length: Option<i64>,
}

impl TryFrom<StoredCycleProfile> for CycleProfile {
    type Error = InvalidProfile;

    fn try_from(stored: StoredCycleProfile) -> Result<Self, Self::Error> {
        CycleProfile::new(stored.last_period_date, stored.cycle_length)
    }
}

impl CycleProfile {
    /// Builds a profile, defaulting the cycle length to 28 days when absent.
    pub fn new(last_period_date: NaiveDate, cycle_length: Option<i64>) -> Result<Self, InvalidProfile> {
        let cycle_length = validate_cycle_length(cycle_length.unwrap_or(i64::from(DEFAULT_CYCLE_LENGTH)))?;
        validate_date(last_period_date)?;
        Ok(Self {
            last_period_date,
            cycle_length,
        })
    }

    pub fn parse(last_period_date: &str, cycle_length: Option<i64>) -> Result<Self, InvalidProfile> {
        Self::new(parse_date(last_period_date)?, cycle_length)
    }

    pub fn last_period_date(&self) -> NaiveDate {
        self.last_period_date
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle_length
    }

    /// Replaces the last period date, keeping the cycle length.
    pub fn with_last_period(self, last_period_date: NaiveDate) -> Result<Self, InvalidProfile> {
        Ok(Self {
            last_period_date: validate_date(last_period_date)?,
            ..self
        })
    }

    pub fn with_cycle_length(self, cycle_length: i64) -> Result<Self, InvalidProfile> {
        Ok(Self {
            cycle_length: validate_cycle_length(cycle_length)?,
            ..self
        })
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, InvalidProfile> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| InvalidProfile::Date(value.to_string()))
}

// The next period date must stay representable for any valid cycle length.
fn validate_date(date: NaiveDate) -> Result<NaiveDate, InvalidProfile> {
    date.checked_add_signed(Duration::days(i64::from(MAX_CYCLE_LENGTH)))
        .ok_or(InvalidProfile::DateOutOfRange(date))?;
    Ok(date)
}

fn validate_cycle_length(cycle_length: i64) -> Result<u32, InvalidProfile> {
    if !(1..=i64::from(MAX_CYCLE_LENGTH)).contains(&cycle_length) {
        return Err(InvalidProfile::CycleLength(cycle_length));
    }
    Ok(cycle_length as u32)
}

/// Last day of each scaled phase for one cycle length. Menstrual is never scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseBounds {
    pub menstrual: u32,
    pub follicular: u32,
    pub ovulation: u32,
    pub early_luteal: u32,
}

impl PhaseBounds {
    pub fn for_length(cycle_length: u32) -> Self {
        Self {
            menstrual: MENSTRUAL_LAST_DAY,
            follicular: scale_boundary(FOLLICULAR_LAST_DAY, cycle_length),
            ovulation: scale_boundary(OVULATION_LAST_DAY, cycle_length),
            early_luteal: scale_boundary(EARLY_LUTEAL_LAST_DAY, cycle_length),
        }
    }

    pub fn phase_of(&self, cycle_day: u32) -> Phase {
        if cycle_day <= self.menstrual {
            Phase::Menstrual
        } else if cycle_day <= self.follicular {
            Phase::Follicular
        } else if cycle_day <= self.ovulation {
            Phase::Ovulation
        } else if cycle_day <= self.early_luteal {
            Phase::EarlyLuteal
        } else {
            Phase::LateLuteal
        }
    }
}

// round(boundary * length / 28), halves rounded up, in integer arithmetic.
fn scale_boundary(boundary: u32, cycle_length: u32) -> u32 {
    (2 * boundary * cycle_length + REFERENCE_CYCLE_LENGTH) / (2 * REFERENCE_CYCLE_LENGTH)
}

pub fn current_phase(cycle_day: u32, cycle_length: u32) -> Phase {
    PhaseBounds::for_length(cycle_length).phase_of(cycle_day)
}

pub fn current_cycle_day(days_since: u32, cycle_length: u32) -> u32 {
    // Day zero (the start date itself at midnight) counts as day one.
    (days_since.max(1) - 1) % cycle_length + 1
}

pub fn next_period_date(profile: &CycleProfile) -> NaiveDate {
    profile.last_period_date + Duration::days(i64::from(profile.cycle_length))
}

pub fn progress_percent(cycle_day: u32, cycle_length: u32) -> u32 {
    (200 * cycle_day + cycle_length) / (2 * cycle_length)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn ceil_days(delta: Duration) -> i64 {
    let millis = delta.num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleSnapshot {
    pub current_day: u32,
    pub cycle_length: u32,
    pub phase: Phase,
    pub days_until_next: u32,
    pub next_period_date: NaiveDate,
    pub last_period_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Positive,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerNotification {
    pub phase: Phase,
    pub phase_name: &'static str,
    pub message: &'static str,
    pub tip: &'static str,
    pub urgency: Urgency,
    pub cycle_day: u32,
}

pub fn partner_notification(snapshot: &CycleSnapshot) -> PartnerNotification {
    let urgency = match snapshot.phase {
        Phase::LateLuteal if snapshot.days_until_next <= URGENT_DAYS_BEFORE_PERIOD => Urgency::High,
        Phase::Ovulation => Urgency::Positive,
        _ => Urgency::Normal,
    };
    let info = snapshot.phase.info();

    PartnerNotification {
        phase: snapshot.phase,
        phase_name: snapshot.phase.name(),
        message: info.partner_message,
        tip: info.partner_tip,
        urgency,
        cycle_day: snapshot.current_day,
    }
}

/// Predictions relative to the time reported by a [`Clock`].
#[derive(Clone)]
pub struct CyclePredictor {
    clock: Arc<dyn Clock>,
}

impl CyclePredictor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Whole days between the start of `last_period_date` and now, rounded up.
    ///
    /// The distance is absolute, so a date in the future counts the same as
    /// a past date equally far away.
    pub fn days_since(&self, last_period_date: NaiveDate) -> u32 {
        let delta = self.clock.now() - midnight(last_period_date);
        let delta = if delta < Duration::zero() { -delta } else { delta };
        let days = ceil_days(delta);
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    pub fn current_cycle_day(&self, profile: &CycleProfile) -> u32 {
        current_cycle_day(self.days_since(profile.last_period_date), profile.cycle_length)
    }

    pub fn days_until_next(&self, profile: &CycleProfile) -> u32 {
        let delta = midnight(next_period_date(profile)) - self.clock.now();
        let days = ceil_days(delta).max(0);
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    pub fn snapshot(&self, profile: &CycleProfile) -> CycleSnapshot {
        let current_day = self.current_cycle_day(profile);
        CycleSnapshot {
            current_day,
            cycle_length: profile.cycle_length,
            phase: current_phase(current_day, profile.cycle_length),
            days_until_next: self.days_until_next(profile),
            next_period_date: next_period_date(profile),
            last_period_date: profile.last_period_date,
        }
    }
}
