//! NPC needs (food, rest, entertainment, safety) and the mood derived from them.

use serde::{Deserialize, Serialize};

/// Upper bound for every need.
pub const NEED_MAX: f32 = 100.0;

/// Kind of need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    /// Hunger (restored by eating)
    Food,
    /// Fatigue (restored by resting)
    Rest,
    /// Boredom
    Entertainment,
    /// Sense of security
    Safety,
}

impl NeedKind {
    /// All need kinds.
    pub const ALL: [Self; 4] = [Self::Food, Self::Rest, Self::Entertainment, Self::Safety];
}

/// Per-second decay for each need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedDecay {
    /// Food decay per second
    pub food: f32,
    /// Rest decay per second
    pub rest: f32,
    /// Entertainment decay per second
    pub entertainment: f32,
    /// Safety decay per second
    pub safety: f32,
}

impl Default for NeedDecay {
    fn default() -> Self {
        Self {
            food: 1.0,
            rest: 0.5,
            entertainment: 0.3,
            safety: 0.2,
        }
    }
}

/// Current need values, each in `[0, 100]`. Needs only drop over time and
/// only go back up through explicit fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// Food
    pub food: f32,
    /// Rest
    pub rest: f32,
    /// Entertainment
    pub entertainment: f32,
    /// Safety
    pub safety: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            food: NEED_MAX,
            rest: NEED_MAX,
            entertainment: 50.0,
            safety: 70.0,
        }
    }
}

impl Needs {
    /// Creates needs at their starting values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns one need.
    #[must_use]
    pub const fn get(&self, kind: NeedKind) -> f32 {
        match kind {
            NeedKind::Food => self.food,
            NeedKind::Rest => self.rest,
            NeedKind::Entertainment => self.entertainment,
            NeedKind::Safety => self.safety,
        }
    }

    fn slot(&mut self, kind: NeedKind) -> &mut f32 {
        match kind {
            NeedKind::Food => &mut self.food,
            NeedKind::Rest => &mut self.rest,
            NeedKind::Entertainment => &mut self.entertainment,
            NeedKind::Safety => &mut self.safety,
        }
    }

    /// Sets one need, clamped to `[0, 100]`.
    pub fn set(&mut self, kind: NeedKind, value: f32) {
        *self.slot(kind) = value.clamp(0.0, NEED_MAX);
    }

    /// Raises one need, capped at 100.
    pub fn fulfill(&mut self, kind: NeedKind, amount: f32) {
        let slot = self.slot(kind);
        *slot = (*slot + amount.max(0.0)).min(NEED_MAX);
    }

    /// Applies `delta_time` seconds of decay, flooring at zero.
    pub fn decay(&mut self, rates: &NeedDecay, delta_time: f32) {
        let dt = delta_time.max(0.0);
        self.food = (self.food - rates.food * dt).max(0.0);
        self.rest = (self.rest - rates.rest * dt).max(0.0);
        self.entertainment = (self.entertainment - rates.entertainment * dt).max(0.0);
        self.safety = (self.safety - rates.safety * dt).max(0.0);
    }

    /// Mean of all four needs.
    #[must_use]
    pub fn average(&self) -> f32 {
        (self.food + self.rest + self.entertainment + self.safety) / NeedKind::ALL.len() as f32
    }
}

/// Emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Needs are well met
    Happy,
    /// Nothing notable
    #[default]
    Neutral,
    /// Needs are slipping
    Sad,
    /// Set by outside events only
    Angry,
    /// Needs are badly unmet
    Stressed,
}

impl Mood {
    /// Mood and mood value (0-100) for a given average need level.
    #[must_use]
    pub fn from_average(average: f32) -> (Self, f32) {
        let (mood, value) = match average {
            a if a >= 80.0 => (Self::Happy, a),
            a if a >= 50.0 => (Self::Neutral, 50.0 + (a - 50.0) * 0.6),
            a if a >= 30.0 => (Self::Sad, 30.0 + (a - 30.0) * 0.6),
            a => (Self::Stressed, a),
        };
        (mood, value.clamp(0.0, 100.0))
    }

    /// Lowercase name used in prompts and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Stressed => "stressed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_needs() {
        let needs = Needs::new();
        assert_eq!(needs.food, 100.0);
        assert_eq!(needs.rest, 100.0);
        assert_eq!(needs.entertainment, 50.0);
        assert_eq!(needs.safety, 70.0);
        assert!((needs.average() - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decay_rates() {
        let mut needs = Needs::new();
        needs.decay(&NeedDecay::default(), 10.0);
        assert!((needs.food - 90.0).abs() < 1e-4);
        assert!((needs.rest - 95.0).abs() < 1e-4);
        assert!((needs.entertainment - 47.0).abs() < 1e-4);
        assert!((needs.safety - 68.0).abs() < 1e-4);
    }

    #[test]
    fn test_decay_floors_at_zero() {
        let mut needs = Needs::new();
        needs.decay(&NeedDecay::default(), 10_000.0);
        for kind in NeedKind::ALL {
            assert_eq!(needs.get(kind), 0.0);
        }
    }

    #[test]
    fn test_fulfill_caps() {
        let mut needs = Needs::new();
        needs.set(NeedKind::Food, 20.0);
        needs.fulfill(NeedKind::Food, 30.0);
        assert_eq!(needs.food, 50.0);
        needs.fulfill(NeedKind::Food, 500.0);
        assert_eq!(needs.food, 100.0);
    }

    #[test]
    fn test_mood_bands() {
        assert_eq!(Mood::from_average(90.0), (Mood::Happy, 90.0));
        assert_eq!(Mood::from_average(80.0).0, Mood::Happy);

        let (mood, value) = Mood::from_average(60.0);
        assert_eq!(mood, Mood::Neutral);
        assert!((value - 56.0).abs() < 1e-4);

        let (mood, value) = Mood::from_average(40.0);
        assert_eq!(mood, Mood::Sad);
        assert!((value - 36.0).abs() < 1e-4);

        assert_eq!(Mood::from_average(12.0), (Mood::Stressed, 12.0));
    }
}
