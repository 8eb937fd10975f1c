//! NPC entity data: personality, allegiance, needs, mood, and conversation memory.
//!
//! Behavior lives in [`crate::ai`]; this module only holds and updates state.

use std::collections::VecDeque;

use ironvale_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantKind};
use crate::faction::{Faction, Relationship, RelationshipThresholds, RelationshipTracker};
use crate::needs::{Mood, NeedDecay, NeedKind, Needs};
use crate::stats::CharacterStats;

/// Conversation entries kept per NPC.
pub const CONVERSATION_HISTORY_LIMIT: usize = 20;

/// Entries included in the plain-text conversation context.
pub const CONVERSATION_CONTEXT_WINDOW: usize = 10;

/// Personality traits in `[0, 100]` plus free-form tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    /// Descriptive tags such as "brave" or "greedy"
    pub traits: Vec<String>,
    /// Kindness
    pub kindness: u8,
    /// Aggression
    pub aggression: u8,
    /// Loyalty
    pub loyalty: u8,
    /// Curiosity
    pub curiosity: u8,
    /// Profession
    pub profession: String,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            traits: Vec::new(),
            kindness: 50,
            aggression: 50,
            loyalty: 50,
            curiosity: 50,
            profession: "commoner".to_string(),
        }
    }
}

impl Personality {
    /// Sets the trait tags.
    #[must_use]
    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits = traits.into_iter().map(Into::into).collect();
        self
    }

    /// Sets kindness (capped at 100).
    #[must_use]
    pub fn with_kindness(mut self, value: u8) -> Self {
        self.kindness = value.min(100);
        self
    }

    /// Sets aggression (capped at 100).
    #[must_use]
    pub fn with_aggression(mut self, value: u8) -> Self {
        self.aggression = value.min(100);
        self
    }

    /// Sets the profession.
    #[must_use]
    pub fn with_profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = profession.into();
        self
    }
}

/// One line of remembered conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// "player" or the NPC's name
    pub speaker: String,
    /// What was said
    pub message: String,
}

/// A non-player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    /// Health, stats, position, and weapon
    pub combatant: Combatant,
    /// Personality
    pub personality: Personality,
    /// Allegiance
    pub faction: Faction,
    /// True for overworld roamers that can trigger encounters
    pub is_world_entity: bool,
    /// Home position for wandering
    pub home: Vec2,
    /// Needs
    pub needs: Needs,
    /// Decay rates for needs
    pub need_decay: NeedDecay,
    /// Lowercase behavior state name, mirrored by the controller
    pub status: String,
    relationship: RelationshipTracker,
    mood: Mood,
    mood_value: f32,
    conversation: VecDeque<ConversationEntry>,
}

impl Npc {
    /// Creates an NPC with default stats and personality.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self::with_stats(name, position, CharacterStats::default())
    }

    /// Creates an NPC with the given stats.
    #[must_use]
    pub fn with_stats(name: impl Into<String>, position: Vec2, stats: CharacterStats) -> Self {
        Self {
            combatant: Combatant::new(name, CombatantKind::Npc, position, stats),
            personality: Personality::default(),
            faction: Faction::Neutral,
            is_world_entity: true,
            home: position,
            needs: Needs::default(),
            need_decay: NeedDecay::default(),
            status: "idle".to_string(),
            relationship: RelationshipTracker::default(),
            mood: Mood::Neutral,
            mood_value: 50.0,
            conversation: VecDeque::with_capacity(CONVERSATION_HISTORY_LIMIT),
        }
    }

    /// Sets the personality.
    #[must_use]
    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    /// Sets the faction.
    #[must_use]
    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    /// Marks the NPC as a local (non-overworld) character.
    #[must_use]
    pub fn local(mut self) -> Self {
        self.is_world_entity = false;
        self
    }

    /// Uses custom relationship band thresholds, keeping the current value.
    #[must_use]
    pub fn with_relationship_thresholds(mut self, thresholds: RelationshipThresholds) -> Self {
        let value = self.relationship.value();
        self.relationship = RelationshipTracker::new(thresholds);
        self.relationship.set(value);
        self
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.combatant.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.combatant.name
    }

    /// Whether the NPC is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.combatant.is_alive()
    }

    /// Current mood.
    #[must_use]
    pub const fn mood(&self) -> Mood {
        self.mood
    }

    /// Mood intensity in `[0, 100]`.
    #[must_use]
    pub const fn mood_value(&self) -> f32 {
        self.mood_value
    }

    /// Forces a mood, e.g. `Angry` after an insult. Overwritten by the next
    /// needs update.
    pub fn set_mood(&mut self, mood: Mood) {
        self.mood = mood;
    }

    /// Relationship band with the player.
    #[must_use]
    pub const fn relationship(&self) -> Relationship {
        self.relationship.band()
    }

    /// Relationship value with the player.
    #[must_use]
    pub const fn relationship_value(&self) -> i32 {
        self.relationship.value()
    }

    /// Adjusts the relationship value and re-bands.
    pub fn modify_relationship(&mut self, delta: i32) {
        self.relationship.modify(delta);
    }

    /// Sets the relationship value directly.
    pub fn set_relationship_value(&mut self, value: i32) {
        self.relationship.set(value);
    }

    /// Decays needs by `delta_time` seconds and recomputes mood.
    pub fn update_needs(&mut self, delta_time: f32) {
        self.needs.decay(&self.need_decay, delta_time);
        self.refresh_mood();
    }

    /// Recomputes mood from the current needs.
    pub fn refresh_mood(&mut self) {
        let (mood, value) = Mood::from_average(self.needs.average());
        self.mood = mood;
        self.mood_value = value;
    }

    /// Raises one need.
    pub fn fulfill_need(&mut self, kind: NeedKind, amount: f32) {
        self.needs.fulfill(kind, amount);
    }

    /// Remembers a line of conversation, dropping the oldest past the limit.
    pub fn add_conversation(&mut self, speaker: impl Into<String>, message: impl Into<String>) {
        if self.conversation.len() == CONVERSATION_HISTORY_LIMIT {
            self.conversation.pop_front();
        }
        self.conversation.push_back(ConversationEntry {
            speaker: speaker.into(),
            message: message.into(),
        });
    }

    /// Remembered conversation, oldest first.
    pub fn conversation(&self) -> impl ExactSizeIterator<Item = &ConversationEntry> + '_ {
        self.conversation.iter()
    }

    /// The most recent `count` entries, oldest first.
    #[must_use]
    pub fn recent_conversation(&self, count: usize) -> Vec<ConversationEntry> {
        let skip = self.conversation.len().saturating_sub(count);
        self.conversation.iter().skip(skip).cloned().collect()
    }

    /// Plain-text summary of who this NPC is and what was said recently.
    #[must_use]
    pub fn conversation_context(&self) -> String {
        let mut context = format!(
            "NPC: {}\nTraits: {}\nMood: {}\nRelationship: {}\n\nConversation:\n",
            self.name(),
            self.personality.traits.join(", "),
            self.mood.as_str(),
            self.relationship().as_str(),
        );
        for entry in self.recent_conversation(CONVERSATION_CONTEXT_WINDOW) {
            context.push_str(&entry.speaker);
            context.push_str(": ");
            context.push_str(&entry.message);
            context.push('\n');
        }
        context
    }
}
