use crate::cycle::Phase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BUILTIN_CATALOG: &str = include_str!("../assets/messages.json");

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseMessages {
    pub display_name: String,
    pub intent: String,
    pub temperature: String,
    pub urgency: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    phases: BTreeMap<String, PhaseMessages>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseMessage {
    pub phase: Phase,
    pub display_name: String,
    pub message: String,
    pub intent: String,
    pub temperature: String,
    pub urgency: String,
}

/// Indices already shown per phase key. Owned by the caller so the
/// table itself stays immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    #[serde(default)]
    used: BTreeMap<String, Vec<usize>>,
}

impl RotationState {
    pub fn reset(&mut self, phase: Option<Phase>) {
        match phase {
            Some(phase) => {
                self.used.remove(phase.key());
            }
            None => self.used.clear(),
        }
    }
}

#[derive(Debug)]
pub struct MessageTable {
    phases: BTreeMap<String, PhaseMessages>,
}

impl MessageTable {
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(BUILTIN_CATALOG.as_bytes())
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let catalog: Catalog = serde_json::from_slice(bytes)?;
        Ok(Self {
            phases: catalog.phases,
        })
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseMessages> {
        self.phases.get(phase.key())
    }

    /// Next message for `phase` that `rotation` has not handed out yet.
    /// Once every message was shown the rotation for that phase restarts.
    pub fn next_message(&self, phase: Phase, rotation: &mut RotationState) -> Option<PhaseMessage> {
        let entry = self.phase(phase)?;
        if entry.messages.is_empty() {
            return None;
        }

        let used = rotation.used.entry(phase.key().to_string()).or_default();
        let index = match (0..entry.messages.len()).find(|index| !used.contains(index)) {
            Some(index) => index,
            None => {
                used.clear();
                0
            }
        };
        used.push(index);

        Some(PhaseMessage {
            phase,
            display_name: entry.display_name.clone(),
            message: entry.messages[index].clone(),
            intent: entry.intent.clone(),
            temperature: entry.temperature.clone(),
            urgency: entry.urgency.clone(),
        })
    }
}
