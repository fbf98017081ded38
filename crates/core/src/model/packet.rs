use serde::{Deserialize, Serialize};

use crate::model::question::Question;

/// Contents of a single packet of a set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(default)]
    pub tossups: Vec<Question>,
    #[serde(default)]
    pub bonuses: Vec<Question>,
}

impl Packet {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tossups.is_empty() && self.bonuses.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tossups.len() + self.bonuses.len()
    }
}
