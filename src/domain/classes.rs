use serde::{Deserialize, Serialize};

/// Labels in the order the trained detector emits class indices.
pub const CLASS_NAMES: [&str; 31] = [
    "A", "B", "Bullseye", "C", "D", "E", "F", "G", "H", "S", "T", "U", "V", "W", "X", "Y", "Z",
    "circle", "down", "eight", "five", "four", "left", "nine", "one", "right",
    "seven", "six", "three", "two", "up",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Letter,
    Number,
    Symbol,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGroup {
    pub kind: CardKind,
    pub labels: Vec<String>,
}

/// Index-to-label mapping for the card taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct ClassRegistry {
    names: &'static [&'static str],
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self { names: &CLASS_NAMES }
    }
}

impl ClassRegistry {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn label(&self, class_id: usize) -> Option<&'static str> {
        self.names.get(class_id).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// Groups labels for the reference panel, keeping registry order inside each group.
    pub fn grouped(&self) -> Vec<ClassGroup> {
        [CardKind::Letter, CardKind::Number, CardKind::Symbol]
            .into_iter()
            .map(|kind| ClassGroup {
                kind,
                labels: self
                    .labels()
                    .filter(|l| kind_of(l) == kind)
                    .map(str::to_string)
                    .collect(),
            })
            .collect()
    }
}

pub fn kind_of(label: &str) -> CardKind {
    const NUMBERS: [&str; 9] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    ];
    if label.len() == 1 && label.chars().all(|c| c.is_ascii_uppercase()) {
        CardKind::Letter
    } else if NUMBERS.contains(&label) {
        CardKind::Number
    } else {
        CardKind::Symbol
    }
}
