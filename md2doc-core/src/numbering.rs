//! Heading numbering
//!
//!     Two interchangeable schemes sit behind [`NumberingScheme`]:
//!
//!     - [`OfficialNumbering`] produces the labels used in formal Chinese reports: "一、" for
//!       level 1, "1、" for level 2, "1）" for level 3, "1.1.1、" for level 4 and "1）" below.
//!     - [`DottedNumbering`] produces plain "1.2.3" paths.
//!
//!     The official scheme keeps siblings consecutive across intervening deeper sections, but
//!     restarts a level when its parent has advanced since the level was last entered. To tell
//!     those two situations apart it keeps a snapshot of the parent counter taken when each
//!     level was (re)started:
//!
//!         # A        一、
//!         ## a       1、
//!         # B        二、
//!         ### x      1）      level 3 first entered under B
//!         ## b       1、      parent advanced since level 2 started: restart
//!
//!     One numberer instance lives for a single document.

use serde::{Deserialize, Serialize};

pub const MAX_LEVEL: u8 = 6;

/// A stateful heading numberer fed heading levels in document order.
pub trait NumberingScheme: Send {
    /// Advance the state for a heading at `level` (1..=6; out of range is clamped).
    fn enter(&mut self, level: u8);

    /// The label for `level` in the current state, or an empty string when the level has no count.
    fn label(&self, level: u8) -> String;

    /// Heading text with its label applied.
    fn numbered(&self, level: u8, text: &str) -> String {
        format!("{}{}", self.label(level), text)
    }
}

/// Which scheme to use for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingStyle {
    #[default]
    Official,
    Dotted,
}

impl NumberingStyle {
    pub fn numberer(self) -> Box<dyn NumberingScheme> {
        match self {
            NumberingStyle::Official => Box::new(OfficialNumbering::new()),
            NumberingStyle::Dotted => Box::new(DottedNumbering::new()),
        }
    }

    /// Name as written in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            NumberingStyle::Official => "official",
            NumberingStyle::Dotted => "dotted",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "official" | "chinese" => Some(NumberingStyle::Official),
            "dotted" | "decimal" => Some(NumberingStyle::Dotted),
            _ => None,
        }
    }
}

fn clamp(level: u8) -> usize {
    level.clamp(1, MAX_LEVEL) as usize
}

/// Counters plus parent snapshots. Index 0 is unused so levels index directly.
#[derive(Debug, Clone, Default)]
pub struct OfficialNumbering {
    counters: [u32; 7],
    last_level: usize,
    parent_snapshot: [Option<u32>; 7],
}

impl OfficialNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, level: u8) -> u32 {
        self.counters[clamp(level)]
    }

    fn parent_counter(&self, level: usize) -> u32 {
        if level == 1 {
            0
        } else {
            self.counters[level - 1]
        }
    }

    fn zero_below(&mut self, level: usize) {
        for deeper in (level + 1)..=MAX_LEVEL as usize {
            self.counters[deeper] = 0;
        }
    }
}

impl NumberingScheme for OfficialNumbering {
    fn enter(&mut self, level: u8) {
        let level = clamp(level);
        let parent = self.parent_counter(level);

        if level == self.last_level {
            self.counters[level] += 1;
        } else if level > self.last_level {
            self.counters[level] = 1;
            self.parent_snapshot[level] = Some(parent);
        } else {
            match self.parent_snapshot[level] {
                Some(snapshot) if snapshot != parent => {
                    self.counters[level] = 1;
                    self.parent_snapshot[level] = Some(parent);
                }
                _ => self.counters[level] += 1,
            }
        }

        self.zero_below(level);
        self.last_level = level;
    }

    fn label(&self, level: u8) -> String {
        let level = clamp(level);
        let n = self.counters[level];
        if n == 0 {
            return String::new();
        }
        match level {
            1 => format!("{}、", chinese_ordinal(n)),
            2 => format!("{n}、"),
            4 => {
                let path: Vec<String> = self.counters[1..=4]
                    .iter()
                    .filter(|c| **c > 0)
                    .map(u32::to_string)
                    .collect();
                format!("{}、", path.join("."))
            }
            _ => format!("{n}）"),
        }
    }
}

/// Plain "1.2.3" numbering: a stack of the counters of the open levels.
#[derive(Debug, Clone, Default)]
pub struct DottedNumbering {
    counters: [u32; 7],
    stack: Vec<u32>,
}

impl DottedNumbering {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NumberingScheme for DottedNumbering {
    fn enter(&mut self, level: u8) {
        let level = clamp(level);
        for deeper in (level + 1)..=MAX_LEVEL as usize {
            self.counters[deeper] = 0;
        }
        self.counters[level] += 1;
        self.stack.truncate(level - 1);
        self.stack.push(self.counters[level]);
    }

    fn label(&self, _level: u8) -> String {
        self.stack
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn numbered(&self, level: u8, text: &str) -> String {
        let label = self.label(level);
        if label.is_empty() {
            text.to_string()
        } else {
            format!("{label} {text}")
        }
    }
}

const DIGITS: [&str; 10] = ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

/// Chinese ordinal for 1..=99; other values fall back to Arabic digits.
pub fn chinese_ordinal(n: u32) -> String {
    match n {
        1..=9 => DIGITS[n as usize].to_string(),
        10 => "十".to_string(),
        11..=19 => format!("十{}", DIGITS[(n % 10) as usize]),
        20..=99 => {
            let tens = DIGITS[(n / 10) as usize];
            match n % 10 {
                0 => format!("{tens}十"),
                ones => format!("{tens}十{}", DIGITS[ones as usize]),
            }
        }
        _ => n.to_string(),
    }
}
