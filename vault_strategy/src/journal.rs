//! Strategy journal
//!
//! Every state transition of a strategy instance leaves an entry here. The
//! collection is bounded; once full, the oldest entries are dropped.

use std::collections::VecDeque;

use alloy_primitives::Address;
use candid::{CandidType, Decode, Encode};
use serde::Deserialize;

use crate::{
    constants::JOURNAL_CAPACITY,
    utils::error::{StrategyError, StrategyResult},
};

/// Category of a journal entry
#[derive(Clone, Copy, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub enum LogType {
    Info,
    Initialization,
    Harvest,
    Tend,
    Report,
    EmergencyExit,
    Migration,
    Sweep,
    Admin,
    Clone,
}

/// Journal entry
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub timestamp: u64,
    pub entry: StrategyResult<()>,
    pub log_type: LogType,
    pub strategy: Option<String>,
    pub note: Option<String>,
}

/// Builder for journal entries
impl JournalEntry {
    /// Create a new instance of a journal entry
    /// Fills the `timestamp`, `entry` and `log_type` fields
    pub fn new(timestamp: u64, entry: StrategyResult<()>, log_type: LogType) -> Self {
        Self {
            timestamp,
            entry,
            log_type,
            strategy: None,
            note: None,
        }
    }

    /// Fills the `strategy` field of the entry
    pub fn strategy(&mut self, address: Address) -> &mut Self {
        self.strategy = Some(address.to_string());
        self
    }

    /// Fills the `note` field of the entry
    pub fn note<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        self.note = Some(text.as_ref().to_string());
        self
    }

    /// Candid encoding of the entry, for persisting it outside the process
    pub fn to_bytes(&self) -> StrategyResult<Vec<u8>> {
        Encode!(self).map_err(|err| StrategyError::DecodingError(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> StrategyResult<Self> {
        Decode!(bytes, Self).map_err(|err| StrategyError::DecodingError(err.to_string()))
    }
}

/// Bounded, per-instance journal
#[derive(Clone, Debug, Default)]
pub struct JournalCollection {
    strategy: Address,
    entries: VecDeque<JournalEntry>,
}

impl JournalCollection {
    pub fn new(strategy: Address) -> Self {
        Self {
            strategy,
            entries: VecDeque::new(),
        }
    }

    /// Appends a note tagged with this journal's strategy
    pub fn append_note<S: AsRef<str>>(
        &mut self,
        timestamp: u64,
        entry: StrategyResult<()>,
        log_type: LogType,
        note: S,
    ) {
        let mut journal_entry = JournalEntry::new(timestamp, entry, log_type);
        journal_entry.strategy(self.strategy).note(note);
        self.push(journal_entry);
    }

    fn push(&mut self, entry: JournalEntry) {
        if self.entries.len() == JOURNAL_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    /// Entries of a single category, oldest first
    pub fn of_type(&self, log_type: LogType) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.log_type == log_type)
    }

    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
