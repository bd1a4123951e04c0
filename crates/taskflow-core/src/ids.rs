use anyhow::anyhow;
use chrono::Utc;

/// Source of task identifiers. Every call must return a value never handed
/// out before by the same source, or fail once the id space is used up.
pub trait IdSource {
    fn next_id(&mut self) -> anyhow::Result<u64>;

    /// Guarantees every later id is strictly greater than `floor`.
    fn reserve_above(&mut self, floor: u64);
}

/// Wall-clock millisecond ids, bumped past the previous id when the clock
/// has not moved.
#[derive(Debug, Clone, Default)]
pub struct ClockIds {
    last: u64,
}

impl ClockIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for ClockIds {
    fn next_id(&mut self) -> anyhow::Result<u64> {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(successor(self.last)?);
        self.last = id;
        Ok(id)
    }

    fn reserve_above(&mut self, floor: u64) {
        self.last = self.last.max(floor);
    }
}

/// Deterministic counter starting at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    last: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> anyhow::Result<u64> {
        self.last = successor(self.last)?;
        Ok(self.last)
    }

    fn reserve_above(&mut self, floor: u64) {
        self.last = self.last.max(floor);
    }
}

fn successor(last: u64) -> anyhow::Result<u64> {
    last.checked_add(1).ok_or_else(|| anyhow!("task ids exhausted: no id after {last}"))
}
