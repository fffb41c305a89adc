//! Wave spawn scheduling
//!
//! A wave walks an ordered manifest of (kind, count) entries, releasing one
//! bloon per successful call once the spawn delay has elapsed.

use serde::{Deserialize, Serialize};

use super::bloon::{Bloon, BloonKind};
use super::map::Path;

/// One manifest line: spawn `count` bloons of `kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveEntry {
    pub kind: BloonKind,
    pub count: u32,
}

impl WaveEntry {
    pub const fn new(kind: BloonKind, count: u32) -> Self {
        Self { kind, count }
    }
}

/// Timer-gated spawn state machine for one round
#[derive(Debug, Clone)]
pub struct Wave {
    manifest: Vec<WaveEntry>,
    /// Milliseconds between spawns
    spawn_delay_ms: u64,
    spawned: u32,
    total: u32,
    /// None until the first spawn, which is released immediately
    last_spawn_ms: Option<u64>,
    entry_index: usize,
    entry_spawned: u32,
}

impl Wave {
    pub fn new(manifest: Vec<WaveEntry>, spawn_delay_ms: u64) -> Self {
        let total = manifest.iter().map(|e| e.count).sum();
        let mut wave = Self {
            manifest,
            spawn_delay_ms,
            spawned: 0,
            total,
            last_spawn_ms: None,
            entry_index: 0,
            entry_spawned: 0,
        };
        wave.skip_empty_entries();
        wave
    }

    /// Scripted manifest for `round` (1-based), generated past round 4
    pub fn for_round(round: u32) -> Self {
        use BloonKind::*;
        match round {
            0 | 1 => Self::new(vec![WaveEntry::new(Red, 10)], 800),
            2 => Self::new(vec![WaveEntry::new(Red, 15)], 600),
            3 => Self::new(vec![WaveEntry::new(Red, 10), WaveEntry::new(Blue, 5)], 500),
            4 => Self::new(
                vec![
                    WaveEntry::new(Red, 5),
                    WaveEntry::new(Blue, 10),
                    WaveEntry::new(Green, 3),
                ],
                400,
            ),
            n => {
                let step = n - 4;
                Self::new(
                    vec![
                        WaveEntry::new(Red, 5 + step),
                        WaveEntry::new(Blue, 8 + 2 * step),
                        WaveEntry::new(Green, 3 + 2 * step),
                        WaveEntry::new(Yellow, step * 2),
                    ],
                    400u64.saturating_sub(20 * u64::from(step)).max(150),
                )
            }
        }
    }

    fn skip_empty_entries(&mut self) {
        while self
            .manifest
            .get(self.entry_index)
            .is_some_and(|e| self.entry_spawned >= e.count)
        {
            self.entry_index += 1;
            self.entry_spawned = 0;
        }
    }

    /// Release the next bloon if the manifest has one and the delay has passed
    pub fn spawn_next_bloon(&mut self, now_ms: u64, path: &Path) -> Option<Bloon> {
        if self.spawned >= self.total {
            return None;
        }
        if self
            .last_spawn_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < self.spawn_delay_ms)
        {
            return None;
        }

        let entry = *self.manifest.get(self.entry_index)?;
        let bloon = Bloon::new(entry.kind, path.clone());

        self.spawned += 1;
        self.entry_spawned += 1;
        self.last_spawn_ms = Some(now_ms);
        self.skip_empty_entries();

        Some(bloon)
    }

    pub fn is_complete(&self) -> bool {
        self.spawned >= self.total
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn spawn_delay_ms(&self) -> u64 {
        self.spawn_delay_ms
    }

    pub fn manifest(&self) -> &[WaveEntry] {
        &self.manifest
    }

    /// Bloons of each kind still to come, in manifest order
    pub fn remaining(&self) -> Vec<WaveEntry> {
        self.manifest
            .iter()
            .enumerate()
            .skip(self.entry_index)
            .map(|(i, e)| {
                let used = if i == self.entry_index { self.entry_spawned } else { 0 };
                WaveEntry::new(e.kind, e.count - used)
            })
            .filter(|e| e.count > 0)
            .collect()
    }
}
