//! Wave progression
//!
//! A wave ends when the kill count reaches the requirement; the next wave
//! needs twice as many kills. Waves are unbounded.

use serde::{Deserialize, Serialize};

/// Emitted when a kill completes a wave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveAdvance {
    pub completed: u32,
    /// New current wave number
    pub next: u32,
    /// Kills needed to clear the new wave
    pub required: u32,
}

/// Run-scoped wave counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDirector {
    /// Starts at 1
    pub current_wave: u32,
    pub required_this_wave: u32,
    pub killed_this_wave: u32,
}

impl WaveDirector {
    pub fn new(first_wave_size: u32) -> Self {
        Self {
            current_wave: 1,
            required_this_wave: first_wave_size.max(1),
            killed_this_wave: 0,
        }
    }

    /// Count one kill, advancing the wave when the requirement is met
    pub fn on_enemy_killed(&mut self) -> Option<WaveAdvance> {
        self.killed_this_wave += 1;
        if self.killed_this_wave < self.required_this_wave {
            return None;
        }

        let completed = self.current_wave;
        self.current_wave = self.current_wave.saturating_add(1);
        self.required_this_wave = self.required_this_wave.saturating_mul(2);
        self.killed_this_wave = 0;
        log::info!(
            "Wave {} complete, wave {} needs {} kills",
            completed,
            self.current_wave,
            self.required_this_wave
        );

        Some(WaveAdvance {
            completed,
            next: self.current_wave,
            required: self.required_this_wave,
        })
    }

    /// Bonus score for reaching the current wave
    pub fn bonus(&self, per_wave: u64) -> u64 {
        per_wave.saturating_mul(u64::from(self.current_wave))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_doubling_progression() {
        let mut waves = WaveDirector::new(5);
        for _ in 0..4 {
            assert!(waves.on_enemy_killed().is_none());
        }
        let advance = waves.on_enemy_killed().unwrap();
        assert_eq!(advance, WaveAdvance { completed: 1, next: 2, required: 10 });
        assert_eq!(waves.killed_this_wave, 0);

        for _ in 0..9 {
            assert!(waves.on_enemy_killed().is_none());
        }
        let advance = waves.on_enemy_killed().unwrap();
        assert_eq!(advance.next, 3);
        assert_eq!(waves.required_this_wave, 20);
    }

    #[test]
    fn test_bonus_uses_new_wave() {
        let mut waves = WaveDirector::new(1);
        waves.on_enemy_killed();
        assert_eq!(waves.bonus(100), 200);
    }

    proptest! {
        #[test]
        fn prop_wave_matches_kill_total(kills in 0u32..400) {
            let mut waves = WaveDirector::new(5);
            let mut advances = 0;
            for _ in 0..kills {
                if waves.on_enemy_killed().is_some() {
                    advances += 1;
                }
            }
            // Kills needed to finish wave n: 5 * (2^n - 1)
            let mut expected_wave = 1;
            while 5 * ((1u64 << expected_wave) - 1) <= u64::from(kills) {
                expected_wave += 1;
            }
            prop_assert_eq!(waves.current_wave, expected_wave as u32);
            prop_assert_eq!(advances + 1, waves.current_wave);
            prop_assert!(waves.killed_this_wave < waves.required_this_wave);
        }
    }
}
