//! Timing profiles for round sequencing

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing profile for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Scaled from another profile
    Custom,
}

/// Every delay the round controller waits on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTiming {
    /// Profile type
    #[serde(default)]
    pub profile: TimingProfile,

    /// Spin time before the reels stop on their own (ms)
    pub auto_stop_delay_ms: u64,

    /// Budget for the stop animation to settle (ms)
    pub stop_settle_delay_ms: u64,

    /// Win banner entrance animation (ms)
    pub win_entrance_ms: u64,

    /// How long the win banner stays up (ms)
    pub win_hold_ms: u64,

    /// Win banner fade-out (ms)
    pub win_fade_ms: u64,

    /// Pause between chained auto-spin rounds (ms)
    pub auto_spin_delay_ms: u64,
}

impl RoundTiming {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            auto_stop_delay_ms: 1000,
            stop_settle_delay_ms: 500,
            win_entrance_ms: 500,
            win_hold_ms: 1500,
            win_fade_ms: 300,
            auto_spin_delay_ms: 100,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            auto_stop_delay_ms: 400,
            stop_settle_delay_ms: 250,
            win_entrance_ms: 200,
            win_hold_ms: 600,
            win_fade_ms: 150,
            auto_spin_delay_ms: 50,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            profile: TimingProfile::Custom,
            auto_stop_delay_ms: scale(self.auto_stop_delay_ms),
            stop_settle_delay_ms: scale(self.stop_settle_delay_ms),
            win_entrance_ms: scale(self.win_entrance_ms),
            win_hold_ms: scale(self.win_hold_ms),
            win_fade_ms: scale(self.win_fade_ms),
            auto_spin_delay_ms: scale(self.auto_spin_delay_ms),
        }
    }

    pub fn auto_stop_delay(&self) -> Duration {
        Duration::from_millis(self.auto_stop_delay_ms)
    }

    pub fn stop_settle_delay(&self) -> Duration {
        Duration::from_millis(self.stop_settle_delay_ms)
    }

    pub fn win_entrance(&self) -> Duration {
        Duration::from_millis(self.win_entrance_ms)
    }

    pub fn win_hold(&self) -> Duration {
        Duration::from_millis(self.win_hold_ms)
    }

    pub fn win_fade(&self) -> Duration {
        Duration::from_millis(self.win_fade_ms)
    }

    pub fn auto_spin_delay(&self) -> Duration {
        Duration::from_millis(self.auto_spin_delay_ms)
    }

    /// Unattended round length without a win (spin + settle)
    pub fn losing_round(&self) -> Duration {
        Duration::from_millis(self.auto_stop_delay_ms + self.stop_settle_delay_ms)
    }

    /// Unattended round length with a win (spin + settle + presentation)
    pub fn winning_round(&self) -> Duration {
        self.losing_round()
            + Duration::from_millis(self.win_entrance_ms + self.win_hold_ms + self.win_fade_ms)
    }
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self::normal()
    }
}
