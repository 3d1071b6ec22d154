//! Reel and win presentation collaborator

use std::time::Duration;

use tokio::sync::oneshot;

use crate::symbols::{SymbolMatrix, SymbolSet};
use crate::timing::RoundTiming;

/// How the controller learns that an animation has finished
#[derive(Debug)]
pub enum AnimationCue {
    /// Assume completion after a fixed budget
    Delay(Duration),
    /// Completion is reported explicitly by the animation system
    Signal(oneshot::Receiver<()>),
}

impl AnimationCue {
    /// A cue that resolves immediately
    pub fn immediate() -> Self {
        Self::Delay(Duration::ZERO)
    }
}

/// Rendering side of a round. Implementations must not block.
pub trait ReelPresenter: Send {
    /// Begin continuous reel motion (fire-and-forget)
    fn start_continuous_spin(&mut self);

    /// Begin stopping the reels on `matrix`
    fn stop_at_result(&mut self, matrix: &SymbolMatrix) -> AnimationCue;

    /// Show the win banner (entrance animation)
    fn show_win(&mut self, amount: u64) -> AnimationCue;

    /// Fade the win banner out
    fn fade_win(&mut self) -> AnimationCue;

    /// Remove any win display immediately
    fn hide_win(&mut self);
}

/// Presenter with no display: logs and reports the configured fixed budgets
#[derive(Debug, Clone)]
pub struct HeadlessPresenter {
    timing: RoundTiming,
    symbols: SymbolSet,
    center_row: usize,
}

impl HeadlessPresenter {
    pub fn new(timing: RoundTiming) -> Self {
        Self {
            timing,
            symbols: SymbolSet::classic(),
            center_row: 1,
        }
    }

    pub fn with_center_row(mut self, row: usize) -> Self {
        self.center_row = row;
        self
    }
}

impl ReelPresenter for HeadlessPresenter {
    fn start_continuous_spin(&mut self) {
        log::trace!("reels spinning");
    }

    fn stop_at_result(&mut self, matrix: &SymbolMatrix) -> AnimationCue {
        log::debug!("reels stopping on [{}]", self.symbols.render_row(matrix, self.center_row));
        AnimationCue::Delay(self.timing.stop_settle_delay())
    }

    fn show_win(&mut self, amount: u64) -> AnimationCue {
        log::debug!("win banner: {amount}");
        AnimationCue::Delay(self.timing.win_entrance())
    }

    fn fade_win(&mut self) -> AnimationCue {
        AnimationCue::Delay(self.timing.win_fade())
    }

    fn hide_win(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_uses_timing_budgets() {
        let mut presenter = HeadlessPresenter::new(RoundTiming::normal());
        presenter.start_continuous_spin();

        assert!(matches!(
            presenter.stop_at_result(&vec![vec![0; 3]; 5]),
            AnimationCue::Delay(d) if d == Duration::from_millis(500)
        ));
        assert!(matches!(
            presenter.show_win(30),
            AnimationCue::Delay(d) if d == Duration::from_millis(500)
        ));
        assert!(matches!(
            presenter.fade_win(),
            AnimationCue::Delay(d) if d == Duration::from_millis(300)
        ));
    }
}
