//! Strategy fallback for PDF rendering.
//!
//! Tries an ordered list of rendering techniques and advances on failure,
//! so the user is never left in an indefinite spinner. Automatic
//! advancement never revisits a strategy that already failed this session;
//! a manual retry wraps around and gives the next strategy a fresh chance.

/// One concrete technique for putting a PDF on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfStrategy {
    /// In-process bitmap rendering through the bundled PDF engine.
    Native,
    /// Text-layer extraction rendered as plain text.
    TextLayer,
    /// Hand the file to an external viewer.
    External,
}

impl PdfStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            PdfStrategy::Native => "native render",
            PdfStrategy::TextLayer => "text layer",
            PdfStrategy::External => "external viewer",
        }
    }
}

/// Environment hints consulted when picking the initial strategy order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyHint {
    /// Known-problematic client: lead with the safer text-layer path.
    pub prefer_safe: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    Idle,
    Attempting(usize),
    Success { total_pages: Option<u32> },
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct FallbackController {
    strategies: Vec<PdfStrategy>,
    failed: Vec<bool>,
    state: FallbackState,
    cursor: usize,
}

impl FallbackController {
    pub fn new(hint: StrategyHint) -> Self {
        Self::with_plan(default_plan(hint))
    }

    pub fn with_plan(strategies: Vec<PdfStrategy>) -> Self {
        let failed = vec![false; strategies.len()];
        Self {
            strategies,
            failed,
            state: FallbackState::Idle,
            cursor: 0,
        }
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    pub fn strategies(&self) -> &[PdfStrategy] {
        &self.strategies
    }

    /// The strategy currently being attempted, if any.
    pub fn current(&self) -> Option<PdfStrategy> {
        match self.state {
            FallbackState::Attempting(i) => self.strategies.get(i).copied(),
            _ => None,
        }
    }

    /// Starts (or restarts) the chain from strategy 0.
    pub fn begin(&mut self) {
        self.failed.iter_mut().for_each(|f| *f = false);
        self.cursor = 0;
        self.state = if self.strategies.is_empty() {
            FallbackState::Exhausted
        } else {
            FallbackState::Attempting(0)
        };
    }

    /// Render-success callback for the current attempt.
    pub fn mark_success(&mut self, total_pages: Option<u32>) {
        if matches!(self.state, FallbackState::Attempting(_)) {
            self.state = FallbackState::Success { total_pages };
        }
    }

    /// Render-failure callback for the current attempt. Advances to the next
    /// strategy not yet marked failed, or terminates the chain.
    pub fn mark_failure(&mut self) {
        let FallbackState::Attempting(i) = self.state else {
            return;
        };
        if let Some(slot) = self.failed.get_mut(i) {
            *slot = true;
        }
        match self.next_unfailed_after(i) {
            Some(next) => {
                self.cursor = next;
                self.state = FallbackState::Attempting(next);
            }
            None => self.state = FallbackState::Exhausted,
        }
    }

    /// User-initiated retry: advances to the next strategy with wrap-around,
    /// clearing its failure mark so it gets a fresh attempt. Allowed from
    /// `Exhausted` and from any `Attempting` state.
    pub fn manual_retry(&mut self) {
        if self.strategies.is_empty() {
            return;
        }
        match self.state {
            FallbackState::Idle => self.begin(),
            FallbackState::Attempting(i) => self.retry_at((i + 1) % self.strategies.len()),
            FallbackState::Exhausted => self.retry_at((self.cursor + 1) % self.strategies.len()),
            FallbackState::Success { .. } => {}
        }
    }

    fn retry_at(&mut self, index: usize) {
        if let Some(slot) = self.failed.get_mut(index) {
            *slot = false;
        }
        self.cursor = index;
        self.state = FallbackState::Attempting(index);
    }

    fn next_unfailed_after(&self, index: usize) -> Option<usize> {
        ((index + 1)..self.strategies.len()).find(|&j| !self.failed[j])
    }
}

fn default_plan(hint: StrategyHint) -> Vec<PdfStrategy> {
    if hint.prefer_safe {
        vec![
            PdfStrategy::TextLayer,
            PdfStrategy::Native,
            PdfStrategy::External,
        ]
    } else {
        vec![
            PdfStrategy::Native,
            PdfStrategy::TextLayer,
            PdfStrategy::External,
        ]
    }
}
