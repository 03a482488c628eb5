//! The timed phase script.
//!
//! The whole show is a flat list of [`Step`]s built up front by
//! [`Script::build`]: countdown, blessing lines, heart transition, typed
//! note. [`Sequencer`] walks that list from the frame loop. Each call to
//! [`Sequencer::advance`] runs every step that is due and returns, so a
//! pending wait never blocks the frame.
//!
//! Waits chain from the previous deadline rather than from the frame that
//! noticed it, so timing does not drift with frame jitter. Cues are handed
//! to a [`Director`] together with the time they were due.
//!
//! ```text
//! wait 350
//! for "3", "2", "1":       show digit, wait 600, explode 300, wait 300
//! for each line:           (explode 900, wait 900), show line, wait 640, wait 1200
//! status, await photos, enter heart
//! open note, wait 140, show note, wait 1100, reveal one char per gap
//! ```
//!
//! A cue that fails aborts the rest of the script and the status line is
//! set to [`RETRY_MESSAGE`]. Whatever was on screen stays there.

use crate::config::Config;
use crate::error::{ConfigError, SequenceError};
use crate::particles::Tint;
use crate::scatter::Scatter;
use crate::text::GlyphLayout;
use tracing::{debug, error, info};

/// Status line shown when the script aborts.
pub const RETRY_MESSAGE: &str = "Something went wrong. Please refresh and try again.";
/// Status line shown while waiting for photos.
pub const PREPARING_MESSAGE: &str = "Preparing photos...";

/// Pulse given to countdown digits.
const COUNTDOWN_PULSE: f32 = 1.0;
/// Pulse given to blessing lines.
const LINE_PULSE: f32 = 0.35;
/// Characters followed by an extra typing pause.
const PUNCTUATION: &str = "，。！？,.!";

/// Something the script asks the scene to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// Morph the particles into `text`.
    ShowGlyphs {
        text: String,
        layout: GlyphLayout,
        tint: Tint,
        pulse: f32,
    },
    /// Scatter the particles for `duration_ms`.
    Explode { duration_ms: u64 },
    /// Set or clear the status line.
    Status(Option<String>),
    /// Hold the script until every photo has resolved.
    AwaitPhotos,
    /// Form the heart, hang the photos and free the camera.
    EnterHeart,
    /// Make the (still empty) note visible.
    OpenNote,
    /// Fade the note in.
    ShowNote,
    /// Show the first `chars` characters of the note.
    RevealNote { chars: usize },
}

impl Cue {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Cue::ShowGlyphs { .. } => "show_glyphs",
            Cue::Explode { .. } => "explode",
            Cue::Status(_) => "status",
            Cue::AwaitPhotos => "await_photos",
            Cue::EnterHeart => "enter_heart",
            Cue::OpenNote => "open_note",
            Cue::ShowNote => "show_note",
            Cue::RevealNote { .. } => "reveal_note",
        }
    }
}

/// One entry of the script.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Cue(Cue),
    /// Pause, in milliseconds.
    Wait(f64),
}

/// Receives cues from the sequencer.
pub trait Director {
    /// Carry out `cue`, which was due at `now_ms`.
    fn perform(&mut self, cue: &Cue, now_ms: f64) -> Result<(), SequenceError>;

    /// Whether every photo has resolved. Polled while the script waits on
    /// [`Cue::AwaitPhotos`].
    fn photos_ready(&mut self, now_ms: f64) -> bool;
}

/// The full list of steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Build the show from configuration. Random gaps (progressive lines,
    /// typing jitter) are drawn from `rng` now.
    pub fn build(config: &Config, rng: &mut Scatter) -> Result<Self, ConfigError> {
        let colors = config.text.colors()?;
        let timing = &config.timing;
        let mut steps = vec![Step::Wait(timing.start_delay_ms as f64)];

        // Countdown
        let hold = timing.countdown_step_ms.saturating_sub(timing.countdown_scatter_ms);
        for (digit, color) in [("3", colors.c), ("2", colors.b), ("1", colors.a)] {
            steps.push(Step::Cue(Cue::ShowGlyphs {
                text: digit.to_string(),
                layout: GlyphLayout::Centered,
                tint: Tint::new(color, colors.b),
                pulse: COUNTDOWN_PULSE,
            }));
            steps.push(Step::Wait(hold as f64));
            steps.push(Step::Cue(Cue::Explode {
                duration_ms: timing.countdown_scatter_ms,
            }));
            steps.push(Step::Wait(timing.countdown_scatter_ms as f64));
        }

        // Blessing lines
        let palette = [colors.a, colors.b, colors.c];
        for (i, line) in config.text.lines.iter().enumerate() {
            if i > 0 {
                steps.push(Step::Cue(Cue::Explode {
                    duration_ms: timing.phrase_exit_ms,
                }));
                steps.push(Step::Wait(timing.phrase_exit_ms as f64));
            }
            let tint = Tint::new(palette[i % palette.len()], colors.b);

            if config.text.progressive_lines {
                let layout = GlyphLayout::Measured {
                    layout_text: line.clone(),
                };
                let chars: Vec<char> = line.chars().collect();
                for k in 1..=chars.len() {
                    steps.push(Step::Cue(Cue::ShowGlyphs {
                        text: chars[..k].iter().collect(),
                        layout: layout.clone(),
                        tint,
                        pulse: LINE_PULSE,
                    }));
                    if k < chars.len() {
                        let gap = rng.random_range(
                            timing.phrase_char_min_ms as f32,
                            timing.phrase_char_max_ms as f32,
                        );
                        steps.push(Step::Wait(gap as f64));
                    }
                }
            } else {
                steps.push(Step::Cue(Cue::ShowGlyphs {
                    text: line.clone(),
                    layout: GlyphLayout::Centered,
                    tint,
                    pulse: LINE_PULSE,
                }));
            }
            steps.push(Step::Wait(timing.phrase_assemble_ms as f64));
            steps.push(Step::Wait(timing.phrase_hold_ms as f64));
        }

        // Heart
        steps.push(Step::Cue(Cue::Status(Some(PREPARING_MESSAGE.to_string()))));
        steps.push(Step::Cue(Cue::AwaitPhotos));
        steps.push(Step::Cue(Cue::EnterHeart));

        // Typed note
        let note = &config.love_note;
        steps.push(Step::Cue(Cue::OpenNote));
        steps.push(Step::Wait(note.lead_in_ms as f64));
        steps.push(Step::Cue(Cue::ShowNote));
        steps.push(Step::Wait(note.delay_ms as f64));
        for (i, c) in note.text.chars().enumerate() {
            steps.push(Step::Cue(Cue::RevealNote { chars: i + 1 }));
            let jitter = note.jitter_ms as f32;
            let mut gap = note.char_ms as f32 + rng.random_range(-jitter, jitter);
            if PUNCTUATION.contains(c) {
                gap += note.punctuation_pause_ms as f32;
            }
            steps.push(Step::Wait(gap.max(note.min_gap_ms as f32) as f64));
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of all waits, i.e. the run time if photos resolve instantly.
    pub fn total_wait_ms(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| match s {
                Step::Wait(ms) => *ms,
                Step::Cue(_) => 0.0,
            })
            .sum()
    }
}

/// Where the sequencer is in its script.
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerState {
    Running,
    Waiting { until_ms: f64 },
    AwaitingPhotos,
    Finished,
    Aborted(SequenceError),
}

/// Walks a [`Script`] against the clock.
#[derive(Debug, Clone)]
pub struct Sequencer {
    script: Script,
    index: usize,
    cursor_ms: f64,
    state: SequencerState,
}

impl Sequencer {
    /// Start `script` at `start_ms`.
    pub fn new(script: Script, start_ms: f64) -> Self {
        Self {
            script,
            index: 0,
            cursor_ms: start_ms,
            state: SequencerState::Running,
        }
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SequencerState::Finished
    }

    /// The fault that aborted the script, if any.
    pub fn error(&self) -> Option<&SequenceError> {
        match &self.state {
            SequencerState::Aborted(err) => Some(err),
            _ => None,
        }
    }

    /// Index of the next step to run.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Run every step due at `now_ms`.
    pub fn advance<D: Director + ?Sized>(&mut self, now_ms: f64, director: &mut D) {
        loop {
            match self.state {
                SequencerState::Finished | SequencerState::Aborted(_) => return,
                SequencerState::Waiting { until_ms } => {
                    if now_ms < until_ms {
                        return;
                    }
                    self.cursor_ms = until_ms;
                    self.state = SequencerState::Running;
                }
                SequencerState::AwaitingPhotos => {
                    if !director.photos_ready(now_ms) {
                        return;
                    }
                    self.cursor_ms = self.cursor_ms.max(now_ms);
                    self.state = SequencerState::Running;
                }
                SequencerState::Running => self.run_next(now_ms, director),
            }
        }
    }

    fn run_next<D: Director + ?Sized>(&mut self, now_ms: f64, director: &mut D) {
        let Some(step) = self.script.steps.get(self.index) else {
            info!(at_ms = self.cursor_ms, "script finished");
            self.state = SequencerState::Finished;
            return;
        };
        self.index += 1;

        match step {
            Step::Wait(ms) => {
                self.state = SequencerState::Waiting {
                    until_ms: self.cursor_ms + ms,
                };
            }
            Step::Cue(cue) => {
                debug!(cue = cue.name(), at_ms = self.cursor_ms, "cue");
                if let Err(err) = director.perform(cue, self.cursor_ms) {
                    error!(cue = cue.name(), %err, "script aborted");
                    let retry = Cue::Status(Some(RETRY_MESSAGE.to_string()));
                    if let Err(status_err) = director.perform(&retry, self.cursor_ms) {
                        error!(%status_err, "could not show retry status");
                    }
                    self.state = SequencerState::Aborted(err);
                } else if *cue == Cue::AwaitPhotos && !director.photos_ready(now_ms) {
                    // Already-ready photos do not shift the timeline.
                    self.state = SequencerState::AwaitingPhotos;
                }
            }
        }
    }
}
