//! Six-digit one-time-code entry: the slot buffer, focus movement, and the
//! auto-submit guard, plus the delayed submit timer and the resend cooldown.
//!
//! The machine mirrors a row of six single-character inputs. Feeding it an
//! event mutates the buffer and returns an [`OtpSignal`] telling the shell
//! what to do next. Submission arming is a phase transition: the buffer
//! becoming full moves the machine into `FullyFilled` and that transition is
//! the only thing that yields [`OtpSignal::Completed`], so duplicate events,
//! races, and re-renders cannot schedule a second submission.
//!
//! Flow Overview:
//! - Shell forwards digit / backspace / paste events to [`OtpEntry`].
//! - On `Completed`, the shell arms an [`AutoSubmitTimer`] with the submit
//!   future; the short delay lets the final digit render before the request.
//! - The timer callback calls [`OtpEntry::begin_submission`], sends the code,
//!   then [`OtpEntry::settle`] with the outcome.
//! - [`ResendCooldown`] gates the "resend code" action.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// One-time codes have exactly this many digits.
pub const OTP_LENGTH: usize = 6;

/// Delay between the buffer filling and the submission firing, so the last
/// digit is visible before the request goes out.
pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(50);

/// Lockout between resend requests.
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(60);

/// Where the entry machine currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtpPhase {
    Empty,
    PartiallyFilled,
    /// All six slots hold digits; a submission is armed. Input is locked.
    FullyFilled,
    /// The code has been handed off to the network call.
    Submitting,
    /// The backend accepted the code.
    Verified,
}

/// What the shell should do after feeding an event to the machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OtpSignal {
    /// The event was applied; render the new buffer and focus.
    Accepted,
    /// The event was refused; nothing to schedule.
    Rejected,
    /// The buffer just became full. Fires exactly once per fill; schedule the
    /// submission now.
    Completed { code: String },
}

/// State machine for a six-slot code input.
#[derive(Clone, Debug)]
pub struct OtpEntry {
    slots: [Option<char>; OTP_LENGTH],
    focus: usize,
    phase: OtpPhase,
}

impl Default for OtpEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpEntry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [None; OTP_LENGTH],
            focus: 0,
            phase: OtpPhase::Empty,
        }
    }

    #[must_use]
    pub fn phase(&self) -> OtpPhase {
        self.phase
    }

    /// Index of the slot that should have keyboard focus.
    #[must_use]
    pub fn focus(&self) -> usize {
        self.focus
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<char> {
        self.slots.get(index).copied().flatten()
    }

    /// Digits entered so far, in slot order.
    #[must_use]
    pub fn code(&self) -> String {
        self.slots.iter().flatten().collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Input events are refused from the moment a submission is armed until
    /// the machine is reset.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(
            self.phase,
            OtpPhase::FullyFilled | OtpPhase::Submitting | OtpPhase::Verified
        )
    }

    /// A character typed into the slot at `index`. Digits fill the slot and
    /// advance focus; anything else clears the slot and is refused.
    pub fn enter_char(&mut self, index: usize, value: char) -> OtpSignal {
        if self.is_locked() || index >= OTP_LENGTH {
            return OtpSignal::Rejected;
        }
        if !value.is_ascii_digit() {
            self.slots[index] = None;
            self.refresh_phase();
            return OtpSignal::Rejected;
        }

        self.slots[index] = Some(value);
        if index + 1 < OTP_LENGTH {
            self.focus = index + 1;
        }
        self.after_fill()
    }

    /// Backspace in the slot at `index`: clears a filled slot in place, or
    /// retreats focus from an empty one without touching the previous value.
    pub fn backspace(&mut self, index: usize) -> OtpSignal {
        if self.is_locked() || index >= OTP_LENGTH {
            return OtpSignal::Rejected;
        }

        if self.slots[index].is_some() {
            self.slots[index] = None;
            self.refresh_phase();
        } else if index > 0 {
            self.focus = index - 1;
        }
        OtpSignal::Accepted
    }

    /// Pasted text. All-digit strings distribute from slot 0, extra digits
    /// are dropped, and focus lands on the last filled slot. Anything with a
    /// non-digit is refused wholesale.
    pub fn paste(&mut self, text: &str) -> OtpSignal {
        if self.is_locked() {
            return OtpSignal::Rejected;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return OtpSignal::Rejected;
        }

        let digits: Vec<char> = trimmed.chars().take(OTP_LENGTH).collect();
        for (index, digit) in digits.iter().enumerate() {
            self.slots[index] = Some(*digit);
        }
        self.focus = digits.len() - 1;
        self.after_fill()
    }

    /// Marks the armed submission as in flight and hands back the code.
    /// Returns `None` when the machine was reset between arming and firing,
    /// in which case nothing must be sent.
    pub fn begin_submission(&mut self) -> Option<String> {
        if self.phase == OtpPhase::FullyFilled {
            self.phase = OtpPhase::Submitting;
            Some(self.code())
        } else {
            None
        }
    }

    /// Records the submission outcome: verified on success; cleared, unlocked,
    /// and refocused on slot 0 on failure so the user can retype.
    pub fn settle(&mut self, success: bool) {
        if success {
            self.phase = OtpPhase::Verified;
        } else {
            self.reset();
        }
    }

    /// Returns to the empty state with focus on slot 0. Also disarms a
    /// pending submission: `begin_submission` after a reset yields `None`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn after_fill(&mut self) -> OtpSignal {
        self.refresh_phase();
        // Reachable only from a not-full state: full phases lock input above,
        // so this transition happens at most once per fill.
        if self.phase == OtpPhase::FullyFilled {
            OtpSignal::Completed { code: self.code() }
        } else {
            OtpSignal::Accepted
        }
    }

    fn refresh_phase(&mut self) {
        let filled = self.slots.iter().filter(|slot| slot.is_some()).count();
        self.phase = if filled == 0 {
            OtpPhase::Empty
        } else if filled == OTP_LENGTH {
            OtpPhase::FullyFilled
        } else {
            OtpPhase::PartiallyFilled
        };
    }
}

/// Runs the submit future after a short delay, on its own task. Arming again
/// replaces the pending run; dropping the timer aborts it, so a torn-down
/// entry form is never called back.
#[derive(Debug, Default)]
pub struct AutoSubmitTimer {
    task: Option<JoinHandle<()>>,
}

impl AutoSubmitTimer {
    #[must_use]
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Schedules `submit` to run after [`AUTO_SUBMIT_DELAY`].
    pub fn arm<F, Fut>(&mut self, submit: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.arm_after(AUTO_SUBMIT_DELAY, submit);
    }

    /// Schedules `submit` after `delay`, replacing any pending run.
    pub fn arm_after<F, Fut>(&mut self, delay: Duration, submit: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            submit().await;
        }));
    }

    /// Aborts the pending run, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AutoSubmitTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Wall-clock lockout between resend requests.
#[derive(Clone, Debug, Default)]
pub struct ResendCooldown {
    ready_at: Option<Instant>,
}

impl ResendCooldown {
    #[must_use]
    pub fn new() -> Self {
        Self { ready_at: None }
    }

    /// Starts (or restarts) the lockout. Call after every accepted send.
    pub fn start(&mut self) {
        self.start_for(RESEND_COOLDOWN);
    }

    /// Starts the lockout with an explicit period.
    pub fn start_for(&mut self, period: Duration) {
        self.ready_at = Some(Instant::now() + period);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining().is_none()
    }

    /// Whole seconds left before resending is allowed, rounded up for
    /// countdown display. `None` once the cooldown has lapsed.
    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u64> {
        self.remaining()
            .map(|left| left.as_secs() + u64::from(left.subsec_nanos() > 0))
    }

    fn remaining(&self) -> Option<Duration> {
        let ready_at = self.ready_at?;
        let now = Instant::now();
        if now >= ready_at {
            None
        } else {
            Some(ready_at - now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fill(entry: &mut OtpEntry, code: &str) -> Vec<OtpSignal> {
        code.chars()
            .enumerate()
            .map(|(index, ch)| entry.enter_char(index, ch))
            .collect()
    }

    #[test]
    fn typing_six_digits_completes_exactly_once() {
        let mut entry = OtpEntry::new();
        let signals = fill(&mut entry, "123456");

        assert_eq!(signals[..5], vec![OtpSignal::Accepted; 5]);
        assert_eq!(
            signals[5],
            OtpSignal::Completed {
                code: "123456".to_string()
            }
        );
        assert_eq!(entry.phase(), OtpPhase::FullyFilled);
        assert_eq!(entry.focus(), 5);
        assert!(entry.is_complete());
    }

    #[test]
    fn focus_advances_after_each_digit_but_not_past_the_end() {
        let mut entry = OtpEntry::new();
        assert_eq!(entry.enter_char(0, '7'), OtpSignal::Accepted);
        assert_eq!(entry.focus(), 1);
        fill(&mut entry, "712345");
        assert_eq!(entry.focus(), 5);
    }

    #[test]
    fn duplicate_completing_keystroke_cannot_arm_twice() {
        let mut entry = OtpEntry::new();
        fill(&mut entry, "123456");

        // The rapid duplicate of the final keystroke arrives while armed.
        assert_eq!(entry.enter_char(5, '6'), OtpSignal::Rejected);
        assert_eq!(entry.code(), "123456");
        assert_eq!(entry.phase(), OtpPhase::FullyFilled);
    }

    #[test]
    fn non_digit_clears_the_slot_and_keeps_focus() {
        let mut entry = OtpEntry::new();
        entry.enter_char(0, '1');
        entry.enter_char(1, '2');

        assert_eq!(entry.enter_char(1, 'x'), OtpSignal::Rejected);
        assert_eq!(entry.slot(1), None);
        assert_eq!(entry.slot(0), Some('1'));
        assert_eq!(entry.focus(), 2);
        assert_eq!(entry.phase(), OtpPhase::PartiallyFilled);
    }

    #[test]
    fn backspace_clears_in_place_or_retreats_from_empty() {
        let mut entry = OtpEntry::new();
        fill(&mut entry, "123");

        // Filled slot: value is cleared, focus stays put.
        assert_eq!(entry.backspace(2), OtpSignal::Accepted);
        assert_eq!(entry.slot(2), None);
        assert_eq!(entry.focus(), 3);

        // Empty slot: focus retreats, previous slot keeps its value.
        assert_eq!(entry.backspace(2), OtpSignal::Accepted);
        assert_eq!(entry.focus(), 1);
        assert_eq!(entry.slot(1), Some('2'));

        // Slot 0 has nowhere to retreat to.
        let mut at_start = OtpEntry::new();
        assert_eq!(at_start.backspace(0), OtpSignal::Accepted);
        assert_eq!(at_start.focus(), 0);
    }

    #[test]
    fn pasting_six_digits_fills_and_completes() {
        let mut entry = OtpEntry::new();
        assert_eq!(
            entry.paste("123456"),
            OtpSignal::Completed {
                code: "123456".to_string()
            }
        );
        assert_eq!(entry.focus(), 5);
        assert_eq!(entry.phase(), OtpPhase::FullyFilled);
    }

    #[test]
    fn pasting_truncates_beyond_six_digits() {
        let mut entry = OtpEntry::new();
        assert_eq!(
            entry.paste("12345678"),
            OtpSignal::Completed {
                code: "123456".to_string()
            }
        );
    }

    #[test]
    fn pasting_fewer_digits_fills_from_the_start() {
        let mut entry = OtpEntry::new();
        assert_eq!(entry.paste("123"), OtpSignal::Accepted);
        assert_eq!(entry.code(), "123");
        assert_eq!(entry.focus(), 2);
        assert_eq!(entry.phase(), OtpPhase::PartiallyFilled);
    }

    #[test]
    fn pasting_non_digits_changes_nothing() {
        let mut entry = OtpEntry::new();
        entry.enter_char(0, '9');

        assert_eq!(entry.paste("12a456"), OtpSignal::Rejected);
        assert_eq!(entry.paste(""), OtpSignal::Rejected);
        assert_eq!(entry.code(), "9");
        assert_eq!(entry.focus(), 1);
    }

    #[test]
    fn paste_while_armed_is_refused() {
        let mut entry = OtpEntry::new();
        fill(&mut entry, "123456");

        assert_eq!(entry.paste("654321"), OtpSignal::Rejected);
        assert_eq!(entry.code(), "123456");
    }

    #[test]
    fn begin_submission_fires_once_and_respects_reset() {
        let mut entry = OtpEntry::new();
        fill(&mut entry, "123456");

        assert_eq!(entry.begin_submission(), Some("123456".to_string()));
        assert_eq!(entry.phase(), OtpPhase::Submitting);
        // A second begin (double-fired timer) gets nothing to send.
        assert_eq!(entry.begin_submission(), None);

        let mut cancelled = OtpEntry::new();
        fill(&mut cancelled, "123456");
        cancelled.reset();
        assert_eq!(cancelled.begin_submission(), None);
    }

    #[test]
    fn settle_failure_clears_and_refocuses_for_retype() {
        let mut entry = OtpEntry::new();
        fill(&mut entry, "123456");
        entry.begin_submission();

        entry.settle(false);
        assert_eq!(entry.phase(), OtpPhase::Empty);
        assert_eq!(entry.focus(), 0);
        assert_eq!(entry.code(), "");
        assert!(!entry.is_locked());
    }

    #[test]
    fn settle_success_marks_verified() {
        let mut entry = OtpEntry::new();
        fill(&mut entry, "123456");
        entry.begin_submission();

        entry.settle(true);
        assert_eq!(entry.phase(), OtpPhase::Verified);
        assert!(entry.is_locked());
    }

    #[tokio::test]
    async fn timer_fires_after_the_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = AutoSubmitTimer::new();

        let counter = Arc::clone(&fired);
        timer.arm_after(Duration::from_millis(5), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_timer_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = AutoSubmitTimer::new();

        let counter = Arc::clone(&fired);
        timer.arm_after(Duration::from_millis(5), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropping_the_timer_aborts_the_pending_run() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let mut timer = AutoSubmitTimer::new();
            let counter = Arc::clone(&fired);
            timer.arm_after(Duration::from_millis(5), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rearming_replaces_the_pending_run() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = AutoSubmitTimer::new();

        let first = Arc::clone(&fired);
        timer.arm_after(Duration::from_millis(5), move || async move {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let second = Arc::clone(&fired);
        timer.arm_after(Duration::from_millis(5), move || async move {
            second.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cooldown_reports_remaining_and_expires() {
        let mut cooldown = ResendCooldown::new();
        assert!(cooldown.is_ready());
        assert_eq!(cooldown.remaining_seconds(), None);

        cooldown.start_for(Duration::from_millis(40));
        assert!(!cooldown.is_ready());
        assert_eq!(cooldown.remaining_seconds(), Some(1));

        std::thread::sleep(Duration::from_millis(60));
        assert!(cooldown.is_ready());
        assert_eq!(cooldown.remaining_seconds(), None);
    }

    #[test]
    fn cooldown_restart_extends_the_lockout() {
        let mut cooldown = ResendCooldown::new();
        cooldown.start();
        let first = cooldown.remaining_seconds();
        assert_eq!(first, Some(60));

        cooldown.start();
        assert!(cooldown.remaining_seconds() >= first);
    }
}
