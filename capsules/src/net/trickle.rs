//! The Trickle suppression timer (RFC 6206), driving BSS's periodic
//! rebroadcast/suppression decisions.
//!
//! Grounded on Tock's `capsules::net::deluge::trickle::TrickleData`,
//! which keeps `i_max`/`i_min`/`k` parameters, an `i_cur`/`c`/`t` variable
//! set, and a two-phase timer (`t` fires mid-interval to decide whether to
//! transmit, the interval boundary fires to double and restart). This
//! version folds that into a single explicit state machine returned by
//! `on_alarm` rather than a `Cell`-based object with a `TrickleClient`
//! callback trait: this crate's dispatcher (§4.7) already owns the single
//! callback path into BSS, so a second callback indirection would just be
//! ceremony. Plain `&mut self` replaces `Cell<>` fields because nothing here
//! runs at interrupt context or is re-entered while borrowed — `TrickleData`'s
//! `Cell` usage exists to let `&self` methods be called from a shared
//! reference inside an interrupt handler, a constraint that doesn't apply to
//! this cooperative, single-threaded dispatch loop.

use core::cmp::min;
use core::time::Duration;
use kernel::config::Config;
use kernel::hil::rng::Rng;
use kernel::ReturnCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for `t_send`: the point mid-interval where we decide whether
    /// to transmit.
    AwaitingSend,
    /// Waiting for `t_end`: the interval boundary, where `i_cur` doubles and
    /// a new interval begins.
    AwaitingEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stopped,
    Running {
        i_cur: Duration,
        c: u8,
        phase: Phase,
        t_send: Duration,
        t_end: Duration,
    },
}

/// One Trickle timer instance, covering a single BSS item.
#[derive(Debug, Clone)]
pub struct TrickleTimer {
    i_min: Duration,
    i_max_val: Duration,
    k: u8,
    state: TimerState,
}

impl TrickleTimer {
    pub fn new(config: &Config) -> Self {
        let mut i_max_val = config.trickle_i_min;
        for _ in 0..config.trickle_i_max_doublings {
            i_max_val *= 2;
        }
        TrickleTimer {
            i_min: config.trickle_i_min,
            i_max_val,
            k: config.trickle_k,
            state: TimerState::Stopped,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, TimerState::Stopped)
    }

    /// Absolute time of the next deadline this timer needs waking at, if
    /// running.
    pub fn next_deadline(&self) -> Option<Duration> {
        match self.state {
            TimerState::Stopped => None,
            TimerState::Running { t_send, t_end, phase, .. } => Some(match phase {
                Phase::AwaitingSend => t_send,
                Phase::AwaitingEnd => t_end,
            }),
        }
    }

    /// Begin trickling from `i_min`, choosing a random `t` in
    /// `[i_cur/2, i_cur)` for the send decision (RFC 6206 §4.2 step 2, and
    /// Tock's `rng::Client::randomness_available`).
    pub fn start(&mut self, now: Duration, rng: &dyn Rng) {
        self.enter_interval(now, self.i_min, 0, rng);
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    /// Resume a stopped timer. Spec §4.3: resuming a timer that is not
    /// stopped is an error (mirrors `mtk_broadcast_resume`'s
    /// already-running check).
    pub fn resume(&mut self, now: Duration, rng: &dyn Rng) -> Result<(), ReturnCode> {
        if !self.is_stopped() {
            return Err(ReturnCode::EBUSY);
        }
        self.start(now, rng);
        Ok(())
    }

    /// A consistent transmission was heard: bump the redundancy counter `c`.
    pub fn consistency(&mut self) {
        if let TimerState::Running { c, .. } = &mut self.state {
            *c = c.saturating_add(1);
        }
    }

    /// An inconsistent transmission was heard: reset to `i_min` and start a
    /// fresh interval immediately, unless we are already at `i_min` (RFC
    /// 6206 §4.2 step 6).
    pub fn inconsistency(&mut self, now: Duration, rng: &dyn Rng) {
        let i_cur = match self.state {
            TimerState::Stopped => return,
            TimerState::Running { i_cur, .. } => i_cur,
        };
        if i_cur > self.i_min {
            self.enter_interval(now, self.i_min, 0, rng);
        }
    }

    /// Drive the timer past a deadline at `now`. Returns `Some(suppress)`
    /// when the send decision fires (`suppress == true` means `c >= k`: the
    /// caller must stay silent this interval), or `None` when only the
    /// interval boundary fired (the caller has nothing to do but keep
    /// running).
    pub fn on_alarm(&mut self, now: Duration, rng: &dyn Rng) -> Option<bool> {
        match self.state {
            TimerState::Stopped => None,
            TimerState::Running { i_cur, c, phase, t_end, .. } => match phase {
                Phase::AwaitingSend => {
                    self.state = TimerState::Running {
                        i_cur,
                        c,
                        phase: Phase::AwaitingEnd,
                        t_send: now,
                        t_end,
                    };
                    Some(c < self.k)
                }
                Phase::AwaitingEnd => {
                    let next_i_cur = min(i_cur * 2, self.i_max_val);
                    self.enter_interval(now, next_i_cur, 0, rng);
                    None
                }
            },
        }
    }

    fn enter_interval(&mut self, now: Duration, i_cur: Duration, c: u8, rng: &dyn Rng) {
        let half = i_cur / 2;
        let offset_ms = half.as_millis().max(1) as u32;
        let jitter = rng.random_u16() as u32 % offset_ms;
        let t_offset = half + Duration::from_millis(jitter as u64);
        self.state = TimerState::Running {
            i_cur,
            c,
            phase: Phase::AwaitingSend,
            t_send: now + t_offset,
            t_end: now + i_cur,
        };
    }
}
