//! Rotary encoder ("knob") decoding.
//!
//! Independent of the streaming pipeline: GPIO samples go in, discrete
//! [`KnobEvent`]s come out. Rotation is decoded from the two-bit Gray
//! code `{00, 01, 11, 10}` on the CLK/DT pins; the push button is
//! edge-triggered with a fixed settle window.
//!
//! Each event has a one-byte wire form (`C`, `A`, `P`) for forwarding
//! over whatever link carries it.
//!
//! [`run_knob`] polls a [`PinReader`] and pushes events into a channel.
//! Neither binary drives it; a host with GPIO access supplies the reader.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CastError;

/// Ignore further button edges for this long after an accepted press.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

/// Valid Gray-code steps per emitted rotation event (one per CLK edge).
pub const DEFAULT_STEPS_PER_EVENT: u8 = 2;

/// Indexed by `prev << 2 | curr`, where a state is `clk << 1 | dt`.
/// `+1` = clockwise, `-1` = counter-clockwise, `0` = no move or an
/// invalid double-bit jump.
const TRANSITIONS: [i8; 16] = [
    0, -1, 1, 0, //
    1, 0, 0, -1, //
    -1, 0, 0, 1, //
    0, 1, -1, 0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnobEvent {
    Rotate(Direction),
    Press,
}

impl KnobEvent {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Rotate(Direction::Clockwise) => b'C',
            Self::Rotate(Direction::CounterClockwise) => b'A',
            Self::Press => b'P',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'C' => Some(Self::Rotate(Direction::Clockwise)),
            b'A' => Some(Self::Rotate(Direction::CounterClockwise)),
            b'P' => Some(Self::Press),
            _ => None,
        }
    }
}

// ── QuadratureDecoder ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    state: u8,
    accum: i8,
    steps_per_event: i8,
}

impl QuadratureDecoder {
    /// Start from the current pin levels.
    pub fn new(clk: bool, dt: bool) -> Self {
        Self::with_steps(clk, dt, DEFAULT_STEPS_PER_EVENT)
    }

    pub fn with_steps(clk: bool, dt: bool, steps_per_event: u8) -> Self {
        Self {
            state: pins(clk, dt),
            accum: 0,
            steps_per_event: steps_per_event.clamp(1, 4) as i8,
        }
    }

    /// Feed one sample; returns a direction once enough steps agree.
    pub fn update(&mut self, clk: bool, dt: bool) -> Option<Direction> {
        let next = pins(clk, dt);
        if next == self.state {
            return None;
        }
        let step = TRANSITIONS[((self.state << 2) | next) as usize];
        self.state = next;

        if step == 0 {
            // Skipped a state; direction unknown.
            self.accum = 0;
            return None;
        }
        if self.accum.signum() == -step {
            self.accum = 0;
        }
        self.accum += step;

        if self.accum.abs() >= self.steps_per_event {
            let dir = if self.accum > 0 {
                Direction::Clockwise
            } else {
                Direction::CounterClockwise
            };
            self.accum = 0;
            return Some(dir);
        }
        None
    }
}

fn pins(clk: bool, dt: bool) -> u8 {
    ((clk as u8) << 1) | dt as u8
}

// ── ButtonDebouncer ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ButtonDebouncer {
    settle: Duration,
    pressed: bool,
    quiet_until: Option<Instant>,
}

impl ButtonDebouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            pressed: false,
            quiet_until: None,
        }
    }

    /// Feed the (already inverted, active-high) button level. Returns
    /// `true` on an accepted released → pressed edge.
    pub fn update(&mut self, pressed: bool, now: Instant) -> bool {
        if let Some(until) = self.quiet_until {
            if now < until {
                return false;
            }
            self.quiet_until = None;
        }

        let rising = pressed && !self.pressed;
        self.pressed = pressed;
        if rising {
            self.quiet_until = Some(now + self.settle);
        }
        rising
    }
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

// ── Knob ─────────────────────────────────────────────────────────

/// Rotation decoder plus button debouncer.
#[derive(Debug, Clone)]
pub struct Knob {
    rotation: QuadratureDecoder,
    button: ButtonDebouncer,
}

impl Knob {
    pub fn new(clk: bool, dt: bool) -> Self {
        Self {
            rotation: QuadratureDecoder::new(clk, dt),
            button: ButtonDebouncer::default(),
        }
    }

    /// Feed one sample of all three pins.
    pub fn sample(&mut self, clk: bool, dt: bool, pressed: bool, now: Instant) -> Vec<KnobEvent> {
        let mut events = Vec::new();
        if let Some(dir) = self.rotation.update(clk, dt) {
            events.push(KnobEvent::Rotate(dir));
        }
        if self.button.update(pressed, now) {
            events.push(KnobEvent::Press);
        }
        events
    }
}

// ── Sampling loop ────────────────────────────────────────────────

/// One sample of the knob's inputs, button already active-high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinLevels {
    pub clk: bool,
    pub dt: bool,
    pub pressed: bool,
}

/// Where pin levels come from: a GPIO chip, or a script in tests.
pub trait PinReader: Send {
    fn read(&mut self) -> Result<PinLevels, CastError>;
}

/// Sample `pins` every `poll` and forward decoded events until `cancel`
/// fires or the event receiver goes away. A failed read ends the loop.
pub async fn run_knob<P: PinReader>(
    mut pins: P,
    poll: Duration,
    events: mpsc::Sender<KnobEvent>,
    cancel: &CancellationToken,
) -> Result<(), CastError> {
    let first = pins.read()?;
    let mut knob = Knob::new(first.clk, first.dt);
    let mut tick = tokio::time::interval(poll);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            _ = tick.tick() => {}
        }

        let p = pins.read()?;
        let now = tokio::time::Instant::now().into_std();
        for event in knob.sample(p.clk, p.dt, p.pressed, now) {
            debug!("knob {:?}", event);
            if events.send(event).await.is_err() {
                debug!("knob listener gone; stopping");
                return Ok(());
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
