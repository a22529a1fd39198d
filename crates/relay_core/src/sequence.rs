use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use relay_logging::{relay_debug, relay_trace, relay_warn};

use crate::{BufferFull, Event, Sequence};

/// First sequence number of a conversation nobody has seen yet.
pub const INITIAL_SEQUENCE: Sequence = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitResult {
    /// Applied now, possibly followed by buffered successors.
    Applied,
    /// Arrived early; held until the gap before it closes.
    Buffered,
    /// Below the cursor (stale or duplicate), or refused by a full buffer.
    Dropped,
}

/// Holds early events for the active conversation and releases them in
/// strictly increasing sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBuffer {
    next_expected: Sequence,
    pending: BTreeMap<Sequence, Event>,
    max_buffered: usize,
    applied: u64,
}

impl SequenceBuffer {
    pub fn new(max_buffered: usize) -> Self {
        Self {
            next_expected: INITIAL_SEQUENCE,
            pending: BTreeMap::new(),
            max_buffered,
            applied: 0,
        }
    }

    pub fn next_expected(&self) -> Sequence {
        self.next_expected
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, sequence: Sequence) -> bool {
        self.pending.contains_key(&sequence)
    }

    /// Total number of events handed to `apply` over the buffer's lifetime.
    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    /// Routes `event` by its sequence number. Every event handed to `apply`
    /// is in cursor order, except the two discontinuity controls.
    pub fn admit(
        &mut self,
        event: Event,
        mut apply: impl FnMut(Event),
    ) -> Result<AdmitResult, BufferFull> {
        let sequence = event.sequence;

        if event.bypasses_ordering() {
            relay_debug!(
                "seq {} ({}) bypasses ordering; cursor was {}",
                sequence,
                event.kind,
                self.next_expected
            );
            self.apply_one(event, &mut apply);
            self.rebase(sequence.saturating_add(1));
            self.drain(&mut apply);
            return Ok(AdmitResult::Applied);
        }

        if sequence < self.next_expected {
            relay_trace!(
                "seq {} dropped; cursor already at {}",
                sequence,
                self.next_expected
            );
            return Ok(AdmitResult::Dropped);
        }

        if sequence > self.next_expected {
            if self.pending.contains_key(&sequence) {
                relay_trace!("seq {} already buffered; keeping first copy", sequence);
                return Ok(AdmitResult::Buffered);
            }
            if self.pending.len() >= self.max_buffered {
                return Err(BufferFull {
                    sequence,
                    waiting_for: self.next_expected,
                    limit: self.max_buffered,
                });
            }
            relay_debug!(
                "seq {} buffered while waiting for {} ({} pending)",
                sequence,
                self.next_expected,
                self.pending.len() + 1
            );
            self.pending.insert(sequence, event);
            return Ok(AdmitResult::Buffered);
        }

        self.apply_one(event, &mut apply);
        self.advance();
        self.drain(&mut apply);
        Ok(AdmitResult::Applied)
    }

    /// Applies buffered events while the next expected one is present.
    /// Returns how many were applied.
    pub fn drain(&mut self, mut apply: impl FnMut(Event)) -> usize {
        let mut drained = 0;
        while let Some(event) = self.pending.remove(&self.next_expected) {
            self.apply_one(event, &mut apply);
            drained += 1;
            if !self.advance() {
                break;
            }
        }
        if drained > 0 {
            relay_debug!(
                "drained {} buffered events; cursor now {}",
                drained,
                self.next_expected
            );
        }
        drained
    }

    /// Moves the cursor to `next_expected`, discarding pending events that
    /// now sit below it.
    pub fn rebase(&mut self, next_expected: Sequence) {
        self.next_expected = next_expected;
        self.pending = self.pending.split_off(&next_expected);
    }

    /// Loads a cursor for a newly active conversation; nothing buffered survives.
    pub fn reset(&mut self, next_expected: Sequence) {
        self.next_expected = next_expected;
        self.pending.clear();
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Moves the cursor one step. At the top of the sequence space the
    /// cursor stays put and false is returned; `Event::validate` refuses that
    /// sequence before it gets here.
    fn advance(&mut self) -> bool {
        match self.next_expected.checked_add(1) {
            Some(next) => {
                self.next_expected = next;
                true
            }
            None => {
                relay_warn!("sequence space exhausted at {}", self.next_expected);
                false
            }
        }
    }

    fn apply_one(&mut self, event: Event, apply: &mut impl FnMut(Event)) {
        self.applied += 1;
        apply(event);
    }
}

/// Watches for buffered events that sit behind a gap for too long.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GapMonitor {
    watch: Option<GapWatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GapWatch {
    since: Instant,
    applied_at_start: u64,
    reported: bool,
}

impl GapMonitor {
    pub fn reset(&mut self) {
        self.watch = None;
    }

    /// Returns true once per stall episode, when events have been buffered
    /// with no forward progress for at least `timeout`.
    pub fn observe(&mut self, buffer: &SequenceBuffer, now: Instant, timeout: Duration) -> bool {
        if buffer.pending_len() == 0 {
            self.watch = None;
            return false;
        }
        let applied = buffer.applied_count();
        match &mut self.watch {
            Some(watch) if watch.applied_at_start == applied => {
                if !watch.reported && now.saturating_duration_since(watch.since) >= timeout {
                    watch.reported = true;
                    return true;
                }
                false
            }
            _ => {
                self.watch = Some(GapWatch {
                    since: now,
                    applied_at_start: applied,
                    reported: false,
                });
                false
            }
        }
    }
}
