//! The event/task controller
//!
//! An [`Etask`] owns one ring channel, one event registry, one timer
//! queue, and the current tick. Producers (peripheral ISRs, the system
//! tick ISR) push event ids and tick advances in; the application's poll
//! loop drains and dispatches with [`Etask::handle`].
//!
//! The deferred path is deliberately asymmetric: [`Etask::queue`] pushes
//! the id blindly in O(1) and never touches the registry, so notify stays
//! cheap in interrupt context; the registry lookup happens at drain time,
//! where a stale id is a normal, logged skip. Do not move the lookup
//! earlier — that would put an unbounded tree traversal inside interrupt
//! handlers.

use et_core::{Dispatch, EtError, EtResult, EventId, Label, Repeat, Tick};
use et_ring::RingChannel;

use crate::registry::AvlMap;
use crate::timing::{Armed, TimerQueue};

/// Event callback signature
///
/// Callbacks receive the controller (so they may queue, arm, or
/// deregister further events), the caller-owned context `C`, and the
/// [`Invoke`] describing this dispatch.
pub type Callback<C, const E: usize, const Q: usize> =
    fn(&mut Etask<C, E, Q>, &mut C, Invoke) -> EtResult<()>;

/// One dispatch as seen by a callback
#[derive(Debug, Clone, Copy)]
pub struct Invoke {
    /// Id the dispatch was addressed to
    pub id: EventId,
    /// Pseudo-label: `Event` for ordinary dispatch, `Enter`/`Exit`/`Poll`
    /// for the state-machine slot
    pub label: Label,
    /// Opaque word supplied at registration, handed back untouched
    pub token: usize,
}

/// Channel entry: an event id with its dispatch label packed alongside
#[derive(Clone, Copy)]
struct Notice {
    id: EventId,
    label: Label,
}

struct EventRecord<C, const E: usize, const Q: usize> {
    cb: Callback<C, E, Q>,
    token: usize,
    dispatch: Dispatch,
    /// Re-arm interval in ticks; 0 means no automatic re-arm (one-shot
    /// or plain event)
    interval: u32,
}

/// Cooperative event/task controller
///
/// `C` is the caller-owned context threaded through every dispatch, `E`
/// bounds the number of registered events, `Q` the deferred channel
/// capacity.
///
/// None of the operations block. `advance_tick` is meant to run from the
/// periodic timer ISR, `queue` from peripheral ISRs, everything else from
/// the poll loop; when both sides share one instance, wrap it in
/// [`crate::SharedEtask`] so each side runs under the interrupt guard.
pub struct Etask<C, const E: usize, const Q: usize> {
    tick: Tick,
    queue: RingChannel<Notice, Q>,
    events: AvlMap<EventRecord<C, E, Q>, E>,
    timers: TimerQueue<E>,
    state: Option<EventId>,
}

impl<C, const E: usize, const Q: usize> Etask<C, E, Q> {
    /// Create a new controller with tick zero and nothing registered
    pub const fn new() -> Self {
        Self {
            tick: Tick::ZERO,
            queue: RingChannel::new(),
            events: AvlMap::new(),
            timers: TimerQueue::new(),
            state: None,
        }
    }

    /// Current tick
    pub fn now(&self) -> Tick {
        self.tick
    }

    /// Number of events waiting in the deferred channel
    pub fn pending(&self) -> usize {
        self.queue.used()
    }

    /// Number of registered events
    pub fn registered(&self) -> usize {
        self.events.len()
    }

    /// Whether `id` is registered
    pub fn is_registered(&self, id: EventId) -> bool {
        self.events.find(id.raw()).is_some()
    }

    /// Whether `id` currently has an armed timer
    pub fn is_armed(&self, id: EventId) -> bool {
        match self.events.find(id.raw()) {
            Some(handle) => self.timers.is_armed(handle),
            None => false,
        }
    }

    /// Absolute deadline of `id`'s armed timer, if any
    pub fn deadline_of(&self, id: EventId) -> Option<Tick> {
        let handle = self.events.find(id.raw())?;
        self.timers.deadline_of(handle)
    }

    /// Id held by the state-machine slot, if a state is active
    pub fn active_state(&self) -> Option<EventId> {
        self.state
    }

    /// Register an event
    ///
    /// `token` is an opaque caller-owned word handed back to the callback
    /// on every dispatch. Fails with [`EtError::Busy`] on a duplicate id
    /// and [`EtError::NoMemory`] when the event arena is full; the
    /// existing record is untouched in both cases.
    pub fn register(
        &mut self,
        id: EventId,
        dispatch: Dispatch,
        cb: Callback<C, E, Q>,
        token: usize,
    ) -> EtResult<()> {
        self.events.insert(
            id.raw(),
            EventRecord {
                cb,
                token,
                dispatch,
                interval: 0,
            },
        )?;
        Ok(())
    }

    /// Register an event and arm its timer in one call
    ///
    /// Convenience for the common timed-event case; `ticks` must be
    /// nonzero ([`EtError::Invalid`] otherwise).
    pub fn register_timer(
        &mut self,
        id: EventId,
        dispatch: Dispatch,
        repeat: Repeat,
        ticks: u32,
        cb: Callback<C, E, Q>,
        token: usize,
    ) -> EtResult<()> {
        if ticks == 0 {
            return Err(EtError::Invalid);
        }
        self.register(id, dispatch, cb, token)?;
        self.arm(id, ticks, repeat)
    }

    /// Deregister an event
    ///
    /// Unlinks the armed timer first, then removes the record, so a tick
    /// advance can never observe a timer whose record is gone. Clears the
    /// state-machine slot if it named this id.
    pub fn deregister(&mut self, id: EventId) -> EtResult<()> {
        let handle = self.events.find(id.raw()).ok_or(EtError::NotFound)?;
        self.timers.disarm(handle);
        self.events.remove(id.raw());
        if self.state == Some(id) {
            self.state = None;
        }
        Ok(())
    }

    /// Queue a deferred dispatch of `id`
    ///
    /// O(1) blind push; the id is resolved at drain time. Intended call
    /// site: peripheral ISRs. [`EtError::Busy`] means the channel is
    /// saturated and the event was dropped — callers must not block or
    /// retry, the triggering condition will re-notify.
    pub fn queue(&mut self, id: EventId) -> EtResult<()> {
        self.push_notice(Notice {
            id,
            label: Label::Event,
        })
    }

    /// Invoke `id`'s callback synchronously
    ///
    /// Used for short ISR-safe handlers and anywhere needing immediate
    /// dispatch; returns the callback's result.
    pub fn fire(&mut self, ctx: &mut C, id: EventId) -> EtResult<()> {
        let handle = self.events.find(id.raw()).ok_or(EtError::NotFound)?;
        let (cb, token) = match self.events.get(handle) {
            Some(record) => (record.cb, record.token),
            None => return Err(EtError::NotFound),
        };
        cb(
            self,
            ctx,
            Invoke {
                id,
                label: Label::Event,
                token,
            },
        )
    }

    /// Arm (or re-arm) a timer for `id`
    ///
    /// The deadline is `now + ticks`. `ticks == 0` disarms: the record is
    /// unlinked from the timer queue and nothing is re-inserted. Arming an
    /// already armed timer replaces its deadline.
    pub fn arm(&mut self, id: EventId, ticks: u32, repeat: Repeat) -> EtResult<()> {
        let handle = self.events.find(id.raw()).ok_or(EtError::NotFound)?;
        self.timers.disarm(handle);
        let interval = if ticks != 0 && repeat.is_periodic() {
            ticks
        } else {
            0
        };
        if let Some(record) = self.events.get_mut(handle) {
            record.interval = interval;
        }
        if ticks == 0 {
            return Ok(());
        }
        self.timers.arm(Armed {
            deadline: self.tick.deadline_after(ticks),
            handle,
            id,
        })
    }

    /// Cancel `id`'s timer; synchronous, effective before return
    pub fn disarm(&mut self, id: EventId) -> EtResult<()> {
        self.arm(id, 0, Repeat::OneShot)
    }

    /// Advance the tick and process expired timers
    ///
    /// Intended call site: the system tick ISR, with `delta` typically 1.
    /// Expired timers are processed earliest-deadline-first. A periodic
    /// record is re-armed at `now + interval` before its dispatch, so a
    /// callback that disarms or re-arms its own timer wins. `Immediate`
    /// records run synchronously from this context; `Deferred` ids go
    /// through the channel and are dropped (logged) when it is full.
    pub fn advance_tick(&mut self, ctx: &mut C, delta: u32) {
        self.tick.advance(delta);
        let now = self.tick;

        while let Some(expired) = self.timers.pop_due(now) {
            let (cb, token, dispatch, interval) = match self.events.get(expired.handle) {
                Some(record) => (record.cb, record.token, record.dispatch, record.interval),
                None => continue,
            };

            if interval != 0 {
                // Re-arm relative to now, not the original deadline, to
                // avoid catch-up bursts after a stall
                let _ = self.timers.arm(Armed {
                    deadline: now.deadline_after(interval),
                    handle: expired.handle,
                    id: expired.id,
                });
            }

            if dispatch.is_immediate() {
                let result = cb(
                    self,
                    ctx,
                    Invoke {
                        id: expired.id,
                        label: Label::Event,
                        token,
                    },
                );
                if let Err(_err) = result {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("timer handler {} failed: {}", expired.id, _err);
                }
            } else {
                let _ = self.push_notice(Notice {
                    id: expired.id,
                    label: Label::Event,
                });
            }
        }
    }

    /// Drain and dispatch queued events, then poll the active state
    ///
    /// Intended call site: the main poll loop. The drain is bounded by a
    /// snapshot of the channel's used count taken at entry, so producers
    /// pushing during the call cannot spin it forever. Each id is looked
    /// up at pop time; a deregistered (stale) id is skipped. Afterwards
    /// the active state, if any, receives one [`Label::Poll`] dispatch.
    pub fn handle(&mut self, ctx: &mut C) {
        let mut count = self.queue.used();
        while count != 0 {
            count -= 1;
            let notice = match self.queue.read() {
                Some(notice) => notice,
                None => break,
            };

            let found = self
                .events
                .find(notice.id.raw())
                .and_then(|handle| self.events.get(handle))
                .map(|record| (record.cb, record.token));
            let (cb, token) = match found {
                Some(found) => found,
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("stale event {} dropped", notice.id);
                    continue;
                }
            };

            let result = cb(
                self,
                ctx,
                Invoke {
                    id: notice.id,
                    label: notice.label,
                    token,
                },
            );
            if let Err(_err) = result {
                #[cfg(feature = "defmt")]
                defmt::debug!("handler {} failed: {}", notice.id, _err);
            }
        }

        if let Some(id) = self.state {
            let found = self
                .events
                .find(id.raw())
                .and_then(|handle| self.events.get(handle))
                .map(|record| (record.cb, record.token));
            if let Some((cb, token)) = found {
                let _ = cb(
                    self,
                    ctx,
                    Invoke {
                        id,
                        label: Label::Poll,
                        token,
                    },
                );
            }
        }
    }

    /// Transition the state-machine slot to `id`
    ///
    /// Queues an `Exit` dispatch for the current state (if one is active),
    /// installs `id` as the new state, and queues its `Enter` dispatch.
    /// Both go through the ordinary channel, so they are delivered in
    /// order on the next `handle` pass. The controller has exactly one
    /// state slot.
    pub fn transition(&mut self, id: EventId) -> EtResult<()> {
        if self.events.find(id.raw()).is_none() {
            return Err(EtError::NotFound);
        }
        if let Some(current) = self.state {
            let _ = self.push_notice(Notice {
                id: current,
                label: Label::Exit,
            });
        }
        self.state = Some(id);
        self.push_notice(Notice {
            id,
            label: Label::Enter,
        })
    }

    /// Drop every registration, armed timer, queued event, and the state
    /// slot, returning the controller to its freshly-created state
    pub fn clear(&mut self) {
        self.queue.clear();
        self.timers.clear();
        self.events.clear();
        self.state = None;
    }

    fn push_notice(&mut self, notice: Notice) -> EtResult<()> {
        match self.queue.write(notice) {
            Ok(()) => Ok(()),
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("channel full, dropped {} ({})", notice.id, notice.label);
                Err(err)
            }
        }
    }
}

impl<C, const E: usize, const Q: usize> Default for Etask<C, E, Q> {
    fn default() -> Self {
        Self::new()
    }
}
