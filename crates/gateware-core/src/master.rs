//! Bus masters that drive the mediator in place of a CPU core.

use std::collections::VecDeque;

use tracing::trace;

use crate::bus::{BusRequest, BusResponse, BusSignals};
use crate::Tick;

/// Anything that drives the master side of the bus.
///
/// At every bus-domain edge the simulator samples [`BusMaster::signals`],
/// clocks the design, then reports the registered response through
/// [`BusMaster::observe`].
pub trait BusMaster {
    /// Signals driven for the coming edge.
    fn signals(&self) -> BusSignals;

    /// Response registered by the edge that just happened.
    fn observe(&mut self, response: BusResponse);
}

/// One scripted bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusOp {
    /// Full-word write.
    Write {
        /// Byte address.
        address: u32,
        /// Write data.
        data: u32,
    },
    /// Word read.
    Read {
        /// Byte address.
        address: u32,
    },
    /// Read, then write back `(value & !clear) | set`.
    Modify {
        /// Byte address.
        address: u32,
        /// Bits to set.
        set: u32,
        /// Bits to clear.
        clear: u32,
    },
    /// Leave `valid` low for a number of edges.
    Idle {
        /// Edges to wait.
        ticks: u64,
    },
}

/// A finished transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Completion {
    /// Operation that completed.
    pub op: BusOp,
    /// Data returned by a read (the read half of a modify included).
    pub read_data: Option<u32>,
    /// Edges observed when the operation was first driven.
    pub issued_at: Tick,
    /// Edges observed when its final `ready` was seen.
    pub completed_at: Tick,
}

impl Completion {
    /// Edges between issue and completion.
    #[must_use]
    pub const fn latency(&self) -> u64 {
        self.completed_at.get().saturating_sub(self.issued_at.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Transaction {
        op: BusOp,
        request: BusRequest,
        issued_at: Tick,
        read_data: Option<u32>,
    },
    Idle {
        remaining: u64,
    },
}

/// Master that plays a fixed list of operations, one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedMaster {
    queue: VecDeque<BusOp>,
    active: Option<Active>,
    edges: Tick,
    completions: Vec<Completion>,
}

impl ScriptedMaster {
    /// Master that will play `ops` in order.
    #[must_use]
    pub fn new(ops: impl IntoIterator<Item = BusOp>) -> Self {
        let mut master = Self {
            queue: ops.into_iter().collect(),
            ..Self::default()
        };
        master.load_next();
        master
    }

    /// Appends `op` after the operations already queued.
    pub fn push(&mut self, op: BusOp) {
        self.queue.push_back(op);
        if self.active.is_none() {
            self.load_next();
        }
    }

    /// Finished transactions, oldest first.
    #[must_use]
    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    /// Whether every queued operation has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Operation currently being driven.
    #[must_use]
    pub fn current(&self) -> Option<BusOp> {
        match self.active? {
            Active::Transaction { op, .. } => Some(op),
            Active::Idle { remaining } => Some(BusOp::Idle { ticks: remaining }),
        }
    }

    /// Edges observed so far.
    #[must_use]
    pub const fn edges(&self) -> Tick {
        self.edges
    }

    fn load_next(&mut self) {
        self.active = None;
        while let Some(op) = self.queue.pop_front() {
            let request = match op {
                BusOp::Write { address, data } => BusRequest::write(address, data),
                BusOp::Read { address } | BusOp::Modify { address, .. } => {
                    BusRequest::read(address)
                }
                BusOp::Idle { ticks: 0 } => continue,
                BusOp::Idle { ticks } => {
                    self.active = Some(Active::Idle { remaining: ticks });
                    return;
                }
            };
            self.active = Some(Active::Transaction {
                op,
                request,
                issued_at: self.edges,
                read_data: None,
            });
            return;
        }
    }

    fn complete(&mut self, op: BusOp, issued_at: Tick, read_data: Option<u32>) {
        let completion = Completion {
            op,
            read_data,
            issued_at,
            completed_at: self.edges,
        };
        trace!(?op, latency = completion.latency(), "bus op complete");
        self.completions.push(completion);
        self.active = None;
    }
}

impl BusMaster for ScriptedMaster {
    fn signals(&self) -> BusSignals {
        match self.active {
            Some(Active::Transaction { request, .. }) => BusSignals::active(request),
            _ => BusSignals::IDLE,
        }
    }

    fn observe(&mut self, response: BusResponse) {
        self.edges = self.edges.next();
        match self.active {
            Some(Active::Transaction {
                op,
                request,
                issued_at,
                read_data,
            }) if response.ready => match (op, request.is_write()) {
                (BusOp::Modify { set, clear, .. }, false) => {
                    let value = (response.read_data & !clear) | set;
                    self.active = Some(Active::Transaction {
                        op,
                        request: BusRequest::write(request.address, value),
                        issued_at,
                        read_data: Some(response.read_data),
                    });
                }
                (BusOp::Read { .. }, _) => {
                    self.complete(op, issued_at, Some(response.read_data));
                }
                _ => self.complete(op, issued_at, read_data),
            },
            Some(Active::Idle { remaining }) => {
                self.active = (remaining > 1).then(|| Active::Idle {
                    remaining: remaining - 1,
                });
            }
            _ => {}
        }
        if self.active.is_none() {
            self.load_next();
        }
    }
}
