//! Clock domains and the edge scheduler that interleaves them.
//!
//! Time is kept in integer picoseconds. Domains with no declared phase
//! relationship are interleaved by their rising edges; edges that land on the
//! same picosecond are reported together so the caller can evaluate every
//! ticking domain from one snapshot before committing any of them.

use std::fmt;

use crate::ConfigError;

/// Picoseconds per second.
pub const PICOS_PER_SECOND: f64 = 1e12;
/// Most domains one scheduler can interleave.
pub const MAX_DOMAINS: usize = 64;

/// Count of edges a domain has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Tick(pub u64);

impl Tick {
    /// No edges yet.
    pub const ZERO: Self = Self(0);

    /// Raw edge count.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The following edge.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named periodic time base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClockDomain {
    name: String,
    period_ps: u64,
}

impl ClockDomain {
    /// Creates a domain running at `hz`, with the period rounded to whole picoseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidClockFrequency`] for non-finite or
    /// non-positive frequencies, or ones above 1 THz.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn from_hz(name: impl Into<String>, hz: f64) -> Result<Self, ConfigError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ConfigError::InvalidClockFrequency { hz });
        }
        let period_ps = (PICOS_PER_SECOND / hz).round();
        if period_ps < 1.0 || period_ps >= u64::MAX as f64 {
            return Err(ConfigError::InvalidClockFrequency { hz });
        }
        Ok(Self {
            name: name.into(),
            period_ps: period_ps as u64,
        })
    }

    /// Domain name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Period between rising edges.
    #[must_use]
    pub const fn period_ps(&self) -> u64 {
        self.period_ps
    }

    /// Frequency implied by the rounded period.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn frequency_hz(&self) -> f64 {
        PICOS_PER_SECOND / self.period_ps as f64
    }
}

/// Handle to a domain registered with a [`DomainScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainId(usize);

impl DomainId {
    /// Registration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Set of domains with an edge at the same instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DomainSet(u64);

impl DomainSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Whether `id` is a member.
    #[must_use]
    pub const fn contains(self, id: DomainId) -> bool {
        id.0 < MAX_DOMAINS && self.0 & (1 << id.0) != 0
    }

    /// Adds `id` to the set.
    #[must_use]
    pub const fn with(self, id: DomainId) -> Self {
        if id.0 < MAX_DOMAINS {
            Self(self.0 | (1 << id.0))
        } else {
            self
        }
    }

    /// Whether no domain is a member.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of members.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }
}

/// An instant at which one or more domains tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Absolute time of the edge.
    pub time_ps: u64,
    /// Domains with a rising edge at `time_ps`.
    pub domains: DomainSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DomainSlot {
    domain: ClockDomain,
    next_edge_ps: u64,
    ticks: Tick,
}

/// Interleaves independent clock domains by rising edge.
///
/// The first edge of every domain falls one period after time zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainScheduler {
    slots: Vec<DomainSlot>,
    now_ps: u64,
}

impl DomainScheduler {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            now_ps: 0,
        }
    }

    /// Registers `domain`, returning its handle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooManyDomains`] past [`MAX_DOMAINS`].
    pub fn add(&mut self, domain: ClockDomain) -> Result<DomainId, ConfigError> {
        if self.slots.len() >= MAX_DOMAINS {
            return Err(ConfigError::TooManyDomains {
                count: self.slots.len() + 1,
            });
        }
        let id = DomainId(self.slots.len());
        self.slots.push(DomainSlot {
            next_edge_ps: self.now_ps.saturating_add(domain.period_ps),
            domain,
            ticks: Tick::ZERO,
        });
        Ok(id)
    }

    /// Current time.
    #[must_use]
    pub const fn now_ps(&self) -> u64 {
        self.now_ps
    }

    /// Registered domain for `id`.
    #[must_use]
    pub fn domain(&self, id: DomainId) -> Option<&ClockDomain> {
        self.slots.get(id.0).map(|slot| &slot.domain)
    }

    /// Edges `id` has seen so far.
    #[must_use]
    pub fn ticks(&self, id: DomainId) -> Tick {
        self.slots.get(id.0).map_or(Tick::ZERO, |slot| slot.ticks)
    }

    /// Moves time to the earliest pending edge and returns every domain ticking there.
    ///
    /// Returns `None` when no domain is registered.
    pub fn advance(&mut self) -> Option<Edge> {
        let time_ps = self.slots.iter().map(|slot| slot.next_edge_ps).min()?;
        let mut domains = DomainSet::EMPTY;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.next_edge_ps == time_ps {
                domains = domains.with(DomainId(index));
                slot.next_edge_ps = slot.next_edge_ps.saturating_add(slot.domain.period_ps);
                slot.ticks = slot.ticks.next();
            }
        }
        self.now_ps = time_ps;
        Some(Edge { time_ps, domains })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ClockDomain, DomainScheduler, Tick, MAX_DOMAINS};
    use crate::{ConfigError, ErrorClass};

    #[rstest]
    #[case(16e6, 62_500)]
    #[case(50e6, 20_000)]
    #[case(48e6, 20_833)]
    fn period_rounds_to_picoseconds(#[case] hz: f64, #[case] period: u64) {
        let domain = ClockDomain::from_hz("sync", hz).expect("valid clock");
        assert_eq!(domain.period_ps(), period);
        assert_eq!(domain.name(), "sync");
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(1e13)]
    fn unusable_frequencies_are_rejected(#[case] hz: f64) {
        assert!(matches!(
            ClockDomain::from_hz("bad", hz),
            Err(ConfigError::InvalidClockFrequency { .. })
        ));
    }

    #[test]
    fn simultaneous_edges_are_reported_together() {
        let mut scheduler = DomainScheduler::new();
        let sync = scheduler
            .add(ClockDomain::from_hz("sync", 16e6).expect("valid clock"))
            .expect("room for domain");
        let pll = scheduler
            .add(ClockDomain::from_hz("pll", 50e6).expect("valid clock"))
            .expect("room for domain");

        let mut both = 0;
        while scheduler.now_ps() < 500_000 {
            let edge = scheduler.advance().expect("domains registered");
            if edge.domains.contains(sync) && edge.domains.contains(pll) {
                both += 1;
                assert_eq!(edge.time_ps, 500_000);
            }
        }
        assert_eq!(both, 1);
        assert_eq!(scheduler.ticks(sync), Tick(8));
        assert_eq!(scheduler.ticks(pll), Tick(25));
    }

    #[rstest]
    #[case(MAX_DOMAINS + 1)]
    #[case(MAX_DOMAINS + 5)]
    fn scheduler_refuses_domains_past_the_limit(#[case] requested: usize) {
        let mut scheduler = DomainScheduler::new();
        let domain = ClockDomain::from_hz("sync", 16e6).expect("valid clock");
        for _ in 0..MAX_DOMAINS {
            scheduler.add(domain.clone()).expect("room for domain");
        }
        for _ in MAX_DOMAINS..requested {
            let error = scheduler.add(domain.clone()).expect_err("scheduler full");
            assert_eq!(error, ConfigError::TooManyDomains { count: MAX_DOMAINS + 1 });
            assert_eq!(error.class(), ErrorClass::Clock);
        }
        assert!(scheduler.advance().is_some());
    }

    #[test]
    fn empty_scheduler_never_advances() {
        let mut scheduler = DomainScheduler::new();
        assert!(scheduler.advance().is_none());
        assert_eq!(scheduler.now_ps(), 0);
    }
}
