//! Multi-domain simulator driving the top-level design from a bus master.

use tracing::{debug, info};

use crate::cdc::ResetSynchronizer;
use crate::clock::{ClockDomain, DomainId, DomainScheduler, Edge, Tick};
use crate::master::BusMaster;
use crate::pll::PllClock;
use crate::top::Top;
use crate::{ConfigError, PllSolution, SimConfig};

/// Name of the reference domain.
pub const SYNC_DOMAIN: &str = "sync";
/// Name of the PLL output domain.
pub const PLL_DOMAIN: &str = "pll";

/// Output counters accumulated while running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimStats {
    /// Reference-domain edges.
    pub sync_ticks: u64,
    /// Signal-domain edges (equal to `sync_ticks` without a PLL).
    pub signal_ticks: u64,
    /// Signal-domain edges spent in reset.
    pub signal_reset_ticks: u64,
    /// Sine DAC ones after each signal edge.
    pub sine_ones: u64,
    /// Cosine DAC ones after each signal edge.
    pub cosine_ones: u64,
    /// Simulated time.
    pub time_ps: u64,
}

impl SimStats {
    /// Fraction of signal edges with a high sine bit.
    #[must_use]
    pub const fn sine_density(&self) -> f64 {
        density(self.sine_ones, self.signal_ticks)
    }

    /// Fraction of signal edges with a high cosine bit.
    #[must_use]
    pub const fn cosine_density(&self) -> f64 {
        density(self.cosine_ones, self.signal_ticks)
    }
}

#[allow(clippy::cast_precision_loss)]
const fn density(ones: u64, ticks: u64) -> f64 {
    if ticks == 0 {
        0.0
    } else {
        ones as f64 / ticks as f64
    }
}

/// Sine and cosine output bits, one entry per signal edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitstreams {
    /// Sine channel.
    pub sine: Vec<bool>,
    /// Cosine channel.
    pub cosine: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
struct PllDomain {
    id: DomainId,
    clock: PllClock,
    reset: ResetSynchronizer,
}

/// Top-level design, bus master and clock domains stepped together.
#[derive(Debug, Clone)]
pub struct Simulator<M> {
    top: Top,
    master: M,
    scheduler: DomainScheduler,
    sync: DomainId,
    pll: Option<PllDomain>,
    stats: SimStats,
    streams: Option<Bitstreams>,
}

impl<M: BusMaster> Simulator<M> {
    /// Builds the design and its clock domains from `config`.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the design, the clock domains or
    /// the PLL search.
    pub fn new(config: &SimConfig, firmware: &[u8], master: M) -> Result<Self, ConfigError> {
        let top = Top::new(config, firmware)?;
        let mut scheduler = DomainScheduler::new();
        let sync = scheduler.add(ClockDomain::from_hz(SYNC_DOMAIN, config.clock_hz)?)?;

        let pll = match config.pll {
            Some(pll) => {
                let clock = PllClock::new(config.clock_mhz(), pll.output_mhz, pll.lock_ticks)?;
                let domain = ClockDomain::from_hz(PLL_DOMAIN, clock.output_mhz() * 1e6)?;
                info!(
                    coefficients = %clock.solution().coefficients,
                    output_mhz = clock.output_mhz(),
                    period_ps = domain.period_ps(),
                    "pll domain"
                );
                Some(PllDomain {
                    id: scheduler.add(domain)?,
                    clock,
                    reset: ResetSynchronizer::new(pll.synchronizer_stages)?,
                })
            }
            None => None,
        };
        info!(
            clock_hz = config.clock_hz,
            nco_width = config.nco.width,
            nco_samples = config.nco.samples,
            memory_words = top.memory().len(),
            pll = pll.is_some(),
            "simulator ready"
        );

        Ok(Self {
            top,
            master,
            scheduler,
            sync,
            pll,
            stats: SimStats::default(),
            streams: None,
        })
    }

    /// Starts (or stops) keeping every output bit.
    pub fn record_streams(&mut self, record: bool) {
        self.streams = record.then(Bitstreams::default);
    }

    /// Recorded output bits, when recording is on.
    #[must_use]
    pub const fn streams(&self) -> Option<&Bitstreams> {
        self.streams.as_ref()
    }

    /// Design under simulation.
    #[must_use]
    pub const fn top(&self) -> &Top {
        &self.top
    }

    /// Bus master.
    #[must_use]
    pub const fn master(&self) -> &M {
        &self.master
    }

    /// Mutable bus master, for queueing more work between runs.
    pub const fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> SimStats {
        self.stats
    }

    /// PLL search result, when a PLL domain is configured.
    #[must_use]
    pub fn pll_solution(&self) -> Option<&PllSolution> {
        self.pll.as_ref().map(|pll| pll.clock.solution())
    }

    /// Whether the signal domain is currently held in reset.
    #[must_use]
    pub fn signal_in_reset(&self) -> bool {
        self.pll.as_ref().is_some_and(|pll| pll.reset.asserted())
    }

    /// Reference-domain edges so far.
    #[must_use]
    pub fn sync_ticks(&self) -> Tick {
        self.scheduler.ticks(self.sync)
    }

    /// Advances to the next edge of any domain.
    ///
    /// Every domain ticking at that instant is evaluated from the same
    /// snapshot before any of them commits.
    pub fn step(&mut self) -> Option<Edge> {
        let edge = self.scheduler.advance()?;
        let sync_edge = edge.domains.contains(self.sync);
        let signal_edge = self
            .pll
            .as_ref()
            .map_or(sync_edge, |pll| edge.domains.contains(pll.id));
        let in_reset = self.signal_in_reset();

        let bus_next = sync_edge.then(|| self.top.evaluate_bus(self.master.signals()));
        let signal_next = (signal_edge && !in_reset).then(|| self.top.evaluate_signal());
        let reset_next = self
            .pll
            .as_ref()
            .filter(|_| signal_edge)
            .map(|pll| pll.reset.evaluate(!pll.clock.locked()));

        if let Some(next) = &bus_next {
            self.top.commit_bus(next);
        }
        if signal_edge {
            match &signal_next {
                Some(next) => self.top.commit_signal(next),
                None => self.top.reset_signal(),
            }
        }
        if let Some(pll) = self.pll.as_mut() {
            if sync_edge {
                let was_locked = pll.clock.locked();
                pll.clock.tick_reference();
                if !was_locked && pll.clock.locked() {
                    debug!(time_ps = edge.time_ps, "pll locked");
                }
            }
            if let Some(next) = reset_next {
                pll.reset.commit(next);
            }
            pll.reset.apply_async(!pll.clock.locked());
        }
        if sync_edge {
            self.master.observe(self.top.response());
            self.stats.sync_ticks += 1;
        }
        if signal_edge {
            self.record_signal_edge(in_reset);
        }
        self.stats.time_ps = edge.time_ps;
        Some(edge)
    }

    fn record_signal_edge(&mut self, in_reset: bool) {
        let (sine, cosine) = (self.top.sine_out(), self.top.cosine_out());
        self.stats.signal_ticks += 1;
        self.stats.signal_reset_ticks += u64::from(in_reset);
        self.stats.sine_ones += u64::from(sine);
        self.stats.cosine_ones += u64::from(cosine);
        if let Some(streams) = self.streams.as_mut() {
            streams.sine.push(sine);
            streams.cosine.push(cosine);
        }
    }

    /// Runs until `ticks` more reference-domain edges have happened.
    pub fn run(&mut self, ticks: u64) -> SimStats {
        let target = self.stats.sync_ticks.saturating_add(ticks);
        while self.stats.sync_ticks < target {
            if self.step().is_none() {
                break;
            }
        }
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::Simulator;
    use crate::config::PllConfig;
    use crate::drivers::boot_sequence;
    use crate::master::ScriptedMaster;
    use crate::SimConfig;

    #[test]
    fn single_domain_ticks_bus_and_signal_together() {
        let mut sim = Simulator::new(&SimConfig::default(), &[], ScriptedMaster::default())
            .expect("default design");
        let stats = sim.run(100);
        assert_eq!(stats.sync_ticks, 100);
        assert_eq!(stats.signal_ticks, 100);
        assert_eq!(stats.time_ps, 100 * 62_500);
        assert!(!sim.signal_in_reset());
    }

    #[test]
    fn pll_domain_runs_faster_and_leaves_reset_after_lock() {
        let config = SimConfig {
            pll: Some(PllConfig {
                output_mhz: 48.0,
                lock_ticks: 4,
                synchronizer_stages: 2,
            }),
            ..SimConfig::default()
        };
        let mut sim = Simulator::new(&config, &[], ScriptedMaster::default()).expect("valid pll");
        assert!(sim.signal_in_reset());
        let stats = sim.run(100);
        assert_eq!(stats.signal_ticks, 300);
        assert!(stats.signal_reset_ticks >= 12);
        assert!(stats.signal_reset_ticks <= 14);
        assert!(!sim.signal_in_reset());
        assert_eq!(
            sim.pll_solution().map(|solution| solution.is_exact()),
            Some(true)
        );
    }

    #[test]
    fn boot_sequence_completes_and_lights_led() {
        let master = ScriptedMaster::new(boot_sequence(16e6, 1_000.0, b""));
        let mut sim = Simulator::new(&SimConfig::default(), &[], master).expect("default design");
        sim.run(20);
        assert!(sim.master().is_done());
        assert_eq!(sim.master().completions().len(), 3);
        assert!(sim.top().led());
        assert_eq!(sim.top().nco_control().step, 268_435);
        assert!(sim.top().nco_control().enable);
    }
}
