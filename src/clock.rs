//! Epidemic clock: batched countdown updates and compartment transitions.
//!
//! Every pass first selects the affected vertices, then computes the new
//! countdowns from that selection, then applies the transitions. No vertex
//! sees another vertex's transition from the same pass.

use crate::error::{NetworkError, Result};
use crate::graph::Topology;
use crate::network::{Agent, Compartment, Network};

/// Vertices that changed compartment during a tick.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Transitions {
    /// Went from infectious to recovered.
    pub recovered: Vec<usize>,
    /// Went from recovered back to susceptible.
    pub susceptible: Vec<usize>,
}

struct Countdown {
    from: Compartment,
    to: Compartment,
    timer: fn(&mut Agent) -> (&mut u32, u32),
}

fn infectious_timer(agent: &mut Agent) -> (&mut u32, u32) {
    (&mut agent.infectious_time, agent.initial_infectious_time)
}

fn recovered_timer(agent: &mut Agent) -> (&mut u32, u32) {
    (&mut agent.recovered_time, agent.initial_recovered_time)
}

const INFECTIOUS: Countdown = Countdown {
    from: Compartment::Infectious,
    to: Compartment::Recovered,
    timer: infectious_timer,
};

const RECOVERED: Countdown = Countdown {
    from: Compartment::Recovered,
    to: Compartment::Susceptible,
    timer: recovered_timer,
};

impl<G: Topology> Network<G> {
    /// Count down every infectious vertex and move the expired ones to recovered.
    ///
    /// Returns the ids of the vertices that recovered.
    pub fn advance_infectious(&mut self) -> Result<Vec<usize>> {
        let selected = self.select(Compartment::Infectious);
        self.advance(&INFECTIOUS, &selected)
    }

    /// Count down every recovered vertex and move the expired ones to susceptible.
    ///
    /// Returns the ids of the vertices that lost their immunity.
    pub fn advance_recovered(&mut self) -> Result<Vec<usize>> {
        let selected = self.select(Compartment::Recovered);
        self.advance(&RECOVERED, &selected)
    }

    /// Advance both countdowns by one step.
    ///
    /// Both compartments are selected before either pass runs, so a vertex that
    /// recovers in this tick does not also count down its immunity. With
    /// `waning` unset only the infectious pass runs.
    pub fn tick(&mut self, waning: bool) -> Result<Transitions> {
        let infectious = self.select(Compartment::Infectious);
        let recovered = if waning {
            self.select(Compartment::Recovered)
        } else {
            Vec::new()
        };
        Ok(Transitions {
            recovered: self.advance(&INFECTIOUS, &infectious)?,
            susceptible: self.advance(&RECOVERED, &recovered)?,
        })
    }

    fn advance(&mut self, countdown: &Countdown, selected: &[usize]) -> Result<Vec<usize>> {
        let mut remaining = Vec::with_capacity(selected.len());
        for &v in selected {
            let (time, _) = (countdown.timer)(&mut self.agents[v]);
            let time = time.checked_sub(1).ok_or_else(|| {
                NetworkError::Invariant(format!("vertex {v} has an expired countdown"))
            })?;
            remaining.push(time);
        }

        let mut expired = Vec::new();
        for (&v, time) in selected.iter().zip(remaining) {
            let agent = &mut self.agents[v];
            debug_assert_eq!(agent.compartment, countdown.from);
            let (timer, initial) = (countdown.timer)(agent);
            if time == 0 {
                *timer = initial;
                agent.compartment = countdown.to;
                expired.push(v);
            } else {
                *timer = time;
            }
        }

        Ok(expired)
    }
}
