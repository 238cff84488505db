//! Stochastic fill model.
//!
//! Three boolean oracles decide the marginal cases the tick alone cannot:
//! whether a stop or limit touched exactly at its price fills, and whether a
//! marketable order slips one tick. Probabilities of 0.0 or 1.0 make an
//! oracle deterministic, which is how tests pin behavior. The RNG is seeded
//! so a given seed replays identically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FillModelError {
    #[error("fill probability out of range [0, 1]: {0}")]
    ProbabilityOutOfRange(f64),
}

#[derive(Debug, Clone)]
pub struct FillModel {
    prob_fill_on_stop: f64,
    prob_fill_on_limit: f64,
    prob_slippage: f64,
    rng: StdRng,
}

impl FillModel {
    pub fn new(
        prob_fill_on_stop: f64,
        prob_fill_on_limit: f64,
        prob_slippage: f64,
        seed: Option<u64>,
    ) -> Result<Self, FillModelError> {
        for p in [prob_fill_on_stop, prob_fill_on_limit, prob_slippage] {
            if !(0.0..=1.0).contains(&p) {
                return Err(FillModelError::ProbabilityOutOfRange(p));
            }
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            prob_fill_on_stop,
            prob_fill_on_limit,
            prob_slippage,
            rng,
        })
    }

    /// Does a stop touched exactly at its trigger fill?
    pub fn is_stop_filled(&mut self) -> bool {
        let p = self.prob_fill_on_stop;
        self.event_occurs(p)
    }

    /// Does a limit touched exactly at its price fill?
    pub fn is_limit_filled(&mut self) -> bool {
        let p = self.prob_fill_on_limit;
        self.event_occurs(p)
    }

    /// Does a marketable fill slip one tick against the order?
    pub fn is_slipped(&mut self) -> bool {
        let p = self.prob_slippage;
        self.event_occurs(p)
    }

    fn event_occurs(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen::<f64>() < probability
    }
}

impl Default for FillModel {
    /// Stops fill on touch, limits do not, no slippage.
    fn default() -> Self {
        Self {
            prob_fill_on_stop: 1.0,
            prob_fill_on_limit: 0.0,
            prob_slippage: 0.0,
            rng: StdRng::from_entropy(),
        }
    }
}
