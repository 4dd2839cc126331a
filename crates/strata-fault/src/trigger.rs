use serde::{Deserialize, Serialize};

/// When an armed fault point actually fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Fire on every check.
    Always,
    /// Fire on the first check only, then disarm.
    Once,
    /// Fire with probability `numerator / denominator` per check.
    Random { numerator: u32, denominator: u32 },
    /// Skip `skip` checks, fire the next `fire`, then repeat.
    NAndM { skip: u32, fire: u32 },
}

/// Armed point state: the mode plus its mutable counters.
#[derive(Clone, Debug)]
pub(crate) struct Trigger {
    mode: TriggerMode,
    /// Checks seen since arming (or since the last cycle for `NAndM`).
    hits: u32,
    /// Set once a `Once` trigger has fired.
    spent: bool,
}

impl Trigger {
    pub(crate) fn new(mode: TriggerMode) -> Self {
        Self {
            mode,
            hits: 0,
            spent: false,
        }
    }

    pub(crate) fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Returns `true` if the trigger can still fire on some future check.
    pub(crate) fn is_live(&self) -> bool {
        match self.mode {
            TriggerMode::Once => !self.spent,
            TriggerMode::NAndM { fire, .. } => fire > 0,
            TriggerMode::Random { numerator, .. } => numerator > 0,
            TriggerMode::Always => true,
        }
    }

    /// Evaluate one check, advancing internal counters.
    pub(crate) fn fire(&mut self) -> bool {
        match self.mode {
            TriggerMode::Always => true,
            TriggerMode::Once => {
                if self.spent {
                    false
                } else {
                    self.spent = true;
                    true
                }
            }
            TriggerMode::Random {
                numerator,
                denominator,
            } => {
                if denominator == 0 {
                    return false;
                }
                rand::Rng::gen_range(&mut rand::thread_rng(), 0..denominator) < numerator
            }
            TriggerMode::NAndM { skip, fire } => {
                let cycle = skip + fire;
                if cycle == 0 {
                    return false;
                }
                let pos = self.hits % cycle;
                self.hits = self.hits.wrapping_add(1);
                pos >= skip
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_fires_every_time() {
        let mut t = Trigger::new(TriggerMode::Always);
        for _ in 0..10 {
            assert!(t.fire());
        }
        assert!(t.is_live());
    }

    #[test]
    fn once_fires_exactly_once() {
        let mut t = Trigger::new(TriggerMode::Once);
        assert!(t.fire());
        for _ in 0..10 {
            assert!(!t.fire());
        }
        assert!(!t.is_live());
    }

    #[test]
    fn n_and_m_skips_then_fires() {
        let mut t = Trigger::new(TriggerMode::NAndM { skip: 2, fire: 3 });
        let observed: Vec<bool> = (0..10).map(|_| t.fire()).collect();
        assert_eq!(
            observed,
            vec![false, false, true, true, true, false, false, true, true, true]
        );
    }

    #[test]
    fn n_and_m_with_zero_fire_never_fires() {
        let mut t = Trigger::new(TriggerMode::NAndM { skip: 3, fire: 0 });
        assert!(!t.is_live());
        for _ in 0..10 {
            assert!(!t.fire());
        }
    }

    #[test]
    fn random_zero_numerator_never_fires() {
        let mut t = Trigger::new(TriggerMode::Random {
            numerator: 0,
            denominator: 100,
        });
        for _ in 0..100 {
            assert!(!t.fire());
        }
    }

    #[test]
    fn random_full_numerator_always_fires() {
        let mut t = Trigger::new(TriggerMode::Random {
            numerator: 10,
            denominator: 10,
        });
        for _ in 0..100 {
            assert!(t.fire());
        }
    }

    #[test]
    fn random_zero_denominator_never_fires() {
        let mut t = Trigger::new(TriggerMode::Random {
            numerator: 1,
            denominator: 0,
        });
        assert!(!t.fire());
    }
}
