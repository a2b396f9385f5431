//! Scalar modifiers (C1): the four-real `Charge` and the verb-state bitset.

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Four reals applied to verbs and constructs: `mass`, `rate`, `time`, `priority`.
///
/// `mass` defaults to 1, the other three default to 0. Multiplying a charge
/// scales `mass`; raising it to a power scales `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub mass: f64,
    pub rate: f64,
    pub time: f64,
    pub priority: f64,
}

impl Default for Charge {
    fn default() -> Self {
        Charge { mass: 1.0, rate: 0.0, time: 0.0, priority: 0.0 }
    }
}

impl Charge {
    pub fn new(mass: f64, rate: f64, time: f64, priority: f64) -> Self {
        Charge { mass, rate, time, priority }
    }

    /// `charge * k` scales mass.
    pub fn mul(self, k: f64) -> Self {
        Charge { mass: self.mass * k, ..self }
    }

    /// `charge ^ k` scales rate.
    pub fn pow(self, k: f64) -> Self {
        Charge { rate: self.rate * k, ..self }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Charge::default()
    }

    /// A charge is flow-dependent iff rate or time is non-zero.
    pub fn is_flow_dependent(&self) -> bool {
        self.rate != 0.0 || self.time != 0.0
    }

    pub fn hash_into(&self, hasher: &mut FnvHasher) {
        self.mass.to_bits().hash(hasher);
        self.rate.to_bits().hash(hasher);
        self.time.to_bits().hash(hasher);
        self.priority.to_bits().hash(hasher);
    }
}

impl std::ops::Mul<f64> for Charge {
    type Output = Charge;
    fn mul(self, k: f64) -> Charge {
        Charge::mul(self, k)
    }
}

impl std::ops::BitXor<f64> for Charge {
    type Output = Charge;
    fn bitxor(self, k: f64) -> Charge {
        Charge::pow(self, k)
    }
}

/// Verb-state flags. Defaults: short-circuited (not long-circuited), multicast
/// (not monocast). Independent bits, with `+ - & %` set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerbState(u8);

impl VerbState {
    pub const LONG_CIRCUITED: VerbState = VerbState(1 << 0);
    pub const MONOCAST: VerbState = VerbState(1 << 1);

    pub fn empty() -> Self {
        VerbState(0)
    }

    pub fn is_long_circuited(&self) -> bool {
        self.0 & Self::LONG_CIRCUITED.0 != 0
    }

    pub fn is_short_circuited(&self) -> bool {
        !self.is_long_circuited()
    }

    pub fn is_monocast(&self) -> bool {
        self.0 & Self::MONOCAST.0 != 0
    }

    pub fn is_multicast(&self) -> bool {
        !self.is_monocast()
    }

    pub fn is_default(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, flag: VerbState) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl std::ops::Add for VerbState {
    type Output = VerbState;
    fn add(self, rhs: VerbState) -> VerbState {
        VerbState(self.0 | rhs.0)
    }
}

impl std::ops::Sub for VerbState {
    type Output = VerbState;
    fn sub(self, rhs: VerbState) -> VerbState {
        VerbState(self.0 & !rhs.0)
    }
}

impl std::ops::BitAnd for VerbState {
    type Output = VerbState;
    fn bitand(self, rhs: VerbState) -> VerbState {
        VerbState(self.0 & rhs.0)
    }
}

impl std::ops::Rem for VerbState {
    type Output = VerbState;
    fn rem(self, rhs: VerbState) -> VerbState {
        VerbState(self.0 ^ rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_charge_is_mass_one() {
        let c = Charge::default();
        assert_eq!(c.mass, 1.0);
        assert_eq!(c.rate, 0.0);
        assert!(c.is_default());
    }

    #[test]
    fn mul_scales_mass_only() {
        let c = Charge::default() * 2.0;
        assert_eq!(c.mass, 2.0);
        assert_eq!(c.rate, 0.0);
    }

    #[test]
    fn pow_scales_rate_only() {
        let c = Charge::default() ^ 3.0;
        assert_eq!(c.rate, 0.0); // rate starts at 0, scaling 0 stays 0
        let c2 = Charge::new(1.0, 2.0, 0.0, 0.0) ^ 3.0;
        assert_eq!(c2.rate, 6.0);
    }

    #[test]
    fn flow_dependent_checks_rate_and_time() {
        assert!(!Charge::default().is_flow_dependent());
        assert!(Charge::new(1.0, 1.0, 0.0, 0.0).is_flow_dependent());
        assert!(Charge::new(1.0, 0.0, 1.0, 0.0).is_flow_dependent());
    }

    #[test]
    fn verb_state_defaults_short_multicast() {
        let s = VerbState::default();
        assert!(s.is_short_circuited());
        assert!(s.is_multicast());
        assert!(s.is_default());
    }

    #[test]
    fn verb_state_flags_are_independent() {
        let s = VerbState::LONG_CIRCUITED;
        assert!(s.is_long_circuited());
        assert!(s.is_multicast());
        let s2 = s + VerbState::MONOCAST;
        assert!(s2.is_long_circuited());
        assert!(s2.is_monocast());
        let s3 = s2 - VerbState::LONG_CIRCUITED;
        assert!(s3.is_short_circuited());
        assert!(s3.is_monocast());
    }

    #[test]
    fn verb_state_and_rem_operate_bitwise() {
        let a = VerbState::LONG_CIRCUITED + VerbState::MONOCAST;
        let b = VerbState::LONG_CIRCUITED;
        assert_eq!(a & b, VerbState::LONG_CIRCUITED);
        assert_eq!(a % b, VerbState::MONOCAST);
    }
}
