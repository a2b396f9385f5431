//! `ManyState` — the orthogonal flag bits carried by every `Many` (spec §3:
//! "carries state bits {empty, typed, sparse, constant, missing, past,
//! future, or-branching}").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct ManyState(u16);

impl ManyState {
    pub const EMPTY: ManyState = ManyState(1 << 0);
    pub const TYPED: ManyState = ManyState(1 << 1);
    pub const SPARSE: ManyState = ManyState(1 << 2);
    pub const CONSTANT: ManyState = ManyState(1 << 3);
    pub const MISSING: ManyState = ManyState(1 << 4);
    pub const PAST: ManyState = ManyState(1 << 5);
    pub const FUTURE: ManyState = ManyState(1 << 6);
    pub const OR_BRANCHING: ManyState = ManyState(1 << 7);

    pub fn none() -> Self {
        ManyState(0)
    }

    pub fn contains(self, flag: ManyState) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn with(self, flag: ManyState) -> Self {
        ManyState(self.0 | flag.0)
    }

    pub fn without(self, flag: ManyState) -> Self {
        ManyState(self.0 & !flag.0)
    }

    pub fn is_empty(self) -> bool {
        self.contains(Self::EMPTY)
    }

    pub fn is_typed(self) -> bool {
        self.contains(Self::TYPED)
    }

    pub fn is_sparse(self) -> bool {
        self.contains(Self::SPARSE)
    }

    pub fn is_dense(self) -> bool {
        !self.is_sparse()
    }

    pub fn is_constant(self) -> bool {
        self.contains(Self::CONSTANT)
    }

    pub fn is_missing(self) -> bool {
        self.contains(Self::MISSING)
    }

    pub fn is_past(self) -> bool {
        self.contains(Self::PAST)
    }

    pub fn is_future(self) -> bool {
        self.contains(Self::FUTURE)
    }

    pub fn is_or(self) -> bool {
        self.contains(Self::OR_BRANCHING)
    }

    pub fn is_and(self) -> bool {
        !self.is_or()
    }

    pub fn make_or(self) -> Self {
        self.with(Self::OR_BRANCHING)
    }

    pub fn make_and(self) -> Self {
        self.without(Self::OR_BRANCHING)
    }

    pub fn make_past(self) -> Self {
        self.with(Self::PAST).with(Self::MISSING)
    }

    pub fn make_future(self) -> Self {
        self.with(Self::FUTURE).with(Self::MISSING)
    }

    pub fn make_missing(self) -> Self {
        self.with(Self::MISSING)
    }

    pub fn make_const(self) -> Self {
        self.with(Self::CONSTANT)
    }
}

impl std::ops::BitOr for ManyState {
    type Output = ManyState;
    fn bitor(self, rhs: ManyState) -> ManyState {
        self.with(rhs)
    }
}
