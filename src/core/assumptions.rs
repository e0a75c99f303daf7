//! Caller-declared assumptions about the operator, consumed by default
//! algorithm selection.
//!
//! `OperatorAssumptions` is an immutable value constructed once per problem.
//! The conditioning level encodes a safety/speed trade-off: the more
//! conservative the assumption, the safer (and slower) the factorization
//! picked by [`crate::solver::default_algorithm`]. `WellConditioned` permits
//! the fastest defaults; `SuperIllConditioned` forces the most robust ones.

/// Tri-state squareness of the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Squareness {
    /// The operator is known to be square.
    Square,
    /// The operator is known to be non-square.
    NonSquare,
    /// Nothing is known about the operator's shape.
    #[default]
    Unknown,
}

impl Squareness {
    /// Build from an optional flag; `None` means unknown.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Squareness::Square,
            Some(false) => Squareness::NonSquare,
            None => Squareness::Unknown,
        }
    }
}

/// Assumed conditioning of the operator, ordered from least to most
/// conservative default algorithm choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Condition {
    /// Conditioning is benign; fast defaults are acceptable.
    WellConditioned,
    /// Moderately ill-conditioned (the default assumption).
    #[default]
    IllConditioned,
    /// Pivoted/orthogonal methods required.
    VeryIllConditioned,
    /// Only rank-revealing methods are trustworthy.
    SuperIllConditioned,
}

/// Shape and conditioning assumptions for one problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorAssumptions {
    issquare: Squareness,
    condition: Condition,
}

impl OperatorAssumptions {
    /// Construct from an optional squareness flag and a conditioning level.
    pub fn new(issquare: Option<bool>, condition: Condition) -> Self {
        Self { issquare: Squareness::from_flag(issquare), condition }
    }

    /// Derive the squareness from an operator's actual shape; conditioning
    /// falls back to the default assumption.
    pub fn from_shape(nrows: usize, ncols: usize) -> Self {
        Self {
            issquare: Squareness::from_flag(Some(nrows == ncols)),
            condition: Condition::default(),
        }
    }

    pub fn issquare(&self) -> Squareness {
        self.issquare
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }
}
