use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{ConfigError, Mass, MassKind, MassScale};

impl Mass {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for Mass {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s.trim()).map(Self)
    }
}

impl MassKind {
    pub const ALL: [Self; 2] = [Self::Monoisotopic, Self::Average];
}

impl MassScale {
    pub fn integral(factor: u64) -> Result<Self, ConfigError> {
        factor
            .try_into()
            .map(Self::Integral)
            .map_err(|_| ConfigError::ZeroMassFactor)
    }

    #[must_use]
    pub fn apply(self, value: Decimal) -> Mass {
        match self {
            Self::Exact => Mass(value.normalize()),
            Self::Integral(factor) => Mass((value * Decimal::from(factor.get())).round()),
        }
    }
}
