//! Flavors this host knows how to run. Selected by the `flavor` field of the
//! container config; there is no runtime plugin discovery.

use std::fmt;
use std::str::FromStr;

use color_eyre::eyre::eyre;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlavorKind {
    Maven,
}

impl FlavorKind {
    pub const ALL: &'static [FlavorKind] = &[FlavorKind::Maven];

    pub fn name(self) -> &'static str {
        match self {
            Self::Maven => "maven",
        }
    }
}

impl fmt::Display for FlavorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlavorKind {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                eyre!("unknown flavor '{s}' (known: {})", known.join(", "))
            })
    }
}
