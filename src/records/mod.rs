//! Write-path rules: duplicate prevention and merge-updates.

mod conflict;
mod merge;

pub use conflict::*;
