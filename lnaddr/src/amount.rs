//! Satoshi and millisatoshi amounts.
//!
//! Configuration and backend calls use whole satoshis. Millisatoshis only
//! appear at the protocol boundary, in the LNURL response fields.

pub use lnaddr_proto::MilliSats;

/// Amount expressed in whole satoshis.
pub type Sats = u64;

/// Millisatoshis per satoshi.
pub const MSAT_PER_SAT: u64 = 1_000;

/// Converts millisatoshis to satoshis, rounding up.
///
/// Rounding up guarantees the backend never receives less than the payer
/// authorized.
#[must_use]
pub const fn msat_to_sats_ceil(msat: MilliSats) -> Sats {
    msat.div_ceil(MSAT_PER_SAT)
}

/// Converts satoshis to millisatoshis, saturating at `u64::MAX`.
#[must_use]
pub const fn sats_to_msat(sats: Sats) -> MilliSats {
    sats.saturating_mul(MSAT_PER_SAT)
}

/// Converts satoshis to millisatoshis, or `None` on overflow.
#[must_use]
pub const fn checked_sats_to_msat(sats: Sats) -> Option<MilliSats> {
    sats.checked_mul(MSAT_PER_SAT)
}
