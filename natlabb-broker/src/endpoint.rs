//! Broker endpoint failover selection.

use rand::seq::IndexedRandom;
use rand::Rng;

/// Pick the endpoint to (re)connect to after a failover event.
///
/// Uniform random choice over the full candidate list: no preference for
/// recently used endpoints and no exclusion of the one that just failed.
/// Randomness is injected so tests can seed it.
pub fn pick_endpoint<'a, R: Rng + ?Sized>(
    candidates: &'a [String],
    rng: &mut R,
) -> Option<&'a String> {
    candidates.choose(rng)
}
