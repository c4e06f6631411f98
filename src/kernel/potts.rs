// ============================================================
// Layer 5 — Potts Monte-Carlo Sweeps
// ============================================================
// One sweep = one half-sweep per checkerboard colour. In a
// half-sweep every site of that colour proposes to take the id
// of a random neighbour:
//
//   ΔE = unlike neighbours after − unlike neighbours before
//   accept if ΔE ≤ 0, else with probability exp(−ΔE / kT)
//
// Sites of one colour only have neighbours of the other colour,
// so all proposals of a half-sweep read a frozen snapshot and
// can be evaluated in parallel. Each block of sites draws from
// its own RNG stream keyed by (seed, sweep, colour, block), which
// keeps the result independent of the thread count.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::kernel::lattice::Lattice;

/// Sites per RNG stream
const BLOCK: usize = 4096;

/// Apply `sweeps` full Monte-Carlo sweeps at temperature `kt`.
pub fn run<const D: usize>(lattice: &mut Lattice<D>, sweeps: u64, kt: f64, seed: u64) {
    for _ in 0..sweeps {
        for colour in 0..2 {
            let next = half_sweep(lattice, colour, kt, seed);
            lattice.set_ids(next);
        }
        lattice.advance_sweeps();
    }
}

fn half_sweep<const D: usize>(lattice: &Lattice<D>, colour: usize, kt: f64, seed: u64) -> Vec<u32> {
    let mut next = lattice.ids().to_vec();
    let sweep    = lattice.sweeps();

    next.par_chunks_mut(BLOCK)
        .enumerate()
        .for_each(|(block, out)| {
            let mut rng = StdRng::seed_from_u64(stream_seed(seed, sweep, colour, block));
            for (k, slot) in out.iter_mut().enumerate() {
                let site = block * BLOCK + k;
                if lattice.colour(site) == colour {
                    *slot = propose(lattice, site, kt, &mut rng);
                }
            }
        });
    next
}

fn propose<const D: usize>(lattice: &Lattice<D>, site: usize, kt: f64, rng: &mut StdRng) -> u32 {
    let ids       = lattice.ids();
    let current   = ids[site];
    let pick      = rng.gen_range(0..2 * D);
    let candidate = lattice
        .neighbours(site)
        .nth(pick)
        .map_or(current, |n| ids[n]);
    if candidate == current {
        return current;
    }

    let (mut before, mut after) = (0i32, 0i32);
    for n in lattice.neighbours(site) {
        before += i32::from(ids[n] != current);
        after  += i32::from(ids[n] != candidate);
    }
    let delta = f64::from(after - before);

    let accept = delta <= 0.0 || (kt > 0.0 && rng.gen::<f64>() < (-delta / kt).exp());
    if accept { candidate } else { current }
}

/// SplitMix64-style mixing of the stream key
fn stream_seed(seed: u64, sweep: u64, colour: usize, block: usize) -> u64 {
    let mut z = seed
        ^ sweep.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (colour as u64).wrapping_mul(0xD1B5_4A32_D192_ED03)
        ^ (block as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
