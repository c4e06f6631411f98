// ============================================================
// Layer 5 — Voronoi Tessellation
// ============================================================
// Scatters `grains` seed points uniformly in the periodic box
// and gives every site the id of its nearest seed, measuring
// distance with the minimum-image convention so grains wrap
// across the box faces.
//
// Sites are independent, so the assignment runs in parallel on
// whatever rayon pool the caller installed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::kernel::lattice::Lattice;

/// Tessellate a lattice of the given extents.
///
/// `grains` is clamped to `1..=sites`. The result depends only on
/// `seed`, never on the number of threads.
pub fn tessellate<const D: usize>(extents: [usize; D], grains: usize, seed: u64) -> Lattice<D> {
    let mut lattice = Lattice::new(extents);
    let grains      = grains.clamp(1, lattice.len().max(1));

    let mut rng = StdRng::seed_from_u64(seed);
    let seeds: Vec<[usize; D]> = (0..grains)
        .map(|_| {
            let mut p = [0; D];
            for (c, &e) in p.iter_mut().zip(extents.iter()) {
                *c = rng.gen_range(0..e);
            }
            p
        })
        .collect();

    let ids: Vec<u32> = (0..lattice.len())
        .into_par_iter()
        .map(|i| nearest_seed(&lattice.coords(i), &seeds, &extents))
        .collect();

    tracing::debug!("Tessellated {} sites into {} grains", ids.len(), grains);
    lattice.set_ids(ids);
    lattice
}

/// Index of the closest seed; ties go to the lower index
fn nearest_seed<const D: usize>(site: &[usize; D], seeds: &[[usize; D]], extents: &[usize; D]) -> u32 {
    let mut best      = 0usize;
    let mut best_dist = usize::MAX;
    for (k, seed) in seeds.iter().enumerate() {
        let d = periodic_dist2(site, seed, extents);
        if d < best_dist {
            best      = k;
            best_dist = d;
        }
    }
    best as u32
}

/// Squared minimum-image distance between two sites
fn periodic_dist2<const D: usize>(a: &[usize; D], b: &[usize; D], extents: &[usize; D]) -> usize {
    (0..D)
        .map(|axis| {
            let d = a[axis].abs_diff(b[axis]);
            let d = d.min(extents[axis] - d);
            d * d
        })
        .sum()
}
