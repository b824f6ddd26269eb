//! Perlin lattice noise for procedural textures.

use cinder_math::Vec3;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

const POINT_COUNT: usize = 256;

/// A Perlin noise field over 3D space.
///
/// Random unit vectors on a 256-point lattice, indexed through per-axis
/// permutation tables. Built once from a caller-supplied generator and
/// immutable afterwards.
pub struct Perlin {
    ranvec: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    /// Build a noise field from the given generator.
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let ranvec = (0..POINT_COUNT)
            .map(|_| {
                Vec3::new(
                    rng.gen::<f32>() * 2.0 - 1.0,
                    rng.gen::<f32>() * 2.0 - 1.0,
                    rng.gen::<f32>() * 2.0 - 1.0,
                )
                .normalize_or_zero()
            })
            .collect();

        Self {
            ranvec,
            perm_x: generate_perm(rng),
            perm_y: generate_perm(rng),
            perm_z: generate_perm(rng),
        }
    }

    /// Smoothed lattice noise at p, in [-1, 1].
    pub fn noise(&self, p: Vec3) -> f32 {
        let u = p.x - p.x.floor();
        let v = p.y - p.y.floor();
        let w = p.z - p.z.floor();

        let i = p.x.floor() as i32;
        let j = p.y.floor() as i32;
        let k = p.z.floor() as i32;

        let mut c = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in c.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, cell) in row.iter_mut().enumerate() {
                    let ix = self.perm_x[((i + di as i32) & 255) as usize];
                    let iy = self.perm_y[((j + dj as i32) & 255) as usize];
                    let iz = self.perm_z[((k + dk as i32) & 255) as usize];
                    *cell = self.ranvec[ix ^ iy ^ iz];
                }
            }
        }

        perlin_interp(&c, u, v, w)
    }

    /// Turbulence: seven octaves of absolute noise.
    pub fn turb(&self, p: Vec3) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..7 {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

fn generate_perm(rng: &mut dyn RngCore) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..POINT_COUNT).collect();
    perm.shuffle(rng);
    perm
}

/// Trilinear interpolation with Hermitian smoothing.
fn perlin_interp(c: &[[[Vec3; 2]; 2]; 2], u: f32, v: f32, w: f32) -> f32 {
    let uu = u * u * (3.0 - 2.0 * u);
    let vv = v * v * (3.0 - 2.0 * v);
    let ww = w * w * (3.0 - 2.0 * w);

    let mut accum = 0.0;
    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, cell) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f32, j as f32, k as f32);
                let weight_v = Vec3::new(u - fi, v - fj, w - fk);
                accum += (fi * uu + (1.0 - fi) * (1.0 - uu))
                    * (fj * vv + (1.0 - fj) * (1.0 - vv))
                    * (fk * ww + (1.0 - fk) * (1.0 - ww))
                    * cell.dot(weight_v);
            }
        }
    }

    accum
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_noise_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Perlin::new(&mut rng);

        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.17, i as f32 * 0.31, i as f32 * 0.47);
            let n = noise.noise(p);
            assert!((-1.0..=1.0).contains(&n), "noise {} out of range", n);
        }
    }

    #[test]
    fn test_noise_deterministic() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = Perlin::new(&mut rng_a);
        let b = Perlin::new(&mut rng_b);

        let p = Vec3::new(1.3, 2.7, 3.1);
        assert_eq!(a.noise(p), b.noise(p));
        assert_eq!(a.turb(p), b.turb(p));
    }

    #[test]
    fn test_turb_non_negative() {
        let mut rng = StdRng::seed_from_u64(9);
        let noise = Perlin::new(&mut rng);

        for i in 0..50 {
            let p = Vec3::splat(i as f32 * 0.23);
            assert!(noise.turb(p) >= 0.0);
        }
    }
}
