use glam::Vec3;
use rand::Rng;

/// Skew a uniform draw in `[0, 1]` into `[-1, 1]` with more mass near 0.
///
/// The draw is recentered to `s = 2u - 1` and its magnitude raised to
/// `exponent`, keeping the sign. Exponents above 1 pack results toward the
/// center; 1 leaves the distribution uniform.
#[inline]
pub fn center_biased(u: f32, exponent: f32) -> f32 {
    let s = u.clamp(0.0, 1.0) * 2.0 - 1.0;
    s.signum() * s.abs().powf(exponent.max(0.1))
}

/// Size multiplier for an instance at normalized cross-axis offset `x_norm`.
#[inline]
pub fn center_falloff(x_norm: f32, shrink: f32) -> f32 {
    (1.0 - x_norm.abs().min(1.0) * shrink).clamp(0.05, 1.0)
}

/// True when `candidate` keeps at least `min_distance` (XZ plane) from every
/// point in `others`.
pub fn is_separated(
    candidate: Vec3,
    others: impl IntoIterator<Item = Vec3>,
    min_distance: f32,
) -> bool {
    let min_sq = min_distance * min_distance;
    others.into_iter().all(|p| {
        let dx = p.x - candidate.x;
        let dz = p.z - candidate.z;
        dx * dx + dz * dz >= min_sq
    })
}

/// A closed interval along the travel axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZBand {
    pub min: f32,
    pub max: f32,
}

impl ZBand {
    pub fn new(a: f32, b: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn contains(&self, z: f32) -> bool {
        z >= self.min && z <= self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let t: f32 = rng.gen();
        (self.min + (self.max - self.min) * t).clamp(self.min, self.max)
    }
}

/// Draw a candidate ground position: center-biased across X, uniform in `band`.
pub fn sample_position<R: Rng + ?Sized>(
    rng: &mut R,
    band: ZBand,
    half_width: f32,
    center_x: f32,
    exponent: f32,
) -> Vec3 {
    let x = center_x + center_biased(rng.gen(), exponent) * half_width;
    Vec3::new(x, 0.0, band.sample(rng))
}
