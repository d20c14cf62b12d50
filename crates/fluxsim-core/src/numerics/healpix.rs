//! HEALPix RING-scheme geometry reduced to what azimuthally symmetric maps
//! need: pixel count and per-pixel colatitude.
//!
//! Ring `r` runs from 1 (north pole) to `4·nside − 1` (south pole). Polar-cap
//! rings hold `4r` pixels, equatorial rings `4·nside`.

use crate::common::config::validate_nside;
use crate::domain::{ComputeResult, FluxError};

pub const fn npix_for_nside(nside: u32) -> u64 {
    12 * (nside as u64) * (nside as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGeometry {
    nside: u64,
    npix: u64,
    ncap: u64,
}

impl RingGeometry {
    pub fn new(nside: u32) -> ComputeResult<Self> {
        validate_nside(nside)?;
        let nside = u64::from(nside);
        Ok(Self {
            nside,
            npix: 12 * nside * nside,
            ncap: 2 * nside * (nside - 1),
        })
    }

    pub const fn nside(&self) -> u64 {
        self.nside
    }

    pub const fn npix(&self) -> u64 {
        self.npix
    }

    pub const fn ring_count(&self) -> u64 {
        4 * self.nside - 1
    }

    /// Ring number (1-based, north to south) and `cos θ` of a pixel centre.
    pub fn pixel_ring(&self, pixel: u64) -> ComputeResult<(u64, f64)> {
        if pixel >= self.npix {
            return Err(FluxError::input_validation(
                "INPUT.PIXEL_INDEX",
                format!(
                    "pixel {} is outside 0..{} for nside {}",
                    pixel, self.npix, self.nside
                ),
            ));
        }

        let fact2 = 4.0 / self.npix as f64;
        if pixel < self.ncap {
            let ring = (1 + (1 + 2 * pixel).isqrt()) >> 1;
            let z = 1.0 - (ring * ring) as f64 * fact2;
            return Ok((ring, z));
        }

        if pixel < self.npix - self.ncap {
            let ring = (pixel - self.ncap) / (4 * self.nside) + self.nside;
            let fact1 = (2 * self.nside) as f64 * fact2;
            let z = (2 * self.nside) as f64 - ring as f64;
            return Ok((ring, z * fact1));
        }

        let mirrored = self.npix - pixel;
        let ring = (1 + (2 * mirrored - 1).isqrt()) >> 1;
        let z = -1.0 + (ring * ring) as f64 * fact2;
        Ok((self.ring_count() + 1 - ring, z))
    }

    pub fn cos_colatitude(&self, pixel: u64) -> ComputeResult<f64> {
        self.pixel_ring(pixel).map(|(_, z)| z)
    }

    pub fn colatitude(&self, pixel: u64) -> ComputeResult<f64> {
        self.cos_colatitude(pixel).map(f64::acos)
    }

    /// `cos θ` for every pixel in canonical RING order.
    pub fn cos_colatitudes(&self) -> Vec<f64> {
        let fact2 = 4.0 / self.npix as f64;
        let fact1 = (2 * self.nside) as f64 * fact2;
        let mut values = Vec::with_capacity(self.npix as usize);

        for ring in 1..=self.ring_count() {
            let (count, z) = if ring < self.nside {
                (4 * ring, 1.0 - (ring * ring) as f64 * fact2)
            } else if ring <= 3 * self.nside {
                (4 * self.nside, ((2 * self.nside) as f64 - ring as f64) * fact1)
            } else {
                let mirrored = self.ring_count() + 1 - ring;
                (4 * mirrored, -1.0 + (mirrored * mirrored) as f64 * fact2)
            };
            values.extend(std::iter::repeat_n(z, count as usize));
        }

        values
    }
}
