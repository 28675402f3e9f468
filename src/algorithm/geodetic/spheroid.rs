use geographiclib_rs::Geodesic;

use crate::error::{GeoArrowError, Result};

/// An ellipsoid of revolution, given by its semi-major axis (in meters) and inverse flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spheroid {
    semi_major: f64,
    inverse_flattening: f64,
}

impl Spheroid {
    /// Construct a spheroid. An `inverse_flattening` of zero or infinity describes a sphere.
    pub fn new(semi_major: f64, inverse_flattening: f64) -> Result<Self> {
        if !(semi_major.is_finite() && semi_major > 0.) {
            return Err(GeoArrowError::Precondition(
                format!("semi-major axis must be positive and finite, got {semi_major}").into(),
            ));
        }
        // Inverse flattening below 1 would make the semi-minor axis zero or negative
        if inverse_flattening.is_nan()
            || (inverse_flattening != 0. && inverse_flattening < 1.)
        {
            return Err(GeoArrowError::Precondition(
                format!("inverse flattening must be 0 or at least 1, got {inverse_flattening}")
                    .into(),
            ));
        }
        Ok(Self {
            semi_major,
            inverse_flattening,
        })
    }

    /// The WGS84 ellipsoid.
    pub fn wgs84() -> Self {
        Self {
            semi_major: 6_378_137.0,
            inverse_flattening: 298.257_223_563,
        }
    }

    /// A sphere of the given radius.
    pub fn sphere(radius: f64) -> Result<Self> {
        Self::new(radius, 0.)
    }

    pub fn semi_major(&self) -> f64 {
        self.semi_major
    }

    pub fn inverse_flattening(&self) -> f64 {
        self.inverse_flattening
    }

    pub fn flattening(&self) -> f64 {
        if self.inverse_flattening == 0. || self.inverse_flattening.is_infinite() {
            0.
        } else {
            1. / self.inverse_flattening
        }
    }

    pub fn semi_minor(&self) -> f64 {
        self.semi_major * (1. - self.flattening())
    }

    pub(crate) fn geodesic(&self) -> Geodesic {
        Geodesic::new(self.semi_major, self.flattening())
    }
}

impl Default for Spheroid {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wgs84_axes() {
        let s = Spheroid::wgs84();
        assert_relative_eq!(s.semi_minor(), 6_356_752.314_245, epsilon = 1e-6);
    }

    #[test]
    fn sphere_has_no_flattening() {
        assert_eq!(Spheroid::sphere(1.).unwrap().flattening(), 0.);
        assert_eq!(Spheroid::new(1., f64::INFINITY).unwrap().flattening(), 0.);
    }

    #[test]
    fn rejects_bad_axes() {
        assert!(Spheroid::new(-1., 298.).is_err());
        assert!(Spheroid::new(f64::NAN, 298.).is_err());
        assert!(Spheroid::new(1., 0.5).is_err());
    }
}
