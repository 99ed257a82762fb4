//! Earth-centred geometry used by the relay and its clients
//!
//! Positions travel on the wire as ECEF (earth-centred, earth-fixed) cartesian
//! coordinates in metres. Range checks work directly on those; display values
//! and speed estimates need geodetic coordinates and a local horizontal frame.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::ops::Sub;

/// WGS84 semi-major axis in metres
pub const EQUATORIAL_EARTH_RADIUS: f64 = 6378137.0;
/// WGS84 first eccentricity squared
pub const E_EARTH_SQUARED: f64 = 6.6943799901377997e-3;
/// Mean earth radius used for surface (great circle) distances
pub const MEAN_EARTH_RADIUS: f64 = 6371000.0;
/// Positions closer than this to the earth's centre have no geodetic equivalent
pub const MIN_GEODETIC_RADIUS: f64 = 100000.0;

/// Immutable 3-D cartesian coordinates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance, NaN if either operand carries a NaN component
    pub fn distance(&self, other: &Cartesian) -> f64 {
        (*self - *other).length()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// True when the conversion to `Geodetic` yields a real location
    pub fn has_geodetic(&self) -> bool {
        self.is_finite() && self.length() >= MIN_GEODETIC_RADIUS
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Sub for Cartesian {
    type Output = Cartesian;

    fn sub(self, rhs: Cartesian) -> Cartesian {
        Cartesian::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Geodetic coordinates on the WGS84 ellipsoid
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Geodetic {
    /// radians
    pub longitude: f64,
    /// radians
    pub latitude: f64,
    /// metres above ellipsoid
    pub height: f64,
}

impl Geodetic {
    pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    pub fn from_degrees(lon: f64, lat: f64, height: f64) -> Self {
        Self::new(lon.to_radians(), lat.to_radians(), height)
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude.to_degrees()
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude.to_degrees()
    }

    /// Converts back to ECEF coordinates
    pub fn to_cartesian(&self) -> Cartesian {
        let (sin_lat, cos_lat) = self.latitude.sin_cos();
        let (sin_lon, cos_lon) = self.longitude.sin_cos();
        let n = EQUATORIAL_EARTH_RADIUS / (1.0 - E_EARTH_SQUARED * sin_lat * sin_lat).sqrt();

        Cartesian::new(
            (n + self.height) * cos_lat * cos_lon,
            (n + self.height) * cos_lat * sin_lon,
            (n * (1.0 - E_EARTH_SQUARED) + self.height) * sin_lat,
        )
    }

    /// Great circle distance along the mean earth sphere, ignoring height
    pub fn surface_distance(&self, other: &Geodetic) -> f64 {
        let dlat = other.latitude - self.latitude;
        let dlon = other.longitude - self.longitude;

        let a = (dlat / 2.0).sin().powi(2)
            + self.latitude.cos() * other.latitude.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * MEAN_EARTH_RADIUS * a.sqrt().min(1.0).asin()
    }

    /// Rotation from the local North-East-Down frame at this location into ECEF
    pub fn horizontal_frame(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.longitude)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -self.latitude - FRAC_PI_2)
    }
}

impl From<&Cartesian> for Geodetic {
    /// ECEF to geodetic after Olson (1996), "Converting Earth-Centered, Earth-Fixed
    /// Coordinates to Geodetic Coordinates". Points within 100km of the earth's
    /// centre have no meaningful geodetic position and map to the zero position.
    fn from(p: &Cartesian) -> Self {
        let a = EQUATORIAL_EARTH_RADIUS;
        let e2 = E_EARTH_SQUARED;
        let a1 = 4.2697672707157535e+4;
        let a2 = 1.8230912546075455e+9;
        let a3 = 1.4291722289812413e+2;
        let a4 = 4.5577281365188637e+9;
        let a5 = 4.2840589930055659e+4;
        let a6 = 9.9330562000986220e-1;

        let (x, y, z) = (p.x, p.y, p.z);
        let zp = z.abs();
        let w2 = x * x + y * y;
        let w = w2.sqrt();
        let z2 = z * z;
        let r2 = w2 + z2;
        let r = r2.sqrt();

        if !(r >= MIN_GEODETIC_RADIUS) {
            return Geodetic::default();
        }

        let lon = y.atan2(x);
        let s2 = z2 / r2;
        let c2 = w2 / r2;
        let mut u = a2 / r;
        let mut v = a3 - a4 / r;

        let (mut lat, s, c, ss) = if c2 > 0.3 {
            let s = (zp / r) * (1.0 + c2 * (a1 + u + s2 * v) / r);
            let ss = s * s;
            (s.asin(), s, (1.0 - ss).sqrt(), ss)
        } else {
            let c = (w / r) * (1.0 - s2 * (a5 - u - c2 * v) / r);
            let ss = 1.0 - c * c;
            (c.acos(), ss.sqrt(), c, ss)
        };

        let g = 1.0 - e2 * ss;
        let rg = a / g.sqrt();
        let rf = a6 * rg;
        u = w - rg * c;
        v = zp - rf * s;
        let f = c * u + s * v;
        let m = c * v - s * u;
        let p = m / (rf / g + f);

        lat += p;
        let height = f + m * p / 2.0;
        if z < 0.0 {
            lat = -lat;
        }

        Geodetic::new(lon, lat, height)
    }
}

impl From<Cartesian> for Geodetic {
    fn from(p: Cartesian) -> Self {
        Geodetic::from(&p)
    }
}

/// Maps any angle in degrees into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}
