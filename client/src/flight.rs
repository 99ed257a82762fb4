//! Synthetic flight path: a level circle flown at constant speed

use rand::Rng;
use shared::geo::MEAN_EARTH_RADIUS;
use shared::{normalize_degrees, Cartesian, Geodetic, PositionReport};
use std::f64::consts::TAU;

pub const DEFAULT_MODEL: &str = "Aircraft/c172p/Models/c172p.xml";

#[derive(Debug, Clone)]
pub struct Flight {
    center: Geodetic,
    /// metres
    radius: f64,
    /// metres per second
    speed: f64,
    /// radians, measured clockwise from north around the centre
    phase: f64,
    model: String,
}

impl Flight {
    pub fn new(center: Geodetic, radius: f64, speed: f64, phase: f64) -> Self {
        Self {
            center,
            radius,
            speed,
            phase,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Starts at a random point of the circle
    pub fn random(center: Geodetic, radius: f64, speed: f64) -> Self {
        let phase = rand::thread_rng().gen_range(0.0..TAU);
        Self::new(center, radius, speed, phase)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn angle_at(&self, t: f64) -> f64 {
        let rate = if self.radius > 0.0 {
            self.speed / self.radius
        } else {
            0.0
        };
        self.phase + rate * t
    }

    pub fn location_at(&self, t: f64) -> Geodetic {
        let angle = self.angle_at(t);
        let north = self.radius * angle.cos();
        let east = self.radius * angle.sin();

        Geodetic::new(
            self.center.longitude + east / (MEAN_EARTH_RADIUS * self.center.latitude.cos()),
            self.center.latitude + north / MEAN_EARTH_RADIUS,
            self.center.height,
        )
    }

    /// True heading in degrees; the circle is flown clockwise
    pub fn heading_at(&self, t: f64) -> f64 {
        normalize_degrees(self.angle_at(t).to_degrees() + 90.0)
    }

    pub fn report_at(&self, t: f64) -> PositionReport {
        let location = self.location_at(t);

        PositionReport {
            model: self.model.clone(),
            time: t,
            position: location.to_cartesian(),
            orientation: PositionReport::level_orientation(&location, self.heading_at(t)),
            linear_velocity: Cartesian::new(self.speed, 0.0, 0.0),
        }
    }
}
