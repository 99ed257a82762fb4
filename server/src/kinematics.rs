//! Per-peer kinematic state derived from the position report stream
//!
//! Simulators report their pose at irregular wall-clock intervals and stamp each
//! report with their own simulation clock. This module turns that stream into
//! display values (geodetic position, ground speed, true course, heading) and
//! reception-quality statistics. Degenerate input never fails; every value has a
//! defined fallback.

use serde::Serialize;
use shared::{normalize_degrees, Cartesian, Geodetic, PositionReport};

/// Ground speed in m/s above which the course is taken from the velocity vector
pub const MIN_COURSE_SPEED: f64 = 10.0;

/// Largest simulation-time gap in seconds over which a positional speed is computed
pub const MAX_SPEED_SAMPLE_GAP: f64 = 3.0;

/// Weight of the previous average in the reception-interval moving average
const INTERVAL_AVERAGE_WEIGHT: f64 = 20.0;

/// Statistics over the wall-clock intervals between received reports
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceptionStats {
    last_reception_ms: Option<u64>,
    min_interval_ms: Option<u64>,
    max_interval_ms: Option<u64>,
    avg_interval_ms: Option<f64>,
}

impl ReceptionStats {
    /// Records a reception at the given wall-clock time in milliseconds
    ///
    /// The first reception only establishes a baseline. A clock that steps
    /// backwards yields a zero interval rather than wrapping around.
    pub fn record(&mut self, received_at_ms: u64) {
        if let Some(last) = self.last_reception_ms {
            let interval = received_at_ms.saturating_sub(last);

            self.min_interval_ms = Some(self.min_interval_ms.map_or(interval, |m| m.min(interval)));
            self.max_interval_ms = Some(self.max_interval_ms.map_or(interval, |m| m.max(interval)));
            self.avg_interval_ms = Some(match self.avg_interval_ms {
                Some(avg) => {
                    (INTERVAL_AVERAGE_WEIGHT * avg + interval as f64) / (INTERVAL_AVERAGE_WEIGHT + 1.0)
                }
                None => interval as f64,
            });
        }

        self.last_reception_ms = Some(received_at_ms);
    }

    pub fn last_reception_ms(&self) -> Option<u64> {
        self.last_reception_ms
    }

    pub fn min_interval_ms(&self) -> Option<u64> {
        self.min_interval_ms
    }

    pub fn max_interval_ms(&self) -> Option<u64> {
        self.max_interval_ms
    }

    /// Exponential moving average, available once two reports have arrived
    pub fn avg_interval_ms(&self) -> Option<f64> {
        self.avg_interval_ms
    }
}

/// Kinematic state of one peer
///
/// All getters are valid straight after construction: the position is the
/// earth's centre, speeds, course and heading are zero and no reception
/// statistics exist yet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KinematicState {
    cartesian: Cartesian,
    geodetic: Geodetic,
    last_geodetic: Option<Geodetic>,
    last_sim_time: Option<f64>,
    reception: ReceptionStats,
    velocity_horizontal: Cartesian,
    ground_speed: f64,
    calculated_ground_speed: f64,
    true_course: f64,
    heading: f64,
    updates: u64,
}

impl KinematicState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one position report received at `received_at_ms` (wall clock)
    pub fn update(&mut self, received_at_ms: u64, report: &PositionReport) {
        self.reception.record(received_at_ms);

        self.cartesian = report.position;
        self.geodetic = Geodetic::from(&self.cartesian);

        self.ground_speed = report.linear_velocity.length();

        // rotate body frame quantities into the local North-East-Down frame
        let body_to_horizontal =
            self.geodetic.horizontal_frame().inverse() * report.orientation_quaternion();
        let velocity = body_to_horizontal * report.linear_velocity.to_vector();
        self.velocity_horizontal = Cartesian::from_vector(&velocity);

        let (_, _, yaw) = body_to_horizontal.euler_angles();
        self.heading = normalize_degrees(yaw.to_degrees());

        // the velocity direction is noise at taxi speeds and below
        self.true_course = if self.ground_speed > MIN_COURSE_SPEED {
            normalize_degrees(velocity.y.atan2(velocity.x).to_degrees())
        } else {
            self.heading
        };

        // a degenerate position maps to (0, 0) and must not serve as a speed sample
        if report.position.has_geodetic() {
            self.calculated_ground_speed = self
                .positional_speed(report.time)
                .unwrap_or(self.ground_speed);
            self.last_geodetic = Some(self.geodetic);
            self.last_sim_time = Some(report.time);
        } else {
            self.calculated_ground_speed = self.ground_speed;
            self.last_geodetic = None;
            self.last_sim_time = None;
        }

        self.updates += 1;
    }

    /// Speed over ground from the previous to the current geodetic position
    ///
    /// None when there is no previous sample, when the simulation clock did not
    /// advance (paused, first report, NaN) or jumped by more than
    /// MAX_SPEED_SAMPLE_GAP, or when the result is not finite.
    fn positional_speed(&self, sim_time: f64) -> Option<f64> {
        let last = self.last_geodetic?;
        let elapsed = sim_time - self.last_sim_time?;

        if !(elapsed > 0.0 && elapsed <= MAX_SPEED_SAMPLE_GAP) {
            return None;
        }

        let speed = (last.surface_distance(&self.geodetic) / elapsed).abs();
        speed.is_finite().then_some(speed)
    }

    pub fn cartesian_position(&self) -> Cartesian {
        self.cartesian
    }

    pub fn geodetic_position(&self) -> Geodetic {
        self.geodetic
    }

    /// Reported ground speed in m/s
    pub fn ground_speed(&self) -> f64 {
        self.ground_speed
    }

    /// Ground speed in m/s derived from consecutive positions
    pub fn calculated_ground_speed(&self) -> f64 {
        self.calculated_ground_speed
    }

    /// Degrees in [0, 360)
    pub fn true_course(&self) -> f64 {
        self.true_course
    }

    /// Degrees in [0, 360)
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Velocity in the local North-East-Down frame (m/s)
    pub fn velocity_horizontal(&self) -> Cartesian {
        self.velocity_horizontal
    }

    pub fn reception(&self) -> &ReceptionStats {
        &self.reception
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }
}
