//! Halo catalogue analyses
//!
//! A catalogue lists host halos found with a large linking length, each with
//! the sub-halos found inside it with a smaller one. Hosts carry their member
//! particle positions and velocities, from which the centre, radius, bulk
//! speed and velocity dispersion are derived.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Cartesian 3-vector.
pub type Vec3 = [f64; 3];

fn norm(v: Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Sub-halo nested in a host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubHalo {
    /// Particle count.
    #[serde(rename = "subhalo_nPart")]
    pub particles: u64,
    /// Mean position of the sub-halo's particles.
    #[serde(rename = "subhalo_mean_pos")]
    pub mean_position: Vec3,
    /// Mean velocity of the sub-halo's particles.
    #[serde(rename = "subhalo_mean_vel")]
    pub mean_velocity: Vec3,
}

/// Host halo with its member particles and sub-halos.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostHalo {
    /// Particle count.
    #[serde(rename = "halo_nPart")]
    pub particles: u64,
    /// Positions of the member particles.
    #[serde(rename = "Halo_Pos", default)]
    pub member_positions: Vec<Vec3>,
    /// Velocities of the member particles.
    #[serde(rename = "Halo_Vel", default)]
    pub member_velocities: Vec<Vec3>,
    /// Mean velocity of the member particles.
    #[serde(rename = "mean_vel")]
    pub mean_velocity: Vec3,
    /// Sub-halos found inside this host.
    #[serde(default)]
    pub subhalos: Vec<SubHalo>,
}

impl HostHalo {
    /// Number of sub-halos.
    pub fn occupancy(&self) -> usize {
        self.subhalos.len()
    }

    /// Centroid of the member positions.
    pub fn centre(&self) -> Option<Vec3> {
        if self.member_positions.is_empty() {
            return None;
        }
        let n = self.member_positions.len() as f64;
        let mut centre = [0.0; 3];
        for p in &self.member_positions {
            for axis in 0..3 {
                centre[axis] += p[axis];
            }
        }
        Some(centre.map(|c| c / n))
    }

    /// Largest member distance from the centre.
    pub fn radius(&self) -> Option<f64> {
        let centre = self.centre()?;
        self.member_positions
            .iter()
            .map(|&p| norm(sub(p, centre)))
            .reduce(f64::max)
    }

    /// Mean member speed.
    pub fn speed(&self) -> Option<f64> {
        if self.member_velocities.is_empty() {
            return None;
        }
        let total: f64 = self.member_velocities.iter().map(|&v| norm(v)).sum();
        Some(total / self.member_velocities.len() as f64)
    }

    /// RMS member speed about the mean velocity.
    pub fn velocity_dispersion(&self) -> Option<f64> {
        if self.member_velocities.is_empty() {
            return None;
        }
        let sum_sq: f64 = self
            .member_velocities
            .iter()
            .map(|&v| {
                let d = norm(sub(v, self.mean_velocity));
                d * d
            })
            .sum();
        Some((sum_sq / self.member_velocities.len() as f64).sqrt())
    }

    /// Sum of sub-halo particle counts.
    pub fn summed_subhalo_mass(&self) -> u64 {
        self.subhalos.iter().map(|s| s.particles).sum()
    }

    /// Particle count of the heaviest sub-halo, 0 when there are none.
    pub fn largest_subhalo_mass(&self) -> u64 {
        self.subhalos.iter().map(|s| s.particles).max().unwrap_or(0)
    }

    fn position_ratios(&self) -> impl Iterator<Item = f64> + '_ {
        let frame = self.centre().zip(self.radius());
        self.subhalos.iter().filter_map(move |s| {
            let (centre, radius) = frame?;
            let ratio = norm(sub(s.mean_position, centre)) / radius;
            ratio.is_finite().then_some(ratio)
        })
    }

    fn speed_ratios(&self) -> impl Iterator<Item = f64> + '_ {
        let frame = self.speed().zip(self.velocity_dispersion());
        self.subhalos.iter().filter_map(move |s| {
            let (speed, sigma) = frame?;
            let ratio = (norm(s.mean_velocity) - speed).abs() / sigma;
            ratio.is_finite().then_some(ratio)
        })
    }
}

/// Inclusive range of sub-halo counts used to select hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyRange {
    /// Smallest accepted occupancy.
    pub low: usize,
    /// Largest accepted occupancy.
    pub high: usize,
}

impl OccupancyRange {
    /// Construct a range, rejecting `low > high`.
    pub fn new(low: usize, high: usize) -> Result<Self, OccupancyRangeError> {
        if low > high {
            return Err(OccupancyRangeError::Inverted { low, high });
        }
        Ok(Self { low, high })
    }

    /// Whether `occupancy` lies in the range.
    pub fn contains(&self, occupancy: usize) -> bool {
        (self.low..=self.high).contains(&occupancy)
    }
}

impl fmt::Display for OccupancyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Errors parsing an [`OccupancyRange`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OccupancyRangeError {
    /// Text is not `<low>-<high>`.
    #[error("occupancy range '{0}' is not of the form <low>-<high>")]
    Malformed(String),

    /// Lower bound exceeds upper bound.
    #[error("occupancy range {low}-{high} is inverted")]
    Inverted {
        /// Lower bound.
        low: usize,
        /// Upper bound.
        high: usize,
    },
}

impl FromStr for OccupancyRange {
    type Err = OccupancyRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || OccupancyRangeError::Malformed(s.to_string());
        let (low, high) = s.split_once('-').ok_or_else(malformed)?;
        let low = low.trim().parse().map_err(|_| malformed())?;
        let high = high.trim().parse().map_err(|_| malformed())?;
        Self::new(low, high)
    }
}

/// Host mass paired with a derived sub-halo mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MassPair {
    /// Host particle count.
    pub host: u64,
    /// Sub-halo particle count (sum or maximum).
    pub subhalos: u64,
}

/// Sub-halo position and speed ratio of one sub-halo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasePoint {
    /// Distance from the host centre over the host radius.
    pub position: f64,
    /// Speed offset from the host over the host velocity dispersion.
    pub speed: f64,
}

/// All hosts of one catalogue snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HaloCatalogue {
    /// Host halos in catalogue order.
    pub hosts: Vec<HostHalo>,
}

impl HaloCatalogue {
    /// Number of sub-halos in every host.
    pub fn occupancies(&self) -> Vec<u64> {
        self.hosts.iter().map(|h| h.occupancy() as u64).collect()
    }

    /// Host mass against the summed mass of its sub-halos.
    pub fn summed_subhalo_masses(&self) -> Vec<MassPair> {
        self.hosts
            .iter()
            .map(|h| MassPair {
                host: h.particles,
                subhalos: h.summed_subhalo_mass(),
            })
            .collect()
    }

    /// Host mass against the mass of its heaviest sub-halo.
    pub fn largest_subhalo_masses(&self) -> Vec<MassPair> {
        self.hosts
            .iter()
            .map(|h| MassPair {
                host: h.particles,
                subhalos: h.largest_subhalo_mass(),
            })
            .collect()
    }

    fn hosts_in(&self, range: OccupancyRange) -> impl Iterator<Item = &HostHalo> + '_ {
        self.hosts
            .iter()
            .filter(move |h| range.contains(h.occupancy()))
    }

    /// Sub-halo distance from the host centre in units of the host radius,
    /// for hosts whose occupancy lies in `range`.
    pub fn subhalo_position_ratios(&self, range: OccupancyRange) -> Vec<f64> {
        self.hosts_in(range).flat_map(|h| h.position_ratios()).collect()
    }

    /// Sub-halo speed offset from the host in units of the host velocity
    /// dispersion, for hosts whose occupancy lies in `range`.
    pub fn subhalo_speed_ratios(&self, range: OccupancyRange) -> Vec<f64> {
        self.hosts_in(range).flat_map(|h| h.speed_ratios()).collect()
    }

    /// Paired position and speed ratios; sub-halos for which either ratio
    /// is undefined are left out.
    pub fn subhalo_phase_points(&self, range: OccupancyRange) -> Vec<PhasePoint> {
        let mut points = Vec::new();
        for host in self.hosts_in(range) {
            let (Some(centre), Some(radius), Some(speed), Some(sigma)) = (
                host.centre(),
                host.radius(),
                host.speed(),
                host.velocity_dispersion(),
            ) else {
                continue;
            };
            for s in &host.subhalos {
                let position = norm(sub(s.mean_position, centre)) / radius;
                let relative_speed = (norm(s.mean_velocity) - speed).abs() / sigma;
                if position.is_finite() && relative_speed.is_finite() {
                    points.push(PhasePoint {
                        position,
                        speed: relative_speed,
                    });
                }
            }
        }
        points
    }
}
