//! Particle population: spawning, per-frame update, and removal.
//!
//! A field runs under one of two population policies:
//!
//! - **Persistent**: a fixed number of particles placed uniformly across the
//!   surface. The population only changes on a theme reset, which regenerates
//!   every particle with the new palette.
//! - **Emission**: the field starts empty; bursts are spawned every few frames
//!   (and on pointer stimulus) and particles are dropped once their life runs
//!   out. The population is capped by `max_particles`.

use std::f64::consts::TAU;

use log::{debug, info};
use rand::Rng;
use serde::Deserialize;

use super::palette::{Color, ParticlePalette};
use super::particles::{BoundaryPolicy, Life, Particle, ParticleStatus};

/// Hard ceiling on any configured population.
pub const MAX_PARTICLES: usize = 10_000;

/// How the particle population is maintained.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopulationPolicy {
	PersistentFixedCount {
		count: usize,
	},
	ContinuousEmission {
		/// Frames between bursts.
		interval: u64,
		burst_size: usize,
		max_particles: usize,
	},
}

impl PopulationPolicy {
	/// Copy with every count and interval clamped to a usable range.
	fn sanitized(&self) -> Self {
		match *self {
			PopulationPolicy::PersistentFixedCount { count } => PopulationPolicy::PersistentFixedCount {
				count: count.min(MAX_PARTICLES),
			},
			PopulationPolicy::ContinuousEmission {
				interval,
				burst_size,
				max_particles,
			} => PopulationPolicy::ContinuousEmission {
				interval: interval.max(1),
				burst_size: burst_size.min(MAX_PARTICLES),
				max_particles: max_particles.min(MAX_PARTICLES),
			},
		}
	}

	pub fn is_emission(&self) -> bool {
		matches!(self, PopulationPolicy::ContinuousEmission { .. })
	}
}

/// When a particle's color is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorAssignment {
	/// Once, when the particle is created.
	#[default]
	AtCreation,
	/// Independently every time the particle is drawn.
	AtDrawTime,
}

/// Ranges used when creating particles.
#[derive(Clone, Debug)]
pub struct SpawnConfig {
	/// Persistent mode: each velocity component is drawn from `[-drift, drift)`.
	pub drift: f64,
	/// Emission mode: speed range along a random heading.
	pub speed_min: f64,
	pub speed_max: f64,
	/// Emission mode: added to the initial `vy` (negative is up).
	pub vertical_offset: f64,
	/// Emission mode: spawn height as a fraction of the surface, from the top.
	pub emission_band: f64,
	pub radius_min: f64,
	pub radius_max: f64,
	pub opacity: f64,
	pub decay_min: f64,
	pub decay_max: f64,
}

impl Default for SpawnConfig {
	fn default() -> Self {
		Self {
			drift: 0.25,
			speed_min: 1.0,
			speed_max: 3.0,
			vertical_offset: -2.0,
			emission_band: 0.3,
			radius_min: 1.0,
			radius_max: 3.0,
			opacity: 1.0,
			decay_min: 0.005,
			decay_max: 0.015,
		}
	}
}

/// Burst spawned around a pointer position.
#[derive(Clone, Debug)]
pub struct StimulusConfig {
	/// Particles per event, spread evenly around a full circle.
	pub burst: usize,
	pub speed: f64,
}

impl Default for StimulusConfig {
	fn default() -> Self {
		Self { burst: 3, speed: 3.0 }
	}
}

/// Everything a [`ParticleField`] needs besides the palette and surface size.
#[derive(Clone, Debug)]
pub struct FieldConfig {
	pub population: PopulationPolicy,
	pub boundary: BoundaryPolicy,
	/// Added to every particle's `vy` each frame.
	pub gravity: Option<f64>,
	pub color_assignment: ColorAssignment,
	pub spawn: SpawnConfig,
	pub stimulus: StimulusConfig,
}

impl Default for FieldConfig {
	fn default() -> Self {
		Self {
			population: PopulationPolicy::PersistentFixedCount { count: 50 },
			boundary: BoundaryPolicy::Bounce,
			gravity: None,
			color_assignment: ColorAssignment::AtCreation,
			spawn: SpawnConfig::default(),
			stimulus: StimulusConfig::default(),
		}
	}
}

fn uniform<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
	if max > min {
		rng.gen_range(min..max)
	} else {
		min
	}
}

/// Owns the particle collection and its population policy.
pub struct ParticleField {
	particles: Vec<Particle>,
	config: FieldConfig,
}

impl ParticleField {
	/// Creates an empty field; call [`ParticleField::initialize`] before use.
	pub fn new(mut config: FieldConfig) -> Self {
		config.population = config.population.sanitized();
		config.spawn.opacity = config.spawn.opacity.clamp(0.0, 1.0);
		config.stimulus.burst = config.stimulus.burst.min(MAX_PARTICLES);
		Self {
			particles: Vec::new(),
			config,
		}
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	pub fn len(&self) -> usize {
		self.particles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	pub fn config(&self) -> &FieldConfig {
		&self.config
	}

	/// Populate according to the policy. Persistent fields are filled
	/// uniformly across the surface; emission fields start empty.
	pub fn initialize<R: Rng>(
		&mut self,
		width: f64,
		height: f64,
		palette: &ParticlePalette,
		rng: &mut R,
	) {
		self.particles.clear();
		if let PopulationPolicy::PersistentFixedCount { count } = self.config.population {
			self.particles.reserve(count);
			for _ in 0..count {
				let particle = self.spawn_drifting(width, height, palette, rng);
				self.particles.push(particle);
			}
		}
	}

	/// Advance the field by one frame.
	pub fn update<R: Rng>(
		&mut self,
		frame_index: u64,
		width: f64,
		height: f64,
		palette: &ParticlePalette,
		rng: &mut R,
	) {
		if let PopulationPolicy::ContinuousEmission {
			interval,
			burst_size,
			max_particles,
		} = self.config.population
		{
			if frame_index % interval == 0 {
				let room = max_particles.saturating_sub(self.particles.len());
				if room < burst_size {
					debug!(
						"ambient: emission capped at {} particles, spawning {} of {}",
						max_particles, room, burst_size
					);
				}
				for _ in 0..burst_size.min(room) {
					let particle = self.spawn_emitted(width, height, palette, rng);
					self.particles.push(particle);
				}
			}
		}

		let (boundary, gravity) = (self.config.boundary, self.config.gravity);
		self.particles
			.retain_mut(|p| p.update(width, height, boundary, gravity) == ParticleStatus::Alive);
	}

	/// Spawn a burst at a pointer position. Only emission fields react;
	/// returns the number of particles added.
	pub fn on_external_stimulus<R: Rng>(
		&mut self,
		x: f64,
		y: f64,
		palette: &ParticlePalette,
		rng: &mut R,
	) -> usize {
		let PopulationPolicy::ContinuousEmission { max_particles, .. } = self.config.population else {
			debug!("ambient: pointer stimulus ignored by persistent field");
			return 0;
		};
		if !x.is_finite() || !y.is_finite() {
			return 0;
		}

		let burst = self
			.config
			.stimulus
			.burst
			.min(max_particles.saturating_sub(self.particles.len()));
		let color = self.creation_color(palette, rng);
		let speed = self.config.stimulus.speed;

		for i in 0..burst {
			let angle = TAU * i as f64 / burst as f64;
			let life = Life::new(uniform(rng, self.config.spawn.decay_min, self.config.spawn.decay_max));
			let radius = uniform(rng, self.config.spawn.radius_min, self.config.spawn.radius_max);
			self.particles.push(Particle {
				x,
				y,
				vx: angle.cos() * speed,
				vy: angle.sin() * speed,
				radius,
				opacity: self.config.spawn.opacity,
				color,
				life: Some(life),
			});
		}
		burst
	}

	/// Regenerate a persistent population with the new palette. Emission
	/// fields pick the new palette up on their next burst.
	pub fn on_theme_changed<R: Rng>(
		&mut self,
		width: f64,
		height: f64,
		palette: &ParticlePalette,
		rng: &mut R,
	) {
		if self.config.population.is_emission() {
			return;
		}
		info!("ambient: theme changed, regenerating {} particles", self.particles.len());
		self.initialize(width, height, palette, rng);
	}

	fn creation_color<R: Rng>(&self, palette: &ParticlePalette, rng: &mut R) -> Option<Color> {
		match self.config.color_assignment {
			ColorAssignment::AtCreation => Some(palette.pick(rng)),
			ColorAssignment::AtDrawTime => None,
		}
	}

	fn spawn_drifting<R: Rng>(
		&self,
		width: f64,
		height: f64,
		palette: &ParticlePalette,
		rng: &mut R,
	) -> Particle {
		let spawn = &self.config.spawn;
		Particle {
			x: uniform(rng, 0.0, width),
			y: uniform(rng, 0.0, height),
			vx: uniform(rng, -spawn.drift, spawn.drift),
			vy: uniform(rng, -spawn.drift, spawn.drift),
			radius: uniform(rng, spawn.radius_min, spawn.radius_max),
			opacity: spawn.opacity,
			color: self.creation_color(palette, rng),
			life: None,
		}
	}

	fn spawn_emitted<R: Rng>(
		&self,
		width: f64,
		height: f64,
		palette: &ParticlePalette,
		rng: &mut R,
	) -> Particle {
		let spawn = &self.config.spawn;
		let angle = uniform(rng, 0.0, TAU);
		let speed = uniform(rng, spawn.speed_min, spawn.speed_max);
		Particle {
			x: uniform(rng, 0.0, width),
			y: uniform(rng, 0.0, height * spawn.emission_band.clamp(0.0, 1.0)),
			vx: angle.cos() * speed,
			vy: angle.sin() * speed + spawn.vertical_offset,
			radius: uniform(rng, spawn.radius_min, spawn.radius_max),
			opacity: spawn.opacity,
			color: self.creation_color(palette, rng),
			life: Some(Life::new(uniform(rng, spawn.decay_min, spawn.decay_max))),
		}
	}
}
