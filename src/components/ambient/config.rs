//! Engine presets and JSON overrides.
//!
//! A page selects a preset and may tweak a handful of knobs with a JSON
//! document such as:
//!
//! ```json
//! { "preset": "fluid", "max_particles": 800, "boundary": "bounce" }
//! ```

use serde::Deserialize;

use super::field::{ColorAssignment, FieldConfig, PopulationPolicy, SpawnConfig, StimulusConfig};
use super::palette::PaletteSet;
use super::particles::BoundaryPolicy;
use super::render::{ConnectionStyle, RenderStyle, WaveLayer};

/// Named engine configurations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
	/// Drifting, bouncing dots joined by glowing lines.
	#[default]
	Constellation,
	/// Falling sparks with motion trails, reacting to the pointer.
	Fluid,
	/// Wrapping dots with halo lines over a rotating hue gradient.
	Aurora,
}

/// Complete configuration of one engine instance.
#[derive(Clone, Debug)]
pub struct EngineConfig {
	pub field: FieldConfig,
	pub palettes: PaletteSet,
	pub render: RenderStyle,
}

impl EngineConfig {
	pub fn preset(preset: Preset) -> Self {
		match preset {
			Preset::Constellation => Self::constellation(),
			Preset::Fluid => Self::fluid(),
			Preset::Aurora => Self::aurora(),
		}
	}

	pub fn constellation() -> Self {
		Self {
			field: FieldConfig {
				population: PopulationPolicy::PersistentFixedCount { count: 50 },
				boundary: BoundaryPolicy::Bounce,
				gravity: None,
				color_assignment: ColorAssignment::AtCreation,
				spawn: SpawnConfig::default(),
				stimulus: StimulusConfig::default(),
			},
			palettes: PaletteSet::constellation(),
			render: RenderStyle {
				background_opacity: 1.0,
				particle_glow: 20.0,
				connections: Some(ConnectionStyle::single(250.0)),
				waves: None,
			},
		}
	}

	pub fn fluid() -> Self {
		Self {
			field: FieldConfig {
				population: PopulationPolicy::ContinuousEmission {
					interval: 3,
					burst_size: 5,
					max_particles: 2000,
				},
				boundary: BoundaryPolicy::Wrap,
				gravity: Some(0.1),
				color_assignment: ColorAssignment::AtDrawTime,
				spawn: SpawnConfig {
					radius_min: 3.0,
					radius_max: 5.0,
					opacity: 0.6,
					..SpawnConfig::default()
				},
				stimulus: StimulusConfig { burst: 3, speed: 3.0 },
			},
			palettes: PaletteSet::fluid(),
			render: RenderStyle {
				background_opacity: 0.1,
				particle_glow: 15.0,
				connections: None,
				waves: Some(WaveLayer::default()),
			},
		}
	}

	pub fn aurora() -> Self {
		Self {
			field: FieldConfig {
				population: PopulationPolicy::PersistentFixedCount { count: 40 },
				boundary: BoundaryPolicy::Wrap,
				gravity: None,
				color_assignment: ColorAssignment::AtCreation,
				spawn: SpawnConfig {
					drift: 0.4,
					radius_min: 1.5,
					radius_max: 3.5,
					opacity: 0.85,
					..SpawnConfig::default()
				},
				stimulus: StimulusConfig::default(),
			},
			palettes: PaletteSet::aurora(),
			render: RenderStyle {
				background_opacity: 1.0,
				particle_glow: 12.0,
				connections: Some(ConnectionStyle::halo(180.0)),
				waves: None,
			},
		}
	}

	/// Parse a JSON override document on top of its preset.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		let overrides: ConfigOverrides = serde_json::from_str(json)?;
		Ok(overrides.apply())
	}
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self::constellation()
	}
}

/// Knobs a host page may set. Absent fields keep the preset's value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
	pub preset: Preset,
	/// Replaces the preset's population policy before the knobs below apply.
	pub population: Option<PopulationPolicy>,
	/// Persistent population size.
	pub particle_count: Option<usize>,
	/// Emission population cap.
	pub max_particles: Option<usize>,
	/// Frames between emission bursts.
	pub emission_interval: Option<u64>,
	pub burst_size: Option<usize>,
	pub boundary: Option<BoundaryPolicy>,
	pub gravity: Option<f64>,
	pub color_assignment: Option<ColorAssignment>,
	/// Connection distance; 0 turns connections off.
	pub connection_radius: Option<f64>,
	pub background_opacity: Option<f64>,
	pub waves: Option<bool>,
}

impl ConfigOverrides {
	pub fn apply(self) -> EngineConfig {
		let mut config = EngineConfig::preset(self.preset);
		if let Some(population) = self.population {
			config.field.population = population;
		}

		match &mut config.field.population {
			PopulationPolicy::PersistentFixedCount { count } => {
				if let Some(n) = self.particle_count {
					*count = n;
				}
			}
			PopulationPolicy::ContinuousEmission {
				interval,
				burst_size,
				max_particles,
			} => {
				if let Some(n) = self.max_particles {
					*max_particles = n;
				}
				if let Some(n) = self.emission_interval {
					*interval = n;
				}
				if let Some(n) = self.burst_size {
					*burst_size = n;
				}
			}
		}

		if let Some(boundary) = self.boundary {
			config.field.boundary = boundary;
		}
		if let Some(gravity) = self.gravity {
			config.field.gravity = (gravity != 0.0).then_some(gravity);
		}
		if let Some(assignment) = self.color_assignment {
			config.field.color_assignment = assignment;
		}
		if let Some(radius) = self.connection_radius {
			config.render.connections = if radius > 0.0 {
				let mut style = config
					.render
					.connections
					.take()
					.unwrap_or_else(|| ConnectionStyle::single(radius));
				style.radius = radius;
				Some(style)
			} else {
				None
			};
		}
		if let Some(opacity) = self.background_opacity {
			config.render.background_opacity = opacity.clamp(0.0, 1.0);
		}
		if let Some(waves) = self.waves {
			config.render.waves = waves.then(WaveLayer::default);
		}

		config
	}
}
