//! Per-frame drawing of the ambient field.
//!
//! A frame is painted in fixed passes:
//! 1. Background: a full repaint, or a translucent wash that leaves motion
//!    trails when `background_opacity < 1`
//! 2. Particles, each with an optional glow that is reset after the draw
//! 3. Connection lines, one stroke per configured [`StrokePass`]
//! 4. Optional sine wave overlay

use rand::Rng;

use super::connections::connections_for;
use super::field::ParticleField;
use super::palette::{Color, PaletteProvider, ThemeSignal};
use super::surface::Surface;

/// One stroke of a connection line. Alpha is multiplied by the connection
/// strength.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokePass {
	pub width: f64,
	pub alpha: f64,
	/// Multiplier on the palette's connection glow blur.
	pub glow_scale: f64,
}

/// How connection lines are drawn.
#[derive(Clone, Debug)]
pub struct ConnectionStyle {
	/// Particles closer than this are connected.
	pub radius: f64,
	pub passes: Vec<StrokePass>,
}

impl ConnectionStyle {
	/// A single glowing line, alpha `0.7 * strength`.
	pub fn single(radius: f64) -> Self {
		Self {
			radius,
			passes: vec![StrokePass {
				width: 2.0,
				alpha: 0.7,
				glow_scale: 1.0,
			}],
		}
	}

	/// A wide faint stroke under a thin bright one.
	pub fn halo(radius: f64) -> Self {
		Self {
			radius,
			passes: vec![
				StrokePass {
					width: 6.0,
					alpha: 0.2,
					glow_scale: 1.5,
				},
				StrokePass {
					width: 1.5,
					alpha: 0.7,
					glow_scale: 0.5,
				},
			],
		}
	}
}

/// Decorative sine curves, one per particle color.
#[derive(Clone, Debug)]
pub struct WaveLayer {
	pub amplitude: f64,
	/// Radians per pixel.
	pub frequency: f64,
	/// Phase advance in pixels per frame.
	pub speed: f64,
	/// Horizontal sampling step in pixels.
	pub step: f64,
	/// Vertical center as a fraction of the surface height.
	pub baseline: f64,
	pub alpha: f64,
	pub width: f64,
	pub glow: f64,
}

impl Default for WaveLayer {
	fn default() -> Self {
		Self {
			amplitude: 50.0,
			frequency: 0.01,
			speed: 0.02,
			step: 5.0,
			baseline: 0.5,
			alpha: 0.3,
			width: 2.0,
			glow: 10.0,
		}
	}
}

/// Visual parameters that do not depend on the theme.
#[derive(Clone, Debug)]
pub struct RenderStyle {
	/// Opacity of the background fill; below 1 earlier frames show through.
	pub background_opacity: f64,
	/// Particle glow blur in pixels, 0 for none.
	pub particle_glow: f64,
	pub connections: Option<ConnectionStyle>,
	pub waves: Option<WaveLayer>,
}

impl Default for RenderStyle {
	fn default() -> Self {
		Self {
			background_opacity: 1.0,
			particle_glow: 20.0,
			connections: Some(ConnectionStyle::single(250.0)),
			waves: None,
		}
	}
}

/// Counts from one painted frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
	pub particles: usize,
	pub connections: usize,
}

pub struct Renderer {
	style: RenderStyle,
}

impl Renderer {
	pub fn new(style: RenderStyle) -> Self {
		Self { style }
	}

	pub fn style(&self) -> &RenderStyle {
		&self.style
	}

	/// Paint one frame. The theme is read once, at the start.
	pub fn draw_frame<S: ThemeSignal, R: Rng>(
		&self,
		field: &ParticleField,
		palette: &PaletteProvider<S>,
		frame_index: u64,
		surface: &mut dyn Surface,
		rng: &mut R,
	) -> FrameStats {
		let mode = palette.current_mode();
		let colors = palette.colors_for(mode);
		let paint = &palette.palette_for(mode).connection;

		surface.set_global_alpha(self.style.background_opacity.clamp(0.0, 1.0));
		surface.fill_background(&palette.background_treatment_for(mode, frame_index));
		surface.set_global_alpha(1.0);

		let glow = self.style.particle_glow.max(0.0);
		for p in field.particles() {
			let color = p.color.unwrap_or_else(|| colors.pick(rng));
			if glow > 0.0 {
				surface.set_glow(glow, color);
			}
			surface.fill_circle(p.x, p.y, p.radius, color.with_alpha(color.a * p.draw_alpha()));
			if glow > 0.0 {
				surface.clear_glow();
			}
		}

		let mut stats = FrameStats {
			particles: field.len(),
			connections: 0,
		};

		if let Some(style) = &self.style.connections {
			let particles = field.particles();
			let connections = connections_for(particles, style.radius);
			for c in &connections {
				let (a, b) = (&particles[c.i], &particles[c.j]);
				for pass in &style.passes {
					let blur = paint.glow_blur * pass.glow_scale;
					if blur > 0.0 {
						surface.set_glow(blur, paint.glow_color);
					}
					surface.stroke_line(
						(a.x, a.y),
						(b.x, b.y),
						pass.width,
						paint.color.with_alpha(c.strength * pass.alpha),
					);
					if blur > 0.0 {
						surface.clear_glow();
					}
				}
			}
			stats.connections = connections.len();
		}

		if let Some(waves) = &self.style.waves {
			draw_waves(surface, waves, &colors.colors, frame_index);
		}

		stats
	}
}

fn draw_waves(
	surface: &mut dyn Surface,
	waves: &WaveLayer,
	colors: &[Color],
	frame_index: u64,
) {
	let (width, height) = surface.size();
	if colors.is_empty() || width <= 0.0 || waves.step <= 0.0 {
		return;
	}

	let phase = frame_index as f64 * waves.speed;
	let center = height * waves.baseline;
	let steps = (width / waves.step).ceil() as usize;

	surface.set_global_alpha(waves.alpha.clamp(0.0, 1.0));
	for (idx, &color) in colors.iter().enumerate() {
		let offset = idx as f64 * width / colors.len() as f64 + phase;
		let points: Vec<(f64, f64)> = (0..steps)
			.map(|s| {
				let x = s as f64 * waves.step;
				(x, center + ((x + offset) * waves.frequency).sin() * waves.amplitude)
			})
			.collect();

		surface.set_glow(waves.glow, color);
		surface.stroke_path(&points, waves.width, color);
	}
	surface.clear_glow();
	surface.set_global_alpha(1.0);
}
