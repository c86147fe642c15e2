//! Ambient particles and their per-frame motion.

use serde::Deserialize;

use super::palette::Color;

/// Smallest decay a living particle may have, so its life always shrinks.
pub const MIN_DECAY_RATE: f64 = 1e-4;

/// Rule applied when a particle leaves the surface, per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
	/// Teleport to the opposite edge.
	Wrap,
	/// Reflect the velocity component and clamp to the edge.
	#[default]
	Bounce,
	/// Clamp to the edge, velocity untouched.
	Clamp,
}

impl BoundaryPolicy {
	/// Apply the policy on one axis spanning `[0, extent]`.
	fn apply(self, pos: &mut f64, vel: &mut f64, extent: f64) {
		let extent = extent.max(0.0);
		match self {
			BoundaryPolicy::Wrap => {
				if *pos < 0.0 {
					*pos = extent;
				} else if *pos > extent {
					*pos = 0.0;
				}
			}
			BoundaryPolicy::Bounce => {
				// Point the velocity back inside instead of negating it, so a
				// particle sitting on the edge is not flipped twice.
				if *pos < 0.0 {
					*pos = 0.0;
					*vel = vel.abs();
				} else if *pos > extent {
					*pos = extent;
					*vel = -vel.abs();
				}
			}
			BoundaryPolicy::Clamp => {
				*pos = pos.clamp(0.0, extent);
			}
		}
		if !pos.is_finite() {
			*pos = 0.0;
		}
	}
}

/// Remaining life of an emitted particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Life {
	/// Fraction of life left, starts at 1.
	pub remaining: f64,
	/// Amount subtracted every update.
	pub decay: f64,
}

impl Life {
	pub fn new(decay: f64) -> Self {
		Self {
			remaining: 1.0,
			decay: decay.max(MIN_DECAY_RATE),
		}
	}
}

/// Outcome of a particle update, consumed by the owning field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleStatus {
	Alive,
	Expired,
}

/// A single floating particle.
#[derive(Clone, Debug)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub radius: f64,
	pub opacity: f64,
	/// Fixed color, or `None` when a color is picked at every draw.
	pub color: Option<Color>,
	/// Present only for emitted particles.
	pub life: Option<Life>,
}

impl Particle {
	/// Advance one frame inside a `width` x `height` surface.
	///
	/// Gravity is added to `vy` before moving. Never allocates and never
	/// touches the drawing surface.
	pub fn update(
		&mut self,
		width: f64,
		height: f64,
		boundary: BoundaryPolicy,
		gravity: Option<f64>,
	) -> ParticleStatus {
		if let Some(g) = gravity {
			self.vy += g;
		}
		self.x += self.vx;
		self.y += self.vy;

		boundary.apply(&mut self.x, &mut self.vx, width);
		boundary.apply(&mut self.y, &mut self.vy, height);

		match self.life.as_mut() {
			Some(life) => {
				life.remaining -= life.decay;
				if life.remaining <= 0.0 {
					ParticleStatus::Expired
				} else {
					ParticleStatus::Alive
				}
			}
			None => ParticleStatus::Alive,
		}
	}

	/// Opacity to draw with, faded by remaining life.
	pub fn draw_alpha(&self) -> f64 {
		let life = self.life.map_or(1.0, |l| l.remaining);
		(self.opacity * life).clamp(0.0, 1.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn particle(x: f64, y: f64, vx: f64, vy: f64) -> Particle {
		Particle {
			x,
			y,
			vx,
			vy,
			radius: 2.0,
			opacity: 1.0,
			color: None,
			life: None,
		}
	}

	#[test]
	fn bounce_reflects_at_left_edge() {
		let mut p = particle(0.0, 50.0, -1.0, 0.0);
		p.update(100.0, 100.0, BoundaryPolicy::Bounce, None);
		assert_eq!((p.x, p.y), (0.0, 50.0));
		assert_eq!((p.vx, p.vy), (1.0, 0.0));
	}

	#[test]
	fn bounce_flips_once_per_crossing() {
		// Overshoot far enough that the next step would still be outside if
		// the velocity were flipped again.
		let mut p = particle(99.5, 10.0, 5.0, 0.0);
		p.update(100.0, 100.0, BoundaryPolicy::Bounce, None);
		assert_eq!(p.x, 100.0);
		assert_eq!(p.vx, -5.0);

		p.update(100.0, 100.0, BoundaryPolicy::Bounce, None);
		assert_eq!(p.x, 95.0);
		assert_eq!(p.vx, -5.0);
	}

	#[test]
	fn bounce_handles_both_axes_independently() {
		let mut p = particle(100.0, 100.0, 3.0, 4.0);
		p.update(100.0, 100.0, BoundaryPolicy::Bounce, None);
		assert_eq!((p.x, p.y), (100.0, 100.0));
		assert_eq!((p.vx, p.vy), (-3.0, -4.0));
	}

	#[test]
	fn wrap_teleports_to_opposite_edge() {
		let mut p = particle(1.0, 99.0, -2.0, 2.0);
		p.update(100.0, 100.0, BoundaryPolicy::Wrap, None);
		assert_eq!((p.x, p.y), (100.0, 0.0));
		assert_eq!((p.vx, p.vy), (-2.0, 2.0));
	}

	#[test]
	fn clamp_keeps_velocity() {
		let mut p = particle(1.0, 50.0, -4.0, 0.0);
		p.update(100.0, 100.0, BoundaryPolicy::Clamp, None);
		assert_eq!(p.x, 0.0);
		assert_eq!(p.vx, -4.0);
	}

	#[test]
	fn positions_stay_inside_after_resize() {
		for policy in [BoundaryPolicy::Wrap, BoundaryPolicy::Bounce, BoundaryPolicy::Clamp] {
			let mut p = particle(800.0, 600.0, 0.3, -0.2);
			p.update(320.0, 240.0, policy, None);
			assert!((0.0..=320.0).contains(&p.x), "{policy:?} x={}", p.x);
			assert!((0.0..=240.0).contains(&p.y), "{policy:?} y={}", p.y);
		}
	}

	#[test]
	fn zero_sized_surface_pins_to_origin() {
		let mut p = particle(5.0, 5.0, 1.0, 1.0);
		p.update(0.0, 0.0, BoundaryPolicy::Wrap, None);
		assert_eq!((p.x, p.y), (0.0, 0.0));
	}

	#[test]
	fn gravity_applies_before_moving() {
		let mut p = particle(50.0, 50.0, 0.0, 0.0);
		p.update(100.0, 100.0, BoundaryPolicy::Wrap, Some(0.1));
		assert!((p.vy - 0.1).abs() < 1e-12);
		assert!((p.y - 50.1).abs() < 1e-12);
	}

	#[test]
	fn life_decreases_until_expired() {
		let mut p = particle(50.0, 50.0, 0.0, 0.0);
		p.life = Some(Life::new(0.3));

		let mut last = 1.0;
		let mut ticks = 0;
		loop {
			ticks += 1;
			let status = p.update(100.0, 100.0, BoundaryPolicy::Wrap, None);
			let remaining = p.life.unwrap().remaining;
			assert!(remaining < last);
			last = remaining;
			if status == ParticleStatus::Expired {
				assert!(remaining <= 0.0);
				break;
			}
			assert!(remaining > 0.0);
		}
		assert_eq!(ticks, 4);
	}

	#[test]
	fn decay_is_clamped_positive() {
		assert_eq!(Life::new(0.0).decay, MIN_DECAY_RATE);
		assert_eq!(Life::new(-1.0).decay, MIN_DECAY_RATE);
	}

	#[test]
	fn draw_alpha_fades_with_life() {
		let mut p = particle(0.0, 0.0, 0.0, 0.0);
		p.opacity = 0.6;
		assert_eq!(p.draw_alpha(), 0.6);
		p.life = Some(Life {
			remaining: 0.5,
			decay: 0.01,
		});
		assert!((p.draw_alpha() - 0.3).abs() < 1e-12);
	}
}
