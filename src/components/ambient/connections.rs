//! Proximity links between particles.
//!
//! Every unordered pair is tested each frame, which is O(n²). That is fine for
//! the tens of particles an ambient background carries; a larger population
//! would want a spatial grid here.

use super::particles::Particle;

/// A pair of particle indices closer than the connection radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
	/// Always less than `j`.
	pub i: usize,
	pub j: usize,
	/// `1 - distance / radius`, in `[0, 1]`.
	pub strength: f64,
}

/// Pairs of particles within `radius` of each other, in index order.
///
/// A non-positive or non-finite radius connects nothing.
pub fn connections_for(particles: &[Particle], radius: f64) -> Vec<Connection> {
	let mut connections = Vec::new();
	if !(radius.is_finite() && radius > 0.0) {
		return connections;
	}

	for (i, a) in particles.iter().enumerate() {
		for (j, b) in particles.iter().enumerate().skip(i + 1) {
			let (dx, dy) = (a.x - b.x, a.y - b.y);
			let distance = (dx * dx + dy * dy).sqrt();
			if distance < radius {
				connections.push(Connection {
					i,
					j,
					strength: (1.0 - distance / radius).clamp(0.0, 1.0),
				});
			}
		}
	}
	connections
}
