//! Theme-aware colors for the ambient background.
//!
//! A [`PaletteProvider`] pairs a [`ThemeSignal`] with one [`Palette`] per
//! [`ThemeMode`]. The signal is read on every query, so a theme switch on the
//! host page shows up on the next frame without any caching in between.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use rand::Rng;

use super::error::EngineError;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const WHITE: Color = Color::rgb(255, 255, 255);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self {
			a: a.clamp(0.0, 1.0),
			..self
		}
	}

	/// Build a color from hue (degrees), saturation and lightness (both 0..1).
	///
	/// Same sector walk as an HSV conversion, with the chroma and offset taken
	/// from lightness so the result matches CSS `hsl()`.
	pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
		let h = hue.rem_euclid(360.0) / 60.0;
		let s = saturation.clamp(0.0, 1.0);
		let l = lightness.clamp(0.0, 1.0);

		let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
		let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
		let (r1, g1, b1) = match h as u32 {
			0 => (chroma, x, 0.0),
			1 => (x, chroma, 0.0),
			2 => (0.0, chroma, x),
			3 => (0.0, x, chroma),
			4 => (x, 0.0, chroma),
			_ => (chroma, 0.0, x),
		};
		let m = l - chroma / 2.0;
		let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

		Self::rgb(channel(r1), channel(g1), channel(b1))
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Light or dark presentation of the host page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemeMode {
	#[default]
	Dark,
	Light,
}

/// Keeps a theme subscription alive. Dropping it unsubscribes.
pub struct ThemeSubscription {
	_guard: Box<dyn Any>,
}

impl ThemeSubscription {
	pub fn new(guard: impl Any) -> Self {
		Self {
			_guard: Box::new(guard),
		}
	}

	/// A subscription to a signal that never changes.
	pub fn inert() -> Self {
		Self::new(())
	}
}

/// Source of the current theme mode.
///
/// Implemented once at the host boundary (see `host::DocumentTheme`). The
/// engine reads the mode when it needs it and subscribes through
/// `scheduler::subscribe_theme` to learn when to repaint.
pub trait ThemeSignal {
	fn current_mode(&self) -> ThemeMode;

	/// Call `callback` after every mode change until the returned
	/// subscription is dropped. Fixed signals never fire.
	fn on_change(&self, _callback: Box<dyn FnMut()>) -> Result<ThemeSubscription, EngineError> {
		Ok(ThemeSubscription::inert())
	}
}

impl ThemeSignal for ThemeMode {
	fn current_mode(&self) -> ThemeMode {
		*self
	}
}

impl ThemeSignal for Cell<ThemeMode> {
	fn current_mode(&self) -> ThemeMode {
		self.get()
	}
}

impl<T: ThemeSignal + ?Sized> ThemeSignal for Rc<T> {
	fn current_mode(&self) -> ThemeMode {
		(**self).current_mode()
	}

	fn on_change(&self, callback: Box<dyn FnMut()>) -> Result<ThemeSubscription, EngineError> {
		(**self).on_change(callback)
	}
}

/// Fixed set of colors particles are drawn from.
#[derive(Clone, Debug)]
pub struct ParticlePalette {
	pub colors: Vec<Color>,
}

impl ParticlePalette {
	/// Uniform random pick. An empty palette yields white.
	pub fn pick<R: Rng>(&self, rng: &mut R) -> Color {
		if self.colors.is_empty() {
			return Color::WHITE;
		}
		self.colors[rng.gen_range(0..self.colors.len())]
	}

	pub fn get(&self, index: usize) -> Color {
		if self.colors.is_empty() {
			return Color::WHITE;
		}
		self.colors[index % self.colors.len()]
	}

	pub fn contains(&self, color: Color) -> bool {
		self.colors.contains(&color)
	}
}

/// Stroke colors used for connection lines.
#[derive(Clone, Debug)]
pub struct ConnectionPaint {
	/// Line color; its alpha is replaced per connection.
	pub color: Color,
	pub glow_color: Color,
	/// Shadow blur applied to every line, in pixels.
	pub glow_blur: f64,
}

/// A color stop on a linear gradient, `offset` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
	pub offset: f64,
	pub color: Color,
}

impl GradientStop {
	pub const fn new(offset: f64, color: Color) -> Self {
		Self { offset, color }
	}
}

/// How the background is derived for a frame.
#[derive(Clone, Debug)]
pub enum BackgroundRule {
	/// Diagonal gradient with fixed stops.
	StaticGradient { stops: Vec<GradientStop> },
	/// Diagonal gradient whose stop hues rotate with the frame index.
	AnimatedHueCycle {
		base_hues: Vec<f64>,
		/// Degrees per frame.
		speed: f64,
		saturation: f64,
		lightness: f64,
	},
	Solid(Color),
}

/// Concrete background fill for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
	Solid(Color),
	/// Gradient from the top-left to the bottom-right corner.
	LinearGradient(Vec<GradientStop>),
}

impl BackgroundRule {
	pub fn treatment(&self, frame_index: u64) -> Fill {
		match self {
			BackgroundRule::StaticGradient { stops } => Fill::LinearGradient(stops.clone()),
			BackgroundRule::Solid(color) => Fill::Solid(*color),
			BackgroundRule::AnimatedHueCycle {
				base_hues,
				speed,
				saturation,
				lightness,
			} => {
				let shift = frame_index as f64 * speed;
				let colors: Vec<Color> = base_hues
					.iter()
					.map(|base| Color::from_hsl((base + shift).rem_euclid(360.0), *saturation, *lightness))
					.collect();
				match colors.len() {
					0 => Fill::Solid(Color::rgb(0, 0, 0)),
					1 => Fill::Solid(colors[0]),
					n => Fill::LinearGradient(
						colors
							.into_iter()
							.enumerate()
							.map(|(i, color)| GradientStop::new(i as f64 / (n - 1) as f64, color))
							.collect(),
					),
				}
			}
		}
	}
}

/// Everything needed to paint one theme mode.
#[derive(Clone, Debug)]
pub struct Palette {
	pub particles: ParticlePalette,
	pub connection: ConnectionPaint,
	pub background: BackgroundRule,
}

impl Palette {
	/// Neon particles over a dark teal gradient.
	pub fn constellation_dark() -> Self {
		Self {
			particles: ParticlePalette {
				colors: vec![
					Color::rgb(0, 255, 255), // Cyan
					Color::rgb(255, 20, 147), // Deep pink
					Color::rgb(255, 215, 0), // Gold
					Color::rgb(0, 255, 0),   // Lime
				],
			},
			connection: ConnectionPaint {
				color: Color::rgb(127, 216, 216),
				glow_color: Color::rgb(0, 255, 255),
				glow_blur: 15.0,
			},
			background: BackgroundRule::StaticGradient {
				stops: vec![
					GradientStop::new(0.0, Color::rgb(26, 26, 26)),
					GradientStop::new(0.5, Color::rgb(13, 61, 77)),
					GradientStop::new(1.0, Color::rgb(26, 26, 26)),
				],
			},
		}
	}

	/// Pastel particles over a near-white gradient.
	pub fn constellation_light() -> Self {
		Self {
			particles: ParticlePalette {
				colors: vec![
					Color::rgb(255, 105, 180), // Hot pink
					Color::rgb(0, 191, 255),   // Deep sky blue
					Color::rgb(0, 255, 127),   // Spring green
					Color::rgb(255, 182, 193), // Light pink
				],
			},
			connection: ConnectionPaint {
				color: Color::rgb(255, 105, 180),
				glow_color: Color::rgb(255, 105, 180),
				glow_blur: 10.0,
			},
			background: BackgroundRule::StaticGradient {
				stops: vec![
					GradientStop::new(0.0, Color::rgb(255, 255, 255)),
					GradientStop::new(0.5, Color::rgb(245, 245, 245)),
					GradientStop::new(1.0, Color::rgb(255, 255, 255)),
				],
			},
		}
	}

	fn fluid_colors() -> ParticlePalette {
		ParticlePalette {
			colors: vec![
				Color::rgb(0, 255, 255), // Cyan
				Color::rgb(255, 0, 255), // Magenta
				Color::rgb(255, 255, 0), // Yellow
			],
		}
	}

	/// Primary neon sparks over near-black.
	pub fn fluid_dark() -> Self {
		Self {
			particles: Self::fluid_colors(),
			connection: ConnectionPaint {
				color: Color::rgb(0, 255, 255),
				glow_color: Color::rgb(0, 255, 255),
				glow_blur: 10.0,
			},
			background: BackgroundRule::Solid(Color::rgb(10, 10, 10)),
		}
	}

	pub fn fluid_light() -> Self {
		Self {
			particles: Self::fluid_colors(),
			connection: ConnectionPaint {
				color: Color::rgb(255, 0, 255),
				glow_color: Color::rgb(255, 0, 255),
				glow_blur: 8.0,
			},
			background: BackgroundRule::Solid(Color::rgb(245, 245, 245)),
		}
	}

	/// Slowly rotating deep hues with pale particles.
	pub fn aurora_dark() -> Self {
		Self {
			particles: ParticlePalette {
				colors: vec![
					Color::rgb(180, 230, 255), // Ice
					Color::rgb(200, 180, 255), // Lilac
					Color::rgb(170, 255, 220), // Mint
				],
			},
			connection: ConnectionPaint {
				color: Color::rgb(190, 220, 255),
				glow_color: Color::rgb(140, 200, 255),
				glow_blur: 12.0,
			},
			background: BackgroundRule::AnimatedHueCycle {
				base_hues: vec![200.0, 260.0, 320.0],
				speed: 0.2,
				saturation: 0.55,
				lightness: 0.12,
			},
		}
	}

	pub fn aurora_light() -> Self {
		Self {
			particles: ParticlePalette {
				colors: vec![
					Color::rgb(70, 110, 170), // Denim
					Color::rgb(120, 80, 160), // Plum
					Color::rgb(40, 140, 120), // Jade
				],
			},
			connection: ConnectionPaint {
				color: Color::rgb(90, 110, 160),
				glow_color: Color::rgb(120, 150, 220),
				glow_blur: 8.0,
			},
			background: BackgroundRule::AnimatedHueCycle {
				base_hues: vec![200.0, 260.0, 320.0],
				speed: 0.2,
				saturation: 0.6,
				lightness: 0.92,
			},
		}
	}
}

/// One palette per theme mode.
#[derive(Clone, Debug)]
pub struct PaletteSet {
	pub dark: Palette,
	pub light: Palette,
}

impl PaletteSet {
	pub fn constellation() -> Self {
		Self {
			dark: Palette::constellation_dark(),
			light: Palette::constellation_light(),
		}
	}

	pub fn fluid() -> Self {
		Self {
			dark: Palette::fluid_dark(),
			light: Palette::fluid_light(),
		}
	}

	pub fn aurora() -> Self {
		Self {
			dark: Palette::aurora_dark(),
			light: Palette::aurora_light(),
		}
	}

	pub fn for_mode(&self, mode: ThemeMode) -> &Palette {
		match mode {
			ThemeMode::Dark => &self.dark,
			ThemeMode::Light => &self.light,
		}
	}
}

/// Resolves the palette for the host's current theme.
pub struct PaletteProvider<S> {
	signal: S,
	palettes: PaletteSet,
}

impl<S: ThemeSignal> PaletteProvider<S> {
	pub fn new(signal: S, palettes: PaletteSet) -> Self {
		Self { signal, palettes }
	}

	/// Reads the theme signal; never cached.
	pub fn current_mode(&self) -> ThemeMode {
		self.signal.current_mode()
	}

	pub fn palette_for(&self, mode: ThemeMode) -> &Palette {
		self.palettes.for_mode(mode)
	}

	pub fn colors_for(&self, mode: ThemeMode) -> &ParticlePalette {
		&self.palettes.for_mode(mode).particles
	}

	pub fn background_treatment_for(&self, mode: ThemeMode, frame_index: u64) -> Fill {
		self.palettes.for_mode(mode).background.treatment(frame_index)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	#[test]
	fn hsl_primaries() {
		assert_eq!(Color::from_hsl(0.0, 1.0, 0.5), Color::rgb(255, 0, 0));
		assert_eq!(Color::from_hsl(120.0, 1.0, 0.5), Color::rgb(0, 255, 0));
		assert_eq!(Color::from_hsl(240.0, 1.0, 0.5), Color::rgb(0, 0, 255));
		assert_eq!(Color::from_hsl(360.0, 1.0, 0.5), Color::rgb(255, 0, 0));
		assert_eq!(Color::from_hsl(-120.0, 1.0, 0.5), Color::rgb(0, 0, 255));
	}

	#[test]
	fn css_output() {
		assert_eq!(Color::rgb(0, 255, 255).to_css(), "#00ffff");
		assert_eq!(
			Color::rgb(127, 216, 216).with_alpha(0.5).to_css(),
			"rgba(127, 216, 216, 0.5)"
		);
		assert_eq!(Color::WHITE.with_alpha(3.0).a, 1.0);
	}

	#[test]
	fn provider_follows_signal_between_queries() {
		let signal = Rc::new(Cell::new(ThemeMode::Dark));
		let provider = PaletteProvider::new(signal.clone(), PaletteSet::constellation());
		assert_eq!(provider.current_mode(), ThemeMode::Dark);

		signal.set(ThemeMode::Light);
		assert_eq!(provider.current_mode(), ThemeMode::Light);
		assert!(
			provider
				.colors_for(ThemeMode::Light)
				.contains(Color::rgb(255, 105, 180))
		);
	}

	#[test]
	fn pick_stays_within_palette() {
		let palette = Palette::constellation_dark().particles;
		let mut rng = SmallRng::seed_from_u64(7);
		for _ in 0..200 {
			assert!(palette.contains(palette.pick(&mut rng)));
		}
		let empty = ParticlePalette { colors: Vec::new() };
		assert_eq!(empty.pick(&mut rng), Color::WHITE);
		assert_eq!(empty.get(3), Color::WHITE);
	}

	#[test]
	fn static_backgrounds_ignore_frame_index() {
		let provider = PaletteProvider::new(ThemeMode::Dark, PaletteSet::constellation());
		assert_eq!(
			provider.background_treatment_for(ThemeMode::Dark, 0),
			provider.background_treatment_for(ThemeMode::Dark, 9_999)
		);

		let fluid = PaletteProvider::new(ThemeMode::Dark, PaletteSet::fluid());
		assert_eq!(
			fluid.background_treatment_for(ThemeMode::Dark, 42),
			Fill::Solid(Color::rgb(10, 10, 10))
		);
	}

	#[test]
	fn hue_cycle_advances_and_wraps() {
		let rule = BackgroundRule::AnimatedHueCycle {
			base_hues: vec![0.0, 120.0],
			speed: 1.0,
			saturation: 1.0,
			lightness: 0.5,
		};

		let Fill::LinearGradient(start) = rule.treatment(0) else {
			panic!("expected gradient");
		};
		assert_eq!(start.len(), 2);
		assert_eq!(start[0].offset, 0.0);
		assert_eq!(start[1].offset, 1.0);
		assert_eq!(start[0].color, Color::rgb(255, 0, 0));
		assert_eq!(start[1].color, Color::rgb(0, 255, 0));

		// A full turn lands back on the same hues.
		assert_eq!(rule.treatment(360), Fill::LinearGradient(start.clone()));
		assert_ne!(rule.treatment(60), Fill::LinearGradient(start));
		let Fill::LinearGradient(shifted) = rule.treatment(240) else {
			panic!("expected gradient");
		};
		assert_eq!(shifted[0].color, Color::rgb(0, 0, 255));
	}

	#[test]
	fn single_hue_cycle_is_solid() {
		let rule = BackgroundRule::AnimatedHueCycle {
			base_hues: vec![240.0],
			speed: 0.5,
			saturation: 1.0,
			lightness: 0.5,
		};
		assert_eq!(rule.treatment(0), Fill::Solid(Color::rgb(0, 0, 255)));
	}
}
