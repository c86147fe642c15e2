//! Frame loop state: one tick is update followed by draw.
//!
//! [`FrameScheduler`] knows nothing about `requestAnimationFrame`; the host
//! (see `host::AnimationLoop`) calls [`FrameScheduler::tick`] once per display
//! refresh and stops requesting frames as soon as a tick reports the
//! scheduler is no longer running. Theme changes and pointer stimuli are
//! delivered between ticks; theme resets are deferred to the start of the
//! next tick so they never interleave with an update/draw pair.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use rand::Rng;

use super::config::EngineConfig;
use super::error::EngineError;
use super::field::ParticleField;
use super::palette::{PaletteProvider, ThemeSignal, ThemeSubscription};
use super::render::{FrameStats, Renderer};
use super::surface::Surface;

/// Encapsulated engine state: field, palette and renderer for one instance.
pub struct AmbientEngine<S, R> {
	field: ParticleField,
	palette: PaletteProvider<S>,
	renderer: Renderer,
	rng: R,
	initialized: bool,
	theme_changed: bool,
}

impl<S: ThemeSignal, R: Rng> AmbientEngine<S, R> {
	pub fn new(config: EngineConfig, signal: S, rng: R) -> Self {
		Self {
			field: ParticleField::new(config.field),
			palette: PaletteProvider::new(signal, config.palettes),
			renderer: Renderer::new(config.render),
			rng,
			initialized: false,
			theme_changed: false,
		}
	}

	pub fn field(&self) -> &ParticleField {
		&self.field
	}

	pub fn palette(&self) -> &PaletteProvider<S> {
		&self.palette
	}

	/// (Re)populate the field for a surface of the given size.
	pub fn initialize(&mut self, width: f64, height: f64) {
		let colors = self.palette.colors_for(self.palette.current_mode());
		self.field.initialize(width, height, colors, &mut self.rng);
		self.initialized = true;
		self.theme_changed = false;
	}

	/// Record a theme change; the population is regenerated at the start of
	/// the next tick.
	pub fn notify_theme_changed(&mut self) {
		self.theme_changed = true;
	}

	pub fn on_external_stimulus(&mut self, x: f64, y: f64) -> usize {
		if !self.initialized && self.field.config().population.is_emission() {
			// Emission fields start empty at any size, so a burst that beats
			// the first frame must not be cleared by it.
			self.initialize(0.0, 0.0);
		}
		let colors = self.palette.colors_for(self.palette.current_mode());
		self.field.on_external_stimulus(x, y, colors, &mut self.rng)
	}

	/// Update then draw one frame against the surface's current size.
	fn step(&mut self, frame_index: u64, surface: &mut dyn Surface) -> FrameStats {
		let (width, height) = surface.size();
		if !self.initialized {
			self.initialize(width, height);
		}

		let mode = self.palette.current_mode();
		let colors = self.palette.colors_for(mode);
		if self.theme_changed {
			self.theme_changed = false;
			info!("ambient: applying theme {:?}", mode);
			self.field.on_theme_changed(width, height, colors, &mut self.rng);
		}

		self.field.update(frame_index, width, height, colors, &mut self.rng);
		self.renderer
			.draw_frame(&self.field, &self.palette, frame_index, surface, &mut self.rng)
	}
}

/// Lifecycle of the frame loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
	#[default]
	Stopped,
	Running,
}

/// Drives the update/draw cycle and exposes start, stop and reset.
pub struct FrameScheduler<S, R> {
	engine: AmbientEngine<S, R>,
	state: SchedulerState,
	frame_index: u64,
}

impl<S: ThemeSignal, R: Rng> FrameScheduler<S, R> {
	pub fn new(engine: AmbientEngine<S, R>) -> Self {
		Self {
			engine,
			state: SchedulerState::Stopped,
			frame_index: 0,
		}
	}

	pub fn state(&self) -> SchedulerState {
		self.state
	}

	pub fn is_running(&self) -> bool {
		self.state == SchedulerState::Running
	}

	pub fn frame_index(&self) -> u64 {
		self.frame_index
	}

	pub fn engine(&self) -> &AmbientEngine<S, R> {
		&self.engine
	}

	pub fn engine_mut(&mut self) -> &mut AmbientEngine<S, R> {
		&mut self.engine
	}

	/// Returns `false` if already running, so callers can tell whether a new
	/// frame request is needed.
	pub fn start(&mut self) -> bool {
		if self.is_running() {
			return false;
		}
		self.state = SchedulerState::Running;
		info!("ambient: scheduler started at frame {}", self.frame_index);
		true
	}

	/// Returns `false` if already stopped.
	pub fn stop(&mut self) -> bool {
		if !self.is_running() {
			return false;
		}
		self.state = SchedulerState::Stopped;
		info!("ambient: scheduler stopped at frame {}", self.frame_index);
		true
	}

	/// Rewind the frame counter and regenerate the population. The running
	/// state is kept.
	pub fn reset(&mut self, surface: &dyn Surface) {
		let (width, height) = surface.size();
		self.frame_index = 0;
		self.engine.initialize(width, height);
	}

	/// Run one frame if running. Returns `None` when stopped, which tells the
	/// host to stop requesting frames.
	pub fn tick(&mut self, surface: &mut dyn Surface) -> Option<FrameStats> {
		if !self.is_running() {
			return None;
		}
		self.frame_index += 1;
		Some(self.engine.step(self.frame_index, surface))
	}
}

/// Forward theme changes from `signal` to the scheduler's engine until the
/// returned subscription is dropped.
pub fn subscribe_theme<S, R>(
	scheduler: &Rc<RefCell<FrameScheduler<S, R>>>,
	signal: &impl ThemeSignal,
) -> Result<ThemeSubscription, EngineError>
where
	S: ThemeSignal + 'static,
	R: Rng + 'static,
{
	let scheduler = scheduler.clone();
	signal.on_change(Box::new(move || match scheduler.try_borrow_mut() {
		Ok(mut s) => s.engine_mut().notify_theme_changed(),
		Err(_) => warn!("ambient: theme change arrived mid-frame, ignored"),
	}))
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::components::ambient::field::PopulationPolicy;
	use crate::components::ambient::palette::{Palette, ThemeMode};
	use crate::components::ambient::surface::recording::RecordingSurface;
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	fn scheduler<S: ThemeSignal>(config: EngineConfig, signal: S) -> FrameScheduler<S, SmallRng> {
		FrameScheduler::new(AmbientEngine::new(config, signal, SmallRng::seed_from_u64(42)))
	}

	#[test]
	fn stopped_scheduler_does_nothing() {
		let mut scheduler = scheduler(EngineConfig::constellation(), ThemeMode::Dark);
		let mut surface = RecordingSurface::new(300.0, 200.0);
		assert_eq!(scheduler.state(), SchedulerState::Stopped);
		assert!(scheduler.tick(&mut surface).is_none());
		assert_eq!(scheduler.frame_index(), 0);
		assert!(surface.ops.is_empty());
	}

	#[test]
	fn start_and_stop_are_idempotent() {
		let mut scheduler = scheduler(EngineConfig::constellation(), ThemeMode::Dark);
		assert!(scheduler.start());
		assert!(!scheduler.start());
		assert!(scheduler.is_running());
		assert!(scheduler.stop());
		assert!(!scheduler.stop());
		assert!(scheduler.start());
	}

	#[test]
	fn first_tick_populates_from_surface_size() {
		let mut scheduler = scheduler(EngineConfig::constellation(), ThemeMode::Dark);
		let mut surface = RecordingSurface::new(300.0, 200.0);
		scheduler.start();

		let stats = scheduler.tick(&mut surface).unwrap();
		assert_eq!(stats.particles, 50);
		assert_eq!(scheduler.frame_index(), 1);
		for p in scheduler.engine().field().particles() {
			assert!(p.x <= 300.0 && p.y <= 200.0);
		}
	}

	#[test]
	fn emission_reaches_one_burst_after_three_ticks() {
		let mut scheduler = scheduler(EngineConfig::fluid(), ThemeMode::Dark);
		let mut surface = RecordingSurface::new(800.0, 600.0);
		scheduler.start();

		for _ in 0..2 {
			scheduler.tick(&mut surface);
			assert!(scheduler.engine().field().is_empty());
		}
		scheduler.tick(&mut surface);
		assert_eq!(scheduler.engine().field().len(), 5);
	}

	#[test]
	fn surface_size_is_reread_every_frame() {
		let mut scheduler = scheduler(EngineConfig::constellation(), ThemeMode::Dark);
		let mut surface = RecordingSurface::new(1000.0, 1000.0);
		scheduler.start();
		scheduler.tick(&mut surface);

		surface.width = 50.0;
		surface.height = 40.0;
		scheduler.tick(&mut surface);
		for p in scheduler.engine().field().particles() {
			assert!((0.0..=50.0).contains(&p.x));
			assert!((0.0..=40.0).contains(&p.y));
		}
	}

	#[test]
	fn theme_toggle_repaints_population_on_next_tick() {
		let signal = Rc::new(Cell::new(ThemeMode::Dark));
		let mut scheduler = scheduler(EngineConfig::constellation(), signal.clone());
		let mut surface = RecordingSurface::new(640.0, 480.0);
		scheduler.start();
		for _ in 0..10 {
			scheduler.tick(&mut surface);
		}
		let dark = Palette::constellation_dark().particles;
		let field = scheduler.engine().field();
		assert!(field.particles().iter().all(|p| dark.contains(p.color.unwrap())));

		signal.set(ThemeMode::Light);
		scheduler.engine_mut().notify_theme_changed();
		scheduler.tick(&mut surface);

		let light = Palette::constellation_light().particles;
		let field = scheduler.engine().field();
		assert_eq!(field.len(), 50);
		assert!(field.particles().iter().all(|p| light.contains(p.color.unwrap())));
	}

	#[test]
	fn stimulus_feeds_emission_field() {
		let mut scheduler = scheduler(EngineConfig::fluid(), ThemeMode::Dark);
		assert_eq!(scheduler.engine_mut().on_external_stimulus(40.0, 30.0), 3);
		assert_eq!(scheduler.engine().field().len(), 3);
	}

	#[test]
	fn stimulus_before_first_tick_survives_it() {
		let mut scheduler = scheduler(EngineConfig::fluid(), ThemeMode::Dark);
		let mut surface = RecordingSurface::new(800.0, 600.0);
		scheduler.start();
		assert_eq!(scheduler.engine_mut().on_external_stimulus(40.0, 30.0), 3);

		scheduler.tick(&mut surface);
		assert_eq!(scheduler.engine().field().len(), 3);
	}

	#[test]
	fn persistent_stimulus_does_not_skip_population() {
		let mut scheduler = scheduler(EngineConfig::constellation(), ThemeMode::Dark);
		let mut surface = RecordingSurface::new(300.0, 200.0);
		scheduler.start();
		assert_eq!(scheduler.engine_mut().on_external_stimulus(10.0, 10.0), 0);

		scheduler.tick(&mut surface);
		assert_eq!(scheduler.engine().field().len(), 50);
	}

	/// Signal whose mode and change notifications are driven by the test.
	#[derive(Default)]
	struct ManualTheme {
		mode: Cell<ThemeMode>,
		listeners: RefCell<Vec<Box<dyn FnMut()>>>,
	}

	impl ManualTheme {
		fn switch_to(&self, mode: ThemeMode) {
			self.mode.set(mode);
			for listener in self.listeners.borrow_mut().iter_mut() {
				listener();
			}
		}
	}

	impl ThemeSignal for ManualTheme {
		fn current_mode(&self) -> ThemeMode {
			self.mode.get()
		}

		fn on_change(&self, callback: Box<dyn FnMut()>) -> Result<ThemeSubscription, EngineError> {
			self.listeners.borrow_mut().push(callback);
			Ok(ThemeSubscription::inert())
		}
	}

	#[test]
	fn subscribed_signal_repaints_on_next_tick() {
		let signal = Rc::new(ManualTheme::default());
		let scheduler = Rc::new(RefCell::new(scheduler(EngineConfig::constellation(), signal.clone())));
		let _subscription = subscribe_theme(&scheduler, &signal).unwrap();
		let mut surface = RecordingSurface::new(640.0, 480.0);
		scheduler.borrow_mut().start();
		scheduler.borrow_mut().tick(&mut surface);

		signal.switch_to(ThemeMode::Light);
		scheduler.borrow_mut().tick(&mut surface);

		let light = Palette::constellation_light().particles;
		let scheduler = scheduler.borrow();
		let field = scheduler.engine().field();
		assert_eq!(field.len(), 50);
		assert!(field.particles().iter().all(|p| light.contains(p.color.unwrap())));
	}

	#[test]
	fn fixed_signals_accept_subscriptions() {
		let scheduler = Rc::new(RefCell::new(scheduler(EngineConfig::constellation(), ThemeMode::Dark)));
		assert!(subscribe_theme(&scheduler, &ThemeMode::Dark).is_ok());
		assert!(subscribe_theme(&scheduler, &Cell::new(ThemeMode::Light)).is_ok());
	}

	#[test]
	fn reset_rewinds_frames_and_keeps_running() {
		let mut config = EngineConfig::constellation();
		config.field.population = PopulationPolicy::PersistentFixedCount { count: 12 };
		let mut scheduler = scheduler(config, ThemeMode::Light);
		let mut surface = RecordingSurface::new(200.0, 200.0);
		scheduler.start();
		for _ in 0..5 {
			scheduler.tick(&mut surface);
		}

		scheduler.reset(&surface);
		assert_eq!(scheduler.frame_index(), 0);
		assert!(scheduler.is_running());
		assert_eq!(scheduler.engine().field().len(), 12);
		assert!(scheduler.tick(&mut surface).is_some());
		assert_eq!(scheduler.frame_index(), 1);
	}
}
