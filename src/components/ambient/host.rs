//! Browser boundary: theme detection, frame callbacks, and event wiring.
//!
//! Everything that touches `web_sys` outside of the canvas context lives here.
//! Each host capability is held by a guard that releases it on drop:
//! [`ThemeObserver`] disconnects its `MutationObserver`, [`AnimationLoop`]
//! cancels its pending `requestAnimationFrame`, and [`EventListener`] removes
//! itself from its target.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
	Document, Element, Event, EventTarget, HtmlCanvasElement, MouseEvent, MutationObserver,
	MutationObserverInit, TouchEvent, Window,
};

use super::config::EngineConfig;
use super::error::EngineError;
use super::palette::{ThemeMode, ThemeSignal, ThemeSubscription};
use super::scheduler::{AmbientEngine, FrameScheduler, subscribe_theme};
use super::surface::{CanvasSurface, Surface};

fn window() -> Result<Window, EngineError> {
	web_sys::window().ok_or(EngineError::NoWindow)
}

fn document() -> Result<Document, EngineError> {
	window()?.document().ok_or(EngineError::NoDocument)
}

/// Theme read from the class list of the document's root element.
///
/// The page is dark when the root carries `dark`, or when it does not carry
/// `light`.
#[derive(Clone, Debug)]
pub struct DocumentTheme {
	root: Element,
}

impl DocumentTheme {
	pub fn new(root: Element) -> Self {
		Self { root }
	}

	pub fn from_document(document: &Document) -> Result<Self, EngineError> {
		document
			.document_element()
			.map(Self::new)
			.ok_or(EngineError::NoDocument)
	}

	/// Call `on_change` whenever the root element's `class` attribute changes.
	pub fn observe(&self, on_change: impl FnMut() + 'static) -> Result<ThemeObserver, EngineError> {
		let callback: Closure<dyn FnMut()> = Closure::new(on_change);
		let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

		let init = MutationObserverInit::new();
		init.set_attributes(true);
		init.set_attribute_filter(&js_sys::Array::of1(&JsValue::from_str("class")));
		observer.observe_with_options(&self.root, &init)?;

		Ok(ThemeObserver {
			observer,
			_callback: callback,
		})
	}
}

impl ThemeSignal for DocumentTheme {
	fn current_mode(&self) -> ThemeMode {
		let classes = self.root.class_list();
		if classes.contains("dark") || !classes.contains("light") {
			ThemeMode::Dark
		} else {
			ThemeMode::Light
		}
	}

	fn on_change(&self, callback: Box<dyn FnMut()>) -> Result<ThemeSubscription, EngineError> {
		self.observe(callback).map(ThemeSubscription::new)
	}
}

/// Disconnects the theme `MutationObserver` on drop.
pub struct ThemeObserver {
	observer: MutationObserver,
	_callback: Closure<dyn FnMut()>,
}

impl Drop for ThemeObserver {
	fn drop(&mut self) {
		self.observer.disconnect();
	}
}

/// Removes a DOM event listener on drop.
pub struct EventListener {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
	pub fn new(
		target: &EventTarget,
		event: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Result<Self, EngineError> {
		let callback: Closure<dyn FnMut(Event)> = Closure::new(handler);
		target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
		Ok(Self {
			target: target.clone(),
			event,
			callback,
		})
	}
}

impl Drop for EventListener {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A `requestAnimationFrame` loop.
///
/// `frame` runs once per display refresh and returns whether another frame
/// should be requested. Dropping the loop cancels the pending request and
/// frees the callback.
pub struct AnimationLoop {
	callback: FrameCallback,
	request_id: Rc<Cell<Option<i32>>>,
}

impl AnimationLoop {
	pub fn start(mut frame: impl FnMut() -> bool + 'static) -> Result<Self, EngineError> {
		let window = window()?;
		let callback: FrameCallback = Rc::new(RefCell::new(None));
		let request_id = Rc::new(Cell::new(None));

		let (callback_inner, request_inner) = (callback.clone(), request_id.clone());
		*callback.borrow_mut() = Some(Closure::new(move || {
			request_inner.set(None);
			if !frame() {
				return;
			}
			let borrowed = callback_inner.borrow();
			let (Some(cb), Some(win)) = (borrowed.as_ref(), web_sys::window()) else {
				return;
			};
			match win.request_animation_frame(cb.as_ref().unchecked_ref()) {
				Ok(id) => request_inner.set(Some(id)),
				Err(e) => warn!("ambient: requestAnimationFrame failed: {:?}", e),
			}
		}));

		if let Some(ref cb) = *callback.borrow() {
			request_id.set(Some(window.request_animation_frame(cb.as_ref().unchecked_ref())?));
		}

		Ok(Self {
			callback,
			request_id,
		})
	}

	pub fn is_pending(&self) -> bool {
		self.request_id.get().is_some()
	}
}

impl Drop for AnimationLoop {
	fn drop(&mut self) {
		if let (Some(id), Some(win)) = (self.request_id.take(), web_sys::window()) {
			let _ = win.cancel_animation_frame(id);
		}
		// Breaks the closure's reference to its own cell.
		self.callback.borrow_mut().take();
	}
}

/// How an attached engine integrates with the page.
#[derive(Clone, Copy, Debug)]
pub struct HostOptions {
	/// Keep the canvas sized to the viewport.
	pub fullscreen: bool,
	/// Forward mouse and touch movement as stimuli.
	pub pointer: bool,
}

impl Default for HostOptions {
	fn default() -> Self {
		Self {
			fullscreen: true,
			pointer: true,
		}
	}
}

type SharedScheduler = Rc<RefCell<FrameScheduler<DocumentTheme, SmallRng>>>;

/// A running ambient engine bound to a canvas.
///
/// Dropping the handle stops the frame loop and detaches every observer and
/// listener it installed.
pub struct AmbientHandle {
	scheduler: SharedScheduler,
	surface: Rc<RefCell<CanvasSurface>>,
	animation: Option<AnimationLoop>,
	_theme: ThemeSubscription,
	_listeners: Vec<EventListener>,
}

impl AmbientHandle {
	/// Attach to the `<canvas>` with the given id and start animating.
	pub fn attach_by_id(id: &str, config: EngineConfig, options: HostOptions) -> Result<Self, EngineError> {
		let surface = CanvasSurface::from_element_id(&document()?, id)?;
		Self::start_on(surface, config, options)
	}

	/// Attach to a canvas element and start animating.
	pub fn attach(
		canvas: HtmlCanvasElement,
		config: EngineConfig,
		options: HostOptions,
	) -> Result<Self, EngineError> {
		Self::start_on(CanvasSurface::from_canvas(canvas)?, config, options)
	}

	fn start_on(surface: CanvasSurface, config: EngineConfig, options: HostOptions) -> Result<Self, EngineError> {
		let window = window()?;
		let theme = DocumentTheme::from_document(&document()?)?;

		if options.fullscreen {
			let (w, h) = viewport_size(&window);
			surface.resize(w, h);
		}

		// Persistent fields ignore stimuli, so skip the listeners entirely.
		let pointer = options.pointer && config.field.population.is_emission();
		let mut engine = AmbientEngine::new(config, theme.clone(), SmallRng::from_entropy());
		// Populate before any listener can deliver a stimulus.
		let (width, height) = surface.size();
		engine.initialize(width, height);
		let scheduler: SharedScheduler = Rc::new(RefCell::new(FrameScheduler::new(engine)));
		let surface = Rc::new(RefCell::new(surface));

		let theme_subscription = subscribe_theme(&scheduler, &theme)?;

		let mut listeners = Vec::new();
		if options.fullscreen {
			let surface_resize = surface.clone();
			listeners.push(EventListener::new(&window, "resize", move |_| {
				if let Some(win) = web_sys::window() {
					let (w, h) = viewport_size(&win);
					surface_resize.borrow().resize(w, h);
				}
			})?);
		}
		if pointer {
			let (scheduler_mouse, surface_mouse) = (scheduler.clone(), surface.clone());
			listeners.push(EventListener::new(&window, "mousemove", move |ev| {
				if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
					let (x, y) = to_surface(&surface_mouse.borrow(), ev.client_x(), ev.client_y());
					scheduler_mouse.borrow_mut().engine_mut().on_external_stimulus(x, y);
				}
			})?);

			let (scheduler_touch, surface_touch) = (scheduler.clone(), surface.clone());
			listeners.push(EventListener::new(&window, "touchmove", move |ev| {
				let Some(touch) = ev.dyn_ref::<TouchEvent>().and_then(|t| t.touches().get(0)) else {
					return;
				};
				let (x, y) = to_surface(&surface_touch.borrow(), touch.client_x(), touch.client_y());
				scheduler_touch.borrow_mut().engine_mut().on_external_stimulus(x, y);
			})?);
		}

		let mut handle = Self {
			scheduler,
			surface,
			animation: None,
			_theme: theme_subscription,
			_listeners: listeners,
		};
		handle.start()?;
		Ok(handle)
	}

	/// Resume the frame loop. No-op if already running.
	pub fn start(&mut self) -> Result<(), EngineError> {
		if !self.scheduler.borrow_mut().start() && self.animation.is_some() {
			return Ok(());
		}
		let (scheduler, surface) = (self.scheduler.clone(), self.surface.clone());
		self.animation = Some(AnimationLoop::start(move || {
			let mut surface = surface.borrow_mut();
			scheduler.borrow_mut().tick(&mut *surface).is_some()
		})?);
		let (w, h) = self.surface.borrow().size();
		info!("ambient: animating {}x{} canvas", w, h);
		Ok(())
	}

	/// Stop requesting frames. The last frame stays on the canvas.
	pub fn stop(&mut self) {
		self.scheduler.borrow_mut().stop();
		self.animation = None;
	}

	/// Rewind the frame counter and regenerate the population.
	pub fn reset(&self) {
		self.scheduler.borrow_mut().reset(&*self.surface.borrow());
	}

	pub fn is_running(&self) -> bool {
		self.scheduler.borrow().is_running()
	}
}

impl Drop for AmbientHandle {
	fn drop(&mut self) {
		self.stop();
	}
}

fn viewport_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
	(dim(window.inner_width()), dim(window.inner_height()))
}

fn to_surface(surface: &CanvasSurface, client_x: i32, client_y: i32) -> (f64, f64) {
	let rect = surface.canvas().get_bounding_client_rect();
	(client_x as f64 - rect.left(), client_y as f64 - rect.top())
}
