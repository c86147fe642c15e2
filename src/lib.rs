//! ambient-particles: theme-aware animated particle backgrounds for the web.
//!
//! This crate provides a WASM canvas component that renders drifting or
//! emitted particles, proximity connections and an adaptive light/dark
//! palette behind a page's content.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

// Only pulled in to enable its `js` entropy source.
#[cfg(target_arch = "wasm32")]
use getrandom as _;

pub use components::ambient::{
	AmbientCanvas, AmbientHandle, EngineConfig, EngineError, HostOptions, Preset, ThemeMode,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("ambient-particles: logging initialized");
}

/// Load engine configuration from a script element with id="ambient-config".
/// Expected format: JSON with { preset: "...", ...overrides }
fn load_config() -> Option<EngineConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("ambient-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match EngineConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"ambient-particles: loaded config, population {:?}",
				config.field.population
			);
			Some(config)
		}
		Err(e) => {
			warn!("ambient-particles: failed to parse config: {}", e);
			None
		}
	}
}

/// Flip the root element between the `dark` and `light` classes.
fn toggle_theme() {
	let Some(root) = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.document_element())
	else {
		return;
	};
	let classes = root.class_list();
	let (from, to) = if classes.contains("light") {
		("light", "dark")
	} else {
		("dark", "light")
	};
	let _ = classes.remove_1(from);
	let _ = classes.add_1(to);
}

/// Main application component.
/// Loads engine configuration from the DOM and renders the ambient background.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config().unwrap_or_default();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:class="dark" />
		<Title text="Ambient Particles" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<AmbientCanvas config=config />
		<div class="ambient-overlay">
			<h1>"Ambient Particles"</h1>
			<button class="theme-toggle" on:click=move |_| toggle_theme()>
				"Toggle theme"
			</button>
		</div>
	}
}
