//! Leptos component hosting an ambient background canvas.
//!
//! The component renders a `<canvas>` and, once it is mounted, hands it to an
//! [`AmbientHandle`]. Handles are not `Send`, so they are parked in a
//! thread-local table keyed by component instance and released from
//! `on_cleanup`, which stops the frame loop and detaches every listener.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use leptos::prelude::*;
use log::warn;
use web_sys::HtmlCanvasElement;

use super::config::EngineConfig;
use super::host::{AmbientHandle, HostOptions};

thread_local! {
	static HANDLES: RefCell<HashMap<u64, AmbientHandle>> = RefCell::new(HashMap::new());
	static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

const FULLSCREEN_STYLE: &str =
	"position: fixed; top: 0; left: 0; width: 100%; height: 100%; z-index: 0; pointer-events: none;";
const INLINE_STYLE: &str = "display: block; width: 100%; height: 100%;";

/// Animated particle background drawn on its own canvas.
///
/// With `fullscreen = true` (the default) the canvas is fixed behind the page
/// and tracks the viewport size; otherwise it takes its parent's size once
/// at mount. `pointer` forwards mouse and touch movement to emission presets.
#[component]
pub fn AmbientCanvas(
	#[prop(optional)] config: Option<EngineConfig>,
	#[prop(default = true)] fullscreen: bool,
	#[prop(default = true)] pointer: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let config = config.unwrap_or_default();
	let id = NEXT_ID.with(|next| {
		let id = next.get();
		next.set(id + 1);
		id
	});

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if HANDLES.with(|handles| handles.borrow().contains_key(&id)) {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();

		if !fullscreen {
			if let Some(parent) = canvas.parent_element() {
				canvas.set_width(parent.client_width().max(0) as u32);
				canvas.set_height(parent.client_height().max(0) as u32);
			}
		}

		match AmbientHandle::attach(canvas, config.clone(), HostOptions { fullscreen, pointer }) {
			Ok(handle) => HANDLES.with(|handles| {
				handles.borrow_mut().insert(id, handle);
			}),
			Err(e) => warn!("ambient: background not started: {}", e),
		}
	});

	on_cleanup(move || {
		let handle = HANDLES.with(|handles| handles.borrow_mut().remove(&id));
		drop(handle);
	});

	let style = if fullscreen { FULLSCREEN_STYLE } else { INLINE_STYLE };

	view! {
		<canvas
			node_ref=canvas_ref
			class="ambient-canvas"
			aria-hidden="true"
			style=style
		/>
	}
}
