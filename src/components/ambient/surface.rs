//! The drawing surface the renderer paints into.
//!
//! [`Surface`] is the small slice of the 2D canvas API the engine needs.
//! [`CanvasSurface`] implements it on top of `CanvasRenderingContext2d`; tests
//! use a recording implementation instead.

use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use super::error::EngineError;
use super::palette::{Color, Fill};

/// A mutable 2D raster target.
///
/// `size` must report the current dimensions on every call; the host may
/// resize the surface between frames.
pub trait Surface {
	fn size(&self) -> (f64, f64);

	/// Opacity multiplier for all following draws.
	fn set_global_alpha(&mut self, alpha: f64);

	/// Shadow blur for following draws; a blur of 0 disables the glow.
	fn set_glow(&mut self, blur: f64, color: Color);

	fn clear_glow(&mut self) {
		self.set_glow(0.0, Color::rgba(0, 0, 0, 0.0));
	}

	/// Cover the whole surface. Gradients run top-left to bottom-right.
	fn fill_background(&mut self, fill: &Fill);

	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color);

	fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color);

	/// Stroke an open polyline through `points`.
	fn stroke_path(&mut self, points: &[(f64, f64)], width: f64, color: Color);
}

/// [`Surface`] backed by an HTML canvas element.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	pub fn from_canvas(canvas: HtmlCanvasElement) -> Result<Self, EngineError> {
		let ctx = canvas
			.get_context("2d")
			.map_err(|_| EngineError::ContextUnavailable)?
			.ok_or(EngineError::ContextUnavailable)?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| EngineError::ContextUnavailable)?;
		Ok(Self { canvas, ctx })
	}

	/// Look up an existing `<canvas id=...>` in the document.
	pub fn from_element_id(document: &Document, id: &str) -> Result<Self, EngineError> {
		let element = document
			.get_element_by_id(id)
			.ok_or_else(|| EngineError::SurfaceMissing(id.to_string()))?;
		let canvas = element
			.dyn_into::<HtmlCanvasElement>()
			.map_err(|_| EngineError::NotACanvas(id.to_string()))?;
		Self::from_canvas(canvas)
	}

	pub fn canvas(&self) -> &HtmlCanvasElement {
		&self.canvas
	}

	/// Match the backing store to the given CSS pixel size.
	pub fn resize(&self, width: f64, height: f64) {
		self.canvas.set_width(width.max(0.0) as u32);
		self.canvas.set_height(height.max(0.0) as u32);
	}
}

impl Surface for CanvasSurface {
	fn size(&self) -> (f64, f64) {
		(self.canvas.width() as f64, self.canvas.height() as f64)
	}

	fn set_global_alpha(&mut self, alpha: f64) {
		self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
	}

	fn set_glow(&mut self, blur: f64, color: Color) {
		self.ctx.set_shadow_blur(blur.max(0.0));
		self.ctx.set_shadow_color(&color.to_css());
	}

	fn fill_background(&mut self, fill: &Fill) {
		let (width, height) = self.size();
		match fill {
			Fill::Solid(color) => self.ctx.set_fill_style_str(&color.to_css()),
			Fill::LinearGradient(stops) => {
				let gradient = self.ctx.create_linear_gradient(0.0, 0.0, width, height);
				for stop in stops {
					let _ = gradient.add_color_stop(stop.offset.clamp(0.0, 1.0) as f32, &stop.color.to_css());
				}
				#[allow(deprecated)]
				self.ctx.set_fill_style(&gradient);
			}
		}
		self.ctx.fill_rect(0.0, 0.0, width, height);
	}

	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color) {
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius.max(0.0), 0.0, PI * 2.0);
		self.ctx.fill();
	}

	fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
		self.ctx.set_stroke_style_str(&color.to_css());
		self.ctx.set_line_width(width);
		self.ctx.begin_path();
		self.ctx.move_to(from.0, from.1);
		self.ctx.line_to(to.0, to.1);
		self.ctx.stroke();
	}

	fn stroke_path(&mut self, points: &[(f64, f64)], width: f64, color: Color) {
		let Some((&(x0, y0), rest)) = points.split_first() else {
			return;
		};
		self.ctx.set_stroke_style_str(&color.to_css());
		self.ctx.set_line_width(width);
		self.ctx.begin_path();
		self.ctx.move_to(x0, y0);
		for &(x, y) in rest {
			self.ctx.line_to(x, y);
		}
		self.ctx.stroke();
	}
}

#[cfg(test)]
pub(crate) mod recording {
	//! In-memory [`Surface`] that logs every call.

	use super::*;

	#[derive(Clone, Debug, PartialEq)]
	pub enum DrawOp {
		GlobalAlpha(f64),
		Glow { blur: f64 },
		Background(Fill),
		Circle { x: f64, y: f64, radius: f64, color: Color, glow: f64 },
		Line { from: (f64, f64), to: (f64, f64), width: f64, color: Color, glow: f64 },
		Path { points: usize, width: f64, color: Color },
	}

	pub struct RecordingSurface {
		pub width: f64,
		pub height: f64,
		pub ops: Vec<DrawOp>,
		glow: f64,
	}

	impl RecordingSurface {
		pub fn new(width: f64, height: f64) -> Self {
			Self {
				width,
				height,
				ops: Vec::new(),
				glow: 0.0,
			}
		}

		pub fn circles(&self) -> impl Iterator<Item = &DrawOp> {
			self.ops.iter().filter(|op| matches!(op, DrawOp::Circle { .. }))
		}

		pub fn lines(&self) -> impl Iterator<Item = &DrawOp> {
			self.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. }))
		}
	}

	impl Surface for RecordingSurface {
		fn size(&self) -> (f64, f64) {
			(self.width, self.height)
		}

		fn set_global_alpha(&mut self, alpha: f64) {
			self.ops.push(DrawOp::GlobalAlpha(alpha));
		}

		fn set_glow(&mut self, blur: f64, _color: Color) {
			self.glow = blur;
			self.ops.push(DrawOp::Glow { blur });
		}

		fn fill_background(&mut self, fill: &Fill) {
			self.ops.push(DrawOp::Background(fill.clone()));
		}

		fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color) {
			self.ops.push(DrawOp::Circle {
				x,
				y,
				radius,
				color,
				glow: self.glow,
			});
		}

		fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
			self.ops.push(DrawOp::Line {
				from,
				to,
				width,
				color,
				glow: self.glow,
			});
		}

		fn stroke_path(&mut self, points: &[(f64, f64)], width: f64, color: Color) {
			self.ops.push(DrawOp::Path {
				points: points.len(),
				width,
				color,
			});
		}
	}
}
