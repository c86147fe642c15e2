//! Ambient particle background.
//!
//! Draws a continuously animated field of particles on an HTML canvas, with
//! optional connecting lines between nearby particles and a palette that
//! follows the page's light/dark theme:
//! - A persistent population that drifts and bounces, or a decaying emission
//!   population that reacts to the pointer
//! - Proximity connections with strength-scaled alpha and optional halo
//! - Static, solid or hue-cycling backgrounds, with optional motion trails
//!
//! The simulation and drawing core (`field`, `connections`, `render`,
//! `scheduler`) is independent of the browser and talks to the canvas through
//! the [`Surface`] trait. `host` and `component` wire it to the DOM.
//!
//! # Example
//!
//! ```ignore
//! use ambient_particles::{AmbientCanvas, EngineConfig};
//!
//! view! { <AmbientCanvas config=EngineConfig::fluid() /> }
//! ```

mod component;
pub mod config;
pub mod connections;
pub mod error;
pub mod field;
pub mod host;
pub mod palette;
pub mod particles;
pub mod render;
pub mod scheduler;
pub mod surface;

pub use component::AmbientCanvas;
pub use config::{EngineConfig, Preset};
pub use error::EngineError;
pub use host::{AmbientHandle, HostOptions};
pub use palette::{Color, ThemeMode, ThemeSignal, ThemeSubscription};
pub use scheduler::{AmbientEngine, FrameScheduler};
pub use surface::{CanvasSurface, Surface};
