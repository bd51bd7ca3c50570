//! Output renderers.

pub mod dot;

pub use dot::render_dot;
