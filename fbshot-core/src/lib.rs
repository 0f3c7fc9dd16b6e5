//! Core conversion and pattern engine for fbshot.
//!
//! This crate turns the raw pixel stream of a Linux framebuffer device into
//! a PNG or PNM image without ever buffering a whole frame, and evaluates
//! the filename/command patterns that decide where each image goes.
//!
//! The two entry points most callers want are [`png::save_png`] /
//! [`pnm::save_pnm`] for images and [`pattern::evaluate_path`] /
//! [`pattern::evaluate_command`] for patterns. Everything else is the
//! machinery underneath: [`geometry::FrameGeometry`] describes one frame's
//! row layout, [`convert`] streams packed pixels into a [`convert::RowSink`],
//! and the two backend modules provide the sinks.

pub mod convert;
pub mod error;
pub mod geometry;
pub mod pattern;
pub mod pixel;
pub mod png;
pub mod pnm;
