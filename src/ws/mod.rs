//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` is the map surface transport: it pushes
//! contour overlays, knock updates and storm list changes, and accepts
//! channel subscription commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
