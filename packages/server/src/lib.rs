//! Real-time multiplayer typing race server.
//!
//! - `domain`: rooms, players, the race state machine and the stats calculator
//! - `usecase`: matchmaking, progress reporting, leaving, room queries and the
//!   race coordinator that sequences mutations and notices per room
//! - `infrastructure`: in-memory stores, the WebSocket pusher and DTOs
//! - `ui`: axum router and handlers

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
