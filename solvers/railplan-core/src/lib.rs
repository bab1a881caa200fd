//! Core types for the railway multi-agent path planning core.
//!
//! Holds the grid data model, the read-only rail view, the reservation
//! table, and per-agent planning metadata. No search logic lives here —
//! see `railplan-search` for the time-expanded search, prioritized planner,
//! replanner, and LNS improver built on top of these types.

mod agent;
mod cell;
mod error;
mod path;
mod rail;
mod reservation;

pub use agent::{AgentDescriptor, AgentMeta, AgentMetaCache};
pub use cell::{Cell, Heading};
pub use error::PlanError;
pub use path::Path;
pub use rail::{GridRail, RailView};
pub use reservation::ReservationTable;
