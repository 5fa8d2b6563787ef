//! Core data models: players, projections and the raw record schema.

mod ids;
mod player;
mod projection;
mod schema;

pub use ids::*;
pub use player::*;
pub use projection::*;
pub use schema::*;
