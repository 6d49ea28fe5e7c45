//! Environment port - the simulated world the agent acts in
//!
//! The learning core never owns the world. It reads the receptacle and object
//! positions, issues one displacement per decision, and removes objects once
//! their episode is resolved. Everything else (spawning positions, falling,
//! despawning) belongs to the implementation.

use crate::types::{FallingObject, ObjectId};

/// Environment trait - 1-D catch world seen through the learning core
///
/// # Examples
///
/// ```
/// use catcher::{
///     ports::Environment,
///     types::{FallingObject, ObjectId},
/// };
///
/// struct StillLife {
///     receptacle_x: f64,
///     object: Option<FallingObject>,
/// }
///
/// impl Environment for StillLife {
///     fn receptacle_x(&self) -> f64 {
///         self.receptacle_x
///     }
///     fn nearest_object(&self) -> Option<FallingObject> {
///         self.object
///     }
///     fn object(&self, id: ObjectId) -> Option<FallingObject> {
///         self.object.filter(|o| o.id == id)
///     }
///     fn apply_displacement(&mut self, dx: f64) {
///         self.receptacle_x += dx;
///     }
///     fn place_receptacle(&mut self, x: f64) {
///         self.receptacle_x = x;
///     }
///     fn remove_object(&mut self, id: ObjectId) {
///         self.object = self.object.filter(|o| o.id != id);
///     }
///     fn spawn_object(&mut self) {}
///     fn advance(&mut self, _dt: f64) {}
/// }
/// ```
pub trait Environment {
    /// Current horizontal position of the receptacle.
    fn receptacle_x(&self) -> f64;

    /// The object horizontally closest to the receptacle, if any.
    fn nearest_object(&self) -> Option<FallingObject>;

    /// Current position of a specific object, or `None` once it is gone.
    fn object(&self, id: ObjectId) -> Option<FallingObject>;

    /// Move the receptacle by `dx`.
    fn apply_displacement(&mut self, dx: f64);

    /// Put the receptacle at `x` (used by the core to enforce world bounds).
    fn place_receptacle(&mut self, x: f64);

    /// Discard an object whose episode has been resolved.
    fn remove_object(&mut self, id: ObjectId);

    /// Spawn a new falling object (called by the spawn timer).
    fn spawn_object(&mut self);

    /// Advance physical time by `dt` seconds.
    fn advance(&mut self, dt: f64);
}
