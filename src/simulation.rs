//! Built-in falling-object world.
//!
//! [`Orchard`] is a minimal implementation of the [`Environment`] port:
//! objects appear at a random x along the top edge, fall at a constant speed
//! and disappear below the floor. The receptacle only moves when the agent
//! asks it to.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::WorldConfig,
    ports::Environment,
    types::{FallingObject, ObjectId},
};

#[derive(Debug, Clone)]
pub struct Orchard {
    world: WorldConfig,
    receptacle_x: f64,
    objects: Vec<FallingObject>,
    next_id: u64,
    spawned: u64,
    rng: StdRng,
}

impl Orchard {
    pub fn new(world: WorldConfig) -> Self {
        Self {
            world,
            receptacle_x: world.receptacle_start_x,
            objects: Vec::new(),
            next_id: 0,
            spawned: 0,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Place an object at an explicit position.
    pub fn spawn_at(&mut self, x: f64, y: f64) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.spawned += 1;
        self.objects.push(FallingObject { id, x, y });
        id
    }

    /// Objects currently in the air, in spawn order.
    pub fn objects(&self) -> &[FallingObject] {
        &self.objects
    }

    /// Total objects spawned so far.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }
}

impl Environment for Orchard {
    fn receptacle_x(&self) -> f64 {
        self.receptacle_x
    }

    fn nearest_object(&self) -> Option<FallingObject> {
        // min_by keeps the first of equal elements, so ties go to the oldest
        self.objects.iter().copied().min_by(|a, b| {
            let da = (a.x - self.receptacle_x).abs();
            let db = (b.x - self.receptacle_x).abs();
            da.total_cmp(&db)
        })
    }

    fn object(&self, id: ObjectId) -> Option<FallingObject> {
        self.objects.iter().find(|o| o.id == id).copied()
    }

    fn apply_displacement(&mut self, dx: f64) {
        self.receptacle_x += dx;
    }

    fn place_receptacle(&mut self, x: f64) {
        self.receptacle_x = x;
    }

    fn remove_object(&mut self, id: ObjectId) {
        self.objects.retain(|o| o.id != id);
    }

    fn spawn_object(&mut self) {
        let x = if self.world.spawn_x_min < self.world.spawn_x_max {
            self.rng
                .random_range(self.world.spawn_x_min..self.world.spawn_x_max)
        } else {
            self.world.spawn_x_min
        };
        self.spawn_at(x, self.world.spawn_y);
    }

    fn advance(&mut self, dt: f64) {
        let fall = self.world.fall_speed * dt;
        for object in &mut self.objects {
            object.y -= fall;
        }
        let floor = self.world.despawn_y;
        self.objects.retain(|o| o.y >= floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_within_range() {
        let world = WorldConfig::default();
        let mut orchard = Orchard::new(world).with_seed(11);
        for _ in 0..100 {
            orchard.spawn_object();
        }
        assert_eq!(orchard.spawned(), 100);
        assert!(orchard.objects().iter().all(|o| {
            o.x >= world.spawn_x_min && o.x < world.spawn_x_max && o.y == world.spawn_y
        }));
    }

    #[test]
    fn test_objects_fall_and_despawn() {
        let mut orchard = Orchard::new(WorldConfig::default());
        let id = orchard.spawn_at(0.0, 6.0);

        orchard.advance(1.0);
        assert_eq!(orchard.object(id).unwrap().y, 1.0);

        orchard.advance(1.5);
        assert!(orchard.object(id).is_none());
    }

    #[test]
    fn test_nearest_object_prefers_oldest_on_tie() {
        let mut orchard = Orchard::new(WorldConfig::default());
        let first = orchard.spawn_at(2.0, 6.0);
        orchard.spawn_at(-2.0, 6.0);
        orchard.spawn_at(5.0, 6.0);
        assert_eq!(orchard.nearest_object().unwrap().id, first);

        orchard.place_receptacle(4.0);
        assert_eq!(orchard.nearest_object().unwrap().x, 5.0);
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = Orchard::new(WorldConfig::default()).with_seed(42);
        let mut b = Orchard::new(WorldConfig::default()).with_seed(42);
        for _ in 0..10 {
            a.spawn_object();
            b.spawn_object();
        }
        assert_eq!(a.objects(), b.objects());
    }
}
