// common/plugins/nntree.rs:
// NNTree implements nearest neighbor lookups via an underlying KdTree
// - adds a NNTree Resource for querying targetable entities around a point
// - updates the KdTree as entities change their positions
// Targetable requires Tracked, so lock-on candidates enter and leave the
// index with the entities themselves.

use bevy::{
    ecs::{lifecycle::HookContext, world::DeferredWorld},
    prelude::*,
};
use kiddo::float::{distance::SquaredEuclidean, kdtree::KdTree};

pub struct NNTreePlugin;

impl Plugin for NNTreePlugin {
    fn build(&self, app: &mut App) {
        let kdtree = NNTree(KdTree::with_capacity(10_000));
        app.insert_resource(kdtree).add_systems(Update, update);
    }
}

/// Last position an entity was indexed at; the remove hook and the update
/// system need it to find the old tree entry.
#[derive(Component, Default, Deref, DerefMut)]
#[component(on_add = on_add, on_remove = on_remove)]
pub struct Tracked(Vec3);

pub fn on_add(mut world: DeferredWorld, context: HookContext) {
    let pos = world
        .get::<Transform>(context.entity)
        .map(|t| t.translation)
        .unwrap_or_default();
    **world.get_mut::<Tracked>(context.entity).unwrap() = pos;
    if let Some(mut nntree) = world.get_resource_mut::<NNTree>() {
        nntree.0.add(&pos.to_array(), context.entity.to_bits());
    }
}

pub fn on_remove(mut world: DeferredWorld, context: HookContext) {
    let pos = **world.get::<Tracked>(context.entity).unwrap();
    if let Some(mut nntree) = world.get_resource_mut::<NNTree>() {
        nntree.0.remove(&pos.to_array(), context.entity.to_bits());
    }
}

#[derive(Resource)]
pub struct NNTree(KdTree<f32, u64, 3, 32, u32>);

impl NNTree {
    /// All tracked entities within `radius` of `center`, in undefined order,
    /// paired with their squared distance. Exclusion and ranking are the
    /// caller's business.
    pub fn within(&self, center: Vec3, radius: f32) -> Vec<(Entity, f32)> {
        self.0
            .within_unsorted::<SquaredEuclidean>(&center.to_array(), radius * radius)
            .into_iter()
            .map(|n| (Entity::from_bits(n.item), n.distance))
            .collect()
    }
}

pub fn update(
    mut query: Query<(Entity, &Transform, &mut Tracked), Changed<Transform>>,
    mut nntree: ResMut<NNTree>,
) {
    for (ent, transform, mut tracked) in &mut query {
        nntree.0.remove(&tracked.to_array(), ent.to_bits());
        **tracked = transform.translation;
        nntree.0.add(&tracked.to_array(), ent.to_bits());
    }
}
