//! Locating extruded features and profiles by bounding box.

use tracing::trace;

use boxjoint_math::{Aabb3, Tolerance};
use boxjoint_sketch::{ExtrudeFeature, FeatureQuery, Profile};

/// Whether every face of `feature` touches `target`.
///
/// A feature with no faces never matches.
pub fn feature_matches(feature: &ExtrudeFeature, target: &Aabb3) -> bool {
    !feature.faces.is_empty() && feature.faces.iter().all(|face| face.intersects(target))
}

/// Extrude features whose faces all intersect `target`, in timeline order.
pub fn filter_matching_features<Q: FeatureQuery + ?Sized>(
    query: &Q,
    target: &Aabb3,
) -> Vec<ExtrudeFeature> {
    query
        .extrude_features()
        .into_iter()
        .filter(|feature| {
            let hit = feature_matches(feature, target);
            trace!(id = ?feature.id, faces = feature.faces.len(), hit, "match feature");
            hit
        })
        .collect()
}

/// Whether two profile boxes have the same corners within the default
/// linear tolerance.
pub fn profile_boxes_equal(a: &Aabb3, b: &Aabb3) -> bool {
    a.approx_eq(b, &Tolerance::DEFAULT)
}

/// Every profile except those whose box equals `border`.
pub fn strip_border_profile(profiles: &[Profile], border: &Aabb3) -> Vec<Profile> {
    profiles
        .iter()
        .filter(|p| !profile_boxes_equal(&p.bounding_box, border))
        .copied()
        .collect()
}
