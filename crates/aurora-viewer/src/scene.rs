//! Procedural demo geometry.

use aurora_engine::mesh::MeshData;
use glam::Vec3;

const FLOOR_Y: f32 = -0.5;
const PILLAR_HEIGHT: f32 = 3.5;
const PILLAR_HALF_WIDTH: f32 = 0.35;

/// Floor slab, two rows of pillars along x and a plinth under the light row.
pub fn colonnade() -> MeshData {
    let mut mesh = MeshData::aabb(
        Vec3::new(-14.0, FLOOR_Y - 0.25, -7.0),
        Vec3::new(14.0, FLOOR_Y, 7.0),
    );

    for i in 0..7 {
        let x = -12.0 + i as f32 * 4.0;
        for z in [-3.5, 3.5] {
            mesh.merge(&pillar(Vec3::new(x, FLOOR_Y, z)));
        }
    }

    mesh.merge(&MeshData::aabb(
        Vec3::new(-1.5, FLOOR_Y, -1.0),
        Vec3::new(1.5, FLOOR_Y + 0.4, 1.0),
    ));
    mesh
}

fn pillar(base: Vec3) -> MeshData {
    let h = PILLAR_HALF_WIDTH;
    let mut pillar = MeshData::aabb(
        base + Vec3::new(-h, 0.0, -h),
        base + Vec3::new(h, PILLAR_HEIGHT, h),
    );
    // capital
    pillar.merge(&MeshData::aabb(
        base + Vec3::new(-h - 0.15, PILLAR_HEIGHT, -h - 0.15),
        base + Vec3::new(h + 0.15, PILLAR_HEIGHT + 0.25, h + 0.15),
    ));
    pillar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colonnade_is_slab_pillars_and_plinth() {
        let cube = MeshData::cube(1.0).triangle_count();
        // slab + 14 pillars of two boxes + plinth
        assert_eq!(colonnade().triangle_count(), cube * (1 + 14 * 2 + 1));
    }

    #[test]
    fn floor_top_is_at_floor_height() {
        let top = colonnade()
            .vertices
            .iter()
            .filter(|v| v.normal == [0.0, 1.0, 0.0])
            .map(|v| v.position[1])
            .fold(f32::INFINITY, f32::min);
        assert_eq!(top, FLOOR_Y);
    }
}
