/// Pre-defined rig scenarios for localization accuracy evaluation.
use fieldtag::camera::{Camera, Intrinsics};
use fieldtag::field::FieldMap;
use fieldtag::locate::FieldLocator;
use fieldtag::math::Vec3;
use fieldtag::mount::CameraMount;
use fieldtag::rotation::EulerDeg;

use crate::scene::{Scene, SceneBuilder};

/// A category of scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Overhead,
    Oblique,
    Contest,
    Noise,
    Pose,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Overhead,
            Category::Oblique,
            Category::Contest,
            Category::Noise,
            Category::Pose,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Overhead => "overhead",
            Category::Oblique => "oblique",
            Category::Contest => "contest",
            Category::Noise => "noise",
            Category::Pose => "pose",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Category::all().iter().find(|c| c.name() == name).copied()
    }
}

/// Which localization strategy a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Ray,
    /// Pose estimation with the given tag size in mm.
    Pose(f64),
}

/// A scenario: a rig, a set of placed tags, and pass criteria.
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub strategy: Strategy,
    /// Number of tags that must be localized.
    pub expect_located: usize,
    /// Maximum acceptable position RMSE in mm.
    pub max_rmse_mm: f64,
    build_fn: Box<dyn Fn() -> (FieldLocator, Scene) + Send + Sync>,
}

impl Scenario {
    pub fn build(&self) -> (FieldLocator, Scene) {
        (self.build_fn)()
    }
}

fn wide_camera() -> Camera {
    Camera::new(Intrinsics::new(600.0, 600.0, 640.0, 360.0))
}

/// The 1800 x 1800 practice rig: camera centered 900 mm above the field.
fn overhead_rig() -> (FieldLocator, Camera, CameraMount) {
    let camera = wide_camera();
    let mount = CameraMount::overhead(900.0, 900.0, 900.0);
    (
        FieldLocator::new(camera, mount, FieldMap::square(1800.0)),
        camera,
        mount,
    )
}

/// The 500 x 500 bench rig: camera off the field edge, tilted down 60
/// degrees toward +X.
fn oblique_rig() -> (FieldLocator, Camera, CameraMount) {
    let camera = wide_camera();
    let mount = CameraMount::new(
        Vec3::new(-250.0, 250.0, 790.0),
        EulerDeg::new(0.0, -60.0, 180.0),
    );
    (
        FieldLocator::new(camera, mount, FieldMap::square(500.0)),
        camera,
        mount,
    )
}

/// The competition rig: camera high above the playable area's center.
fn contest_rig() -> (FieldLocator, Camera, CameraMount) {
    let camera = wide_camera();
    let mount = CameraMount::overhead(1165.0, 900.0, 2500.0);
    (
        FieldLocator::new(camera, mount, FieldMap::contest()),
        camera,
        mount,
    )
}

/// Build the full scenario catalog.
pub fn all_scenarios() -> Vec<Scenario> {
    let mut scenarios = Vec::new();

    scenarios.push(Scenario {
        name: "overhead-center".to_string(),
        description: "single tag directly under the overhead camera".to_string(),
        category: Category::Overhead,
        strategy: Strategy::Ray,
        expect_located: 1,
        max_rmse_mm: 1.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = overhead_rig();
            let scene = SceneBuilder::new(camera, mount)
                .place(0, 900.0, 900.0, 0.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "overhead-spread".to_string(),
        description: "four tags spread across the overhead field".to_string(),
        category: Category::Overhead,
        strategy: Strategy::Ray,
        expect_located: 4,
        max_rmse_mm: 1.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = overhead_rig();
            let scene = SceneBuilder::new(camera, mount)
                .place(0, 450.0, 450.0, 0.0)
                .place(1, 1400.0, 450.0, 30.0)
                .place(2, 1400.0, 1350.0, 120.0)
                .place(3, 450.0, 1350.0, -45.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "overhead-raised-tags".to_string(),
        description: "tags mounted 100 mm above the floor".to_string(),
        category: Category::Overhead,
        strategy: Strategy::Ray,
        expect_located: 2,
        max_rmse_mm: 1.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = overhead_rig();
            let loc = loc.with_tag_height(100.0);
            let scene = SceneBuilder::new(camera, mount)
                .tag_height(100.0)
                .place(0, 700.0, 900.0, 0.0)
                .place(1, 1200.0, 600.0, 15.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "oblique-near-far".to_string(),
        description: "tilted bench rig, tags near and far".to_string(),
        category: Category::Oblique,
        strategy: Strategy::Ray,
        expect_located: 2,
        max_rmse_mm: 1.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = oblique_rig();
            let scene = SceneBuilder::new(camera, mount)
                .tag_size(95.0)
                .place(0, 150.0, 250.0, 0.0)
                .place(1, 400.0, 300.0, 60.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "oblique-out-of-bounds".to_string(),
        description: "tilted rig seeing a tag beyond the field edge".to_string(),
        category: Category::Oblique,
        strategy: Strategy::Ray,
        expect_located: 2,
        max_rmse_mm: 1.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = oblique_rig();
            let scene = SceneBuilder::new(camera, mount)
                .place(0, 250.0, 250.0, 0.0)
                .place(1, 250.0, 650.0, 0.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "contest-goals".to_string(),
        description: "competition field, tags near the goal boxes".to_string(),
        category: Category::Contest,
        strategy: Strategy::Ray,
        expect_located: 3,
        max_rmse_mm: 1.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = contest_rig();
            let scene = SceneBuilder::new(camera, mount)
                .place(0, 400.0, 250.0, 0.0)
                .place(1, 400.0, 900.0, 0.0)
                .place(2, 400.0, 1550.0, 0.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "noise-light".to_string(),
        description: "overhead rig with 0.5 px corner noise".to_string(),
        category: Category::Noise,
        strategy: Strategy::Ray,
        expect_located: 3,
        max_rmse_mm: 5.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = overhead_rig();
            let scene = SceneBuilder::new(camera, mount)
                .noise(0.5, 11)
                .place(0, 600.0, 600.0, 0.0)
                .place(1, 900.0, 1200.0, 45.0)
                .place(2, 1300.0, 800.0, 90.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "noise-heavy".to_string(),
        description: "overhead rig with 2 px corner noise".to_string(),
        category: Category::Noise,
        strategy: Strategy::Ray,
        expect_located: 3,
        max_rmse_mm: 20.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = overhead_rig();
            let scene = SceneBuilder::new(camera, mount)
                .noise(2.0, 29)
                .place(0, 600.0, 600.0, 0.0)
                .place(1, 900.0, 1200.0, 45.0)
                .place(2, 1300.0, 800.0, 90.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios.push(Scenario {
        name: "pose-overhead".to_string(),
        description: "pose-translation strategy against the overhead rig".to_string(),
        category: Category::Pose,
        strategy: Strategy::Pose(95.0),
        expect_located: 2,
        max_rmse_mm: 25.0,
        build_fn: Box::new(|| {
            let (loc, camera, mount) = overhead_rig();
            let scene = SceneBuilder::new(camera, mount)
                .tag_size(95.0)
                .place(0, 800.0, 900.0, 0.0)
                .place(1, 1100.0, 1100.0, 30.0)
                .build();
            (loc, scene)
        }),
    });

    scenarios
}

/// Filter scenarios by category.
pub fn scenarios_for_category(category: Category) -> Vec<Scenario> {
    all_scenarios()
        .into_iter()
        .filter(|s| s.category == category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_category() {
        let scenarios = all_scenarios();
        for cat in Category::all() {
            assert!(
                scenarios.iter().any(|s| s.category == *cat),
                "no scenario for category {}",
                cat.name()
            );
        }
    }

    #[test]
    fn scenario_names_are_unique() {
        let scenarios = all_scenarios();
        for (i, a) in scenarios.iter().enumerate() {
            for b in &scenarios[i + 1..] {
                assert_ne!(a.name, b.name, "duplicate scenario name");
            }
        }
    }

    #[test]
    fn every_scene_images_the_expected_tags() {
        for scenario in all_scenarios() {
            let (_loc, scene) = scenario.build();
            assert_eq!(
                scene.frame.detections.len(),
                scenario.expect_located,
                "scenario {} imaged {} tags, expected {}",
                scenario.name,
                scene.frame.detections.len(),
                scenario.expect_located,
            );
        }
    }

    #[test]
    fn category_names_roundtrip() {
        for cat in Category::all() {
            assert_eq!(Category::from_name(cat.name()), Some(*cat));
        }
    }
}
