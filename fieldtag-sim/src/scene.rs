/// Scene composition: place tags on a field and project them through a
/// camera rig into a synthetic detection frame with ground truth.
use fieldtag::camera::Camera;
use fieldtag::detection::{DetectionFrame, TagDetection};
use fieldtag::math::Vec3;
use fieldtag::mount::CameraMount;
use fieldtag::rotation::EulerDeg;
use serde::{Deserialize, Serialize};

/// A tag placed on the field with its ground-truth position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedTag {
    pub id: i32,
    /// Tag center on the field, mm.
    pub position: [f64; 2],
    /// In-plane rotation of the tag, degrees.
    pub yaw_deg: f64,
}

/// A complete scene: synthetic detections plus ground truth.
///
/// Ground truth keeps every placed tag; the frame only contains the tags
/// the rig can actually image.
#[derive(Debug, Clone)]
pub struct Scene {
    pub frame: DetectionFrame,
    pub ground_truth: Vec<PlacedTag>,
}

/// Gaussian pixel noise applied to projected corners and centers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PixelNoise {
    pub sigma: f64,
    pub seed: u64,
}

/// Builder for synthetic scenes.
pub struct SceneBuilder {
    camera: Camera,
    mount: CameraMount,
    image_width: u32,
    image_height: u32,
    tag_size: f64,
    tag_height: f64,
    noise: Option<PixelNoise>,
    placements: Vec<PlacedTag>,
}

impl SceneBuilder {
    pub fn new(camera: Camera, mount: CameraMount) -> Self {
        SceneBuilder {
            camera,
            mount,
            image_width: 1280,
            image_height: 720,
            tag_size: 95.0,
            tag_height: 0.0,
            noise: None,
            placements: Vec::new(),
        }
    }

    pub fn image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Tag edge length in mm.
    pub fn tag_size(mut self, tag_size: f64) -> Self {
        self.tag_size = tag_size;
        self
    }

    /// Height of the tag plane above the floor, mm.
    pub fn tag_height(mut self, tag_height: f64) -> Self {
        self.tag_height = tag_height;
        self
    }

    pub fn noise(mut self, sigma: f64, seed: u64) -> Self {
        self.noise = Some(PixelNoise { sigma, seed });
        self
    }

    /// Place a tag at (x, y) with the given in-plane rotation.
    pub fn place(mut self, id: i32, x: f64, y: f64, yaw_deg: f64) -> Self {
        self.placements.push(PlacedTag {
            id,
            position: [x, y],
            yaw_deg,
        });
        self
    }

    pub fn build(self) -> Scene {
        let mut rng = self.noise.map(|n| Rng::new(n.seed));
        let sigma = self.noise.map(|n| n.sigma).unwrap_or(0.0);

        let mut detections = Vec::new();
        for tag in &self.placements {
            if let Some(mut det) = self.project_tag(tag) {
                if let Some(rng) = rng.as_mut() {
                    for corner in &mut det.corners {
                        corner[0] += rng.next_gaussian() * sigma;
                        corner[1] += rng.next_gaussian() * sigma;
                    }
                    det.center[0] += rng.next_gaussian() * sigma;
                    det.center[1] += rng.next_gaussian() * sigma;
                }
                detections.push(det);
            }
        }

        Scene {
            frame: DetectionFrame {
                width: self.image_width,
                height: self.image_height,
                detections,
            },
            ground_truth: self.placements,
        }
    }

    /// Project one placed tag into the image; `None` when any corner falls
    /// behind the camera or outside the frame.
    fn project_tag(&self, tag: &PlacedTag) -> Option<TagDetection> {
        let s = self.tag_size / 2.0;
        // Tag-frame corner order matches the detection convention
        let local = [[-s, s], [s, s], [s, -s], [-s, -s]];
        let rot = EulerDeg::new(tag.yaw_deg, 0.0, 0.0).to_matrix();
        let center_field = Vec3::new(tag.position[0], tag.position[1], self.tag_height);

        let mut corners = [[0.0f64; 2]; 4];
        for (corner, l) in corners.iter_mut().zip(&local) {
            let p_field = center_field + rot * Vec3::new(l[0], l[1], 0.0);
            let px = self.mount.project_field_point(&self.camera, p_field)?;
            if !self.in_image(px) {
                return None;
            }
            *corner = px;
        }

        let center = self.mount.project_field_point(&self.camera, center_field)?;

        Some(TagDetection {
            family: "tag36h11".to_string(),
            id: tag.id,
            corners,
            center,
            decision_margin: 75.0,
        })
    }

    fn in_image(&self, px: [f64; 2]) -> bool {
        px[0] >= 0.0
            && px[1] >= 0.0
            && px[0] < self.image_width as f64
            && px[1] < self.image_height as f64
    }
}

/// Deterministic LCG random source with a Box-Muller Gaussian.
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Rng {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        // LCG with Knuth's constants
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_gaussian(&mut self) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}
