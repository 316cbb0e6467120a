/// Raster rendering of field maps and located tags.
///
/// Produces a plain RGB8 buffer; encoding (PNG etc.) is left to callers.
/// Raster y runs downward, which matches the map view convention, so field
/// coordinates map to pixels with a scale and margin only.
use crate::field::{FieldElement, FieldMap, ZoneColor};
use crate::locate::TagPosition;

pub type Color = [u8; 3];

pub const WHITE: Color = [255, 255, 255];
pub const BLACK: Color = [0, 0, 0];
pub const RED: Color = [220, 50, 47];
pub const BLUE: Color = [38, 102, 255];
pub const YELLOW: Color = [245, 200, 0];
pub const GRAY: Color = [200, 200, 200];
pub const GREEN: Color = [0, 160, 70];

impl ZoneColor {
    pub fn rgb(self) -> Color {
        match self {
            ZoneColor::Red => RED,
            ZoneColor::Blue => BLUE,
            ZoneColor::Yellow => YELLOW,
            ZoneColor::Gray => GRAY,
        }
    }
}

/// An RGB8 raster.
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize, background: Color) -> Self {
        let mut pixels = vec![0u8; width * height * 3];
        for chunk in pixels.chunks_exact_mut(3) {
            chunk.copy_from_slice(&background);
        }
        Raster {
            width,
            height,
            pixels,
        }
    }

    pub fn set(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 3;
        self.pixels[idx..idx + 3].copy_from_slice(&color);
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        let idx = (y * self.width + x) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}

/// Rendering parameters.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Millimeters per pixel.
    pub scale: f64,
    /// Blank border around the canvas, mm.
    pub margin: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            scale: 5.0,
            margin: 100.0,
        }
    }
}

/// Render a field map with located tags and (optionally) the camera
/// footprint marked.
pub fn render_field(
    field: &FieldMap,
    positions: &[TagPosition],
    camera_at: Option<[f64; 2]>,
    opts: RenderOptions,
) -> Raster {
    let to_px = |p: [f64; 2]| -> [i64; 2] {
        [
            ((p[0] + opts.margin) / opts.scale).round() as i64,
            ((p[1] + opts.margin) / opts.scale).round() as i64,
        ]
    };

    let width = ((field.width + 2.0 * opts.margin) / opts.scale).ceil() as usize;
    let height = ((field.height + 2.0 * opts.margin) / opts.scale).ceil() as usize;
    let mut img = Raster::new(width.max(1), height.max(1), WHITE);

    for element in &field.elements {
        match element {
            FieldElement::Rect { x, y, w, h, fill } => {
                let a = to_px([*x, *y]);
                let b = to_px([*x + *w, *y + *h]);
                if let Some(color) = fill {
                    fill_rect(&mut img, a, b, color.rgb());
                }
                draw_rect(&mut img, a, b, BLACK);
            }
            FieldElement::Polygon { vertices } => {
                draw_polygon(&mut img, vertices, &to_px, BLACK);
            }
            FieldElement::Line { from, to } => {
                draw_line(&mut img, to_px(*from), to_px(*to), BLACK);
            }
            FieldElement::Arc {
                center,
                radius,
                start_deg,
                end_deg,
            } => {
                draw_arc(&mut img, *center, *radius, *start_deg, *end_deg, &to_px, BLACK);
            }
        }
    }

    // Boundary on top of zone fills
    draw_polygon(&mut img, &field.boundary, &to_px, BLACK);

    if let Some(cam) = camera_at {
        draw_cross(&mut img, to_px(cam), 5, BLUE);
    }

    for pos in positions {
        let color = if pos.point.in_bounds { GREEN } else { RED };
        fill_disc(&mut img, to_px([pos.point.x, pos.point.y]), 3, color);
    }

    img
}

/// Midpoint line drawing.
fn draw_line(img: &mut Raster, a: [i64; 2], b: [i64; 2], color: Color) {
    let (mut x0, mut y0) = (a[0], a[1]);
    let (x1, y1) = (b[0], b[1]);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        img.set(x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_rect(img: &mut Raster, a: [i64; 2], b: [i64; 2], color: Color) {
    draw_line(img, [a[0], a[1]], [b[0], a[1]], color);
    draw_line(img, [b[0], a[1]], [b[0], b[1]], color);
    draw_line(img, [b[0], b[1]], [a[0], b[1]], color);
    draw_line(img, [a[0], b[1]], [a[0], a[1]], color);
}

fn fill_rect(img: &mut Raster, a: [i64; 2], b: [i64; 2], color: Color) {
    for y in a[1].min(b[1])..=a[1].max(b[1]) {
        for x in a[0].min(b[0])..=a[0].max(b[0]) {
            img.set(x, y, color);
        }
    }
}

fn draw_polygon<F>(img: &mut Raster, vertices: &[[f64; 2]], to_px: &F, color: Color)
where
    F: Fn([f64; 2]) -> [i64; 2],
{
    if vertices.len() < 2 {
        return;
    }
    for i in 0..vertices.len() {
        let a = to_px(vertices[i]);
        let b = to_px(vertices[(i + 1) % vertices.len()]);
        draw_line(img, a, b, color);
    }
}

fn draw_arc<F>(
    img: &mut Raster,
    center: [f64; 2],
    radius: f64,
    start_deg: f64,
    end_deg: f64,
    to_px: &F,
    color: Color,
) where
    F: Fn([f64; 2]) -> [i64; 2],
{
    let sweep = (end_deg - start_deg).abs();
    let steps = ((sweep / 2.0).ceil() as usize).max(2);
    let mut prev: Option<[i64; 2]> = None;
    for i in 0..=steps {
        let ang = (start_deg + (end_deg - start_deg) * i as f64 / steps as f64).to_radians();
        let p = to_px([center[0] + radius * ang.cos(), center[1] + radius * ang.sin()]);
        if let Some(q) = prev {
            draw_line(img, q, p, color);
        }
        prev = Some(p);
    }
}

fn fill_disc(img: &mut Raster, c: [i64; 2], r: i64, color: Color) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                img.set(c[0] + dx, c[1] + dy, color);
            }
        }
    }
}

fn draw_cross(img: &mut Raster, c: [i64; 2], r: i64, color: Color) {
    for d in -r..=r {
        img.set(c[0] + d, c[1], color);
        img.set(c[0], c[1] + d, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::FieldPoint;

    fn count_color(img: &Raster, color: Color) -> usize {
        let mut n = 0;
        for y in 0..img.height {
            for x in 0..img.width {
                if img.get(x, y) == color {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn canvas_size_follows_scale_and_margin() {
        let field = FieldMap::square(500.0);
        let opts = RenderOptions {
            scale: 5.0,
            margin: 50.0,
        };
        let img = render_field(&field, &[], None, opts);
        assert_eq!(img.width, 120); // (500 + 100) / 5
        assert_eq!(img.height, 120);
    }

    #[test]
    fn empty_field_draws_boundary_only() {
        let field = FieldMap::square(500.0);
        let img = render_field(&field, &[], None, RenderOptions::default());
        let black = count_color(&img, BLACK);
        assert!(black > 100, "boundary should be drawn, black={black}");
        assert_eq!(count_color(&img, GREEN), 0);
    }

    #[test]
    fn tag_marker_lands_at_field_position() {
        let field = FieldMap::square(500.0);
        let opts = RenderOptions {
            scale: 1.0,
            margin: 0.0,
        };
        let positions = vec![TagPosition {
            family: "tag36h11".to_string(),
            id: 1,
            point: FieldPoint {
                x: 100.0,
                y: 200.0,
                in_bounds: true,
            },
        }];
        let img = render_field(&field, &positions, None, opts);
        assert_eq!(img.get(100, 200), GREEN);
    }

    #[test]
    fn out_of_bounds_marker_is_red() {
        let field = FieldMap::square(500.0);
        let opts = RenderOptions {
            scale: 1.0,
            margin: 100.0,
        };
        let positions = vec![TagPosition {
            family: "tag36h11".to_string(),
            id: 2,
            point: FieldPoint {
                x: -50.0,
                y: -50.0,
                in_bounds: false,
            },
        }];
        let img = render_field(&field, &positions, None, opts);
        assert_eq!(img.get(50, 50), RED);
    }

    #[test]
    fn goal_zones_are_filled() {
        let field = FieldMap::contest();
        let img = render_field(&field, &[], None, RenderOptions::default());
        assert!(count_color(&img, BLUE) > 0);
        assert!(count_color(&img, RED) > 0);
        assert!(count_color(&img, YELLOW) > 0);
    }

    #[test]
    fn camera_marker_is_drawn() {
        let field = FieldMap::square(500.0);
        let opts = RenderOptions {
            scale: 1.0,
            margin: 100.0,
        };
        let img = render_field(&field, &[], Some([250.0, -80.0]), opts);
        assert_eq!(img.get(350, 20), BLUE);
    }

    #[test]
    fn line_endpoints_are_set() {
        let mut img = Raster::new(50, 50, WHITE);
        draw_line(&mut img, [5, 5], [40, 30], BLACK);
        assert_eq!(img.get(5, 5), BLACK);
        assert_eq!(img.get(40, 30), BLACK);
    }

    #[test]
    fn drawing_outside_canvas_is_ignored() {
        let mut img = Raster::new(10, 10, WHITE);
        draw_line(&mut img, [-20, -20], [30, 30], BLACK);
        fill_disc(&mut img, [9, 9], 4, RED);
        // In-bounds diagonal pixels were still painted
        assert_eq!(img.get(5, 5), BLACK);
    }
}
