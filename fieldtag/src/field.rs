/// Field map model: the physical playing-field geometry in millimeters.
///
/// Field frame: origin at a corner, X along the width, Y along the height,
/// Z up. The map view convention matches image coordinates (Y grows toward
/// the bottom of a rendered map).
use crate::error::FieldError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Zone fill colors used on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum ZoneColor {
    Red,
    Blue,
    Yellow,
    Gray,
}

/// One drawable element of the field layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum FieldElement {
    /// Axis-aligned box; filled when a color is given, outline otherwise.
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Option::is_none")
        )]
        fill: Option<ZoneColor>,
    },
    /// Closed polygon obstacle.
    Polygon { vertices: Vec<[f64; 2]> },
    /// Painted guide line.
    Line { from: [f64; 2], to: [f64; 2] },
    /// Painted guide arc; angles in degrees, counterclockwise from +X.
    Arc {
        center: [f64; 2],
        radius: f64,
        start_deg: f64,
        end_deg: f64,
    },
}

/// A complete field layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldMap {
    pub name: String,
    /// Canvas extent in mm (the drawable area, not always the playable one).
    pub width: f64,
    pub height: f64,
    /// Outer boundary of the playable area. Closed implicitly.
    pub boundary: Vec<[f64; 2]>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub elements: Vec<FieldElement>,
}

impl FieldMap {
    /// A rectangular field with the boundary spanning the whole canvas.
    pub fn new(name: &str, width: f64, height: f64) -> Result<FieldMap, FieldError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(FieldError::InvalidSize(width, height));
        }
        Ok(FieldMap {
            name: name.to_string(),
            width,
            height,
            boundary: vec![[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]],
            elements: Vec::new(),
        })
    }

    /// A square practice field (500, 1000, 1800 mm are the common sizes).
    pub fn square(side: f64) -> FieldMap {
        FieldMap::new(&format!("square-{side}"), side, side)
            .expect("square preset side must be positive")
    }

    /// The 2065 x 2300 mm competition field: inset boundary, central block,
    /// three colored goal boxes, the staging square, and painted guides.
    pub fn contest() -> FieldMap {
        let mut map = FieldMap::new("contest", 2065.0, 2300.0)
            .expect("contest preset dimensions are valid");
        map.boundary = vec![[265.0, 0.0], [2065.0, 0.0], [2065.0, 1800.0], [265.0, 1800.0]];

        map.elements = vec![
            FieldElement::Polygon {
                vertices: vec![
                    [865.0, 500.0],
                    [1165.0, 500.0],
                    [1165.0, 1400.0],
                    [865.0, 1400.0],
                ],
            },
            FieldElement::Rect {
                x: 0.0,
                y: 100.0,
                w: 265.0,
                h: 300.0,
                fill: Some(ZoneColor::Blue),
            },
            FieldElement::Rect {
                x: 0.0,
                y: 750.0,
                w: 265.0,
                h: 300.0,
                fill: Some(ZoneColor::Yellow),
            },
            FieldElement::Rect {
                x: 0.0,
                y: 1400.0,
                w: 265.0,
                h: 300.0,
                fill: Some(ZoneColor::Red),
            },
            // Staging square below the field proper
            FieldElement::Rect {
                x: 265.0,
                y: 1800.0,
                w: 500.0,
                h: 500.0,
                fill: None,
            },
            FieldElement::Line {
                from: [565.0, 400.0],
                to: [565.0, 1550.0],
            },
            FieldElement::Line {
                from: [1605.0, 400.0],
                to: [1605.0, 1800.0],
            },
            FieldElement::Line {
                from: [715.0, 250.0],
                to: [1455.0, 250.0],
            },
            FieldElement::Arc {
                center: [715.0, 400.0],
                radius: 150.0,
                start_deg: 180.0,
                end_deg: 270.0,
            },
            FieldElement::Arc {
                center: [1455.0, 400.0],
                radius: 150.0,
                start_deg: 270.0,
                end_deg: 360.0,
            },
            FieldElement::Line {
                from: [1455.0, 500.0],
                to: [1755.0, 500.0],
            },
            FieldElement::Line {
                from: [415.0, 900.0],
                to: [715.0, 900.0],
            },
            FieldElement::Line {
                from: [415.0, 1560.0],
                to: [715.0, 1560.0],
            },
            FieldElement::Line {
                from: [1455.0, 1750.0],
                to: [1755.0, 1750.0],
            },
            FieldElement::Line {
                from: [315.0, 100.0],
                to: [315.0, 400.0],
            },
            FieldElement::Line {
                from: [315.0, 750.0],
                to: [315.0, 1050.0],
            },
            FieldElement::Line {
                from: [315.0, 1400.0],
                to: [315.0, 1700.0],
            },
            FieldElement::Line {
                from: [865.0, 100.0],
                to: [865.0, 400.0],
            },
        ];
        map
    }

    /// Builder-style element append.
    pub fn with(mut self, element: FieldElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Whether a point lies inside the boundary polygon (even-odd rule).
    /// Points exactly on an edge count as inside.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        let b = &self.boundary;
        if b.len() < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = b.len() - 1;
        for i in 0..b.len() {
            let (xi, yi) = (b[i][0], b[i][1]);
            let (xj, yj) = (b[j][0], b[j][1]);
            if on_segment([xi, yi], [xj, yj], p) {
                return true;
            }
            if (yi > p[1]) != (yj > p[1]) {
                let x_cross = (xj - xi) * (p[1] - yi) / (yj - yi) + xi;
                if p[0] < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

fn on_segment(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> bool {
    let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    if cross.abs() > 1e-9 {
        return false;
    }
    let dot = (p[0] - a[0]) * (b[0] - a[0]) + (p[1] - a[1]) * (b[1] - a[1]);
    let len2 = (b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2);
    dot >= 0.0 && dot <= len2
}
