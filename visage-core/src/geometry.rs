//! Geometry mapper - pose + viewport + style to drawable primitives
//!
//! Output is an angular, flat-shaded face: a faceted silhouette with a
//! directional shadow, almond eyes, circular iris/pupil/highlight, straight
//! brows and trapezoid lips. Every coordinate is an integer pixel position.

use crate::pose::{PoseParam, PoseVector, Side};
use crate::style::FaceStyle;
use serde::Serialize;
use std::collections::BTreeMap;

/// Integer pixel coordinate
pub type Point = (i32, i32);

/// Mouth interior is only emitted above this openness
pub const MOUTH_VISIBLE_THRESHOLD: f64 = 0.02;

/// Eye height never shrinks below this fraction of full height
pub const MIN_EYE_OPENNESS: f64 = 0.08;

/// Body-part key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    FaceLit,
    FaceShadow,
    LeftEye,
    LeftIris,
    LeftPupil,
    LeftHighlight,
    RightEye,
    RightIris,
    RightPupil,
    RightHighlight,
    LeftBrow,
    RightBrow,
    MouthUpper,
    MouthLower,
    MouthInterior,
}

impl Part {
    pub fn key(self) -> &'static str {
        match self {
            Part::FaceLit => "face_lit",
            Part::FaceShadow => "face_shadow",
            Part::LeftEye => "left_eye",
            Part::LeftIris => "left_iris",
            Part::LeftPupil => "left_pupil",
            Part::LeftHighlight => "left_highlight",
            Part::RightEye => "right_eye",
            Part::RightIris => "right_iris",
            Part::RightPupil => "right_pupil",
            Part::RightHighlight => "right_highlight",
            Part::LeftBrow => "left_brow",
            Part::RightBrow => "right_brow",
            Part::MouthUpper => "mouth_upper",
            Part::MouthLower => "mouth_lower",
            Part::MouthInterior => "mouth_interior",
        }
    }

    fn eye(side: Side) -> Part {
        match side {
            Side::Left => Part::LeftEye,
            Side::Right => Part::RightEye,
        }
    }

    fn iris(side: Side) -> Part {
        match side {
            Side::Left => Part::LeftIris,
            Side::Right => Part::RightIris,
        }
    }

    fn pupil(side: Side) -> Part {
        match side {
            Side::Left => Part::LeftPupil,
            Side::Right => Part::RightPupil,
        }
    }

    fn highlight(side: Side) -> Part {
        match side {
            Side::Left => Part::LeftHighlight,
            Side::Right => Part::RightHighlight,
        }
    }

    fn brow(side: Side) -> Part {
        match side {
            Side::Left => Part::LeftBrow,
            Side::Right => Part::RightBrow,
        }
    }
}

/// One drawable primitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Polygon { points: Vec<Point> },
    Circle { center: Point, radius: i32 },
    Segment { start: Point, end: Point },
}

/// Per-tick drawable output, keyed by body part
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Geometry {
    parts: BTreeMap<Part, Shape>,
}

impl Geometry {
    pub fn get(&self, part: Part) -> Option<&Shape> {
        self.parts.get(&part)
    }

    pub fn contains(&self, part: Part) -> bool {
        self.parts.contains_key(&part)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Part, &Shape)> {
        self.parts.iter().map(|(p, s)| (*p, s))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn polygon(&self, part: Part) -> Option<&[Point]> {
        match self.parts.get(&part) {
            Some(Shape::Polygon { points }) => Some(points),
            _ => None,
        }
    }

    pub fn circle(&self, part: Part) -> Option<(Point, i32)> {
        match self.parts.get(&part) {
            Some(Shape::Circle { center, radius }) => Some((*center, *radius)),
            _ => None,
        }
    }

    pub fn segment(&self, part: Part) -> Option<(Point, Point)> {
        match self.parts.get(&part) {
            Some(Shape::Segment { start, end }) => Some((*start, *end)),
            _ => None,
        }
    }

    fn insert_polygon(&mut self, part: Part, points: &[(f64, f64)]) {
        let points = points.iter().map(|&(x, y)| (px(x), px(y))).collect();
        self.parts.insert(part, Shape::Polygon { points });
    }

    fn insert(&mut self, part: Part, shape: Shape) {
        self.parts.insert(part, shape);
    }
}

/// Truncate toward zero to a pixel coordinate (NaN maps to 0)
fn px(v: f64) -> i32 {
    v as i32
}

/// Map a pose onto pixel geometry for a `size = (width, height)` viewport.
pub fn compute(pose: &PoseVector, size: (u32, u32), style: &FaceStyle) -> Geometry {
    let (w, h) = (size.0 as f64, size.1 as f64);
    let cx = (size.0 / 2) as f64;
    let cy = (size.1 / 2) as f64;

    let scale = pose[PoseParam::FaceScale];
    let fw = style.face_width * w * scale;
    let fh = style.face_height * h * scale;

    let mut geo = Geometry::default();

    // Silhouette: top, temples, cheekbones, jaw, chin.
    let top_w = fw * 0.42;
    let mid_w = fw * 0.50;
    let jaw_w = fw * 0.38;
    let chin_w = fw * 0.05;

    let top_y = cy - fh * 0.48;
    let temple_y = top_y + fh * 0.08;
    let mid_y = cy - fh * 0.05;
    let jaw_y = cy + fh * 0.28;
    let chin_y = cy + fh * 0.48;

    geo.insert_polygon(
        Part::FaceLit,
        &[
            (cx, top_y),
            (cx + top_w, temple_y),
            (cx + mid_w, mid_y),
            (cx + jaw_w, jaw_y),
            (cx + chin_w, chin_y),
            (cx - chin_w, chin_y),
            (cx - jaw_w, jaw_y),
            (cx - mid_w, mid_y),
            (cx - top_w, temple_y),
        ],
    );

    // Shadow covers the right half, inset a couple of pixels from the midline.
    geo.insert_polygon(
        Part::FaceShadow,
        &[
            (cx + 2.0, top_y),
            (cx + top_w, temple_y),
            (cx + mid_w, mid_y),
            (cx + jaw_w, jaw_y),
            (cx + chin_w, chin_y),
            (cx, chin_y + 2.0),
            (cx + 2.0, mid_y),
        ],
    );

    let eye_y_pos = cy - (0.5 - style.eye_y) * fh;
    let min_dim = w.min(h);

    for side in Side::BOTH {
        let ex = cx + px(side.sign() * style.eye_spacing * w) as f64;
        let ey = px(eye_y_pos) as f64;

        let openness = pose[PoseParam::eye_open(side)];
        let erx = style.eye_rx * w;
        let ery = style.eye_ry * h * openness.max(MIN_EYE_OPENNESS);

        geo.insert_polygon(
            Part::eye(side),
            &[
                (ex - erx, ey),
                (ex - erx * 0.5, ey - ery),
                (ex + erx * 0.5, ey - ery * 0.9),
                (ex + erx, ey),
                (ex + erx * 0.5, ey + ery * 0.9),
                (ex - erx * 0.5, ey + ery),
            ],
        );

        let pdx = pose[PoseParam::pupil_x(side)] * w;
        let pdy = pose[PoseParam::pupil_y(side)] * h;
        let iris_r = px(style.pupil_radius * 1.6 * min_dim);
        let pupil_r = px(style.pupil_radius * min_dim);
        let center = (px(ex + pdx), px(ey + pdy));

        geo.insert(Part::iris(side), Shape::Circle { center, radius: iris_r });
        geo.insert(Part::pupil(side), Shape::Circle { center, radius: pupil_r });

        let offset = pupil_r as f64 * 0.35;
        geo.insert(
            Part::highlight(side),
            Shape::Circle {
                center: (px(ex + pdx - offset), px(ey + pdy - offset)),
                radius: (pupil_r / 3).max(2),
            },
        );
    }

    for side in Side::BOTH {
        let bx = cx + px(side.sign() * style.eye_spacing * w) as f64;
        let by = px(eye_y_pos + style.brow_y_offset * h) + px(pose[PoseParam::brow_height(side)] * h);
        let by = by as f64;
        let angle = pose[PoseParam::brow_angle(side)];
        let bw = style.brow_width * w;
        let (dx, dy) = (angle.cos() * bw, angle.sin() * bw);

        geo.insert(
            Part::brow(side),
            Shape::Segment {
                start: (px(bx - dx), px(by - dy)),
                end: (px(bx + dx), px(by + dy)),
            },
        );
    }

    let mx = cx;
    let my = cy + px((style.mouth_y - 0.5) * fh) as f64;
    let mw = (style.mouth_width + pose[PoseParam::MouthWide]) * w;
    let lip_curve = pose[PoseParam::MouthSmile] * h * 0.08;
    let openness = pose[PoseParam::MouthOpen];

    geo.insert_polygon(
        Part::MouthUpper,
        &[
            (mx - mw, my),
            (mx - mw * 0.3, my - lip_curve),
            (mx + mw * 0.3, my - lip_curve),
            (mx + mw, my),
        ],
    );
    geo.insert_polygon(
        Part::MouthLower,
        &[
            (mx - mw, my),
            (mx - mw * 0.3, my + lip_curve * 0.3),
            (mx + mw * 0.3, my + lip_curve * 0.3),
            (mx + mw, my),
        ],
    );

    if openness > MOUTH_VISIBLE_THRESHOLD {
        let mouth_h = openness * h * 0.12;
        geo.insert_polygon(
            Part::MouthInterior,
            &[
                (mx - mw * 0.8, my),
                (mx + mw * 0.8, my),
                (mx + mw * 0.5, my + mouth_h),
                (mx - mw * 0.5, my + mouth_h),
            ],
        );
    }

    geo
}
