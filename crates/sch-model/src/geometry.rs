use serde::{Deserialize, Serialize};

/// A coordinate on the fixed-point schematic grid.
///
/// The upstream parser normalises every position to the same grid unit, so
/// two points are connected exactly when they compare equal – there is no
/// tolerance anywhere in the connectivity logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Return `true` if `p` lies strictly between the endpoints of the segment
/// `a`–`b` (collinear and inside the bounding box, but not an endpoint).
///
/// Wire endpoints themselves connect through coordinate equality; this test
/// covers the T-connection case where a pin, label or junction lands in the
/// middle of a wire segment.
pub fn strictly_on_segment(p: Point, a: Point, b: Point) -> bool {
    if p == a || p == b {
        return false;
    }
    let cross = (b.x - a.x) as i128 * (p.y - a.y) as i128
        - (b.y - a.y) as i128 * (p.x - a.x) as i128;
    if cross != 0 {
        return false;
    }
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorAxis {
    X,
    Y,
}

impl MirrorAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            MirrorAxis::X => "x",
            MirrorAxis::Y => "y",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "x" => Some(MirrorAxis::X),
            "y" => Some(MirrorAxis::Y),
            _ => None,
        }
    }
}

impl std::fmt::Display for MirrorAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placement of a symbol instance on its sheet: position, rotation and an
/// optional mirror axis.
///
/// Rotation comes pre-normalised from the parser and must be one of 0, 90,
/// 180 or 270 degrees; the transform engine rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub at: Point,
    #[serde(default)]
    pub rotation: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<MirrorAxis>,
}

impl Placement {
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            at: Point::new(x, y),
            rotation: 0,
            mirror: None,
        }
    }

    pub fn with_rotation(mut self, rotation: i32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mirror(mut self, axis: MirrorAxis) -> Self {
        self.mirror = Some(axis);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ordering_is_x_then_y() {
        let mut points = vec![Point::new(3, 1), Point::new(1, 5), Point::new(1, 2)];
        points.sort();
        assert_eq!(
            points,
            vec![Point::new(1, 2), Point::new(1, 5), Point::new(3, 1)]
        );
    }

    #[test]
    fn on_segment_detects_interior_points_only() {
        let a = Point::new(0, 0);
        let b = Point::new(10, 0);
        assert!(strictly_on_segment(Point::new(5, 0), a, b));
        assert!(!strictly_on_segment(Point::new(0, 0), a, b)); // endpoint
        assert!(!strictly_on_segment(Point::new(11, 0), a, b)); // past the end
        assert!(!strictly_on_segment(Point::new(5, 1), a, b)); // off axis
    }

    #[test]
    fn on_segment_handles_diagonals() {
        let a = Point::new(0, 0);
        let b = Point::new(4, 4);
        assert!(strictly_on_segment(Point::new(2, 2), a, b));
        assert!(!strictly_on_segment(Point::new(2, 3), a, b));
    }

    #[test]
    fn mirror_axis_string_roundtrip() {
        assert_eq!(MirrorAxis::from_str_opt("y"), Some(MirrorAxis::Y));
        assert_eq!(MirrorAxis::from_str_opt("z"), None);
        assert_eq!(MirrorAxis::X.as_str(), "x");
    }
}
