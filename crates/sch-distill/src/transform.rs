//! Pure coordinate math: placing a symbol-local pin position into
//! sheet-absolute coordinates.
//!
//! Order matters and is fixed: the local offset is rotated about the
//! instance origin first, the *already-rotated* offset is then mirrored,
//! and finally the instance position translates the result.  Mirroring
//! flips the pin's facing direction so downstream rendering stays correct,
//! but pin identity (number, name, electrical type) never passes through
//! this module – only geometry moves.

use sch_model::{MirrorAxis, Placement, Point};

use crate::error::DistillError;

/// Transform a pin's local position and facing direction into absolute
/// sheet coordinates under the given placement.
///
/// Fails with [`DistillError::InvalidTransform`] if the placement rotation
/// is not one of the four canonical values.
pub fn place_pin(
    local: Point,
    orientation: i32,
    placement: &Placement,
    reference: &str,
) -> Result<(Point, i32), DistillError> {
    let (mut x, mut y) = match placement.rotation {
        0 => (local.x, local.y),
        90 => (-local.y, local.x),
        180 => (-local.x, -local.y),
        270 => (local.y, -local.x),
        rotation => {
            return Err(DistillError::InvalidTransform {
                reference: reference.to_owned(),
                rotation,
            });
        }
    };
    let mut angle = (orientation + placement.rotation).rem_euclid(360);

    match placement.mirror {
        Some(MirrorAxis::X) => {
            y = -y;
            angle = (360 - angle).rem_euclid(360);
        }
        Some(MirrorAxis::Y) => {
            x = -x;
            angle = (180 - angle).rem_euclid(360);
        }
        None => {}
    }

    let absolute = Point::new(placement.at.x + x, placement.at.y + y);
    Ok((absolute, angle))
}
