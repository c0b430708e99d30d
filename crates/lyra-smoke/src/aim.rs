//! Aim solver: the look rotation that points an observer at a target.
//!
//! Convention: +z is up, yaw is measured in the horizontal plane with
//! `atan2(y, x)`, pitch is positive when looking *down* (the remote engine
//! applies the negated elevation), roll is always zero. Angles are degrees.

use crate::client::{AutomationClient, MethodArg};
use crate::geometry::{EulerRotation3, Position3, Vector3};
use crate::locator::Locator;
use crate::result::{SmokeError, SmokeResult};
use tracing::{debug, trace};

/// Controller method that accepts a view rotation
pub const DEFAULT_VIEW_ROTATION_METHOD: &str = "SetPlayerViewRotation";

/// Euler rotation (pitch, yaw, 0) that orients `observer` toward `target`.
///
/// Fails with [`SmokeError::InvalidInput`] when the two positions coincide
/// or any component is not finite; the direction is undefined there.
pub fn aim_rotation(observer: Position3, target: Position3) -> SmokeResult<EulerRotation3> {
    if !observer.is_finite() || !target.is_finite() {
        return Err(SmokeError::invalid_input(format!(
            "cannot aim from {observer} to {target}: non-finite coordinate"
        )));
    }

    let delta = target - observer;
    let direction = delta.normalized().ok_or_else(|| {
        let reason = if delta == Vector3::ZERO {
            "positions coincide"
        } else {
            "distance is not representable"
        };
        SmokeError::invalid_input(format!("cannot aim from {observer} to {target}: {reason}"))
    })?;

    // Rounding can push a unit component just past ±1.
    let pitch = -direction.z.clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = direction.y.atan2(direction.x).to_degrees();
    trace!(%observer, %target, %direction, pitch, yaw, "aim solved");

    Ok(EulerRotation3::new(pitch, yaw, 0.0))
}

/// Point the player's view at `target`.
///
/// Reads the camera position, solves the rotation and hands it to
/// `method` on the player controller as a single rotation argument.
/// Returns the rotation that was sent.
pub fn aim_at<C: AutomationClient + ?Sized>(
    client: &mut C,
    camera: &Locator,
    controller: &Locator,
    method: &str,
    target: Position3,
) -> SmokeResult<EulerRotation3> {
    let camera_position = client.object_position(camera)?;
    let rotation = aim_rotation(camera_position, target)?;
    debug!(%camera, %controller, method, %rotation, "applying view rotation");
    client.call_method(controller, method, &[MethodArg::Rotation(rotation)])?;
    Ok(rotation)
}
