//! Player vertical motion
//!
//! Semi-implicit Euler at a fixed per-tick gravity: velocity first, then
//! position. Values are not scaled by elapsed time; the fixed-step driver
//! keeps the tick rate constant instead.

use super::state::PlayerBody;

/// Integrate one tick of gravity and resolve the ground.
///
/// Returns true on the tick the body touches down after being airborne.
pub fn step(body: &mut PlayerBody, gravity: f32, ground_y: f32) -> bool {
    body.velocity_y += gravity;
    body.rect.pos.y += body.velocity_y;

    let rest_y = ground_y - body.rect.size.y;
    if body.rect.pos.y > rest_y {
        let landed = !body.grounded;
        body.rect.pos.y = rest_y;
        body.velocity_y = 0.0;
        body.grounded = true;
        body.jumps_remaining = body.max_jumps;
        landed
    } else {
        body.grounded = false;
        false
    }
}

/// Launch the body upward.
///
/// From the ground this always succeeds. In the air it consumes one of the
/// remaining jump charges, and is rejected when none are left.
pub fn jump(body: &mut PlayerBody, jump_force: f32) -> bool {
    if body.grounded {
        body.jumps_remaining = body.max_jumps.saturating_sub(1);
    } else if body.jumps_remaining > 0 {
        body.jumps_remaining -= 1;
    } else {
        return false;
    }
    body.velocity_y = -jump_force;
    body.grounded = false;
    true
}
