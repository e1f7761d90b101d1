#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

pub fn distance(a: Vec2, b: Vec2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Normalizes `(x, y)`; a zero vector stays zero instead of producing NaN.
pub fn normalize_or_zero(x: f32, y: f32) -> Vec2 {
    let len_sq = x * x + y * y;
    if len_sq > 0.0 {
        let inv_len = len_sq.sqrt().recip();
        Vec2 {
            x: x * inv_len,
            y: y * inv_len,
        }
    } else {
        Vec2 { x: 0.0, y: 0.0 }
    }
}

/// Moves `current` toward `target` by at most `speed * fixed_dt_seconds`,
/// snapping onto the target once within `arrival_threshold`. Returns the new
/// position and whether the target was reached this step.
pub fn step_toward(
    current: Vec2,
    target: Vec2,
    speed: f32,
    fixed_dt_seconds: f32,
    arrival_threshold: f32,
) -> (Vec2, bool) {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let distance_sq = dx * dx + dy * dy;
    let threshold_sq = arrival_threshold * arrival_threshold;
    if distance_sq <= threshold_sq {
        return (target, true);
    }

    let distance = distance_sq.sqrt();
    let max_step = speed * fixed_dt_seconds;
    if max_step >= distance {
        return (target, true);
    }

    let inv_distance = distance.recip();
    (
        Vec2 {
            x: current.x + dx * inv_distance * max_step,
            y: current.y + dy * inv_distance * max_step,
        },
        false,
    )
}

/// Clamps a position into the square `[-half_extent, half_extent]` on both
/// axes; the arena walls, expressed as math instead of colliders.
pub fn clamp_to_extent(position: Vec2, half_extent: f32) -> Vec2 {
    Vec2 {
        x: position.x.clamp(-half_extent, half_extent),
        y: position.y.clamp(-half_extent, half_extent),
    }
}
