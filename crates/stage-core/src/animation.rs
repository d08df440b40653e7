use glam::Vec2;
use keyframe::EasingFunction;
use stage_data::model::EaseSpec;

/// Easing applied inside one keyframe segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EasingType {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// CSS-style cubic bezier with implicit endpoints (0,0) and (1,1).
    CubicBezier(Vec2, Vec2),
}

impl Default for EasingType {
    fn default() -> Self {
        EasingType::Linear
    }
}

impl EasingFunction for EasingType {
    fn y(&self, x: f64) -> f64 {
        match self {
            EasingType::Linear => keyframe::functions::Linear.y(x),
            EasingType::EaseIn => keyframe::functions::EaseIn.y(x),
            EasingType::EaseOut => keyframe::functions::EaseOut.y(x),
            EasingType::EaseInOut => keyframe::functions::EaseInOut.y(x),
            EasingType::CubicBezier(p1, p2) => solve_cubic_bezier(*p1, *p2, x as f32) as f64,
        }
    }
}

impl EasingType {
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        EasingType::CubicBezier(Vec2::new(x1, y1), Vec2::new(x2, y2))
    }

    /// Evaluates the easing with pinned endpoints: 0 maps to exactly 0 and
    /// 1 to exactly 1, whatever the underlying approximation does.
    pub fn eval(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        self.y(x as f64) as f32
    }
}

impl From<EaseSpec> for EasingType {
    fn from(spec: EaseSpec) -> Self {
        match spec {
            EaseSpec::Linear => EasingType::Linear,
            EaseSpec::EaseIn => EasingType::EaseIn,
            EaseSpec::EaseOut => EasingType::EaseOut,
            EaseSpec::EaseInOut => EasingType::EaseInOut,
            EaseSpec::CubicBezier([x1, y1, x2, y2]) => EasingType::cubic_bezier(x1, y1, x2, y2),
        }
    }
}

/// Cubic bezier easing. `t` is clamped to [0, 1] after each Newton step so
/// steep control points cannot push the estimate off the curve.
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson on x(t), then evaluate y(t)
    let mut t = x;
    for _ in 0..8 {
        let one_minus_t = 1.0 - t;
        let x_est = 3.0 * one_minus_t * one_minus_t * t * p1.x
            + 3.0 * one_minus_t * t * t * p2.x
            + t * t * t;

        let err = x_est - x;
        if err.abs() < 1e-4 {
            break;
        }

        let dx_dt = 3.0 * one_minus_t * one_minus_t * p1.x
            + 6.0 * one_minus_t * t * (p2.x - p1.x)
            + 3.0 * t * t * (1.0 - p2.x);

        if dx_dt.abs() < 1e-6 {
            break;
        }
        t = (t - err / dx_dt).clamp(0.0, 1.0);
    }

    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1.y + 3.0 * one_minus_t * t * t * p2.y + t * t * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f32, // Tension
    pub damping: f32,   // Friction
    pub mass: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        // Over-damped: settles without overshoot
        Self {
            stiffness: 100.0,
            damping: 30.0,
            mass: 1.0,
        }
    }
}

impl SpringConfig {
    /// True when the oscillator cannot overshoot its target.
    pub fn is_overdamped(&self) -> bool {
        self.damping * self.damping >= 4.0 * self.stiffness * self.mass
    }
}

/// Largest integration step. Longer frames are split so a stalled frame
/// cannot destabilise the oscillator.
const MAX_STEP: f32 = 1.0 / 120.0;

/// Longest frame simulated in one `step`. Anything longer (a suspended tab,
/// a debugger pause) is treated as this long.
const MAX_FRAME: f32 = 0.25;

/// Damped harmonic oscillator integrated once per frame:
/// `v += ((target - x) * k - v * c) / m * dt; x += v * dt`.
#[derive(Clone, Copy, Debug)]
pub struct Spring {
    pub config: SpringConfig,
    pub position: f32,
    pub velocity: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, position: f32) -> Self {
        Self {
            config,
            position,
            velocity: 0.0,
        }
    }

    pub fn step(&mut self, target: f32, dt: f32) -> f32 {
        if !(dt.is_finite() && dt > 0.0) {
            return self.position;
        }
        let dt = dt.min(MAX_FRAME);
        let steps = (dt / MAX_STEP).ceil().max(1.0) as u32;
        let h = dt / steps as f32;
        for _ in 0..steps {
            let force = -self.config.stiffness * (self.position - target);
            let damping = -self.config.damping * self.velocity;
            let acceleration = (force + damping) / self.config.mass;

            self.velocity += acceleration * h;
            self.position += self.velocity * h;
        }
        self.position
    }

    pub fn is_settled(&self, target: f32, epsilon: f32) -> bool {
        (self.position - target).abs() < epsilon && self.velocity.abs() < epsilon
    }

    pub fn snap_to(&mut self, target: f32) {
        self.position = target;
        self.velocity = 0.0;
    }
}
