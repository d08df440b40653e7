//! # Timeline Mapper
//!
//! Authored curves are plain data (ordered keyframe lists); `interpolate`
//! is the only function that reads them. Progress before the first keyframe
//! or after the last one holds the boundary value, never extrapolates.

use crate::animation::EasingType;
use crate::error::{Result, StageError};
use stage_data::model::{CurvesSpec, KeyframeSpec};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub at: f32,
    pub value: f32,
    /// Easing of the segment starting here.
    pub ease: EasingType,
}

impl Keyframe {
    pub fn new(at: f32, value: f32) -> Self {
        Self {
            at,
            value,
            ease: EasingType::Linear,
        }
    }

    pub fn eased(at: f32, value: f32, ease: EasingType) -> Self {
        Self { at, value, ease }
    }
}

impl From<&KeyframeSpec> for Keyframe {
    fn from(spec: &KeyframeSpec) -> Self {
        Self {
            at: spec.at,
            value: spec.value,
            ease: spec.ease.map(EasingType::from).unwrap_or_default(),
        }
    }
}

/// Non-empty keyframe list with strictly increasing positions in [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    keyframes: Vec<Keyframe>,
}

impl Curve {
    pub fn new(name: &str, keyframes: Vec<Keyframe>) -> Result<Self> {
        if keyframes.is_empty() {
            return Err(StageError::EmptyCurve {
                curve: name.to_string(),
            });
        }
        for (index, kf) in keyframes.iter().enumerate() {
            if !(kf.at.is_finite() && (0.0..=1.0).contains(&kf.at)) {
                return Err(StageError::KeyframeOutOfRange {
                    curve: name.to_string(),
                    index,
                    at: kf.at,
                });
            }
            if !kf.value.is_finite() {
                return Err(StageError::NonFiniteValue {
                    curve: name.to_string(),
                    index,
                });
            }
            if index > 0 && kf.at <= keyframes[index - 1].at {
                return Err(StageError::KeyframeOrder {
                    curve: name.to_string(),
                    index,
                    at: kf.at,
                    previous: keyframes[index - 1].at,
                });
            }
        }
        Ok(Self { keyframes })
    }

    /// Builds a linear curve from `(at, value)` pairs.
    pub fn from_pairs(name: &str, pairs: &[(f32, f32)]) -> Result<Self> {
        Self::new(
            name,
            pairs.iter().map(|&(at, value)| Keyframe::new(at, value)).collect(),
        )
    }

    pub fn from_specs(name: &str, specs: &[KeyframeSpec]) -> Result<Self> {
        Self::new(name, specs.iter().map(Keyframe::from).collect())
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn sample(&self, p: f32) -> f32 {
        interpolate(self, p)
    }

    /// Slope of the linear segment containing `p`, taking the segment to the
    /// right at an exact keyframe. Zero outside the keyframe range.
    pub fn slope_at(&self, p: f32) -> f32 {
        let idx = self.keyframes.partition_point(|kf| kf.at <= p);
        if idx == 0 || idx >= self.keyframes.len() {
            return 0.0;
        }
        let start = &self.keyframes[idx - 1];
        let end = &self.keyframes[idx];
        (end.value - start.value) / (end.at - start.at)
    }
}

/// Maps progress through the curve.
pub fn interpolate(curve: &Curve, p: f32) -> f32 {
    let keyframes = &curve.keyframes;

    // First keyframe strictly after p; the segment is [idx-1, idx].
    let idx = keyframes.partition_point(|kf| kf.at <= p);

    if idx == 0 {
        return keyframes[0].value;
    }
    let len = keyframes.len();
    if idx >= len {
        return keyframes[len - 1].value;
    }

    let start = &keyframes[idx - 1];
    let end = &keyframes[idx];
    let local_t = (p - start.at) / (end.at - start.at);
    let eased = start.ease.eval(local_t);

    start.value + (end.value - start.value) * eased
}

/// Visual properties an act can animate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Opacity,
    TranslateY,
    Scale,
    Blur,
    Hue,
}

impl Property {
    pub const ALL: [Property; 5] = [
        Property::Opacity,
        Property::TranslateY,
        Property::Scale,
        Property::Blur,
        Property::Hue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Property::Opacity => "opacity",
            Property::TranslateY => "translateY",
            Property::Scale => "scale",
            Property::Blur => "blur",
            Property::Hue => "hue",
        }
    }

    /// Value used when the act authors no curve for this property.
    pub fn identity(&self) -> f32 {
        match self {
            Property::Opacity | Property::Scale => 1.0,
            Property::TranslateY | Property::Blur | Property::Hue => 0.0,
        }
    }
}

/// The named curves of one act.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveSet {
    opacity: Option<Curve>,
    translate_y: Option<Curve>,
    scale: Option<Curve>,
    blur: Option<Curve>,
    hue: Option<Curve>,
}

impl CurveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spec(spec: &CurvesSpec) -> Result<Self> {
        let build = |prop: Property, specs: &Option<Vec<KeyframeSpec>>| -> Result<Option<Curve>> {
            specs
                .as_deref()
                .map(|s| Curve::from_specs(prop.name(), s))
                .transpose()
        };
        Ok(Self {
            opacity: build(Property::Opacity, &spec.opacity)?,
            translate_y: build(Property::TranslateY, &spec.translate_y)?,
            scale: build(Property::Scale, &spec.scale)?,
            blur: build(Property::Blur, &spec.blur)?,
            hue: build(Property::Hue, &spec.hue)?,
        })
    }

    pub fn with(mut self, prop: Property, curve: Curve) -> Self {
        *self.slot_mut(prop) = Some(curve);
        self
    }

    pub fn get(&self, prop: Property) -> Option<&Curve> {
        match prop {
            Property::Opacity => self.opacity.as_ref(),
            Property::TranslateY => self.translate_y.as_ref(),
            Property::Scale => self.scale.as_ref(),
            Property::Blur => self.blur.as_ref(),
            Property::Hue => self.hue.as_ref(),
        }
    }

    fn slot_mut(&mut self, prop: Property) -> &mut Option<Curve> {
        match prop {
            Property::Opacity => &mut self.opacity,
            Property::TranslateY => &mut self.translate_y,
            Property::Scale => &mut self.scale,
            Property::Blur => &mut self.blur,
            Property::Hue => &mut self.hue,
        }
    }

    /// Samples `prop`, falling back to its identity value.
    pub fn sample(&self, prop: Property, p: f32) -> f32 {
        self.get(prop)
            .map(|c| c.sample(p))
            .unwrap_or_else(|| prop.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hump() -> Curve {
        Curve::from_pairs("opacity", &[(0.15, 0.0), (0.25, 1.0), (0.35, 1.0), (0.45, 0.0)])
            .unwrap()
    }

    #[test]
    fn exact_at_every_keyframe() {
        let curve = hump();
        for kf in curve.keyframes() {
            assert_eq!(interpolate(&curve, kf.at), kf.value);
        }
    }

    #[test]
    fn clamps_outside_range() {
        let curve = hump();
        assert_eq!(interpolate(&curve, 0.0), 0.0);
        assert_eq!(interpolate(&curve, 1.0), 0.0);

        let ramp = Curve::from_pairs("translateY", &[(0.2, 100.0), (0.4, -100.0)]).unwrap();
        assert_eq!(interpolate(&ramp, 0.1), 100.0);
        assert_eq!(interpolate(&ramp, 0.9), -100.0);
    }

    #[test]
    fn linear_between_keyframes() {
        let ramp = Curve::from_pairs("translateY", &[(0.2, 100.0), (0.4, -100.0)]).unwrap();
        assert!((interpolate(&ramp, 0.3) - 0.0).abs() < 1e-4);
        assert!((interpolate(&ramp, 0.25) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn continuous_at_interior_keyframes() {
        let curve = hump();
        let eps = 1e-5;
        for kf in &curve.keyframes()[1..curve.keyframes().len() - 1] {
            let left = interpolate(&curve, kf.at - eps);
            let right = interpolate(&curve, kf.at + eps);
            assert!((left - right).abs() < 1e-3, "jump at {}", kf.at);
            assert!((left - kf.value).abs() < 1e-3);
        }
    }

    #[test]
    fn eased_segment_keeps_endpoints() {
        let curve = Curve::new(
            "scale",
            vec![
                Keyframe::eased(0.4, 0.8, EasingType::EaseInOut),
                Keyframe::new(0.5, 1.0),
                Keyframe::new(0.6, 0.95),
            ],
        )
        .unwrap();
        assert_eq!(interpolate(&curve, 0.4), 0.8);
        assert_eq!(interpolate(&curve, 0.5), 1.0);
        let mid = interpolate(&curve, 0.45);
        assert!(mid > 0.8 && mid < 1.0);
    }

    #[test]
    fn single_keyframe_is_constant() {
        let curve = Curve::from_pairs("blur", &[(0.5, 3.0)]).unwrap();
        assert_eq!(interpolate(&curve, 0.0), 3.0);
        assert_eq!(interpolate(&curve, 0.5), 3.0);
        assert_eq!(interpolate(&curve, 1.0), 3.0);
    }

    #[test]
    fn nan_progress_holds_first_value() {
        assert_eq!(interpolate(&hump(), f32::NAN), 0.0);
    }

    #[test]
    fn slope_sign_tracks_rise_and_fall() {
        let curve = hump();
        assert!(curve.slope_at(0.2) > 0.0);
        assert_eq!(curve.slope_at(0.3), 0.0);
        assert!(curve.slope_at(0.4) < 0.0);
        assert_eq!(curve.slope_at(0.05), 0.0);
        assert_eq!(curve.slope_at(0.45), 0.0);
    }

    #[test]
    fn rejects_malformed_curves() {
        assert_eq!(
            Curve::new("opacity", vec![]),
            Err(StageError::EmptyCurve {
                curve: "opacity".into()
            })
        );
        assert!(matches!(
            Curve::from_pairs("opacity", &[(0.3, 0.0), (0.3, 1.0)]),
            Err(StageError::KeyframeOrder { index: 1, .. })
        ));
        assert!(matches!(
            Curve::from_pairs("opacity", &[(0.5, 0.0), (0.2, 1.0)]),
            Err(StageError::KeyframeOrder { .. })
        ));
        assert!(matches!(
            Curve::from_pairs("scale", &[(1.2, 0.0)]),
            Err(StageError::KeyframeOutOfRange { .. })
        ));
        assert!(matches!(
            Curve::from_pairs("blur", &[(0.0, f32::INFINITY)]),
            Err(StageError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn curve_set_falls_back_to_identity() {
        let set = CurveSet::new().with(Property::Opacity, hump());
        assert_eq!(set.sample(Property::Opacity, 0.3), 1.0);
        assert_eq!(set.sample(Property::Scale, 0.3), 1.0);
        assert_eq!(set.sample(Property::TranslateY, 0.3), 0.0);
        assert!(set.get(Property::Hue).is_none());
    }
}
