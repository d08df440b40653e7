//! Built-in authoring data.

use stage_data::model::{
    ActSpec, ContentSpec, CurvesSpec, KeyframeSpec, NavTarget, StageJson, WindowSpec,
};

fn keys(pairs: &[(f32, f32)]) -> Option<Vec<KeyframeSpec>> {
    Some(pairs.iter().map(|&(at, value)| KeyframeSpec::new(at, value)).collect())
}

fn text(text: &str) -> ContentSpec {
    ContentSpec::Text { text: text.into() }
}

fn counter(value: u32, label: &str) -> ContentSpec {
    ContentSpec::Counter {
        value,
        duration: 2.5,
        prefix: String::new(),
        suffix: "+".into(),
        label: Some(label.into()),
    }
}

fn link(label: &str, href: &str) -> ContentSpec {
    ContentSpec::Link(NavTarget {
        label: label.into(),
        href: href.into(),
    })
}

/// The five-act homepage: entrance, work reveals, impact numbers, showcase
/// and the closing invitation. The track is five viewports tall.
pub fn homepage() -> StageJson {
    let entrance = ActSpec {
        index: 1,
        name: Some("entrance".into()),
        window: WindowSpec::new(0.0, 0.2),
        interactive: None,
        curves: CurvesSpec {
            opacity: keys(&[(0.0, 1.0), (0.2, 0.0)]),
            scale: keys(&[(0.0, 1.0), (0.2, 0.95)]),
            blur: keys(&[(0.0, 0.0), (0.2, 10.0)]),
            ..Default::default()
        },
        content: vec![
            text("Cultural Visionary"),
            ContentSpec::Image {
                src: "portrait.png".into(),
                alt: Some("Portrait".into()),
            },
            ContentSpec::Magnetic {
                target: "portrait".into(),
                radius: 200.0,
                strength: 20.0,
            },
            ContentSpec::Particles {
                count: None,
                seed: None,
            },
        ],
    };

    let work = ActSpec {
        index: 2,
        name: Some("work".into()),
        window: WindowSpec::new(0.15, 0.45),
        interactive: None,
        curves: CurvesSpec {
            opacity: keys(&[(0.15, 0.0), (0.25, 1.0), (0.35, 1.0), (0.45, 0.0)]),
            translate_y: keys(&[(0.2, 100.0), (0.4, -100.0)]),
            ..Default::default()
        },
        content: vec![text("Selected Work")],
    };

    let impact = ActSpec {
        index: 3,
        name: Some("impact".into()),
        window: WindowSpec::new(0.35, 0.65),
        interactive: None,
        curves: CurvesSpec {
            opacity: keys(&[(0.35, 0.0), (0.45, 1.0), (0.55, 1.0), (0.65, 0.0)]),
            scale: keys(&[(0.4, 0.8), (0.5, 1.0), (0.6, 0.95)]),
            // coral, amber, sky
            hue: keys(&[(0.4, 10.0), (0.5, 36.0), (0.6, 210.0)]),
            ..Default::default()
        },
        content: vec![
            text("Impact by Numbers"),
            counter(15, "Years Leading"),
            counter(25, "Countries"),
            counter(40, "Youth Programs"),
            counter(850, "Media Features"),
        ],
    };

    let showcase = ActSpec {
        index: 4,
        name: Some("showcase".into()),
        window: WindowSpec::new(0.55, 0.85),
        interactive: None,
        curves: CurvesSpec {
            opacity: keys(&[(0.55, 0.0), (0.65, 1.0), (0.75, 1.0), (0.85, 0.0)]),
            translate_y: keys(&[(0.6, 100.0), (0.7, 0.0)]),
            ..Default::default()
        },
        content: vec![text("Featured Projects")],
    };

    let invitation = ActSpec {
        index: 5,
        name: Some("invitation".into()),
        window: WindowSpec::new(0.8, 1.0),
        interactive: Some(WindowSpec::new(0.9, 1.0)),
        curves: CurvesSpec {
            opacity: keys(&[(0.8, 0.0), (0.9, 1.0)]),
            scale: keys(&[(0.8, 0.9), (0.95, 1.0)]),
            ..Default::default()
        },
        content: vec![
            text("Let's Create Something Extraordinary Together"),
            ContentSpec::Magnetic {
                target: "cta".into(),
                radius: 200.0,
                strength: 40.0,
            },
            link("Start the Conversation", "/contact"),
            link("About", "/about"),
            link("Projects", "/projects"),
            link("Awards", "/awards"),
        ],
    };

    StageJson {
        name: Some("homepage".into()),
        acts: vec![entrance, work, impact, showcase, invitation],
        config: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::CompositionRoot;
    use crate::config::EngineConfig;
    use crate::lifecycle::{HeadlessHost, SharedHost};

    #[test]
    fn homepage_mounts_with_five_viewport_track() {
        let host: SharedHost = HeadlessHost::new();
        let root = CompositionRoot::mount(&host, &homepage(), EngineConfig::default()).unwrap();
        assert_eq!(root.acts().len(), 5);
        assert_eq!(root.track_height(), 5.0 * 800.0);
    }

    #[test]
    fn homepage_round_trips_through_json() {
        let stage = homepage();
        let raw = serde_json::to_string(&stage).unwrap();
        let parsed: StageJson = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, stage);
    }
}
