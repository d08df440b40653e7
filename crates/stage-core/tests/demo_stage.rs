use stage_core::lifecycle::HeadlessHost;
use stage_core::{ActPhase, CompositionRoot, PointerTarget, SharedHost};
use stage_data::model::StageJson;
use std::fs;

fn load_demo() -> StageJson {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = std::path::Path::new(manifest_dir).join("../../demos/two_acts.json");
    let raw = fs::read_to_string(&path).expect("Failed to read demo stage");
    serde_json::from_str(&raw).expect("Failed to parse demo stage")
}

#[test]
fn demo_stage_mounts_with_embedded_config() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let headless = HeadlessHost::new();
    let host: SharedHost = headless.clone();
    let mut root = CompositionRoot::mount_stage(&host, &load_demo()).unwrap();
    assert_eq!(root.track_height(), 2.0 * 900.0 * 1.2);

    root.attach_track(0.0);
    let scrollable = root.track_height() - 900.0;

    root.on_scroll(0.5 * scrollable);
    root.frame(1.0 / 60.0);
    let intro = root.act(1).unwrap();
    assert_eq!(intro.phase(), ActPhase::Exiting);
    // ease_in keeps the fade slow at first
    assert!(intro.render().opacity > 0.5);
    assert!(intro.render().blur > 0.0);

    root.on_scroll(scrollable);
    root.frame(1.0 / 60.0);
    assert_eq!(root.pointer_target(), PointerTarget::Act(2));
    let links = root.navigation_surface().unwrap();
    assert_eq!(links[0].href, "/contact");

    drop(root);
    assert_eq!(headless.live(), 0);
}
