use glam::Vec2;
use stage_core::lifecycle::HeadlessHost;
use stage_core::presets::homepage;
use stage_core::{CompositionRoot, EngineConfig, SharedHost, Subscription};
use std::panic::{self, AssertUnwindSafe};

const DT: f32 = 1.0 / 60.0;

fn mounted(headless: &std::rc::Rc<HeadlessHost>) -> CompositionRoot {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let host: SharedHost = headless.clone();
    let mut root = CompositionRoot::mount(&host, &homepage(), EngineConfig::default()).unwrap();
    root.attach_track(0.0);
    root
}

fn drive(root: &mut CompositionRoot, p: f32, frames: usize) {
    let scrollable = root.track_height() - root.source().viewport_height();
    for _ in 0..frames {
        root.on_scroll(p * scrollable);
        root.on_pointer_move(Vec2::new(400.0, 400.0));
        root.frame(DT);
    }
}

#[test]
fn root_holds_its_own_listeners() {
    let headless = HeadlessHost::new();
    let root = mounted(&headless);
    for kind in [
        Subscription::Scroll,
        Subscription::Resize,
        Subscription::PointerMove,
        Subscription::PointerLeave,
        Subscription::FrameLoop,
    ] {
        assert_eq!(headless.live_of(kind), 1, "{kind:?}");
    }
    drop(root);
    assert_eq!(headless.live(), 0);
}

#[test]
fn unmount_mid_animation_releases_everything() {
    let headless = HeadlessHost::new();
    let mut root = mounted(&headless);
    // Act 3 counters are mid-flight and act 1 particles are running.
    drive(&mut root, 0.0, 5);
    drive(&mut root, 0.5, 10);
    assert!(root
        .act(3)
        .unwrap()
        .counters()
        .any(|counter| counter.is_animating()));
    assert!(headless.live() > 5);

    drop(root);
    assert_eq!(headless.live(), 0);
}

#[test]
fn panic_while_driving_still_releases_everything() {
    let headless = HeadlessHost::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut root = mounted(&headless);
        drive(&mut root, 0.5, 10);
        panic!("render failed elsewhere in the tree");
    }));
    assert!(outcome.is_err());
    assert_eq!(headless.live(), 0);
}

#[test]
fn inactive_acts_hold_no_frame_loops() {
    let headless = HeadlessHost::new();
    let mut root = mounted(&headless);
    drive(&mut root, 0.0, 3);
    // Root loop plus act 1 particles.
    assert_eq!(headless.live_of(Subscription::FrameLoop), 2);

    drive(&mut root, 0.7, 3);
    let particles = root.act(1).unwrap().particle_fields().next().unwrap();
    assert!(!particles.is_running());
    let ticks = particles.ticks();
    assert_eq!(headless.live_of(Subscription::FrameLoop), 1);

    drive(&mut root, 0.7, 30);
    let particles = root.act(1).unwrap().particle_fields().next().unwrap();
    assert_eq!(particles.ticks(), ticks);
}
