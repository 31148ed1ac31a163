//! Headless host driving `stream-pager` with scripted input.
//!
//! Run with `RUST_LOG=stream_pager=trace` to watch every drag move and settle
//! frame.

mod calendar;
mod chapters;
mod host;

use stream_pager::{PagerConfig, Px, ScrollRegion, dp::set_scale_factor};
use tracing::info;

pub use crate::{calendar::Calendar, chapters::Chapters, host::ScriptedHost};

/// Viewport width of the simulated screen.
const SCREEN_WIDTH: Px = Px(1080);
/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "error,stream_pager=debug,example=info";
/// Physical pixels per dp of the simulated screen.
const SCREEN_DENSITY: f64 = 2.0;

/// Runs both demos.
pub fn run() {
    init_tracing();
    set_scale_factor(SCREEN_DENSITY);
    browse_calendar();
    read_chapters();
}

fn browse_calendar() {
    info!("Calendar: endless days, weekends at half width");
    let config = PagerConfig::default().page_margin(Px(24));
    let mut host = ScriptedHost::new(config, Calendar::new(), SCREEN_WIDTH);

    host.swipe(900.0, 200.0, 120);
    host.swipe(200.0, 900.0, 120);
    host.fling(700.0, -60.0);
    host.jump_to(-365);
    host.swipe(500.0, 420.0, 400);
    host.report();
}

fn read_chapters() {
    info!("Chapters: a finite book with an embedded carousel");
    let mut host = ScriptedHost::new(PagerConfig::default(), Chapters::sample(), SCREEN_WIDTH);
    let carousel = ScrollRegion::new(0.0, 0.0, SCREEN_WIDTH.to_f32(), 1920.0).child(
        ScrollRegion::new(0.0, 600.0, SCREEN_WIDTH.to_f32(), 300.0).scrollable(false, true),
    );
    host.pager_mut().set_nested_scroll(Box::new(carousel));

    // Swipes over the carousel belong to it.
    host.swipe_at(800.0, 300.0, 700.0, 120);
    host.swipe(900.0, 100.0, 150);
    host.swipe(100.0, 1000.0, 150);
    host.jump_to(99);
    host.page_left();
    host.report();
}

fn init_tracing() {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match tracing_subscriber::EnvFilter::try_new(DEFAULT_FILTER) {
            Ok(filter) => filter,
            Err(_) => tracing_subscriber::EnvFilter::new("error"),
        },
    };

    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .try_init();
}
