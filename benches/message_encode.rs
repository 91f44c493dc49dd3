//! Telemetry encoding benchmark suite.
//!
//! Measures the per-event cost on the hot paths of the runtime:
//! - Envelope serialization for each outbound message type
//! - Inbound frame parsing
//! - Message assembly from page context
//!
//! Run with: cargo bench --bench message_encode
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::time::Instant;

use docs_beacon::clock::Clock;
use docs_beacon::protocol::InboundMessage;
use docs_beacon::session::{PageVisitContext, SessionContext};
use docs_beacon::tracking::{EngagementTracker, EventEmitter};
use docs_beacon::{Anchor, Envelope, Host, PageState, TelemetryMessage, Viewport};

// ============================================================================
// Fixtures
// ============================================================================

struct Fixture {
    emitter: EventEmitter,
    page: PageState,
    session: SessionContext,
    visit: PageVisitContext,
    now: Instant,
}

fn fixture() -> Fixture {
    let now = Instant::now();
    let page = PageState::new("https://docs.gpuflow.app/guides/setup?os=linux")
        .expect("valid page url");
    page.set_title("Setup - GPUFlow Docs");
    page.set_user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0");
    page.set_viewport(Viewport::new(1920, 1080));

    Fixture {
        emitter: EventEmitter::new("docs", Clock::start(), 50),
        session: SessionContext::capture(&page, now),
        visit: PageVisitContext::capture(&page, now),
        page,
        now,
    }
}

fn messages(fx: &Fixture) -> Vec<(&'static str, TelemetryMessage)> {
    let engagement = EngagementTracker::default();
    let anchor = Anchor::new("https://github.com/gpuflow/gpuflow", "View the source on GitHub");

    vec![
        ("session_start", fx.emitter.session_start(&fx.session)),
        (
            "page_visit",
            fx.emitter.page_visit(&fx.visit, &fx.session),
        ),
        (
            "page_leave",
            fx.emitter.page_leave(&fx.visit, &engagement, fx.now),
        ),
        (
            "session_update",
            fx.emitter
                .session_update(&fx.visit, &engagement, &fx.session, fx.now),
        ),
        (
            "docs_link_click",
            fx.emitter.link_click(&anchor, &fx.page.location()),
        ),
    ]
}

// ============================================================================
// Benchmark: Envelope Encoding
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let fx = fixture();
    let mut group = c.benchmark_group("encode");

    for (kind, message) in messages(&fx) {
        let envelope = Envelope::new(message, 1_740_830_400_000);
        group.bench_with_input(BenchmarkId::new("to_frame", kind), &envelope, |b, env| {
            b.iter(|| black_box(env.to_frame()));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Inbound Parsing
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let frames = [
        ("auth_success", r#"{"type":"auth_success"}"#),
        (
            "with_data",
            r#"{"type":"announcement","data":{"message":"maintenance","at":1740830400000}}"#,
        ),
        ("malformed", "{not json"),
    ];

    for (name, frame) in frames {
        group.bench_with_input(BenchmarkId::new("inbound", name), frame, |b, text| {
            b.iter(|| black_box(InboundMessage::parse(text).is_ok()));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Message Assembly
// ============================================================================

fn bench_assemble(c: &mut Criterion) {
    let fx = fixture();

    c.bench_function("assemble/page_visit", |b| {
        b.iter(|| {
            let visit = PageVisitContext::capture(&fx.page, fx.now);
            black_box(fx.emitter.page_visit(&visit, &fx.session))
        });
    });
}

criterion_group!(benches, bench_encode, bench_parse, bench_assemble);
criterion_main!(benches);
