// Host-side tests for the frame clock and caption cues.

#![allow(dead_code)]
mod clock {
    include!("../src/core/clock.rs");
}
mod cues {
    include!("../src/core/cues.rs");
}

use clock::*;
use cues::*;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn first_tick_is_zero() {
    let mut clock = FrameClock::default();
    assert_eq!(clock.tick(12.0, Some(3.0), true), 0.0);
}

#[test]
fn playback_position_drives_the_step() {
    let mut clock = FrameClock::default();
    clock.tick(0.0, Some(10.0), true);
    // wall time jumped but the audio only moved 20ms
    assert!(approx(clock.tick(0.5, Some(10.02), true), 0.02));
}

#[test]
fn coarse_playback_updates_are_not_counted_twice() {
    let mut clock = FrameClock::default();
    let frames = [
        (0.0, 0.0),
        (0.016, 0.016),
        (0.032, 0.016),
        (0.048, 0.048),
        (0.064, 0.048),
        (0.080, 0.080),
    ];
    let total: f32 = frames
        .iter()
        .map(|&(wall, position)| clock.tick(wall, Some(position), true))
        .sum();
    assert!(approx(total, 0.080), "advanced {}", total);
}

#[test]
fn wall_clock_takes_over_when_paused_or_silent() {
    let mut clock = FrameClock::default();
    clock.tick(1.0, Some(4.0), true);
    assert!(approx(clock.tick(1.016, Some(4.0), false), 0.016));
    assert!(approx(clock.tick(1.032, None, false), 0.016));
    // resuming picks the audio back up from where it stopped
    clock.tick(1.048, Some(4.0), true);
    assert!(approx(clock.tick(1.064, Some(4.016), true), 0.016));
}

#[test]
fn steps_are_clamped_and_never_negative() {
    let mut clock = FrameClock::new(0.05);
    clock.tick(0.0, None, false);
    assert!(approx(clock.tick(2.0, None, false), 0.05));
    clock.tick(2.0, Some(30.0), true);
    assert_eq!(clock.tick(2.016, Some(12.0), true), 0.0);
    assert_eq!(clock.tick(2.032, Some(11.0), false), 0.0);
    assert_eq!(clock.tick(1.0, None, false), 0.0);
}

#[test]
fn reset_swallows_the_pause() {
    let mut clock = FrameClock::default();
    clock.tick(0.0, None, false);
    clock.reset();
    assert_eq!(clock.tick(60.0, None, false), 0.0);
    assert!(approx(clock.tick(60.02, None, false), 0.02));
}

const CAPTIONS: &str = "\
# opening
0.0 2.5 A field at dawn
2.0 4.0   Wind in the grass

6 7.5 Stillness
";

#[test]
fn parses_sorted_cues_and_skips_comments() {
    let track = CueTrack::parse(CAPTIONS).expect("valid captions");
    assert_eq!(track.len(), 3);
    assert_eq!(track.cues()[1].text, "Wind in the grass");
    assert_eq!(track.cues()[2].start, 6.0);
}

#[test]
fn reports_the_offending_line() {
    assert_eq!(
        CueTrack::parse("0 1 ok\n2 3\n"),
        Err(CueError::Malformed { line: 2 })
    );
    assert_eq!(
        CueTrack::parse("\n0 x nope\n"),
        Err(CueError::BadTime {
            line: 2,
            value: "x".into()
        })
    );
}

#[test]
fn later_cue_wins_on_overlap() {
    let track = CueTrack::parse(CAPTIONS).expect("valid captions");
    let text = |t: f64| track.active(t).map(|c| c.text.as_str());
    assert_eq!(text(1.0), Some("A field at dawn"));
    assert_eq!(text(2.2), Some("Wind in the grass"));
    assert_eq!(text(5.0), None);
    assert_eq!(text(7.5), None);
    assert_eq!(text(-1.0), None);
}

#[test]
fn progress_runs_through_the_active_cue() {
    let track = CueTrack::parse(CAPTIONS).expect("valid captions");
    assert!(approx(track.progress(6.75).unwrap_or(-1.0), 0.5));
    assert_eq!(track.progress(5.0), None);
}

#[test]
fn inverted_cues_are_dropped() {
    let track = CueTrack::new(vec![
        Cue {
            start: 3.0,
            end: 1.0,
            text: "backwards".into(),
        },
        Cue {
            start: 0.0,
            end: f64::NAN,
            text: "nan".into(),
        },
    ]);
    assert!(track.is_empty());
}
