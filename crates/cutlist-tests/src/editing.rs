//! Integration tests for editing and planning.
//!
//! Drives cutlist-timeline through timecode input from cutlist-core, the
//! way a front end would.

use cutlist_core::{CutlistError, EditingConfig, TimecodeCodec};
use cutlist_timeline::{
    AssemblyPlan, EditingSession, InteractionMode, PlanStep, SectionState, SessionCommand,
};

// ── Helpers ────────────────────────────────────────────────────

fn session(duration: f64) -> EditingSession {
    let mut session = EditingSession::new(EditingConfig::default());
    session.load_media(duration, None).unwrap();
    session
}

fn run(session: &mut EditingSession, commands: &[SessionCommand]) {
    for cmd in commands {
        cmd.apply(session).unwrap();
    }
}

fn keep(start: f64, end: f64) -> PlanStep {
    PlanStep::KeepRange { start, end }
}

// ── Sections ───────────────────────────────────────────────────

#[test]
fn sections_cover_media_after_every_add() {
    let mut s = session(90.0);
    for text in ["00:45:000", "00:10:500", "01:20", "00:00:30", "00:01:00:250"] {
        s.add_cut_point_at_timecode(text).unwrap();

        let sections = s.sections().unwrap();
        let cuts = s.timeline().unwrap().len();
        assert_eq!(sections.len(), cuts + 1);
        assert_eq!(sections[0].start, 0.0);
        assert_eq!(sections[sections.len() - 1].end, 90.0);
        for pair in sections.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

#[test]
fn out_of_range_and_duplicate_cut_points() {
    let mut s = session(30.0);
    assert!(matches!(
        s.add_cut_point(35.0),
        Err(CutlistError::OutOfRange { .. })
    ));
    s.add_cut_point(10.0).unwrap();
    assert!(matches!(
        s.add_cut_point(10.0),
        Err(CutlistError::Duplicate { .. })
    ));
    assert_eq!(s.timeline().unwrap().cut_points(), &[10.0]);
    assert_eq!(s.section_states().unwrap().len(), 2);
}

#[test]
fn add_then_undo_restores_exact_state() {
    let mut s = session(60.0);
    run(
        &mut s,
        &[
            SessionCommand::AddCutPoint { time: 10.0 },
            SessionCommand::AddCutPoint { time: 40.0 },
            SessionCommand::SetSectionState {
                index: 1,
                state: SectionState::Delete,
            },
        ],
    );
    let cuts_before = s.timeline().unwrap().cut_points().to_vec();
    let states_before = s.section_states().unwrap().clone();

    // splits the deleted middle section
    s.add_cut_point_at_timecode("00:25:000").unwrap();
    assert_eq!(s.section_states().unwrap().len(), 4);
    s.undo_last().unwrap();

    assert_eq!(s.timeline().unwrap().cut_points(), cuts_before.as_slice());
    assert_eq!(s.section_states().unwrap(), &states_before);
}

#[test]
fn removing_a_marker_merges_keep_and_delete_into_delete() {
    let mut s = session(30.0);
    run(
        &mut s,
        &[
            SessionCommand::AddCutPoint { time: 10.0 },
            SessionCommand::ToggleSection { index: 1 },
            SessionCommand::RemoveCutPointAt { index: 0 },
        ],
    );
    let states: Vec<_> = s.section_states().unwrap().iter().collect();
    assert_eq!(states, vec![SectionState::Delete]);
}

#[test]
fn deletable_bar_removes_marker_under_pointer() {
    let mut s = session(100.0);
    s.add_cut_point(10.0).unwrap();
    s.add_cut_point(50.0).unwrap();

    // the overview bar never deletes
    let overview = s.marker_index(1000.0, InteractionMode::ReadOnly).unwrap();
    assert_eq!(overview.hit_test_for_delete(500.0, 5.0), None);
    assert_eq!(overview.section_at(300.0), Some(1));

    assert_eq!(s.remove_marker_at_position(503.0, 1000.0).unwrap(), Some(50.0));
    assert_eq!(s.remove_marker_at_position(503.0, 1000.0).unwrap(), None);
    assert_eq!(s.timeline().unwrap().cut_points(), &[10.0]);
}

// ── Timecodes ──────────────────────────────────────────────────

#[test]
fn timecode_examples() {
    let cases = [
        ("01:02:03", 3723.0),
        ("02:05", 125.0),
        ("1:02:03:004", 3723.004),
        ("12:34:567", 754.567),
        ("12:34:56", 45296.0),
    ];
    for (text, expected) in cases {
        let parsed = TimecodeCodec::parse(text).unwrap();
        assert!((parsed - expected).abs() < 1e-9, "{text} -> {parsed}");
    }
    assert!(matches!(
        TimecodeCodec::parse("bad"),
        Err(CutlistError::InvalidFormat(_))
    ));
}

#[test]
fn cut_point_labels_round_trip_through_precise_timecode() {
    let mut s = session(4000.0);
    let (_, time) = s.add_cut_point_at_timecode("1:02:03:004").unwrap();
    let label = TimecodeCodec::format_precise(time);
    assert_eq!(label, "01:02:03:004");
    assert_eq!(TimecodeCodec::parse(&label).unwrap(), time);
    // same instant again is a duplicate
    assert!(s.add_cut_point_at_timecode(&label).is_err());
}

// ── Planning ───────────────────────────────────────────────────

#[test]
fn keep_delete_keep_plan() {
    let mut s = session(30.0);
    run(
        &mut s,
        &[
            SessionCommand::AddCutPointAtTimecode {
                text: "00:10:000".into(),
            },
            SessionCommand::AddCutPointAtTimecode {
                text: "00:20:000".into(),
            },
            SessionCommand::ToggleSection { index: 1 },
            SessionCommand::SetSilenceGap { text: "2.5".into() },
        ],
    );

    let plan = s.build_plan().unwrap();
    assert_eq!(
        plan.steps(),
        &[
            keep(0.0, 10.0),
            PlanStep::SilenceGap { duration: 2.5 },
            keep(20.0, 30.0)
        ]
    );
    assert_eq!(plan.total_duration(), 22.5);
}

#[test]
fn everything_deleted_is_nothing_to_keep() {
    let mut s = session(30.0);
    run(
        &mut s,
        &[
            SessionCommand::AddCutPoint { time: 15.0 },
            SessionCommand::ToggleSection { index: 0 },
            SessionCommand::ToggleSection { index: 1 },
        ],
    );
    assert!(matches!(s.build_plan(), Err(CutlistError::NothingToKeep)));
}

#[test]
fn silence_input_is_clamped() {
    let mut s = session(30.0);
    s.add_cut_point(10.0).unwrap();

    assert_eq!(s.set_silence_gap_text("-3"), 0.0);
    let plan = s.build_plan().unwrap();
    assert_eq!(plan.gap_count(), 0);
    assert_eq!(plan.total_duration(), 30.0);

    assert_eq!(s.set_silence_gap_text("soon"), 1.0);
    assert_eq!(s.build_plan().unwrap().total_duration(), 31.0);
}

#[test]
fn plan_json_is_stable_for_external_encoders() {
    let mut s = session(30.0);
    s.add_cut_point(10.0).unwrap();
    let plan = s.build_plan().unwrap();
    let json = plan.to_json().unwrap();
    assert_eq!(AssemblyPlan::from_json(&json).unwrap(), plan);
    assert!(json.contains("\"start\": 10.0"));
}

#[test]
fn commands_before_load_report_no_media() {
    let mut s = EditingSession::default();
    for cmd in [
        SessionCommand::AddCutPoint { time: 1.0 },
        SessionCommand::UndoLast,
        SessionCommand::ToggleSection { index: 0 },
    ] {
        assert!(matches!(cmd.apply(&mut s), Err(CutlistError::NoMediaLoaded)));
    }
    assert!(matches!(s.build_plan(), Err(CutlistError::NoMediaLoaded)));
}
