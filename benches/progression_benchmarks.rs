use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ironquest::engine::progression::{Role, UserProgression, apply_xp};
use ironquest::engine::skill_tree::{SkillCatalog, SkillTree, SkillTreeProgress};
use ironquest::engine::streak::{SessionStats, apply_session};
use ironquest::engine::xp::compute_session_xp;
use ironquest::session::workout::{LoggedExercise, LoggedSet, WorkoutSession};

fn make_exercises(count: usize) -> Vec<LoggedExercise> {
    (0..count)
        .map(|i| {
            let sets = (0..4)
                .map(|s| LoggedSet::new(5 + s, 60.0 + (i * 5) as f64, Some(6 + (s % 4) as u8)))
                .collect();
            LoggedExercise::new(format!("lift_{i}"), sets)
        })
        .collect()
}

fn make_history(days: u32) -> Vec<WorkoutSession> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..days)
        .map(|d| {
            // rest every fourth day
            let date = start + chrono::Duration::days((d + d / 3) as i64);
            WorkoutSession::complete(date, make_exercises(6)).unwrap()
        })
        .collect()
}

fn bench_session_xp(c: &mut Criterion) {
    let exercises = make_exercises(8);

    c.bench_function("compute_session_xp (8 exercises x 4 sets)", |b| {
        b.iter(|| compute_session_xp(black_box(&exercises)))
    });
}

fn bench_replay(c: &mut Criterion) {
    let history = make_history(1000);

    c.bench_function("replay 1000 sessions (apply_xp + apply_session)", |b| {
        b.iter(|| {
            let mut progression = UserProgression::new(Role::Assassin);
            let mut stats = SessionStats::default();
            for session in black_box(&history) {
                progression = apply_xp(&progression, session.xp_gained() as i64)
                    .unwrap()
                    .progression;
                stats = apply_session(&stats, session);
            }
            (progression, stats)
        })
    });
}

fn bench_skill_evaluation(c: &mut Criterion) {
    let mut progression = UserProgression::new(Role::Warden);
    let mut stats = SessionStats::default();
    for session in make_history(30) {
        progression = apply_xp(&progression, session.xp_gained() as i64)
            .unwrap()
            .progression;
        stats = apply_session(&stats, &session);
    }
    let tree = SkillTree::new(SkillCatalog::builtin(), SkillTreeProgress::default());

    c.bench_function("skill tree evaluate (builtin catalog)", |b| {
        b.iter(|| tree.evaluate(black_box(&progression), black_box(&stats)))
    });
}

criterion_group!(benches, bench_session_xp, bench_replay, bench_skill_evaluation);
criterion_main!(benches);
