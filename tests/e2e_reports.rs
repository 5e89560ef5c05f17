//! End-to-end tests for weekly report upkeep.
//!
//! Reports are never written directly: every run mutation recomputes the
//! Monday-to-Sunday week it touches.

use chrono::{NaiveDate, TimeDelta};
use pretty_assertions::assert_eq;
use serde_json::json;

use runlog::{
    Caller, Config, Error, ListParams, MemoryBackend, NewRun, RunPatch, Tracker, WeatherRegistry,
    WeeklyReport,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn hms(h: i64, m: i64, s: i64) -> TimeDelta {
    TimeDelta::seconds(h * 3600 + m * 60 + s)
}

fn tracker() -> Tracker<MemoryBackend> {
    Tracker::open_memory(Config::default(), &WeatherRegistry::new()).unwrap()
}

async fn reports(tracker: &Tracker<MemoryBackend>, caller: &Caller) -> Vec<WeeklyReport> {
    tracker.list_weekly_reports(caller, &ListParams::new()).await.unwrap().results
}

/// Bob's runs: four in the week of 2020-10-05, one on Monday 2020-10-12.
async fn bob_with_two_weeks(tracker: &Tracker<MemoryBackend>) -> Caller {
    let bob = Caller::from(&tracker.new_account("bob").await.unwrap());
    let runs = [
        NewRun::new(date("2020-10-05"), 11.3, hms(0, 58, 24), "Frankfurt"),
        NewRun::new(date("2020-10-06"), 15.9, hms(1, 22, 47), "Frankfurt"),
        NewRun::new(date("2020-10-08"), 15.9, hms(1, 20, 32), "Frankfurt"),
        NewRun::new(date("2020-10-10"), 15.9, hms(1, 19, 3), "Frankfurt"),
        NewRun::new(date("2020-10-12"), 15.9, hms(1, 23, 12), "Frankfurt"),
    ];
    for run in runs {
        tracker.log_run(&bob, run).await.unwrap();
    }
    bob
}

// ============================================================================
// 1. Report contents
// ============================================================================

#[tokio::test]
async fn test_weekly_reports_list() {
    let tracker = tracker();
    let bob = bob_with_two_weeks(&tracker).await;

    let listed = reports(&tracker, &bob).await;
    let json: Vec<serde_json::Value> = listed
        .iter()
        .map(|r| serde_json::to_value(r).unwrap())
        .collect();

    assert_eq!(
        json,
        vec![
            json!({
                "id": 1,
                "week": "2020-10-05 to 2020-10-11",
                "week_start": "2020-10-05",
                "total_distance_km": 59.0,
                "average_speed_kmph": 11.77,
            }),
            json!({
                "id": 2,
                "week": "2020-10-12 to 2020-10-18",
                "week_start": "2020-10-12",
                "total_distance_km": 15.9,
                "average_speed_kmph": 11.47,
            }),
        ]
    );
}

#[tokio::test]
async fn test_can_see_only_own_reports() {
    let tracker = tracker();
    let bob = bob_with_two_weeks(&tracker).await;

    let mike = Caller::from(&tracker.new_account("mike").await.unwrap());
    tracker
        .log_run(&mike, NewRun::new(date("2020-10-05"), 5.3, hms(0, 25, 4), "Madrid"))
        .await
        .unwrap();
    tracker
        .log_run(&mike, NewRun::new(date("2020-10-11"), 5.3, hms(0, 25, 55), "Madrid"))
        .await
        .unwrap();

    let bobs = reports(&tracker, &bob).await;
    assert_eq!(bobs.len(), 2);
    assert_eq!(bobs[0].total_distance_km, 11.3 + 15.9 + 15.9 + 15.9);

    let mikes = reports(&tracker, &mike).await;
    assert_eq!(mikes.len(), 1);
    assert_eq!(mikes[0].week(), "2020-10-05 to 2020-10-11");

    let err = tracker.get_weekly_report(&mike, bobs[0].id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(tracker.get_weekly_report(&bob, bobs[0].id).await.unwrap(), bobs[0]);
}

// ============================================================================
// 2. Recomputation on change
// ============================================================================

#[tokio::test]
async fn test_moving_a_run_updates_both_weeks() {
    let tracker = tracker();
    let bob = bob_with_two_weeks(&tracker).await;

    // Run 1 moves from the first week to the second.
    let moved = tracker
        .update_run(&bob, runlog::RunId(1), RunPatch::default().date(date("2020-10-13")))
        .await
        .unwrap();
    assert_eq!(moved.date, date("2020-10-13"));

    let listed = reports(&tracker, &bob).await;
    assert_eq!(listed.len(), 2);
    let first = listed.iter().find(|r| r.week_start == date("2020-10-05")).unwrap();
    let second = listed.iter().find(|r| r.week_start == date("2020-10-12")).unwrap();
    assert!((first.total_distance_km - 47.7).abs() < 1e-9);
    assert!((second.total_distance_km - 27.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_emptied_week_loses_its_report() {
    let tracker = tracker();
    let bob = bob_with_two_weeks(&tracker).await;

    tracker.delete_run(&bob, runlog::RunId(5)).await.unwrap();

    let listed = reports(&tracker, &bob).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].week_start, date("2020-10-05"));
    assert_eq!(tracker.backend().report_count(), 1);
}

#[tokio::test]
async fn test_report_keeps_its_id_across_recomputation() {
    let tracker = tracker();
    let bob = bob_with_two_weeks(&tracker).await;
    let before = reports(&tracker, &bob).await;

    tracker
        .update_run(&bob, runlog::RunId(2), RunPatch::default().distance(20.0))
        .await
        .unwrap();

    let after = reports(&tracker, &bob).await;
    assert_eq!(after[0].id, before[0].id);
    assert!(after[0].total_distance_km > before[0].total_distance_km);
}

#[tokio::test]
async fn test_reports_filter_by_search() {
    let tracker = tracker();
    let bob = bob_with_two_weeks(&tracker).await;

    let params = ListParams::new().search("week_start gt '2020-10-06'");
    let page = tracker.list_weekly_reports(&bob, &params).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].week_start, date("2020-10-12"));

    let params = ListParams::new().search("average_speed_kmph gt 11.5");
    let page = tracker.list_weekly_reports(&bob, &params).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].week_start, date("2020-10-05"));
}
