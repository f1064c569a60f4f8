use anyhow::Result;
use envscore::analytics::{AnalyticsEngine, EmptyRecordPolicy, HourlySource, Statistics, TimeRange};
use envscore::datamodel::{CalendarDate, ScoringConfig, TimestampNormalizer, TimestampUnit};
use envscore::live::{LiveMonitor, LiveState};
use envscore::scoring::ScoreComposer;
use envscore::telemetry::{TelemetryError, TelemetrySource};
use envscore::telemetry::telemetry_factory::create_telemetry_from_connection_string;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

// 2023-11-15T12:06:40Z
const NOW: i64 = 1_700_050_000_000;

fn tree() -> Value {
    json!({
        "latest_readings": {"timestamp": 1_700_049_000, "temperature": 24.0, "humidity": 55},
        "environmental_data": {
            "-Nk1": {"timestamp": 1_700_000_000, "temperature": 22.0, "humidity": 45, "airQuality_ppm": 380},
            "-Nk2": {"timestamp": "1700003600", "temperature": "26.5", "humidity": 52},
            "-Nk3": {"timestamp": 1_700_007_200},
            "-Nk4": {"timestamp": "yesterday", "temperature": 40},
            "-Nk5": {"timestamp": 1_690_000_000, "temperature": 21.0}
        },
        "aggregated_data": {"hourly": {"2023": {"11": {"14": [
            null,
            {"avgTemperature": 19.5, "avgScore": 7.1, "readings": 6},
            "garbage"
        ]}}}}
    })
}

fn snapshot_file(content: &str) -> Result<NamedTempFile> {
    let file = NamedTempFile::new()?;
    std::fs::write(file.path(), content)?;
    Ok(file)
}

fn snapshot_engine(file: &NamedTempFile, policy: EmptyRecordPolicy) -> Result<AnalyticsEngine> {
    let source = create_telemetry_from_connection_string(
        &format!("snapshot:{}", file.path().display()),
        TimestampUnit::Seconds,
        Duration::from_millis(100),
    )?;
    Ok(
        AnalyticsEngine::new(source, Arc::new(ScoringConfig::living_conditions()), 0)
            .with_empty_record_policy(policy),
    )
}

#[tokio::test]
async fn test_historical_analytics_from_a_snapshot() -> Result<()> {
    let file = snapshot_file(&tree().to_string())?;
    let engine = snapshot_engine(&file, EmptyRecordPolicy::Retain)?;

    let series = engine.historical_series(TimeRange::Last7Days, NOW).await?;
    // the invalid timestamp and the record older than the range are dropped
    let timestamps: Vec<i64> = series.iter().map(|reading| reading.timestamp()).collect();
    assert_eq!(
        timestamps,
        vec![1_700_000_000_000, 1_700_003_600_000, 1_700_007_200_000]
    );
    // a record without metrics is kept but never scored
    assert_eq!(series.readings()[2].score(), None);

    let report = engine.analyze(TimeRange::Last7Days, NOW).await?;
    assert_eq!(report.reading_count, 3);
    assert_eq!(
        report.statistics["temperature"],
        Statistics::Available {
            avg: 24.3,
            min: 22.0,
            max: 26.5,
            latest: 26.5
        }
    );
    assert_eq!(report.statistics["soundLevel"], Statistics::Unavailable);
    assert_eq!(report.temperature_distribution.total(), 2);
    assert_eq!(report.correlation.points.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_records_can_be_dropped() -> Result<()> {
    let file = snapshot_file(&tree().to_string())?;
    let engine = snapshot_engine(&file, EmptyRecordPolicy::Drop)?;

    let series = engine.historical_series(TimeRange::Last7Days, NOW).await?;
    assert_eq!(series.len(), 2);
    assert!(series.iter().all(|reading| reading.score().is_some()));
    Ok(())
}

#[tokio::test]
async fn test_hourly_aggregates_stored_as_an_array() -> Result<()> {
    let file = snapshot_file(&tree().to_string())?;
    let engine = snapshot_engine(&file, EmptyRecordPolicy::Retain)?;

    let pattern = engine.hourly_pattern(CalendarDate::new(2023, 11, 14)?).await?;
    assert_eq!(pattern.source, HourlySource::Precomputed);
    assert_eq!(pattern.hours.len(), 1);
    assert_eq!(pattern.hours[0].hour, "01:00");
    assert_eq!(pattern.hours[0].average("temperature"), Some(19.5));
    assert_eq!(pattern.hours[0].average("score"), Some(7.1));
    assert_eq!(pattern.hours[0].reading_count, 6);

    // nothing stored for the 15th, its readings are aggregated instead
    let pattern = engine.hourly_pattern(CalendarDate::new(2023, 11, 15)?).await?;
    assert_eq!(pattern.source, HourlySource::Readings);
    assert_eq!(pattern.hours.len(), 1);
    assert_eq!(pattern.hours[0].hour, "00:00");
    // counted, but with nothing to average
    assert_eq!(pattern.hours[0].reading_count, 1);
    assert!(pattern.hours[0].averages.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_and_malformed_snapshots() -> Result<()> {
    let missing = NamedTempFile::new()?;
    let path = missing.path().to_path_buf();
    drop(missing);
    let source = create_telemetry_from_connection_string(
        &format!("snapshot://{}", path.display()),
        TimestampUnit::Seconds,
        Duration::from_secs(1),
    )?;
    assert!(source.query_range(0).await?.is_empty());
    assert!(source.health_check().await.is_ok());

    let file = snapshot_file("{\"environmental_data\": ")?;
    let engine = snapshot_engine(&file, EmptyRecordPolicy::Retain)?;
    assert!(matches!(
        engine.analyze(TimeRange::Last24Hours, NOW).await,
        Err(TelemetryError::Malformed(_))
    ));
    assert!(engine.source().health_check().await.is_err());

    let file = snapshot_file(r#"{"environmental_data": 17}"#)?;
    let engine = snapshot_engine(&file, EmptyRecordPolicy::Retain)?;
    assert!(matches!(
        engine.historical_series(TimeRange::Last24Hours, NOW).await,
        Err(TelemetryError::Malformed(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_live_updates_are_polled() -> Result<()> {
    let file = snapshot_file(&tree().to_string())?;
    let source = create_telemetry_from_connection_string(
        &format!("snapshot:{}", file.path().display()),
        TimestampUnit::Seconds,
        Duration::from_millis(100),
    )?;
    let monitor = Arc::new(LiveMonitor::new(
        ScoreComposer::new(Arc::new(ScoringConfig::living_conditions())),
        TimestampNormalizer::new(TimestampUnit::Seconds),
    ));
    let mut receiver = monitor.watch();
    let _subscription = monitor.attach(source.as_ref()).await?;

    let snapshot = monitor.current().snapshot().cloned().unwrap();
    assert_eq!(snapshot.timestamp, Some(1_700_049_000_000));

    let mut updated = tree();
    updated["latest_readings"] = Value::Null;
    std::fs::write(file.path(), updated.to_string())?;

    tokio::time::timeout(
        Duration::from_secs(3),
        receiver.wait_for(|state| *state == LiveState::NoReading),
    )
    .await??;
    Ok(())
}
