mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{app_with, hours_ago};
use envscore::datamodel::CalendarDate;
use envscore::telemetry::TelemetryError;
use envscore::test_utils::{comfortable_record, living_record, now_seconds};
use serde_json::{Value, json};
use serial_test::serial;

/// One comfortable reading an hour ago, one at every acceptable edge two hours ago.
async fn two_readings() -> (common::http::TestApp, std::sync::Arc<envscore::telemetry::MemoryTelemetry>) {
    let now = now_seconds();
    app_with(vec![
        comfortable_record(hours_ago(now, 1)),
        living_record(hours_ago(now, 2), 30.0, 70.0, 1000.0, 0.7),
        // outside the 24h window
        comfortable_record(hours_ago(now, 48)),
    ])
    .await
}

mod health_check_tests {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn test_liveness_endpoint() -> Result<()> {
        let (app, _) = app_with(vec![]).await;

        let response = app.get("/health/live").await?;

        response.assert_status(StatusCode::OK);
        let health_response: Value = response.json()?;
        assert_eq!(health_response["status"], "ok");
        assert_eq!(health_response["service"], "EnvScore Test");
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_readiness_follows_the_telemetry_source() -> Result<()> {
        let (app, telemetry) = app_with(vec![]).await;

        let response = app.get("/health/ready").await?;
        response.assert_status(StatusCode::OK);
        let readiness: Value = response.json()?;
        assert_eq!(readiness["status"], "ready");
        assert_eq!(readiness["source"]["scheme"], "memory");
        assert_eq!(readiness["source"]["timestampUnit"], "s");
        assert_eq!(readiness["source"]["reachable"], true);
        assert_eq!(readiness["live"], "noReading");
        assert!(readiness.get("error").is_none());

        telemetry
            .set_failure(Some(TelemetryError::Connectivity("offline".to_string())))
            .await;
        let response = app.get("/health/ready").await?;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let readiness: Value = response.json()?;
        assert_eq!(readiness["status"], "not_ready");
        assert_eq!(readiness["source"]["reachable"], false);
        response.assert_body_contains("offline");
        Ok(())
    }
}

mod scoring_tests {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn test_scoring_table() -> Result<()> {
        let (app, _) = app_with(vec![]).await;

        let response = app.get("/api/v1/scoring").await?;
        response.assert_status(StatusCode::OK);
        let table: Value = response.json()?;
        let names: Vec<&str> = table["metrics"]
            .as_array()
            .unwrap()
            .iter()
            .map(|metric| metric["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["temperature", "humidity", "airQuality_ppm", "soundLevel"]
        );
        assert_eq!(table["metrics"][2]["polarity"], "LOWER_IS_BETTER");
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_score_a_partial_record() -> Result<()> {
        let (app, _) = app_with(vec![]).await;

        let response = app
            .post_json("/api/v1/score", r#"{"temperature": 23, "humidity": "50", "soundLevel": "loud"}"#)
            .await?;
        response.assert_status(StatusCode::OK);
        let score: Value = response.json()?;
        assert_eq!(score["score"], 10.0);
        assert_eq!(score["rating"], "excellent");
        assert_eq!(
            score["subScores"],
            json!({"temperature": 10.0, "humidity": 10.0})
        );
        assert_eq!(score["statuses"]["soundLevel"], "unknown");
        assert_eq!(score["statuses"]["humidity"], "excellent");
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_score_rejects_non_objects() -> Result<()> {
        let (app, _) = app_with(vec![]).await;

        let response = app.post_json("/api/v1/score", "[1, 2, 3]").await?;
        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_body_contains("JSON object");
        Ok(())
    }
}

mod analytics_tests {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn test_report_of_the_last_day() -> Result<()> {
        let (app, _) = two_readings().await;

        let response = app.get("/api/v1/analytics?range=24h").await?;
        response.assert_status(StatusCode::OK);
        let report: Value = response.json()?;

        assert_eq!(report["range"], "24h");
        assert_eq!(report["readingCount"], 2);
        assert_eq!(
            report["statistics"]["score"],
            json!({"status": "available", "avg": 7.5, "min": 5.0, "max": 10.0, "latest": 10.0})
        );
        assert_eq!(
            report["statistics"]["temperature"]["latest"],
            23.0
        );

        let temperature = &report["temperatureDistribution"];
        assert_eq!(temperature["status"], "binned");
        assert_eq!(temperature["bins"][2]["rangeLabel"], "20-25°C");
        assert_eq!(temperature["bins"][2]["count"], 1);
        assert_eq!(temperature["bins"][4]["count"], 1);

        let scores = &report["scoreDistribution"];
        assert_eq!(scores["bins"][2]["count"], 1);
        assert_eq!(scores["bins"][4]["count"], 1);

        let correlation = &report["correlation"];
        assert_eq!(correlation["xMetric"], "temperature");
        assert_eq!(correlation["points"].as_array().unwrap().len(), 2);
        assert!(correlation["coefficient"].as_f64().unwrap() > 0.99);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_default_range_is_seven_days() -> Result<()> {
        let (app, _) = two_readings().await;

        let report: Value = app.get("/api/v1/analytics").await?.json()?;
        assert_eq!(report["range"], "7d");
        assert_eq!(report["readingCount"], 3);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_source_has_no_data() -> Result<()> {
        let (app, _) = app_with(vec![]).await;

        let report: Value = app.get("/api/v1/analytics").await?.json()?;
        assert_eq!(report["readingCount"], 0);
        assert_eq!(report["statistics"]["score"], json!({"status": "unavailable"}));
        assert_eq!(report["temperatureDistribution"], json!({"status": "noData"}));
        assert_eq!(report["correlation"]["coefficient"], Value::Null);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_bad_parameters() -> Result<()> {
        let (app, _) = two_readings().await;

        app.get("/api/v1/analytics?range=1y")
            .await?
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_body_contains("1y");
        app.get("/api/v1/analytics/distribution?metric=humidity")
            .await?
            .assert_status(StatusCode::BAD_REQUEST);
        app.get("/api/v1/analytics/correlation?x=pressure")
            .await?
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_body_contains("pressure");
        app.get("/api/v1/analytics/hourly?date=2024-02-30")
            .await?
            .assert_status(StatusCode::BAD_REQUEST);
        app.get("/api/v1/analytics/export?format=xlsx")
            .await?
            .assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_history_is_ascending_and_scored() -> Result<()> {
        let (app, _) = two_readings().await;

        let history: Value = app.get("/api/v1/analytics/history?range=24h").await?.json()?;
        let readings = history["readings"].as_array().unwrap();
        assert_eq!(readings.len(), 2);
        assert!(readings[0]["timestamp"].as_i64() < readings[1]["timestamp"].as_i64());
        assert_eq!(readings[0]["score"], 5.0);
        assert_eq!(readings[1]["score"], 10.0);
        // canonical milliseconds
        assert_eq!(readings[1]["timestamp"].as_i64().unwrap() % 1000, 0);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_score_distribution_and_custom_correlation() -> Result<()> {
        let (app, _) = two_readings().await;

        let distribution: Value = app
            .get("/api/v1/analytics/distribution?range=24h&metric=score")
            .await?
            .json()?;
        assert_eq!(distribution["bins"][4]["rangeLabel"], "8-10");
        assert_eq!(distribution["unbinned"], 0);

        let correlation: Value = app
            .get("/api/v1/analytics/correlation?range=24h&x=airQuality_ppm&y=score")
            .await?
            .json()?;
        assert_eq!(correlation["yMetric"], "score");
        assert!(correlation["coefficient"].as_f64().unwrap() < -0.99);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_hourly_prefers_stored_aggregates() -> Result<()> {
        let (app, telemetry) = app_with(vec![]).await;
        telemetry
            .insert_hourly(
                CalendarDate::new(2024, 3, 1)?,
                9,
                json!({"avgTemperature": 21.5, "avgAirQuality": 420, "readings": 12}),
            )
            .await;

        let pattern: Value = app.get("/api/v1/analytics/hourly?date=2024-03-01").await?.json()?;
        assert_eq!(pattern["date"], "2024-03-01");
        assert_eq!(pattern["source"], "precomputed");
        assert_eq!(
            pattern["hours"],
            json!([{
                "hour": "09:00",
                "averages": {"temperature": 21.5, "airQuality_ppm": 420.0},
                "readingCount": 12
            }])
        );
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_hourly_falls_back_to_readings() -> Result<()> {
        let now = now_seconds();
        let (app, _) = app_with(vec![comfortable_record(now)]).await;

        let pattern: Value = app.get("/api/v1/analytics/hourly").await?.json()?;
        assert_eq!(pattern["source"], "readings");
        let hours = pattern["hours"].as_array().unwrap();
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0]["readingCount"], 1);
        assert_eq!(hours[0]["averages"]["score"], 10.0);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_telemetry_failures() -> Result<()> {
        let (app, telemetry) = two_readings().await;

        telemetry
            .set_failure(Some(TelemetryError::PermissionDenied("rules".to_string())))
            .await;
        app.get("/api/v1/analytics")
            .await?
            .assert_status(StatusCode::SERVICE_UNAVAILABLE)
            .assert_body_contains("rules");

        telemetry
            .set_failure(Some(TelemetryError::Malformed("not a tree".to_string())))
            .await;
        let response = app.get("/api/v1/analytics/statistics").await?;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = response.json()?;
        assert_eq!(error["error"], "Internal Server Error");
        Ok(())
    }
}

mod export_tests {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn test_csv_export() -> Result<()> {
        let (app, _) = two_readings().await;

        let response = app.get("/api/v1/analytics/export?range=24h").await?;
        response
            .assert_status(StatusCode::OK)
            .assert_content_type("text/csv; charset=utf-8")
            .assert_header(
                "content-disposition",
                "attachment; filename=\"envscore-24h.csv\"",
            );

        let lines: Vec<&str> = response.body().lines().collect();
        assert_eq!(
            lines[0],
            "timestamp,date,time,temperature,humidity,airQuality_ppm,soundLevel,score"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",30,70,1000,0.7,5"));
        assert!(lines[2].ends_with(",23,50,350,0.1,10"));
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_jsonl_export() -> Result<()> {
        let (app, _) = two_readings().await;

        let response = app
            .get("/api/v1/analytics/export?range=24h&format=jsonl")
            .await?;
        response
            .assert_status(StatusCode::OK)
            .assert_content_type("application/x-ndjson");
        let readings: Vec<Value> = response
            .body()
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1]["temperature"], 23.0);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_export() -> Result<()> {
        let (app, _) = app_with(vec![]).await;

        let response = app.get("/api/v1/analytics/export").await?;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.body(), "");
        Ok(())
    }
}

mod selection_tests {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn test_select_then_read_back() -> Result<()> {
        let (app, _) = two_readings().await;

        app.get("/api/v1/analytics/selection")
            .await?
            .assert_status(StatusCode::NOT_FOUND);

        let response = app.post("/api/v1/analytics/selection?range=24h").await?;
        response.assert_status(StatusCode::OK);
        let selection: Value = response.json()?;
        assert_eq!(selection["superseded"], false);
        assert_eq!(selection["report"]["readingCount"], 2);

        let current: Value = app.get("/api/v1/analytics/selection").await?.json()?;
        assert_eq!(current["range"], "24h");
        assert_eq!(current, selection["report"]);
        Ok(())
    }
}

mod live_tests {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn test_live_state_before_any_reading() -> Result<()> {
        let (app, _) = app_with(vec![]).await;

        let live: Value = app.get("/api/v1/live").await?.json()?;
        assert_eq!(live, json!({"state": "noReading"}));
        Ok(())
    }
}
