//! Replay loop — feeds a sample log line by line through the engine.
//!
//! Lines without their own `deviceId` are attributed to the fallback
//! device. Unparseable lines are counted here and skipped; malformed or
//! out-of-order samples are counted by the engine.

use std::io::BufRead;

use geofence_core::{GeofenceEngine, GeofenceEvent};

use crate::input;

/// Feed every line of `reader` through `engine`, calling `on_event` for
/// each produced event in emission order. Returns the count of lines
/// that did not parse.
pub fn run_replay(
    engine: &mut GeofenceEngine,
    reader: impl BufRead,
    fallback_device: &str,
    mut on_event: impl FnMut(&GeofenceEvent),
) -> u64 {
    let mut unparseable = 0u64;

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        let parsed = match input::parse_sample_line(&line) {
            None => continue,
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                unparseable += 1;
                tracing::warn!("skipping unparseable line: {e}");
                continue;
            }
        };

        let device = parsed.device_id.as_deref().unwrap_or(fallback_device);
        match engine.ingest(device, &parsed.sample) {
            Ok(events) => {
                for event in &events {
                    on_event(event);
                }
            }
            Err(e) => {
                tracing::warn!("sample rejected for {device}: {e}");
            }
        }
    }

    unparseable
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use geofence_core::{EventKind, Geofence};
    use std::io::BufReader;

    /// 1000 m fence at the equator; 0.005 deg of latitude is ~556 m.
    fn engine_with_zone() -> GeofenceEngine {
        let mut engine = GeofenceEngine::new();
        engine
            .upsert_geofence(Geofence::new("zone", 0.0, 0.0, 1000.0))
            .unwrap();
        engine
    }

    #[test]
    fn test_replay_routes_fallback_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"latitude":0.005,"longitude":0.0,"timestamp":1.0}"#,
                "\n",
                r#"{"deviceId":"phone-9","latitude":0.005,"longitude":0.0,"timestamp":1.0}"#,
                "\n",
            ),
        )
        .unwrap();

        let mut engine = engine_with_zone();
        let mut events = Vec::new();
        let reader = BufReader::new(std::fs::File::open(&path).unwrap());
        let unparseable = run_replay(&mut engine, reader, "device-0", |e| {
            events.push(e.clone())
        });

        assert_eq!(unparseable, 0);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].device_id, "device-0",
            "line without a deviceId goes to the fallback device"
        );
        assert_eq!(events[1].device_id, "phone-9");
        assert_eq!(engine.device_count(), 2);
    }

    #[test]
    fn test_replay_skips_and_counts_malformed_lines() {
        let log = concat!(
            "# recorded walk\n",
            "\n",
            r#"{"latitude":0.005,"longitude":0.0,"timestamp":1.0}"#,
            "\n",
            "{broken json\n",
            r#"{"longitude":0.0,"timestamp":2.0}"#,
            "\n",
            r#"{"latitude":0.02,"longitude":0.0,"timestamp":3.0}"#,
            "\n",
        );

        let mut engine = engine_with_zone();
        let mut events = Vec::new();
        let unparseable = run_replay(&mut engine, log.as_bytes(), "device-0", |e| {
            events.push(e.clone())
        });

        assert_eq!(unparseable, 2, "broken JSON and missing latitude both count");
        assert_eq!(engine.samples_ingested, 2, "blanks and comments are not samples");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Entry);
        assert_eq!(events[1].kind, EventKind::Exit);
    }

    #[test]
    fn test_replay_counts_rejected_samples() {
        // Second line runs the clock backwards, third is out of range;
        // both parse fine, so they are engine rejections, not parse noise.
        let log = concat!(
            r#"{"latitude":0.005,"longitude":0.0,"timestamp":10.0}"#,
            "\n",
            r#"{"latitude":0.02,"longitude":0.0,"timestamp":5.0}"#,
            "\n",
            r#"{"latitude":91.0,"longitude":0.0,"timestamp":20.0}"#,
            "\n",
        );

        let mut engine = engine_with_zone();
        let mut events = Vec::new();
        let unparseable = run_replay(&mut engine, log.as_bytes(), "device-0", |e| {
            events.push(e.clone())
        });

        assert_eq!(unparseable, 0);
        assert_eq!(engine.samples_rejected, 2);
        assert_eq!(engine.samples_ingested, 1);
        assert_eq!(events.len(), 1, "only the first sample produced an event");
    }
}
