//! Recorded landmark playback
//!
//! Reads one JSON-encoded [`LandmarkFrame`] per line. Blank lines are
//! skipped. Playback can follow the recorded timestamps and loop.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::{LandmarkSource, TrackingError};
use crate::hand::LandmarkFrame;

/// Landmark source backed by a JSON-lines recording
pub struct ReplaySource {
    path: PathBuf,
    name: String,
    lines: Option<Lines<BufReader<File>>>,
    /// 1-based number of the last line read
    line: usize,
    pace: bool,
    looping: bool,
    /// Wall clock and recorded timestamp of the first frame of this pass
    clock: Option<(Instant, f64)>,
    /// Frames read during the current pass
    pass_frames: usize,
}

impl ReplaySource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("replay:{}", path.display());
        Self {
            path,
            name,
            lines: None,
            line: 0,
            pace: false,
            looping: false,
            clock: None,
            pass_frames: 0,
        }
    }

    /// Sleep between frames so playback matches the recorded timing
    pub fn paced(mut self, pace: bool) -> Self {
        self.pace = pace;
        self
    }

    /// Restart from the first line at end of file
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rewind(&mut self) -> Result<(), TrackingError> {
        let file = File::open(&self.path).map_err(|source| TrackingError::Replay {
            path: self.path.clone(),
            source,
        })?;
        self.lines = Some(BufReader::new(file).lines());
        self.line = 0;
        self.clock = None;
        self.pass_frames = 0;
        Ok(())
    }

    /// Next non-blank line, or `None` at end of file
    fn next_line(&mut self) -> Result<Option<String>, TrackingError> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };
        for next in lines.by_ref() {
            self.line += 1;
            let text = next.map_err(|source| TrackingError::Replay {
                path: self.path.clone(),
                source,
            })?;
            if !text.trim().is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    fn wait_for(&mut self, timestamp_ms: f64) {
        let (start, base_ms) = *self.clock.get_or_insert((Instant::now(), timestamp_ms));
        let offset_ms = timestamp_ms - base_ms;
        if !(offset_ms.is_finite() && offset_ms > 0.0) {
            return;
        }
        let due = start + Duration::from_secs_f64(offset_ms / 1000.0);
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
    }
}

impl LandmarkSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), TrackingError> {
        self.rewind()?;
        tracing::info!(path = %self.path.display(), looping = self.looping, "Replay opened");
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, TrackingError> {
        let text = match self.next_line()? {
            Some(text) => text,
            None if self.looping && self.pass_frames > 0 => {
                tracing::debug!(frames = self.pass_frames, "Replay looping");
                self.rewind()?;
                match self.next_line()? {
                    Some(text) => text,
                    None => return Ok(None),
                }
            }
            None => return Ok(None),
        };

        let frame: LandmarkFrame =
            serde_json::from_str(&text).map_err(|source| TrackingError::Parse {
                line: self.line,
                source,
            })?;
        self.pass_frames += 1;

        if self.pace {
            self.wait_for(frame.timestamp_ms);
        }
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.lines = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_recording(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "gesture-orbit-{}-{}.jsonl",
            name,
            std::process::id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const TWO_FRAMES: &str =
        "{\"timestampMs\": 0, \"hands\": []}\n\n{\"timestampMs\": 16, \"hands\": []}\n";

    #[test]
    fn test_reads_frames_and_skips_blank_lines() {
        let path = write_recording("frames", TWO_FRAMES);
        let mut source = ReplaySource::new(&path);
        source.open().unwrap();
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, 0.0);
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, 16.0);
        assert!(source.next_frame().unwrap().is_none());
        source.close();
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let path = write_recording(
            "bad",
            "{\"timestampMs\": 0}\n\n{not json}\n{\"timestampMs\": 5}\n",
        );
        let mut source = ReplaySource::new(&path);
        source.open().unwrap();
        assert!(source.next_frame().unwrap().is_some());
        match source.next_frame() {
            Err(TrackingError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
        // Reading continues after the bad line
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, 5.0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file() {
        let mut source = ReplaySource::new("/nonexistent/gesture-orbit/recording.jsonl");
        assert!(matches!(source.open(), Err(TrackingError::Replay { .. })));
        source.close();
    }

    #[test]
    fn test_looping() {
        let path = write_recording("loop", TWO_FRAMES);
        let mut source = ReplaySource::new(&path).looping(true);
        source.open().unwrap();
        let stamps: Vec<f64> = (0..5)
            .map(|_| source.next_frame().unwrap().unwrap().timestamp_ms)
            .collect();
        assert_eq!(stamps, vec![0.0, 16.0, 0.0, 16.0, 0.0]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_looping_empty_file_ends() {
        let path = write_recording("empty", "\n\n");
        let mut source = ReplaySource::new(&path).looping(true);
        source.open().unwrap();
        assert!(source.next_frame().unwrap().is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_paced_playback_waits() {
        let path = write_recording("paced", "{\"timestampMs\": 0}\n{\"timestampMs\": 30}\n");
        let mut source = ReplaySource::new(&path).paced(true);
        source.open().unwrap();
        let start = Instant::now();
        source.next_frame().unwrap();
        source.next_frame().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(25));
        let _ = std::fs::remove_file(path);
    }
}
