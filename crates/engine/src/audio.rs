//! Audio playback for the audio viewer.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use rodio::source::Source as _;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

/// Wall-clock playback position tracker. The sink does not report a
/// position, so we account for resume/pause/seek ourselves.
#[derive(Debug, Clone, Copy, Default)]
struct PlaybackClock {
    base: Duration,
    accumulated: Duration,
    resumed_at: Option<Instant>,
}

impl PlaybackClock {
    fn resume(&mut self, now: Instant) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(now);
        }
    }

    fn pause(&mut self, now: Instant) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.accumulated += now.saturating_duration_since(resumed_at);
        }
    }

    fn seek(&mut self, position: Duration, now: Instant) {
        let running = self.resumed_at.is_some();
        self.base = position;
        self.accumulated = Duration::ZERO;
        self.resumed_at = running.then_some(now);
    }

    fn position(&self, now: Instant) -> Duration {
        let running = self
            .resumed_at
            .map(|resumed_at| now.saturating_duration_since(resumed_at))
            .unwrap_or(Duration::ZERO);
        self.base + self.accumulated + running
    }
}

pub struct AudioPlayback {
    // The stream must outlive the sink; dropping it silences everything.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Sink,
    path: PathBuf,
    duration: Option<Duration>,
    clock: PlaybackClock,
    volume: f32,
    muted: bool,
    repeat: bool,
}

impl std::fmt::Debug for AudioPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPlayback")
            .field("path", &self.path)
            .field("duration", &self.duration)
            .field("volume", &self.volume)
            .field("muted", &self.muted)
            .field("repeat", &self.repeat)
            .finish_non_exhaustive()
    }
}

impl AudioPlayback {
    /// Opens the file and starts playing immediately.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("open audio output stream")?;
        let sink = Sink::try_new(&handle).context("create audio sink")?;

        let duration = attach(&sink, path, Duration::ZERO)?;

        let mut clock = PlaybackClock::default();
        clock.resume(Instant::now());

        Ok(Self {
            _stream: stream,
            handle,
            sink,
            path: path.to_path_buf(),
            duration,
            clock,
            volume: 1.0,
            muted: false,
            repeat: false,
        })
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn position(&self) -> Duration {
        let position = self.clock.position(Instant::now());
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    pub fn toggle_play(&mut self) {
        let now = Instant::now();
        if self.sink.is_paused() {
            self.sink.play();
            self.clock.resume(now);
        } else {
            self.sink.pause();
            self.clock.pause(now);
        }
    }

    /// Pauses playback; part of the session's close cleanup.
    pub fn pause(&mut self) {
        if !self.sink.is_paused() {
            self.sink.pause();
            self.clock.pause(Instant::now());
        }
    }

    pub fn seek(&mut self, position: Duration) -> anyhow::Result<()> {
        let position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        let was_paused = self.sink.is_paused();

        // The sink cannot rewind; rebuild it from a freshly decoded source.
        self.sink.stop();
        self.sink = Sink::try_new(&self.handle).context("recreate audio sink")?;
        attach(&self.sink, &self.path, position)?;
        self.apply_volume();
        if was_paused {
            self.sink.pause();
        }
        self.clock.seek(position, Instant::now());
        Ok(())
    }

    pub fn seek_by(&mut self, delta_secs: i64) -> anyhow::Result<()> {
        let current = self.position();
        let target = if delta_secs >= 0 {
            current + Duration::from_secs(delta_secs as u64)
        } else {
            current.saturating_sub(Duration::from_secs(delta_secs.unsigned_abs()))
        };
        self.seek(target)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        self.volume = (self.volume + delta).clamp(0.0, 1.0);
        self.apply_volume();
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.apply_volume();
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
    }

    pub fn finished(&self) -> bool {
        self.sink.empty() && !self.sink.is_paused()
    }

    /// Call once per event-loop tick; restarts the track when it ended and
    /// repeat is on.
    pub fn tick(&mut self) -> anyhow::Result<()> {
        if self.repeat && self.finished() {
            self.seek(Duration::ZERO)?;
        }
        Ok(())
    }

    fn apply_volume(&self) {
        self.sink
            .set_volume(if self.muted { 0.0 } else { self.volume });
    }
}

fn attach(sink: &Sink, path: &Path, skip: Duration) -> anyhow::Result<Option<Duration>> {
    let file = File::open(path).with_context(|| format!("open audio file {}", path.display()))?;
    let decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("decode audio file {}", path.display()))?;
    let duration = decoder.total_duration();
    if skip.is_zero() {
        sink.append(decoder);
    } else {
        sink.append(decoder.skip_duration(skip));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accumulates_only_while_running() {
        let now = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.resume(now);
        assert_eq!(
            clock.position(now + Duration::from_secs(5)),
            Duration::from_secs(5)
        );

        clock.pause(now + Duration::from_secs(5));
        assert_eq!(
            clock.position(now + Duration::from_secs(60)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn clock_seek_rebases_position() {
        let now = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.resume(now);
        clock.seek(Duration::from_secs(30), now + Duration::from_secs(2));
        assert_eq!(
            clock.position(now + Duration::from_secs(3)),
            Duration::from_secs(31)
        );
    }

    #[test]
    fn clock_seek_while_paused_stays_paused() {
        let now = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.seek(Duration::from_secs(10), now);
        assert_eq!(
            clock.position(now + Duration::from_secs(9)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn double_resume_does_not_double_count() {
        let now = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.resume(now);
        clock.resume(now + Duration::from_secs(2));
        assert_eq!(
            clock.position(now + Duration::from_secs(4)),
            Duration::from_secs(4)
        );
    }

    // Requires an audio output device; run manually.
    #[test]
    #[ignore]
    fn open_missing_file_fails() {
        assert!(AudioPlayback::open(Path::new("/nonexistent/clip.mp3")).is_err());
    }
}
