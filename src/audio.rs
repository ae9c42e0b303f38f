//! Audio output seen from the core: play, stop and fade by key
//!
//! Channel management lives in the backend. `AudioLog` records commands for tests and
//! headless runs.

/// Something that can play sounds addressed by asset key
pub trait AudioSink {
    /// Starts `key`; `loops` of `None` repeats forever
    fn play(&mut self, key: &str, volume: f32, loops: Option<u32>);

    fn stop(&mut self, key: &str);

    fn fade_out(&mut self, key: &str, millis: u32);
}

/// Discards every command
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _key: &str, _volume: f32, _loops: Option<u32>) {}

    fn stop(&mut self, _key: &str) {}

    fn fade_out(&mut self, _key: &str, _millis: u32) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Play {
        key: String,
        volume: f32,
        loops: Option<u32>,
    },
    Stop(String),
    FadeOut {
        key: String,
        millis: u32,
    },
}

/// Records every command in order
#[derive(Debug, Clone, Default)]
pub struct AudioLog {
    pub events: Vec<AudioEvent>,
}

impl AudioLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of every `Play`, in order
    pub fn played(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                AudioEvent::Play { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl AudioSink for AudioLog {
    fn play(&mut self, key: &str, volume: f32, loops: Option<u32>) {
        self.events.push(AudioEvent::Play {
            key: key.to_string(),
            volume,
            loops,
        });
    }

    fn stop(&mut self, key: &str) {
        self.events.push(AudioEvent::Stop(key.to_string()));
    }

    fn fade_out(&mut self, key: &str, millis: u32) {
        self.events.push(AudioEvent::FadeOut {
            key: key.to_string(),
            millis,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_log_records_in_order() {
        let mut log = AudioLog::new();
        log.play("depths", 0.5, None);
        log.fade_out("depths", 800);
        log.play("chase", 1.0, Some(2));

        assert_eq!(log.played(), vec!["depths", "chase"]);
        assert_eq!(
            log.events[1],
            AudioEvent::FadeOut {
                key: "depths".to_string(),
                millis: 800
            }
        );
    }
}
