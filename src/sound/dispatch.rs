use super::output::{AudioSink, OutputError, Playback};
use super::registry::SoundRegistry;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("sound not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A clip that started playing.
#[derive(Debug)]
pub struct Ack {
    pub file_name: String,
    pub playback: Playback,
}

/// Resolves sound names against the registry and starts them on the sink.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SoundRegistry>,
    sink: Arc<dyn AudioSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SoundRegistry>, sink: Arc<dyn AudioSink>) -> Self {
        Self { registry, sink }
    }

    pub fn registry(&self) -> &SoundRegistry {
        &self.registry
    }

    /// Starts `name` from the beginning and returns without waiting for it.
    pub fn play(&self, name: &str) -> Result<Ack, PlayError> {
        let buffer = self
            .registry
            .lookup(name)
            .ok_or_else(|| PlayError::NotFound(self.registry.file_name(name)))?;
        let playback = self.sink.play(buffer)?;
        Ok(Ack {
            file_name: self.registry.file_name(name),
            playback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::output::testing::{BrokenSink, RecordingSink};
    use crate::sound::test_support::wav_bytes;

    fn registry() -> Arc<SoundRegistry> {
        Arc::new(SoundRegistry::from_assets(
            "wav",
            [
                ("beep.wav".to_string(), wav_bytes(1, 8000, 40)),
                ("boop.wav".to_string(), wav_bytes(1, 8000, 80)),
            ],
        ))
    }

    #[tokio::test]
    async fn test_play_known_sound() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(registry(), sink.clone());

        let ack = dispatcher.play("boop").unwrap();
        assert_eq!(ack.file_name, "boop.wav");
        ack.playback.finished().await;
        assert_eq!(sink.played_lengths(), vec![80]);
    }

    #[test]
    fn test_play_unknown_sound() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(registry(), sink.clone());

        for name in ["missing", "", "boop.wav", "../boop"] {
            let result = dispatcher.play(name);
            assert!(matches!(result, Err(PlayError::NotFound(_))), "{name}");
        }
        assert_eq!(sink.play_count(), 0);
    }

    #[tokio::test]
    async fn test_overlapping_plays_are_independent() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(registry(), sink.clone());

        let first = dispatcher.play("beep").unwrap();
        let second = dispatcher.play("beep").unwrap();
        let third = dispatcher.play("boop").unwrap();
        second.playback.finished().await;
        first.playback.finished().await;
        third.playback.finished().await;
        assert_eq!(sink.play_count(), 3);
    }

    #[test]
    fn test_output_failure_is_reported() {
        let dispatcher = Dispatcher::new(registry(), Arc::new(BrokenSink));
        let result = dispatcher.play("beep");
        assert!(matches!(result, Err(PlayError::Output(_))));
    }
}
