use super::buffer::SoundBuffer;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no audio output device: {0}")]
    Device(String),
    #[error("failed to start playback: {0}")]
    Play(String),
}

/// Completion handle for a clip that is already playing.
///
/// Dropping it does not stop the sound.
#[derive(Debug)]
pub struct Playback {
    done: oneshot::Receiver<()>,
}

impl Playback {
    pub fn new(done: oneshot::Receiver<()>) -> Self {
        Self { done }
    }

    /// Playback that has nothing left to do.
    pub fn finished_now() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        Self { done: rx }
    }

    /// Resolves when the last sample was consumed or the output went away.
    pub async fn finished(self) {
        let _ = self.done.await;
    }
}

/// Anything that can start a clip without waiting for it to end.
///
/// Implementations must let calls overlap: a second `play` never waits for
/// the first clip.
pub trait AudioSink: Send + Sync {
    fn play(&self, buffer: &SoundBuffer) -> Result<Playback, OutputError>;
}

/// Plays through the default output device.
///
/// rodio's output stream is not `Send`, so it lives on a dedicated thread for
/// as long as this sink exists. Every clip gets its own detached `Sink` on the
/// shared mixer, which is what lets clips overlap.
pub struct RodioSink {
    handle: rodio::OutputStreamHandle,
    volume: f32,
    _stream_guard: mpsc::SyncSender<()>,
}

impl RodioSink {
    pub fn open_default(volume: f32) -> Result<Self, OutputError> {
        let (handle_tx, handle_rx) = mpsc::channel();
        let (guard_tx, guard_rx) = mpsc::sync_channel::<()>(0);

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match rodio::OutputStream::try_default() {
                Ok((stream, handle)) => {
                    if handle_tx.send(Ok(handle)).is_err() {
                        return;
                    }
                    // returns once the sink is dropped
                    let _ = guard_rx.recv();
                    drop(stream);
                }
                Err(err) => {
                    let _ = handle_tx.send(Err(OutputError::Device(err.to_string())));
                }
            })
            .map_err(|e| OutputError::Device(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|_| OutputError::Device("audio thread exited".to_string()))??;

        Ok(Self {
            handle,
            volume,
            _stream_guard: guard_tx,
        })
    }
}

impl AudioSink for RodioSink {
    fn play(&self, buffer: &SoundBuffer) -> Result<Playback, OutputError> {
        let sink =
            rodio::Sink::try_new(&self.handle).map_err(|e| OutputError::Play(e.to_string()))?;
        let (tx, rx) = oneshot::channel();
        sink.set_volume(self.volume);
        sink.append(buffer.stream().notify_on_end(tx));
        sink.detach();
        Ok(Playback::new(rx))
    }
}

/// Stand-in used when no output device could be opened.
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn play(&self, buffer: &SoundBuffer) -> Result<Playback, OutputError> {
        tracing::debug!(
            duration_ms = buffer.duration().as_millis() as u64,
            "No audio output, skipping playback"
        );
        Ok(Playback::finished_now())
    }
}

/// Opens the default device, falling back to [`SilentSink`] when there is none.
pub fn open_default(volume: f32) -> Arc<dyn AudioSink> {
    match RodioSink::open_default(volume) {
        Ok(sink) => Arc::new(sink),
        Err(err) => {
            tracing::warn!(error = %err, "Audio output unavailable, sounds will not be audible");
            Arc::new(SilentSink)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every clip it is asked to play and drains it on a thread,
    /// like a real mixer would.
    #[derive(Default)]
    pub struct RecordingSink {
        played: Mutex<Vec<usize>>,
    }

    impl RecordingSink {
        pub fn play_count(&self) -> usize {
            self.played.lock().map(|p| p.len()).unwrap_or(0)
        }

        pub fn played_lengths(&self) -> Vec<usize> {
            self.played.lock().map(|p| p.clone()).unwrap_or_default()
        }
    }

    impl AudioSink for RecordingSink {
        fn play(&self, buffer: &SoundBuffer) -> Result<Playback, OutputError> {
            let (tx, rx) = oneshot::channel();
            let source = buffer.stream().notify_on_end(tx);
            if let Ok(mut played) = self.played.lock() {
                played.push(buffer.len());
            }
            thread::spawn(move || source.for_each(drop));
            Ok(Playback::new(rx))
        }
    }

    pub struct BrokenSink;

    impl AudioSink for BrokenSink {
        fn play(&self, _buffer: &SoundBuffer) -> Result<Playback, OutputError> {
            Err(OutputError::Play("device unplugged".to_string()))
        }
    }
}
