mod buffer;
mod dispatch;
mod output;
mod registry;

pub use buffer::{ClipSource, DecodeError, SoundBuffer};
pub use dispatch::{Ack, Dispatcher, PlayError};
pub use output::{open_default, AudioSink, OutputError, Playback, RodioSink, SilentSink};
pub use registry::{RegistryError, SoundRegistry};

#[cfg(test)]
pub(crate) use output::testing;
