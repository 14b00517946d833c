//! Speaker output on the default `cpal` device.
//!
//! The output callback runs on the audio thread and pulls mono samples out of
//! a shared [`Synth`], copying each one to every channel of the frame.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use crate::audio::{Cue, SoundSink, Tone};
use crate::error::{Error, Result};
use crate::synth::Synth;

fn audio_err(e: impl std::fmt::Display) -> Error {
    Error::Audio(e.to_string())
}

/// Renders every cue and the ambient loop to the speakers.
pub struct DeviceSink {
    synth: Arc<Mutex<Synth>>,
    _stream: Stream,
}

impl DeviceSink {
    /// Open the default output device and start an `f32` stream on it.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".into()))?;
        let supported = device.default_output_config().map_err(audio_err)?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(Error::Audio(format!(
                "unsupported sample format {:?}",
                supported.sample_format()
            )));
        }
        let config: StreamConfig = supported.into();
        let channels = (config.channels as usize).max(1);

        let synth = Arc::new(Mutex::new(Synth::new(config.sample_rate.0)));
        let shared = Arc::clone(&synth);
        let mut mono = Vec::new();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    mono.resize(data.len() / channels, 0.0);
                    match shared.lock() {
                        Ok(mut synth) => synth.fill(&mut mono),
                        Err(_) => mono.fill(0.0),
                    }
                    for (frame, v) in data.chunks_mut(channels).zip(&mono) {
                        frame.fill(*v);
                    }
                },
                |err| log::warn!("audio stream error: {err}"),
                None,
            )
            .map_err(audio_err)?;
        stream.play().map_err(audio_err)?;

        log::info!(
            "audio output on {:?} at {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate.0,
            channels
        );
        Ok(Self {
            synth,
            _stream: stream,
        })
    }

    fn with_synth(&self, f: impl FnOnce(&mut Synth)) -> Result<()> {
        let mut synth = self
            .synth
            .lock()
            .map_err(|_| Error::Audio("synth lock poisoned".into()))?;
        f(&mut synth);
        Ok(())
    }
}

impl SoundSink for DeviceSink {
    fn play(&mut self, _cue: Cue, tones: &[Tone]) -> Result<()> {
        self.with_synth(|s| s.trigger(tones))
    }

    fn set_ambient(&mut self, playing: bool) -> Result<()> {
        self.with_synth(|s| s.set_ambient(playing))
    }

    fn describe(&self) -> &'static str {
        "speaker"
    }
}

impl std::fmt::Debug for DeviceSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSink").finish_non_exhaustive()
    }
}
