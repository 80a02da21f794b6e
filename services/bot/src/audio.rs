//! rodio-backed Mixer.
//!
//! The `OutputStream` is not `Send`, so it lives on a dedicated thread for
//! the life of the mixer; everything else talks to it through the cloneable
//! `OutputStreamHandle`. Each slot gets a fresh `Sink` per clip or track,
//! which makes replacing and stopping trivial.

use pixel_core::error::MixerError;
use pixel_core::mixer::{AudioFormat, Clip, Mixer};
use rodio::buffer::SamplesBuffer;
use rodio::source::EmptyCallback;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, MixerError> {
    let file = File::open(path).map_err(|e| MixerError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| MixerError::Decode(format!("{}: {e}", path.display())))
}

/// Decodes a whole file into memory.
pub fn decode_path(path: &Path) -> Result<Clip, MixerError> {
    let decoder = open_decoder(path)?;
    let format = AudioFormat {
        sample_rate: decoder.sample_rate(),
        channels: decoder.channels(),
    };
    let samples: Vec<i16> = decoder.collect();
    Ok(Clip::new(format, samples))
}

fn clip_source(clip: Clip) -> SamplesBuffer<i16> {
    SamplesBuffer::new(clip.format.channels, clip.format.sample_rate, clip.samples)
}

struct OutputThread {
    shutdown: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

pub struct RodioMixer {
    handle: OutputStreamHandle,
    volume: Mutex<f32>,
    background: Mutex<Option<Sink>>,
    foreground: Mutex<Option<Sink>>,
    finished: Arc<Notify>,
    output: Mutex<Option<OutputThread>>,
}

impl RodioMixer {
    /// Opens the default output device at the given background volume.
    pub fn open(initial_volume: f32) -> Result<Self, MixerError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<OutputStreamHandle, String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    if ready_tx.send(Ok(handle)).is_ok() {
                        // Blocks until close() sends or the mixer is dropped.
                        let _ = shutdown_rx.recv();
                    }
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| MixerError::Device(e.to_string()))?;

        let handle = ready_rx
            .recv()
            .map_err(|e| MixerError::Device(e.to_string()))?
            .map_err(MixerError::Device)?;
        info!(volume = initial_volume, "Audio output opened");

        Ok(Self {
            handle,
            volume: Mutex::new(initial_volume),
            background: Mutex::new(None),
            foreground: Mutex::new(None),
            finished: Arc::new(Notify::new()),
            output: Mutex::new(Some(OutputThread {
                shutdown: shutdown_tx,
                thread,
            })),
        })
    }

    fn new_sink(&self) -> Result<Sink, MixerError> {
        Sink::try_new(&self.handle).map_err(|e| MixerError::Device(e.to_string()))
    }

    /// Releases the output device. Safe to call more than once.
    pub fn close(&self) {
        self.stop_all();
        if let Some(output) = lock(&self.output).take() {
            let _ = output.shutdown.send(());
            if output.thread.join().is_err() {
                warn!("Audio output thread panicked");
            }
            info!("Audio output closed");
        }
    }
}

impl Mixer for RodioMixer {
    fn background_volume(&self) -> f32 {
        *lock(&self.volume)
    }

    fn set_background_volume(&self, volume: f32) {
        *lock(&self.volume) = volume;
        if let Some(sink) = lock(&self.background).as_ref() {
            sink.set_volume(volume);
        }
    }

    fn background_busy(&self) -> bool {
        lock(&self.background)
            .as_ref()
            .is_some_and(|sink| !sink.empty())
    }

    fn play_background(&self, track: &Path) -> Result<(), MixerError> {
        let source = open_decoder(track)?;
        let sink = self.new_sink()?;
        sink.set_volume(self.background_volume());
        sink.append(source);
        let finished = Arc::clone(&self.finished);
        sink.append(EmptyCallback::<f32>::new(Box::new(move || {
            finished.notify_one();
        })));
        debug!(track = %track.display(), "Background track queued");
        *lock(&self.background) = Some(sink);
        Ok(())
    }

    fn background_finished(&self) -> Option<Arc<Notify>> {
        Some(Arc::clone(&self.finished))
    }

    fn decode_file(&self, path: &Path) -> Result<Clip, MixerError> {
        decode_path(path)
    }

    fn play_foreground(&self, clip: Clip) -> Result<(), MixerError> {
        let sink = self.new_sink()?;
        sink.append(clip_source(clip));
        *lock(&self.foreground) = Some(sink);
        Ok(())
    }

    fn stop_all(&self) {
        for slot in [&self.foreground, &self.background] {
            if let Some(sink) = lock(slot).take() {
                sink.stop();
            }
        }
    }
}

impl Drop for RodioMixer {
    fn drop(&mut self) {
        self.close();
    }
}
