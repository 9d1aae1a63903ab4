use std::{
    io::Cursor,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use deck_core::PreviewUrl;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
        formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default,
};

use crate::{AudioError, AudioOutput, AudioResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

enum Request {
    SetSource(PreviewUrl, Sender<AudioResult<()>>),
    Play(Sender<AudioResult<()>>),
    Pause(Sender<AudioResult<()>>),
}

/// Output backed by cpal + symphonia.
///
/// cpal streams are not `Send` on every platform, so a dedicated thread owns
/// the device and the current stream; each call is a request/reply round
/// trip over a channel.
pub struct CpalAudioOutput {
    requests: Sender<Request>,
}

impl std::fmt::Debug for CpalAudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalAudioOutput").finish_non_exhaustive()
    }
}

impl CpalAudioOutput {
    /// Opens the default output device. Fails when none is available.
    pub fn new() -> AudioResult<Self> {
        let (requests, inbox) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        thread::Builder::new()
            .name("deck-audio".into())
            .spawn(move || run_audio_thread(inbox, ready_tx))
            .map_err(|e| AudioError::Backend(e.to_string()))?;
        ready_rx.recv().map_err(|_| AudioError::Disconnected)??;
        Ok(Self { requests })
    }

    fn round_trip(
        &self,
        build: impl FnOnce(Sender<AudioResult<()>>) -> Request,
    ) -> AudioResult<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .send(build(reply_tx))
            .map_err(|_| AudioError::Disconnected)?;
        reply_rx.recv().map_err(|_| AudioError::Disconnected)?
    }
}

impl AudioOutput for CpalAudioOutput {
    fn set_source(&mut self, url: &PreviewUrl) -> AudioResult<()> {
        let url = url.clone();
        self.round_trip(|reply| Request::SetSource(url, reply))
    }

    fn play(&mut self) -> AudioResult<()> {
        self.round_trip(Request::Play)
    }

    fn pause(&mut self) -> AudioResult<()> {
        self.round_trip(Request::Pause)
    }
}

fn run_audio_thread(inbox: Receiver<Request>, ready: Sender<AudioResult<()>>) {
    let host = cpal::default_host();
    let Some(device) = host.default_output_device() else {
        let _ = ready.send(Err(AudioError::Backend("no output device".into())));
        return;
    };
    let client = match reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            let _ = ready.send(Err(AudioError::Backend(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut current: Option<cpal::Stream> = None;
    while let Ok(request) = inbox.recv() {
        match request {
            Request::SetSource(url, reply) => {
                // Dropping the old stream silences it before the download starts.
                current = None;
                let result = fetch_preview(&client, &url)
                    .and_then(|bytes| decode_preview(bytes, &url))
                    .and_then(|clip| build_stream(&device, clip))
                    .map(|stream| {
                        current = Some(stream);
                    });
                let _ = reply.send(result);
            }
            Request::Play(reply) => {
                let result = match &current {
                    Some(stream) => stream
                        .play()
                        .map_err(|e| AudioError::Backend(e.to_string())),
                    None => Err(AudioError::NoSource),
                };
                let _ = reply.send(result);
            }
            Request::Pause(reply) => {
                let result = match &current {
                    Some(stream) => stream
                        .pause()
                        .map_err(|e| AudioError::Backend(e.to_string())),
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
        }
    }
    tracing::debug!("audio thread exiting");
}

fn fetch_preview(client: &reqwest::blocking::Client, url: &PreviewUrl) -> AudioResult<Vec<u8>> {
    if !(url.as_ref().starts_with("http://") || url.as_ref().starts_with("https://")) {
        return Err(AudioError::UnsupportedSource(url.as_ref().to_string()));
    }
    let response = client
        .get(url.as_ref())
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| AudioError::Fetch(e.to_string()))?;
    let bytes = response
        .bytes()
        .map_err(|e| AudioError::Fetch(e.to_string()))?;
    tracing::debug!(bytes = bytes.len(), "preview downloaded");
    Ok(bytes.to_vec())
}

/// Interleaved f32 samples with their layout.
struct Clip {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

fn decode_preview(bytes: Vec<u8>, url: &PreviewUrl) -> AudioResult<Clip> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = url
        .as_ref()
        .split('?')
        .next()
        .and_then(|path| path.rsplit_once('.'))
        .map(|(_, ext)| ext)
    {
        hint.with_extension(ext);
    }

    let probed = default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(e.to_string()))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Decode("no default track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut decoder = default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(e.to_string()))?;

    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);
    let mut sample_rate = codec_params.sample_rate.unwrap_or(44_100);
    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(AudioError::Decode(err.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let audio_buf = match decoder.decode(&packet) {
            Ok(buf) => buf,
            // A corrupt frame is skipped rather than failing the whole clip.
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::debug!(reason, "skipping undecodable packet");
                continue;
            }
            Err(err) => return Err(AudioError::Decode(err.to_string())),
        };
        let spec = *audio_buf.spec();
        channels = spec.channels.count();
        sample_rate = spec.rate;
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(AudioError::Decode("preview contained no audio".into()));
    }
    Ok(Clip {
        samples,
        channels: channels.max(1),
        sample_rate,
    })
}

fn build_stream(device: &cpal::Device, clip: Clip) -> AudioResult<cpal::Stream> {
    let stream_config = pick_config(device, clip.sample_rate)?;
    let device_channels = stream_config.channels as usize;
    let Clip {
        samples, channels, ..
    } = clip;
    let frames = samples.len() / channels;
    let mut frame = 0usize;

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _| {
                for out in data.chunks_mut(device_channels) {
                    if frame >= frames {
                        out.fill(0.0);
                        continue;
                    }
                    let base = frame * channels;
                    for (channel, sample) in out.iter_mut().enumerate() {
                        *sample = samples[base + channel.min(channels - 1)];
                    }
                    frame += 1;
                }
            },
            |err| tracing::error!("cpal stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    // Some hosts start streams eagerly; the controller decides when to play.
    stream
        .pause()
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    Ok(stream)
}

/// Prefer an f32 config at the clip's native rate; otherwise use the
/// device default if it is f32.
fn pick_config(device: &cpal::Device, sample_rate: u32) -> AudioResult<cpal::StreamConfig> {
    let native = device.supported_output_configs().ok().and_then(|mut ranges| {
        ranges.find(|range| {
            range.sample_format() == cpal::SampleFormat::F32
                && range.min_sample_rate().0 <= sample_rate
                && sample_rate <= range.max_sample_rate().0
        })
    });
    if let Some(range) = native {
        return Ok(range
            .with_sample_rate(cpal::SampleRate(sample_rate))
            .config());
    }

    let fallback = device
        .default_output_config()
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    if fallback.sample_format() != cpal::SampleFormat::F32 {
        return Err(AudioError::Backend(format!(
            "unsupported sample format: {:?}",
            fallback.sample_format()
        )));
    }
    tracing::warn!(
        wanted = sample_rate,
        using = fallback.sample_rate().0,
        "device does not support the preview sample rate"
    );
    Ok(fallback.config())
}
