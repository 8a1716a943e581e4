//! Decode an uploaded answer into the pipeline's normalized sample buffer.
//!
//! This is the edge adapter between arbitrary browser uploads (webm, ogg, wav, mp4,
//! ...) and the one shape the pipeline consumes: mono `f32` at the target sample
//! rate. Responsibilities:
//! - probe the container and pick a decodable audio track
//! - decode packets into PCM
//! - downmix interleaved channels to mono by averaging
//! - resample to the target rate when the source rate differs
//!
//! Decode-level failures (unrecognized container, no audio track, nothing decodable)
//! are the client's malformed upload and surface as invalid input, not as pipeline
//! failures.

use std::io::{Cursor, Read};

use anyhow::{Context, anyhow, bail};
use rubato::{Resampler, SincFixedIn, WindowFunction};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer as PcmBuffer};
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, Track};
use symphonia::core::io::{MediaSource, MediaSourceStream, MediaSourceStreamOptions, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::{SampleBuffer, TARGET_SAMPLE_RATE};
use crate::error::{Error, Result};

/// Decode a complete in-memory upload into a [`SampleBuffer`].
pub fn sample_buffer_from_bytes(bytes: Vec<u8>) -> Result<SampleBuffer> {
    sample_buffer_from_reader(Cursor::new(bytes))
}

/// Decode an arbitrary byte stream into a [`SampleBuffer`].
///
/// The `Send + Sync + 'static` bounds mirror Symphonia's `MediaSource` requirements.
/// Unseekable inputs work for stream-friendly container layouts; some MP4/MOV files
/// place metadata at the end and will fail here — that is reported as invalid input
/// like any other undecodable upload.
pub fn sample_buffer_from_reader<R>(reader: R) -> Result<SampleBuffer>
where
    R: Read + Send + Sync + 'static,
{
    let source = ReadOnlySource::new(reader);
    let (mono, src_rate) = decode_mono(Box::new(source))
        .map_err(|err| Error::invalid_input(format!("failed to decode audio: {err:#}")))?;

    let samples = if src_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        // Resampler trouble is ours, not the client's.
        resample_to_target(&mono, src_rate)?
    };

    SampleBuffer::new(samples, TARGET_SAMPLE_RATE)
}

/// Demux + decode the default audio track into one mono buffer at its source rate.
fn decode_mono(source: Box<dyn MediaSource>) -> anyhow::Result<(Vec<f32>, u32)> {
    let (mut format, track) = probe_source_and_pick_default_track(source)?;

    let decoder_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")?;

    let mut mono = Vec::<f32>::new();
    let mut pcm_buf: Option<PcmBuffer<f32>> = None;
    let mut src_rate = track
        .codec_params
        .sample_rate
        .context("selected track has no sample rate")?;

    loop {
        let Some(packet) = next_packet(&mut format)? else {
            break;
        };

        // Ignore packets from non-audio tracks.
        if packet.track_id() != track.id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_mono(&decoded, &mut pcm_buf, &mut mono, &mut src_rate)?,

            // Recoverable: corrupted frame, but decoding can continue.
            Err(SymphoniaError::DecodeError(_)) => continue,

            // Treat IO errors as graceful end-of-stream.
            Err(SymphoniaError::IoError(_)) => break,

            Err(e) => return Err(anyhow!(e)).context("decoder failure"),
        }
    }

    if mono.is_empty() {
        bail!("no audio samples decoded");
    }

    Ok((mono, src_rate))
}

/// Probe the container and pick a default audio track.
///
/// Track selection policy: the first track that looks decodable (codec != NULL) and
/// has a known sample rate (required for resampling decisions downstream).
fn probe_source_and_pick_default_track(
    source: Box<dyn MediaSource>,
) -> anyhow::Result<(Box<dyn FormatReader>, Track)> {
    let mss_opts = MediaSourceStreamOptions {
        // Symphonia expects a power-of-two buffer > 32KiB for good probing behavior.
        buffer_len: 256 * 1024,
    };

    let mss = MediaSourceStream::new(source, mss_opts);

    let hint = Hint::new();
    let format_opts: FormatOptions = Default::default();
    let metadata_opts: MetadataOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| anyhow!(e))
        .context("failed to probe media stream")?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no audio track found"))?;

    Ok((format, track))
}

/// Read the next packet, treating IO errors as "end of stream".
fn next_packet(format: &mut Box<dyn FormatReader>) -> anyhow::Result<Option<Packet>> {
    match format.next_packet() {
        Ok(p) => Ok(Some(p)),
        Err(SymphoniaError::IoError(_)) => Ok(None),
        Err(e) => Err(anyhow!(e)).context("failed reading packet"),
    }
}

/// Copy one decoded buffer into the mono accumulator, downmixing if needed.
fn append_mono(
    decoded: &AudioBufferRef<'_>,
    pcm_buf: &mut Option<PcmBuffer<f32>>,
    mono: &mut Vec<f32>,
    src_rate: &mut u32,
) -> anyhow::Result<()> {
    let spec = *decoded.spec();
    let channels = spec.channels.count();
    if channels == 0 {
        bail!("decoded audio had zero channels");
    }
    *src_rate = spec.rate;

    if pcm_buf.is_none() {
        *pcm_buf = Some(PcmBuffer::<f32>::new(decoded.capacity() as u64, spec));
    }
    let buf = pcm_buf
        .as_mut()
        .ok_or_else(|| anyhow!("pcm buffer not initialized"))?;

    buf.copy_interleaved_ref(decoded.clone());
    let interleaved = buf.samples();

    if channels == 1 {
        mono.extend_from_slice(interleaved);
        return Ok(());
    }

    // Downmix policy: equal-weight average across channels (simple, predictable).
    let frames = interleaved.len() / channels;
    mono.reserve(frames);
    for f in 0..frames {
        let base = f * channels;
        let mut acc = 0.0;
        for c in 0..channels {
            acc += interleaved[base + c];
        }
        mono.push(acc / channels as f32);
    }

    Ok(())
}

/// Resample a complete mono buffer to the target rate.
fn resample_to_target(mono_src: &[f32], src_rate: u32) -> anyhow::Result<Vec<f32>> {
    // How many source frames we feed rubato per `process()` call.
    let in_chunk_src_frames = 2048;

    let mut rs = SincFixedIn::<f32>::new(
        TARGET_SAMPLE_RATE as f64 / src_rate as f64,
        2.0,
        rubato::SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: rubato::SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        },
        in_chunk_src_frames,
        1, // mono
    )
    .map_err(|e| anyhow!(e))
    .context("failed to init resampler")?;

    let in_max = rs.input_frames_max();

    // rubato expects exact block sizes; pad the tail with zeros.
    let mut padded = mono_src.to_vec();
    let rem = padded.len() % in_max;
    if rem != 0 {
        padded.resize(padded.len() + (in_max - rem), 0.0);
    }

    let estimated_out =
        (padded.len() as f64 * TARGET_SAMPLE_RATE as f64 / src_rate as f64) as usize;
    let mut out = Vec::with_capacity(estimated_out);

    for block in padded.chunks(in_max) {
        let input = vec![block.to_vec()];
        let processed = rs
            .process(&input, None)
            .map_err(|e| anyhow!(e))
            .context("resampler process failed")?;

        if processed.len() != 1 {
            bail!("expected mono output from resampler");
        }
        out.extend_from_slice(&processed[0]);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, frames: usize) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
            for i in 0..frames {
                // A quiet ramp; content doesn't matter, shape does.
                let value = ((i % 128) as i16 - 64) * 16;
                for _ in 0..spec.channels {
                    writer.write_sample(value).expect("write sample");
                }
            }
            writer.finalize().expect("finalize wav");
        }
        cursor.into_inner()
    }

    fn pcm16(sample_rate: u32, channels: u16) -> hound::WavSpec {
        hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn decodes_mono_16k_wav_without_resampling() -> anyhow::Result<()> {
        let frames = TARGET_SAMPLE_RATE as usize; // 1 second
        let bytes = wav_bytes(pcm16(TARGET_SAMPLE_RATE, 1), frames);

        let buffer = sample_buffer_from_bytes(bytes)?;
        assert_eq!(buffer.sample_rate(), TARGET_SAMPLE_RATE);
        assert_eq!(buffer.len(), frames);
        assert!((buffer.duration_seconds() - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn downmixes_stereo_to_mono() -> anyhow::Result<()> {
        let frames = 8_000;
        let bytes = wav_bytes(pcm16(TARGET_SAMPLE_RATE, 2), frames);

        let buffer = sample_buffer_from_bytes(bytes)?;
        assert_eq!(buffer.len(), frames);
        Ok(())
    }

    #[test]
    fn resamples_8k_input_to_target_rate() -> anyhow::Result<()> {
        let frames = 8_000; // 1 second at 8 kHz
        let bytes = wav_bytes(pcm16(8_000, 1), frames);

        let buffer = sample_buffer_from_bytes(bytes)?;
        assert_eq!(buffer.sample_rate(), TARGET_SAMPLE_RATE);
        // Zero-padding to rubato's block size makes the output slightly longer than
        // the ideal 2x; it must never come out shorter.
        assert!(buffer.len() >= 2 * frames);
        assert!(buffer.duration_seconds() >= 1.0);
        Ok(())
    }

    #[test]
    fn rejects_garbage_bytes_as_invalid_input() {
        let err = sample_buffer_from_bytes(vec![0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn rejects_empty_input_as_invalid_input() {
        let err = sample_buffer_from_bytes(Vec::new()).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
