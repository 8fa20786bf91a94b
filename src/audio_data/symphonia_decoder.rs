use crate::{
    audio_data::{CadenzaAudioData, DecodeOptions},
    error::DecodeError,
};
use std::io::Cursor;
use std::time::Duration;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Decodes an in-memory container (wav, flac, mp3, ogg...) into interleaved f32 samples.
pub fn decode_audio_bytes(
    bytes: Vec<u8>,
    options: &DecodeOptions,
) -> Result<CadenzaAudioData, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = options.extension_hint.as_deref() {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Unsupported(format!("Failed to probe audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::Unsupported("No default audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::Malformed("Sample rate not found".to_string()))?;

    let channels = codec_params
        .channels
        .ok_or_else(|| DecodeError::Malformed("Channel count not found".to_string()))?
        .count() as u16;

    if sample_rate == 0 || channels == 0 {
        return Err(DecodeError::Malformed(format!(
            "Invalid stream parameters: {} Hz, {} channels",
            sample_rate, channels
        )));
    }

    let mut decoder = get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(format!("Failed to create decoder: {}", e)))?;

    let max_frames = options
        .max_duration
        .map(|d| (d.as_secs_f64() * sample_rate as f64) as usize)
        .unwrap_or(usize::MAX);

    let mut samples: Vec<f32> = Vec::new();
    let mut frames_decoded = 0;

    while frames_decoded < max_frames {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break, // end of stream
            Err(Error::ResetRequired) => break,
            Err(e) => {
                return Err(DecodeError::Malformed(format!(
                    "Error reading packet: {}",
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(Error::IoError(_)) => break,
            Err(Error::DecodeError(e)) => {
                log::warn!("Skipping corrupt audio packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(DecodeError::Malformed(format!(
                    "Error decoding packet: {}",
                    e
                )));
            }
        };

        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let mut tmp = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        tmp.copy_interleaved_ref(decoded);

        let keep = frames.min(max_frames - frames_decoded);
        samples.extend_from_slice(&tmp.samples()[..keep * channels as usize]);
        frames_decoded += keep;
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    let duration =
        Duration::from_secs_f64(samples.len() as f64 / (sample_rate * channels as u32) as f64);

    let mut audio_data = CadenzaAudioData::new(samples, sample_rate, channels, duration);

    if let Some(target_rate) = options.target_sample_rate {
        if target_rate != sample_rate {
            audio_data = audio_data.resample(target_rate)?;
        }
    }

    log::debug!(
        "Decoded {} frames ({} ch, {} Hz, {:?})",
        audio_data.total_frames(),
        audio_data.channels(),
        audio_data.sample_rate(),
        audio_data.duration()
    );

    Ok(audio_data)
}
