use std::io::Cursor;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::TranscriptionError;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

const RESAMPLE_CHUNK: usize = 1024;

/// Decodes any supported container/codec to 16 kHz mono `f32` samples.
///
/// `extension` is only a probing hint; the container is still sniffed from the
/// bytes themselves.
pub fn decode_audio_to_pcm(
    data: Vec<u8>,
    extension: Option<&str>,
) -> Result<Vec<f32>, TranscriptionError> {
    if data.is_empty() {
        return Err(decoding("empty audio payload"));
    }

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    let detected = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decoding(format!("unrecognized container: {}", e)))?;

    let mut reader = detected.format;
    let (track_id, params) = {
        let track = reader
            .default_track()
            .ok_or_else(|| decoding("no audio track found"))?;
        (track.id, track.codec_params.clone())
    };

    let source_rate = params
        .sample_rate
        .ok_or_else(|| decoding("unknown sample rate"))?;

    let mono = decode_track(reader.as_mut(), track_id, &params)?;
    if mono.is_empty() {
        return Err(decoding("no audio samples decoded"));
    }

    let pcm = if source_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample(&mono, source_rate, TARGET_SAMPLE_RATE)?
    };

    tracing::debug!(
        samples = pcm.len(),
        duration_secs = pcm.len() as f32 / TARGET_SAMPLE_RATE as f32,
        source_rate,
        "Audio decoded to 16kHz mono PCM"
    );

    Ok(pcm)
}

fn decode_track(
    reader: &mut dyn FormatReader,
    track_id: u32,
    params: &CodecParameters,
) -> Result<Vec<f32>, TranscriptionError> {
    let channels = params.channels.map(|c| c.count()).unwrap_or(1).max(1);
    let mut decoder: Box<dyn Decoder> = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| decoding(format!("codec: {}", e)))?;

    let mut mono = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decoding(format!("packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(decoding(format!("decode: {}", e))),
        };

        if decoded.frames() == 0 {
            continue;
        }

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        downmix_into(buffer.samples(), channels, &mut mono);
    }

    Ok(mono)
}

/// Averages interleaved frames into a single channel.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, TranscriptionError> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| decoding(format!("resampler init: {}", e)))?;

    let expected_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(expected_len + RESAMPLE_CHUNK);

    for chunk in samples.chunks(RESAMPLE_CHUNK) {
        let mut input = chunk.to_vec();
        input.resize(RESAMPLE_CHUNK, 0.0);

        let frames = resampler
            .process(&[input], None)
            .map_err(|e| decoding(format!("resample: {}", e)))?;

        if let Some(channel) = frames.first() {
            output.extend_from_slice(channel);
        }
    }

    output.truncate(expected_len);
    Ok(output)
}

fn decoding(message: impl Into<String>) -> TranscriptionError {
    TranscriptionError::DecodingFailed(message.into())
}
