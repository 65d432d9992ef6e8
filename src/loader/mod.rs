//! Fetching source bytes and reading their duration.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read source: {0}")]
    Io(#[from] std::io::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unsupported media: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("cannot probe media: {0}")]
    Probe(#[from] symphonia::core::errors::Error),
    #[error("no playable track")]
    NoTrack,
    #[error("track does not report its length")]
    UnknownDuration,
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Reads the whole asset into memory. Remote sources are fetched once, without
/// retries.
pub fn fetch(source: &str) -> Result<Bytes, LoadError> {
    if is_remote(source) {
        debug!(url = source, "fetching remote media");
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let response = client.get(source).send()?.error_for_status()?;
        return Ok(response.bytes()?);
    }

    let path = source.strip_prefix("file://").unwrap_or(source);
    Ok(Bytes::from(std::fs::read(path)?))
}

/// Container hint taken from the source's extension, ignoring any query
/// string on remote URLs.
pub fn hint_for(source: &str, fallback: &str) -> String {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| fallback.to_string())
}

/// Duration in seconds of the default track, from its frame count.
pub fn probe_duration(data: &Bytes, hint: &str) -> Result<f64, LoadError> {
    let stream = MediaSourceStream::new(
        Box::new(Cursor::new(data.clone())),
        MediaSourceStreamOptions::default(),
    );
    let mut probe_hint = Hint::new();
    probe_hint.with_extension(hint);

    let probed = symphonia::default::get_probe().format(
        &probe_hint,
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let track = probed.format.default_track().ok_or(LoadError::NoTrack)?;
    let params = &track.codec_params;

    match (params.n_frames, params.time_base, params.sample_rate) {
        (Some(frames), Some(time_base), _) => {
            let time = time_base.calc_time(frames);
            Ok(time.seconds as f64 + time.frac)
        }
        (Some(frames), None, Some(rate)) if rate > 0 => Ok(frames as f64 / rate as f64),
        _ => Err(LoadError::UnknownDuration),
    }
}

/// 单声道 16 位 PCM 的静音 WAV，测试用
#[cfg(test)]
pub(crate) fn wav_bytes(sample_rate: u32, samples: u32) -> Vec<u8> {
    let data_len = samples * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}
