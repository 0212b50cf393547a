//! Integration tests for frontscope-io recordings and coefficient dumps.

use frontscope_config::FileConfig;
use frontscope_io::{
    Error, NlModel, NlModelLayout, Recording, dims_from_name, read_aec_filters, read_f32_dump,
    read_nlmodel, read_recording, read_wav_info, truncate_to_common, write_f32_dump,
    write_recording,
};
use tempfile::TempDir;

/// Generate a sine at `freq_hz` with the given amplitude.
fn sine(sample_rate: u32, freq_hz: f32, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            amplitude * (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Recordings
// ---------------------------------------------------------------------------

#[test]
fn four_channel_recording_roundtrip_24bit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("array.wav");
    let channels: Vec<Vec<f32>> = (0..4)
        .map(|ch| sine(16000, 250.0 * (ch + 1) as f32, 0.5, 1600))
        .collect();
    write_recording(&path, &Recording::new("array", 16000, channels.clone()), 24).unwrap();

    let info = read_wav_info(&path).unwrap();
    assert_eq!(info.channels, 4);
    assert_eq!(info.bits_per_sample, 24);
    assert_eq!(info.num_frames, 1600);
    assert!(!info.is_float);

    let loaded = read_recording(&path).unwrap();
    assert_eq!(loaded.name, "array");
    assert_eq!(loaded.num_channels(), 4);
    for (orig, back) in channels.iter().zip(&loaded.channels) {
        for (a, b) in orig.iter().zip(back) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }
}

#[test]
fn pcm_full_scale_is_normalized_by_half_range() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("edges.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for s in [i16::MIN, -16384, 0, 16384, i16::MAX] {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let rec = read_recording(&path).unwrap();
    let ch = rec.channel(0).unwrap();
    assert_eq!(ch[0], -1.0);
    assert_eq!(ch[1], -0.5);
    assert_eq!(ch[2], 0.0);
    assert_eq!(ch[3], 0.5);
    assert!((ch[4] - 32767.0 / 32768.0).abs() < 1e-9);
}

#[test]
fn float_recording_is_read_unscaled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("float.wav");
    let loud = vec![vec![1.5, -2.0, 0.25]];
    write_recording(&path, &Recording::new("float", 48000, loud.clone()), 32).unwrap();

    let rec = read_recording(&path).unwrap();
    assert!(read_wav_info(&path).unwrap().is_float);
    assert_eq!(rec.channels, loud);
}

#[test]
fn recordings_share_shortest_length() {
    let mut recs = vec![
        Recording::new("a", 16000, vec![vec![0.0; 100], vec![0.0; 100]]),
        Recording::new("b", 16000, vec![vec![0.0; 40]]),
        Recording::new("c", 16000, vec![vec![0.0; 70]; 3]),
    ];
    assert_eq!(truncate_to_common(&mut recs), 40);
    assert!(recs.iter().all(|r| r.num_frames() == 40));
    assert_eq!(recs[2].num_channels(), 3);
}

#[test]
fn missing_recording_is_reported() {
    let err = read_recording("/nonexistent/dir/x.wav").unwrap_err();
    assert!(matches!(err, Error::MissingFile(_)));
}

// ---------------------------------------------------------------------------
// Coefficient dumps
// ---------------------------------------------------------------------------

#[test]
fn aec_filters_follow_configured_pattern() {
    let dir = TempDir::new().unwrap();
    let files = FileConfig {
        aec_filter_pattern: "{base}_ref{ref}_mic{mic}.bin".to_string(),
        ..FileConfig::default()
    };
    let base = dir.path().join("filt").to_string_lossy().into_owned();
    for reference in 0..2 {
        for mic in 0..2 {
            let path = files.aec_filter_path(&base, reference, mic);
            write_f32_dump(&path, &[reference as f32, mic as f32, 0.5]).unwrap();
        }
    }

    let filters = read_aec_filters(&base, 2, 2, &files).unwrap();
    assert_eq!(filters.len(), 4);
    let order: Vec<(usize, usize)> = filters.iter().map(|f| (f.reference, f.mic)).collect();
    assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert_eq!(filters[2].coefficients, vec![1.0, 0.0, 0.5]);
    assert_eq!(filters[3].name(), "filt_ref1_mic1.bin");
}

#[test]
fn aec_filters_default_naming_and_missing_file() {
    let dir = TempDir::new().unwrap();
    let files = FileConfig::default();
    let base = dir.path().join("aecfilt.bin").to_string_lossy().into_owned();
    write_f32_dump(files.aec_filter_path(&base, 0, 0), &[1.0]).unwrap();

    let err = read_aec_filters(&base, 1, 2, &files).unwrap_err();
    match err {
        Error::MissingFile(path) => assert!(path.ends_with("aecfilt.bin.f0.m1")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nlmodel_payload_is_valid_explicit_input() {
    let dir = TempDir::new().unwrap();
    let header_dump = dir.path().join("nlm_buffer.bin");
    let mut buffer = vec![3.0, 2.0];
    buffer.extend((0..6).map(|i| i as f32 * 0.5));
    write_f32_dump(&header_dump, &buffer).unwrap();

    let model = read_nlmodel(&header_dump, NlModelLayout::Header).unwrap();
    assert_eq!((model.rows(), model.cols()), (3, 2));
    assert_eq!(model.row(2).unwrap(), &[2.0, 2.5]);

    let set_file = dir.path().join("nlm.r3.c2");
    model.write_payload(&set_file).unwrap();
    assert_eq!(read_f32_dump(&set_file).unwrap(), &buffer[2..]);

    let (rows, cols) = dims_from_name(&set_file).unwrap();
    let reread = read_nlmodel(&set_file, NlModelLayout::Explicit { rows, cols }).unwrap();
    assert_eq!(reread, model);
}

#[test]
fn nlmodel_length_mismatch_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.bin");
    write_f32_dump(&path, &[2.0, 2.0, 1.0, 2.0, 3.0]).unwrap();

    let err = read_nlmodel(&path, NlModelLayout::Header).unwrap_err();
    assert!(matches!(
        err,
        Error::LengthMismatch {
            expected: 4,
            actual: 3,
            ..
        }
    ));
    assert!(NlModel::new(2, 2, vec![0.0; 3]).is_none());
}

#[test]
fn nlmodel_oversized_dimensions_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge.bin");
    write_f32_dump(&path, &[1e30, 1e30, 0.0, 1.0]).unwrap();

    let err = read_nlmodel(&path, NlModelLayout::Header).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }), "{err}");

    let explicit = NlModelLayout::Explicit {
        rows: usize::MAX,
        cols: 2,
    };
    let err = read_nlmodel(&path, explicit).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }), "{err}");

    assert!(NlModel::new(usize::MAX, 2, Vec::new()).is_none());
}
