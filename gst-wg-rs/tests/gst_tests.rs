// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! GStreamer backend integration tests.
//!
//! # Requirements
//!
//! - GStreamer core must be installed
//! - Source tests need `wavparse` (gst-plugins-good)

use gstreamer as gst;
use gst::prelude::*;
use wg::config::TaskPoolConfig;
use wg::{Backend, Dispatcher, Error, GraphState, Probability, Source, Status, TransformCreateParams};

use gstwg::{GstBackend, WgTaskPool};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

fn setup_test() {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();
    });
    gstwg::init().unwrap();
}

/// One second of silent 8 kHz mono 8-bit PCM.
fn wav_data() -> Vec<u8> {
    let samples: u32 = 8000;
    let mut data = Vec::new();
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36 + samples).to_le_bytes());
    data.extend_from_slice(b"WAVEfmt ");
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes()); // PCM
    data.extend_from_slice(&1u16.to_le_bytes()); // channels
    data.extend_from_slice(&8000u32.to_le_bytes()); // rate
    data.extend_from_slice(&8000u32.to_le_bytes()); // byte rate
    data.extend_from_slice(&1u16.to_le_bytes()); // block align
    data.extend_from_slice(&8u16.to_le_bytes()); // bits per sample
    data.extend_from_slice(b"data");
    data.extend_from_slice(&samples.to_le_bytes());
    data.resize(data.len() + samples as usize, 0x80);
    data
}

#[test]
fn typefind_detects_wav() {
    setup_test();
    let backend = GstBackend::new();
    let (caps, probability) = backend.type_find(&wav_data(), Some("wav")).unwrap();
    let structure = caps.structure(0).unwrap();
    assert_eq!(structure.name(), "audio/x-wav");
    assert!(probability >= Probability::Likely);
}

#[test]
fn typefind_rejects_noise() {
    setup_test();
    let backend = GstBackend::new();
    assert!(backend.type_find(&[0u8; 16], None).is_none());
    let err = Source::create(&backend, None, &[0u8; 16]).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedInput));
}

#[test]
fn free_standing_pad_carries_caps() {
    setup_test();
    let backend = GstBackend::new();
    let caps = gst::Caps::builder("audio/x-wav").build();
    let pad = wg::pad::create_pad_with_caps(&backend, wg::PadDirection::Src, Some(&caps)).unwrap();
    assert_eq!(pad.direction(), gst::PadDirection::Src);
    assert_eq!(pad.name().as_str(), "src");
    let template = pad.pad_template().unwrap();
    assert!(template.caps().can_intersect(&caps));
}

#[test]
fn wav_source_prerolls() {
    setup_test();
    let backend = GstBackend::new();
    let source = Source::create(&backend, Some("tone.wav"), &wav_data()).unwrap();
    assert_eq!(source.state(&backend), GraphState::Paused);
    assert_eq!(source.container().name().as_str(), "wg_source");
    assert!(source.src_pad().is_linked());
    source.destroy(&backend);
}

#[test]
fn dispatcher_reports_status_codes() {
    setup_test();
    let dispatcher = Dispatcher::new(GstBackend::new());
    let handle = dispatcher.create_source(Some("tone.wav"), &wav_data()).unwrap();
    assert!(dispatcher.source_caps(handle).unwrap().starts_with("audio/x-wav"));
    dispatcher.destroy_source(handle).unwrap();
    assert!(matches!(
        dispatcher.destroy_source(handle),
        Err(Error::InvalidHandle(_))
    ));

    let mut transform = TransformCreateParams::default();
    assert_eq!(dispatcher.transform_create(&mut transform), Status::Success);
}

#[test]
fn task_pool_runs_gst_tasks_on_named_threads() {
    setup_test();
    let pool = WgTaskPool::new(TaskPoolConfig {
        thread_name: "wg-gst-test".to_owned(),
        ..Default::default()
    });
    pool.prepare().unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let handle = pool
        .push(move || {
            let _ = tx.send(std::thread::current().name().map(str::to_owned));
        })
        .unwrap();
    assert_eq!(rx.recv().unwrap().as_deref(), Some("wg-gst-test"));
    if let Some(handle) = handle {
        handle.join();
    }
    pool.cleanup();
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn task_pool_limit_becomes_glib_error() {
    setup_test();
    let pool = WgTaskPool::new(TaskPoolConfig {
        max_threads: Some(0),
        ..Default::default()
    });
    let err = pool.push(|| {}).unwrap_err();
    assert!(err.matches(gst::CoreError::Thread));
    assert_eq!(pool.outstanding(), 0);
}

/// A queue starts a streaming task on its source pad when it reaches
/// PAUSED, which the bus handler must move onto the wg pool.
#[test]
fn streaming_tasks_use_the_wg_pool() {
    setup_test();
    let backend = GstBackend::with_task_pool(TaskPoolConfig::default());
    let pool = backend.task_pool().unwrap().clone();

    let container = backend.new_container("pool_test").unwrap();
    let queue = gst::ElementFactory::make("queue").build().unwrap();
    backend.add_element(&container, &queue).unwrap();
    backend.set_state(&container, GraphState::Paused).unwrap();
    assert_eq!(backend.wait_state(&container, None).unwrap(), GraphState::Paused);
    assert_eq!(pool.outstanding(), 1);

    backend.set_state(&container, GraphState::Null).unwrap();
    assert_eq!(pool.outstanding(), 0);
}
