//! Streaming task pool installation.
//!
//! GStreamer announces every new streaming task with a synchronous
//! `StreamStatus` message of type `Create`, posted from the thread that is
//! about to start the task. Setting the task's pool while handling that
//! message makes the task run on our threads instead of the default pool.

// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

use gst::prelude::*;
use gstreamer as gst;
use tracing::debug;

use crate::{CAT, WgTaskPool};

/// Installs a sync handler on `bus` that assigns `pool` to every streaming
/// task created by elements posting on it. Replaces any previous sync
/// handler.
pub fn install_task_pool(bus: &gst::Bus, pool: &WgTaskPool) {
    let pool = pool.clone();
    bus.set_sync_handler(move |_bus, message| {
        if let gst::MessageView::StreamStatus(status) = message.view() {
            assign_pool(status, &pool);
        }
        gst::BusSyncReply::Pass
    });
}

fn assign_pool(status: &gst::message::StreamStatus, pool: &WgTaskPool) {
    let (kind, owner) = status.get();
    if kind != gst::StreamStatusType::Create {
        return;
    }
    let Some(task) = status
        .stream_status_object()
        .and_then(|value| value.get::<gst::Task>().ok())
    else {
        gst::warning!(CAT, obj = owner, "Stream status without a task");
        return;
    };
    task.set_pool(pool);
    debug!(owner = %owner.name(), "Assigned wg task pool to streaming task");
}
