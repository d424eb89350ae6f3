//! Shared-memory pixel buffers and their release lifecycle.
//!
//! A committed buffer belongs to the compositor until it sends `release`;
//! the backing memory must stay alive for that whole window. The ledger
//! tracks lent buffers by protocol id and, when recycling is enabled, keeps
//! released buffers of the current extent for reuse instead of destroying
//! them.

use std::collections::HashMap;
use std::fs::File;
use std::os::fd::AsFd;

use log::trace;
use memmap2::{MmapMut, MmapOptions};
use wayland_client::protocol::wl_buffer::{self, WlBuffer};
use wayland_client::protocol::wl_shm::{self, WlShm};
use wayland_client::protocol::wl_shm_pool::WlShmPool;
use wayland_client::{delegate_noop, Connection, Dispatch, Proxy, QueueHandle};

use crate::client::ClientState;
use crate::error::ClientError;
use crate::shm;

/// One writable frame: a protocol buffer plus its mapped canvas.
#[derive(Debug)]
pub struct FrameBuffer {
    wl: WlBuffer,
    map: MmapMut,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// The canvas as packed 32-bit pixels.
    pub fn canvas(&mut self) -> &mut [u32] {
        bytemuck::cast_slice_mut(&mut self.map[..])
    }

    pub fn wl(&self) -> &WlBuffer {
        &self.wl
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A buffer lent to the compositor. The mapping is retained only when the
/// ledger recycles; otherwise the compositor's own reference keeps the
/// memory alive.
#[derive(Debug)]
struct InFlight {
    wl: WlBuffer,
    map: Option<MmapMut>,
    width: u32,
    height: u32,
}

/// Tracks buffers lent to the compositor and, optionally, recycles them.
#[derive(Debug)]
pub struct BufferLedger {
    recycle: bool,
    free: Vec<FrameBuffer>,
    in_flight: HashMap<u32, InFlight>,
}

impl BufferLedger {
    pub fn new(recycle: bool) -> Self {
        Self {
            recycle,
            free: Vec::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Produces a writable buffer of the requested extent.
    ///
    /// Reuses a recycled buffer when one matches, otherwise allocates fresh
    /// shared memory. The backing descriptor is closed before returning; the
    /// compositor holds its own reference through the pool request.
    pub fn acquire(
        &mut self,
        shm_factory: &WlShm,
        qh: &QueueHandle<ClientState>,
        width: u32,
        height: u32,
    ) -> Result<FrameBuffer, ClientError> {
        self.free.retain(|buffer| {
            if buffer.extent() == (width, height) {
                true
            } else {
                buffer.wl.destroy();
                false
            }
        });
        if let Some(buffer) = self.free.pop() {
            return Ok(buffer);
        }

        let stride = width as i32 * 4;
        let len = stride as usize * height as usize;
        let fd = shm::allocate(len)?;
        let file = File::from(fd);
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file) }
            .map_err(ClientError::AllocationFailed)?;

        let pool = shm_factory.create_pool(file.as_fd(), len as i32, qh, ());
        let wl = pool.create_buffer(
            0,
            width as i32,
            height as i32,
            stride,
            wl_shm::Format::Xrgb8888,
            qh,
            (),
        );
        pool.destroy();
        drop(file);

        Ok(FrameBuffer {
            wl,
            map,
            width,
            height,
        })
    }

    /// Records a buffer as lent to the compositor after commit.
    pub fn submit(&mut self, buffer: FrameBuffer) {
        let FrameBuffer {
            wl,
            map,
            width,
            height,
        } = buffer;
        let map = if self.recycle { Some(map) } else { None };
        self.in_flight.insert(
            wl.id().protocol_id(),
            InFlight {
                wl,
                map,
                width,
                height,
            },
        );
    }

    /// Handles the compositor's release of a previously submitted buffer.
    pub fn released(&mut self, wl: &WlBuffer) {
        match self.in_flight.remove(&wl.id().protocol_id()) {
            Some(InFlight {
                wl,
                map: Some(map),
                width,
                height,
            }) => {
                trace!("buffer {} back in the pool", wl.id().protocol_id());
                self.free.push(FrameBuffer {
                    wl,
                    map,
                    width,
                    height,
                });
            }
            Some(InFlight { wl, map: None, .. }) => {
                wl.destroy();
            }
            None => {
                trace!("release for an untracked buffer, ignored");
            }
        }
    }
}

impl Drop for BufferLedger {
    fn drop(&mut self) {
        for buffer in self.free.drain(..) {
            buffer.wl.destroy();
        }
        for (_, entry) in self.in_flight.drain() {
            entry.wl.destroy();
        }
    }
}

impl Dispatch<WlBuffer, ()> for ClientState {
    fn event(
        state: &mut Self,
        buffer: &WlBuffer,
        event: wl_buffer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            state.buffers.released(buffer);
        }
    }
}

impl Dispatch<WlShm, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &WlShm,
        event: wl_shm::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_shm::Event::Format { format } = event {
            trace!("shm format: {format:?}");
        }
    }
}

delegate_noop!(ClientState: WlShmPool);
