//! Heap high-water tracking through a wrapping global allocator.
//!
//! Nothing is recorded unless a binary installs [`TrackingAllocator`] as its
//! `#[global_allocator]`; peaks then read as zero.

use std::alloc::{GlobalAlloc, Layout};
use std::sync::atomic::{AtomicUsize, Ordering};

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static BASELINE: AtomicUsize = AtomicUsize::new(0);

pub struct TrackingAllocator<A: GlobalAlloc + Sync + 'static> {
    inner: &'static A,
}

impl<A: GlobalAlloc + Sync + 'static> TrackingAllocator<A> {
    pub const fn new(inner: &'static A) -> Self {
        Self { inner }
    }
}

unsafe impl<A: GlobalAlloc + Sync + 'static> GlobalAlloc
    for TrackingAllocator<A>
{
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            track_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        track_dealloc(layout.size());
    }
}

fn track_alloc(size: usize) {
    let current = ALLOCATED.fetch_add(size, Ordering::SeqCst) + size;
    let relative = current.saturating_sub(BASELINE.load(Ordering::SeqCst));
    PEAK_ALLOCATED.fetch_max(relative, Ordering::SeqCst);
}

fn track_dealloc(size: usize) {
    ALLOCATED.fetch_sub(size, Ordering::SeqCst);
}

/// Starts a new measurement window at the current allocation level.
pub fn reset_peak() {
    let current = ALLOCATED.load(Ordering::SeqCst);
    BASELINE.store(current, Ordering::SeqCst);
    PEAK_ALLOCATED.store(0, Ordering::SeqCst);
}

/// Highest number of bytes live above the baseline since [`reset_peak`].
pub fn peak_bytes() -> usize {
    PEAK_ALLOCATED.load(Ordering::SeqCst)
}

/// Runs `operation` in its own measurement window.
pub fn measure_peak<T, F>(operation: F) -> (T, usize)
where
    F: FnOnce() -> T,
{
    reset_peak();
    let value = operation();
    (value, peak_bytes())
}
