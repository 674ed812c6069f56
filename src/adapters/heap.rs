//! Free-heap probe.
//!
//! Implements [`MemoryProbe`].
//!
//! - **`target_os = "espidf"`**: `esp_get_free_heap_size()`.  There is no
//!   collector to run; a reclamation pass yields one tick so the idle task
//!   can release the stacks of deleted tasks.
//! - **other targets**: synthetic values that decay slowly with uptime to
//!   model fragmentation, so simulation runs walk the same branches.

use crate::app::ports::MemoryProbe;

#[derive(Debug, Default)]
pub struct HeapProbe {
    #[cfg(not(target_os = "espidf"))]
    start: Option<std::time::Instant>,
}

impl HeapProbe {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: Some(std::time::Instant::now()),
        }
    }
}

#[cfg(target_os = "espidf")]
impl MemoryProbe for HeapProbe {
    fn reclaim(&mut self) {
        esp_idf_hal::delay::FreeRtos::delay_ms(1);
    }

    fn free_bytes(&mut self) -> u32 {
        // SAFETY: plain read of allocator statistics.
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }
}

#[cfg(not(target_os = "espidf"))]
impl MemoryProbe for HeapProbe {
    fn reclaim(&mut self) {}

    fn free_bytes(&mut self) -> u32 {
        let uptime_secs = self.start.map_or(0, |s| s.elapsed().as_secs());
        let base_free: u32 = 307_200; // 300 KB
        let decay = (uptime_secs / 60) as u32 * 512; // lose ~512B/min
        base_free.saturating_sub(decay)
    }
}
