//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the network task stalls for more than the
//! configured timeout — a hung controller would leave the fans frozen
//! with no remote way to intervene.  The network loop calls `feed()` on
//! every service iteration; the acquisition task is deliberately not
//! subscribed, since a stuck sensor read already re-anchors its own
//! cadence.

/// Stall bound before the TWDT panics the device.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl Watchdog {
    /// Initialise the TWDT and subscribe the calling task.
    pub fn new() -> Self {
        use esp_idf_svc::sys::*;

        // SAFETY: TWDT reconfigure/add are called once from the network
        // task before its loop starts.
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: TIMEOUT_MS,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                log::warn!("watchdog: reconfigure returned {ret} (already configured?)");
            }

            let subscribed = esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK;
            if subscribed {
                log::info!("watchdog: armed ({TIMEOUT_MS} ms)");
            } else {
                log::warn!("watchdog: task subscription failed");
            }
            Self { subscribed }
        }
    }

    /// Feed the watchdog.  Must be called at least every `TIMEOUT_MS`.
    pub fn feed(&self) {
        if self.subscribed {
            // SAFETY: plain TWDT counter reset for the calling task.
            unsafe {
                esp_idf_svc::sys::esp_task_wdt_reset();
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Watchdog {
    pub fn new() -> Self {
        Self {}
    }

    pub fn feed(&self) {}
}
