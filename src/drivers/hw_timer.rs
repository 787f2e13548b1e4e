//! Millisecond tick source using ESP-IDF's esp_timer API.
//!
//! A 1 kHz periodic timer advances [`SYSTEM_CLOCK`] by one tick per
//! period.  The callback does nothing else: one atomic increment.
//! On simulation targets nothing is started; tests and host runs drive the
//! clock directly.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use esp_idf_svc::sys::*;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use log::info;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use crate::clock::SYSTEM_CLOCK;

/// Tick period in microseconds (1 ms).
pub const TICK_PERIOD_US: u64 = 1_000;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe extern "C" fn tick_cb(_arg: *mut core::ffi::c_void) {
    SYSTEM_CLOCK.advance();
}

/// Start the 1 kHz clock tick.
#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn start_tick_timer() -> Result<(), crate::error::Error> {
    // SAFETY: TICK_TIMER is written here once at boot from the single
    // main-task context before the callback can fire.  The callback only
    // touches an atomic.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"door_tick\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK {
            log::error!("hw_timer: tick timer create failed (rc={})", ret);
            return Err(crate::error::Error::Init("tick timer create"));
        }
        let ret = esp_timer_start_periodic(TICK_TIMER, TICK_PERIOD_US);
        if ret != ESP_OK {
            log::error!("hw_timer: tick timer start failed (rc={})", ret);
            return Err(crate::error::Error::Init("tick timer start"));
        }
    }

    info!("hw_timer: clock tick @1kHz started");
    Ok(())
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn start_tick_timer() -> Result<(), crate::error::Error> {
    log::info!("hw_timer(sim): tick timer not started (clock driven by caller)");
    Ok(())
}
