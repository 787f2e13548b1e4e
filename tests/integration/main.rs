//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the controller against
//! mock adapters with a simulated millisecond clock.  All tests run on the
//! host (x86_64) with no real hardware required.

mod hardware_adapter_tests;
mod mock_hw;
mod service_mode_tests;
