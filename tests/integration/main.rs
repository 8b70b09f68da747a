//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the dispatcher end to
//! end against mock I/O.  All tests run on the host (x86_64) with no real
//! hardware required.

mod dispatch_tests;
mod mock_io;
mod ticker_tests;
