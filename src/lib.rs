pub mod error;
pub mod config;
pub mod system_paths;
pub mod identity;
pub mod api;
pub mod navigation;
pub mod routes;
pub mod validation;
pub mod services;
pub mod app;
pub mod cli;

// Debug-only printing helper: expands to eprintln! in tests and debug builds.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
