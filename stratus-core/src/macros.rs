/// Cross-platform logging macro with explicit level selection.
///
/// On native (non-WASM) builds it forwards to [`tracing`] macros.
/// In WASM builds (e.g. browsers) it forwards to log crate macros.
/// During tests it prints to `stdout`, preserving the log level for context.
///
/// The logging crates are re-exported by `stratus-core`, so dependents can use
/// this macro without depending on `tracing` or `log` themselves.
///
/// # Examples
/// ```
/// use stratus_core::cross_log;
/// # fn main() {
/// cross_log!(info, "dispatching {} listeners", 3);
/// cross_log!(warn, "no listeners for {}", "auth");
/// # }
/// ```
///
/// [`tracing`]: https://docs.rs/tracing
#[macro_export]
macro_rules! cross_log {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(all(not(test), target_arch = "wasm32"))]
        $crate::__log::$level!($($arg)*);
        #[cfg(all(not(test), not(target_arch = "wasm32")))]
        $crate::__tracing::$level!($($arg)*);
        #[cfg(test)]
        println!("[{}] {}", stringify!($level), format_args!($($arg)*));
    };
}
