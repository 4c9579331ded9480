/*
 Custom debug! macro so that evaluation traces stay out of release builds
 without raising the log crate's max level for every dependency.
*/

#[macro_export]
macro_rules! q_debug {
    (target: $target:expr, $($arg:tt)+) => (
        #[cfg(debug_assertions)]
        $crate::log::info!(target: $target, $($arg)+)
    );
    ($($arg:tt)+) => (
        #[cfg(debug_assertions)]
        $crate::log::info!($($arg)+)
    )
}
