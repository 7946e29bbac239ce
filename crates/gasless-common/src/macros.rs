/// Log the error carried by a `Result` without consuming it. Errors for which `$remote`
/// holds are logged as warnings since they come from the remote service itself, every
/// other error is logged at error level.
#[macro_export]
macro_rules! log_if_error {
    ($e: expr) => {
        $crate::log_if_error!($e, |_| false)
    };
    ($e: expr, $remote: expr) => {{
        let result = $e;
        if let Err(ref error) = result {
            #[allow(clippy::redundant_closure_call)]
            if ($remote)(error) {
                $crate::tracing::warn!(message=%error);
            } else {
                $crate::tracing::error!(message=%error);
            }
        }
        result
    }};
}
