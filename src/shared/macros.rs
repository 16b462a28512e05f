/***************************************/
/*               Macros                */
/***************************************/

/**
 * Unwraps a `Result` in the binary's setup and teardown paths, or logs the
 * error and exits with status 1. `context` names the step that failed.
 */
#[macro_export]
macro_rules! unwrap_or_exit {
    ($expr:expr, $context:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => {
                log::error!("elevator-sim: {} failed: {}", $context, e);
                std::process::exit(1);
            }
        }
    };
}
