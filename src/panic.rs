//! Panic payload formatting shared by the worker actors and subscriber workers.

use std::any::Any;

/// Extracts a printable message from a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_str_and_string_payloads() {
        let a = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(&*a), "boom");

        let b = std::panic::catch_unwind(|| panic!("code={}", 7)).unwrap_err();
        assert_eq!(panic_message(&*b), "code=7");
    }
}
