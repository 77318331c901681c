//! The syntactic error-tail continuations spliced verbatim into marshal and
//! dispatch blocks (§7, §9 "code strings as values"). These are plain text:
//! they may contain `goto`/`return`/multiple statements and are never
//! re-parsed by the engine that interpolates them.

/// Object-mode marshal, reading in-args: a bad wire type builds an
/// `INVALID_ARGS` error reply and jumps to the reply-send tail.
pub fn object_in_args_type_error(member: &str) -> String {
    format!(
        "\
reply = dbus_message_new_error (message->message, DBUS_ERROR_INVALID_ARGS,
\t\t\t\t\"Invalid arguments to {member} method\");
if (! reply) {{
\treturn DBUS_HANDLER_RESULT_NEED_MEMORY;
}}

goto send;"
    )
}

/// Object-mode marshal/dispatch: any allocation/append failure returns the
/// "needs more memory" handler result so the caller retries.
pub fn need_memory() -> &'static str {
    "return DBUS_HANDLER_RESULT_NEED_MEMORY;"
}

/// Proxy-mode dispatch of in-args: free the outgoing message and report OOM.
pub fn proxy_in_args_mem_error() -> String {
    "\
dbus_message_unref (method_call);
nih_return_no_memory_error (-1);"
        .to_string()
}

/// Proxy-mode marshal of the reply's out-args on a type mismatch: free the
/// reply and raise the NIH binding's own `INVALID_ARGS` error, distinct from
/// the core `DBUS_ERROR_INVALID_ARGS` family object-mode raises.
pub fn proxy_out_args_type_error() -> String {
    "\
dbus_message_unref (reply);
nih_return_error (-1, NIH_DBUS_INVALID_ARGS, NIH_DBUS_INVALID_ARGS_STR);"
        .to_string()
}

/// Proxy-mode marshal of the reply's out-args on an allocation failure: free
/// the reply and raise OOM.
pub fn proxy_out_args_mem_error() -> String {
    "\
dbus_message_unref (reply);
nih_return_no_memory_error (-1);"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_out_args_type_error_is_the_atomic_nih_return_error_macro() {
        let tail = proxy_out_args_type_error();
        assert!(tail.contains("nih_return_error (-1, NIH_DBUS_INVALID_ARGS, NIH_DBUS_INVALID_ARGS_STR);"));
        assert!(!tail.contains("nih_dbus_error_raise"));
        assert!(!tail.contains("DBUS_ERROR_INVALID_ARGS"));
    }

    #[test]
    fn object_in_args_type_error_uses_core_invalid_args_constant() {
        let tail = object_in_args_type_error("Ping");
        assert!(tail.contains("DBUS_ERROR_INVALID_ARGS"));
        assert!(tail.contains("goto send;"));
    }
}
