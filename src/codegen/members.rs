//! Method and signal strategies (§4.D): per-member marshal/dispatch
//! wrappers, reply emitters, and descriptor arrays.

use crate::codegen::error_tails;
use crate::config::{GeneratorConfig, Mode};
use crate::error::Result;
use crate::group::TypeGroup;
use crate::model::{Method, Signal, Style};
use crate::naming::{camel_to_snake, indent};
use crate::types::TypeNode;

fn iface_symbol(interface: &str) -> String {
    interface.replace('.', "_")
}

/// One fully rendered member: everything the interface aggregator and
/// output assembler need to place it.
pub struct MemberArtifacts {
    /// Static `NihDBusArg[]` descriptor array.
    pub args_array: String,
    /// Name of the args array (for the method/signal table entry).
    pub args_symbol: String,
    /// Extern prototype for the user-supplied handler (object mode, methods
    /// only).
    pub extern_prototype: Option<String>,
    /// Static prototype for the marshal/dispatch function.
    pub prototype: String,
    /// The function body/bodies to emit (marshal wrapper, reply emitter,
    /// proxy dispatch, or signal emitter — whichever applies).
    pub functions: Vec<String>,
    /// Name of the marshal function (object mode method table entry); `None`
    /// in proxy mode, where the table itself isn't emitted.
    pub marshal_symbol: Option<String>,
}

fn args_array(interface: &str, member: &str, args: &[TypeNode]) -> (String, String) {
    let symbol = format!("{}_{member}_args", iface_symbol(interface));
    let mut body = String::new();
    for arg in args {
        let dir = match arg.direction {
            Some(crate::types::Direction::Out) => "NIH_DBUS_ARG_OUT",
            _ => "NIH_DBUS_ARG_IN",
        };
        body.push_str(&format!(
            "\t{{ \"{name}\", \"{sig}\", {dir} }},\n",
            name = arg.name,
            sig = arg.signature(),
        ));
    }
    body.push_str("\t{ NULL }\n");
    (
        format!("const NihDBusArg {symbol}[] = {{\n{body}}};\n"),
        symbol,
    )
}

/// Renders a `Method`'s object-mode marshal wrapper (plus async reply
/// emitter) or proxy-mode dispatch wrapper, according to `config.mode`.
pub struct MethodCodegen<'a> {
    pub interface: &'a str,
    pub method: &'a Method,
    pub config: &'a GeneratorConfig,
}

impl<'a> MethodCodegen<'a> {
    fn handler_name(&self) -> String {
        format!("{}_{}", self.config.extern_prefix, camel_to_snake(&self.method.name))
    }

    fn marshal_symbol(&self) -> String {
        format!("{}_{}_marshal", iface_symbol(self.interface), self.method.name)
    }

    fn reply_symbol(&self) -> String {
        format!("{}_reply", self.handler_name())
    }

    pub fn render(&self) -> Result<MemberArtifacts> {
        let in_nodes: Vec<TypeNode> = self.method.in_args().map(|a| a.node.clone()).collect();
        let out_nodes: Vec<TypeNode> = self.method.out_args().map(|a| a.node.clone()).collect();
        let (args_array, args_symbol) = args_array(self.interface, &self.method.name, &self.method.args.iter().map(|a| a.node.clone()).collect::<Vec<_>>());

        match self.config.mode {
            Mode::Object => self.render_object(in_nodes, out_nodes, args_array, args_symbol),
            Mode::Proxy => self.render_proxy(in_nodes, out_nodes, args_array, args_symbol),
        }
    }

    fn render_object(
        &self,
        in_nodes: Vec<TypeNode>,
        out_nodes: Vec<TypeNode>,
        args_array: String,
        args_symbol: String,
    ) -> Result<MemberArtifacts> {
        let marshal_symbol = self.marshal_symbol();
        let handler_name = self.handler_name();
        let in_group = TypeGroup::new(&in_nodes, false, false);
        let out_group = TypeGroup::new(&out_nodes, false, false);

        let mut decls = String::new();
        for (ty, name) in in_group.vars() {
            decls.push_str(&format!("\t{ty} {name};\n"));
        }
        for (ty, name) in in_group.locals() {
            decls.push_str(&format!("\t{ty} {name};\n"));
        }
        let is_async = self.method.style == Style::Async;
        if !is_async {
            for (ty, name) in out_group.vars() {
                decls.push_str(&format!("\t{ty} {name};\n"));
            }
        }

        let type_error = error_tails::object_in_args_type_error(&self.method.name);
        let mem_error = error_tails::need_memory();
        let marshal_in = indent(&in_group.marshal("iter", "message", &type_error, mem_error), 1);

        let mut call_args = vec!["object->data".to_string(), "message".to_string()];
        call_args.extend(in_nodes.iter().map(|n| n.name.clone()));
        if !is_async {
            call_args.extend(out_nodes.iter().map(|n| format!("&{}", n.name)));
        }
        let call = format!("ret = {handler_name} ({args});\n", args = call_args.join(", "));

        let failure = "\
if (ret < 0) {
\tNihError *err;

\terr = nih_error_get ();
\tif (err->number == ENOMEM) {
\t\tnih_free (err);

\t\treturn DBUS_HANDLER_RESULT_NEED_MEMORY;
\t} else if (err->number == NIH_DBUS_ERROR) {
\t\tNihDBusError *dbus_err = (NihDBusError *) err;

\t\treply = dbus_message_new_error (message->message, dbus_err->name, err->message);
\t\tnih_free (err);

\t\tif (! reply)
\t\t\treturn DBUS_HANDLER_RESULT_NEED_MEMORY;

\t\tgoto send;
\t} else {
\t\treply = dbus_message_new_error (message->message, DBUS_ERROR_FAILED, err->message);
\t\tnih_free (err);

\t\tif (! reply)
\t\t\treturn DBUS_HANDLER_RESULT_NEED_MEMORY;

\t\tgoto send;
\t}
}
";

        let mut body = String::new();
        body.push_str("nih_assert (object != NULL);\nnih_assert (message != NULL);\n\n");
        body.push_str("dbus_message_iter_init (message->message, &iter);\n\n");
        body.push_str(&marshal_in);
        body.push('\n');
        body.push_str(&call);
        body.push('\n');
        body.push_str(failure);

        let mut functions = Vec::new();

        if is_async {
            body.push_str("\nreturn DBUS_HANDLER_RESULT_NOT_YET_HANDLED;\n");
        } else {
            body.push_str("\nif (dbus_message_get_no_reply (message->message))\n\treturn DBUS_HANDLER_RESULT_HANDLED;\n\n");
            body.push_str("reply = dbus_message_new_method_return (message->message);\nif (! reply)\n\treturn DBUS_HANDLER_RESULT_NEED_MEMORY;\n\n");
            body.push_str("dbus_message_iter_init_append (reply, &reply_iter);\n\n");
            body.push_str(&out_group.dispatch("reply_iter", mem_error));
        }

        // Reachable via `goto send` from the failure branch in both styles —
        // even an async method sends an error reply if the handler call
        // itself fails synchronously.
        body.push_str("\nsend:\n");
        body.push_str(
            "if (! dbus_connection_send (message->conn, reply, NULL)) {\n\
             \tdbus_message_unref (reply);\n\treturn DBUS_HANDLER_RESULT_NEED_MEMORY;\n}\n\n\
             dbus_message_unref (reply);\n\nreturn DBUS_HANDLER_RESULT_HANDLED;\n",
        );

        if is_async {
            let marshal_fn = format!(
                "static DBusHandlerResult\n{marshal_symbol} (NihDBusObject *  object,\n{pad}NihDBusMessage *message)\n{{\n\
                 \tDBusMessageIter iter;\n\tDBusMessage *   reply;\n\tint             ret;\n{decls}\n{body}}}\n",
                pad = " ".repeat(marshal_symbol.len() + 10),
            );
            functions.push(marshal_fn);
            functions.push(self.render_reply(&out_group, &out_nodes)?);
        } else {
            let marshal_fn = format!(
                "static DBusHandlerResult\n{marshal_symbol} (NihDBusObject *  object,\n{pad}NihDBusMessage *message)\n{{\n\
                 \tDBusMessageIter iter;\n\tDBusMessageIter reply_iter;\n\tDBusMessage *   reply;\n\tint             ret;\n{decls}\n{body}}}\n",
                pad = " ".repeat(marshal_symbol.len() + 10),
            );
            functions.push(marshal_fn);
        }

        Ok(MemberArtifacts {
            args_array,
            args_symbol,
            extern_prototype: Some(format!(
                "extern int {handler_name} (void *data, NihDBusMessage *message{sep}{args});",
                sep = if in_nodes.is_empty() && (is_async || out_nodes.is_empty()) { "" } else { ", " },
                args = self.handler_signature_tail(&in_nodes, &out_nodes, is_async),
            )),
            prototype: format!("static DBusHandlerResult {marshal_symbol} (NihDBusObject *object, NihDBusMessage *message);"),
            functions,
            marshal_symbol: Some(marshal_symbol),
        })
    }

    fn handler_signature_tail(&self, in_nodes: &[TypeNode], out_nodes: &[TypeNode], is_async: bool) -> String {
        let mut parts = Vec::new();
        for n in in_nodes {
            parts.push(format!("{} {}", n.kind.native_type(), n.name));
        }
        if !is_async {
            for n in out_nodes {
                parts.push(format!("{} *{}", n.kind.native_type(), n.name));
            }
        }
        parts.join(", ")
    }

    fn render_reply(&self, out_group: &TypeGroup, out_nodes: &[TypeNode]) -> Result<String> {
        let reply_symbol = self.reply_symbol();
        let mut params = vec!["NihDBusMessage *message".to_string()];
        for n in out_nodes {
            params.push(format!("{} {}", n.kind.native_type(), n.name));
        }
        let mem_error = error_tails::need_memory();
        let dispatch = indent(&out_group.dispatch("iter", mem_error), 1);

        Ok(format!(
            "int\n{reply_symbol} ({params})\n{{\n\
             \tDBusMessage *   reply;\n\tDBusMessageIter iter;\n\n\
             \tnih_assert (message != NULL);\n\n\
             \tif (dbus_message_get_no_reply (message->message)) {{\n\t\tnih_free (message);\n\t\treturn 0;\n\t}}\n\n\
             \treply = dbus_message_new_method_return (message->message);\n\tif (! reply)\n\t\treturn -1;\n\n\
             \tdbus_message_iter_init_append (reply, &iter);\n\n\
             {dispatch}\n\
             \tif (! dbus_connection_send (message->conn, reply, NULL)) {{\n\t\tdbus_message_unref (reply);\n\t\treturn -1;\n\t}}\n\n\
             \tdbus_message_unref (reply);\n\tnih_free (message);\n\n\treturn 0;\n}}\n",
            params = params.join(",\n\t"),
        ))
    }

    fn render_proxy(
        &self,
        in_nodes: Vec<TypeNode>,
        out_nodes: Vec<TypeNode>,
        args_array: String,
        args_symbol: String,
    ) -> Result<MemberArtifacts> {
        let dispatch_symbol = self.handler_name();
        let in_group = TypeGroup::new(&in_nodes, false, true);
        let out_group = TypeGroup::new(&out_nodes, true, false);

        let mut params = vec!["NihDBusProxy *proxy".to_string()];
        for (ty, name) in in_group.vars() {
            params.push(format!("{ty} {name}"));
        }
        for (ty, name) in out_group.vars() {
            params.push(format!("{ty} {name}"));
        }

        let mut decls = String::new();
        for (ty, name) in in_group.locals() {
            decls.push_str(&format!("\t{ty} {name};\n"));
        }

        let mem_in = error_tails::proxy_in_args_mem_error();
        let dispatch_in = indent(&in_group.dispatch("iter", &mem_in), 0);

        let type_out = error_tails::proxy_out_args_type_error();
        let mem_out = error_tails::proxy_out_args_mem_error();
        let marshal_out = indent(&out_group.marshal("iter", "reply", &type_out, &mem_out), 0);

        let body = format!(
            "\tDBusMessage *   method_call;\n\tDBusMessageIter iter;\n\tDBusMessage *   reply;\n\tDBusError       error;\n\n\
             \tnih_assert (proxy != NULL);\n\n\
             \tmethod_call = dbus_message_new_method_call (proxy->name, proxy->path,\n\t                                             \"{iface}\", \"{member}\");\n\
             \tif (! method_call)\n\t\tnih_return_no_memory_error (-1);\n\n\
             \tdbus_message_iter_init_append (method_call, &iter);\n\n\
             {dispatch_in}\n\
             \tdbus_error_init (&error);\n\n\
             \treply = dbus_connection_send_with_reply_and_block (proxy->conn, method_call,\n\t                                                    NIH_DBUS_TIMEOUT_DEFAULT, &error);\n\
             \tif (! reply) {{\n\t\tdbus_message_unref (method_call);\n\n\
             \t\tif (dbus_error_has_name (&error, DBUS_ERROR_NO_MEMORY)) {{\n\t\t\tdbus_error_free (&error);\n\t\t\tnih_return_no_memory_error (-1);\n\t\t}} else {{\n\
             \t\t\tnih_dbus_error_raise (error.name, error.message);\n\t\t\tdbus_error_free (&error);\n\t\t\treturn -1;\n\t\t}}\n\t}}\n\n\
             \tdbus_message_unref (method_call);\n\n\
             \tdbus_message_iter_init (reply, &iter);\n\n\
             {marshal_out}\n\
             \tdbus_message_unref (reply);\n\n\treturn 0;\n",
            iface = self.interface,
            member = self.method.name,
        );

        let function = format!(
            "int\n{dispatch_symbol} ({params})\n{{\n{decls}\n{body}}}\n",
            params = params.join(",\n\t"),
        );

        Ok(MemberArtifacts {
            args_array,
            args_symbol,
            extern_prototype: None,
            prototype: format!("int {dispatch_symbol} ({params});", params = params.join(", ")),
            functions: vec![function],
            marshal_symbol: None,
        })
    }
}

/// Renders a `Signal`'s object-mode emitter. Proxy-mode signal handling is
/// unimplemented (§9 open questions): `render_proxy` returns `Ok(None)`
/// rather than inventing semantics.
pub struct SignalCodegen<'a> {
    pub interface: &'a str,
    pub signal: &'a Signal,
    pub config: &'a GeneratorConfig,
}

impl<'a> SignalCodegen<'a> {
    fn emit_symbol(&self) -> String {
        format!("{}_{}", self.config.extern_prefix, camel_to_snake(&self.signal.name))
    }

    pub fn render(&self) -> Result<Option<MemberArtifacts>> {
        match self.config.mode {
            Mode::Proxy => Ok(None),
            Mode::Object => Ok(Some(self.render_object()?)),
        }
    }

    fn render_object(&self) -> Result<MemberArtifacts> {
        let nodes: Vec<TypeNode> = self.signal.args.iter().map(|a| a.node.clone()).collect();
        let (args_array, args_symbol) = args_array(self.interface, &self.signal.name, &nodes);
        let symbol = self.emit_symbol();
        let group = TypeGroup::new(&nodes, false, true);

        let mut params = vec!["DBusConnection *connection".to_string(), "const char *    origin_path".to_string()];
        for (ty, name) in group.vars() {
            params.push(format!("{ty} {name}"));
        }

        let mem_error = error_tails::need_memory();
        let dispatch = indent(&group.dispatch("iter", mem_error), 1);

        let function = format!(
            "int\n{symbol} ({params})\n{{\n\
             \tDBusMessage *   signal;\n\tDBusMessageIter iter;\n\n\
             \tnih_assert (connection != NULL);\n\tnih_assert (origin_path != NULL);\n\n\
             \tsignal = dbus_message_new_signal (origin_path, \"{iface}\", \"{member}\");\n\
             \tif (! signal)\n\t\tnih_return_no_memory_error (-1);\n\n\
             \tdbus_message_iter_init_append (signal, &iter);\n\n\
             {dispatch}\n\
             \tif (! dbus_connection_send (connection, signal, NULL)) {{\n\t\tdbus_message_unref (signal);\n\t\tnih_return_no_memory_error (-1);\n\t}}\n\n\
             \tdbus_message_unref (signal);\n\n\treturn 0;\n}}\n",
            params = params.join(",\n\t"),
            iface = self.interface,
            member = self.signal.name,
        );

        Ok(MemberArtifacts {
            args_array,
            args_symbol,
            extern_prototype: None,
            prototype: format!("int {symbol} ({params});", params = params.join(", ")),
            functions: vec![function],
            marshal_symbol: None,
        })
    }
}
