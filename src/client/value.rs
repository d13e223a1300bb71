/*!
value.rs - store reply model + human-readable rendering.

`Value` is the nested scalar/collection shape a command reply carries.
`to_display_string` turns it into console text following the usual
redis-cli conventions:
  (nil) / (integer) / quoted bulk strings / (error) / numbered arrays

Command-level error replies (e.g. `ERR unknown command`) are ordinary
`Value::Error` payloads; transport failures live in `ConnectionError`.
*/

/// One reply from the store. Arbitrarily nested via `Array`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nil,
    /// Simple status line such as `OK` or `PONG`.
    Status(String),
    Int(i64),
    Bulk(String),
    Array(Vec<Value>),
    /// Error reply produced by the store itself.
    Error(String),
}

impl Value {
    /// Render this value as console text. Pure; never prints.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Nil => "(nil)".to_string(),
            Value::Status(line) => line.clone(),
            Value::Int(n) => format!("(integer) {n}"),
            Value::Bulk(text) => format!("\"{}\"", escape(text)),
            Value::Error(msg) => format!("(error) {msg}"),
            Value::Array(items) if items.is_empty() => "(empty array)".to_string(),
            Value::Array(items) => render_array(items, 0),
        }
    }
}

/// Numbered, indentation-aligned array rendering:
///
/// ```text
/// 1) 1) "a"
///    2) "b"
/// 2) "c"
/// ```
fn render_array(items: &[Value], indent: usize) -> String {
    let width = items.len().to_string().len();
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(&" ".repeat(indent));
        }
        let label = format!("{:>width$}) ", i + 1);
        out.push_str(&label);
        match item {
            Value::Array(inner) if !inner.is_empty() => {
                out.push_str(&render_array(inner, indent + label.len()));
            }
            other => out.push_str(&other.to_display_string()),
        }
    }
    out
}

/// Escape a bulk string minimally for quoted display.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/* --------------------------------- Tests ---------------------------------- */
