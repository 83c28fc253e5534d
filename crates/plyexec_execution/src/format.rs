use crate::knot::DataKnot;
use plyexec_vector::scalar::ScalarValue;
use std::fmt;

/// Plain renderer for knot contents. Collections of records come out as a
/// small table, everything else as a value literal.
impl fmt::Display for DataKnot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Ok(value) => write_value(f, &value),
            Err(_) => write!(f, "#invalid"),
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &ScalarValue) -> fmt::Result {
    match value {
        ScalarValue::List(rows) if rows.iter().all(is_tuple) && !rows.is_empty() => {
            write_table(f, rows)
        }
        other => write_scalar(f, other),
    }
}

fn is_tuple(value: &ScalarValue) -> bool {
    matches!(value, ScalarValue::Tuple { .. })
}

fn write_table(f: &mut fmt::Formatter<'_>, rows: &[ScalarValue]) -> fmt::Result {
    if let ScalarValue::Tuple { labels, .. } = &rows[0] {
        if !labels.is_empty() {
            let header: Vec<_> = labels.iter().map(|l| l.to_string()).collect();
            writeln!(f, "{}", header.join(" | "))?;
        }
    }
    for row in rows {
        if let ScalarValue::Tuple { values, .. } = row {
            let mut first = true;
            for value in values {
                if !first {
                    write!(f, " | ")?;
                }
                first = false;
                write_scalar(f, value)?;
            }
            writeln!(f)?;
        }
    }
    Ok(())
}

fn write_scalar(f: &mut fmt::Formatter<'_>, value: &ScalarValue) -> fmt::Result {
    match value {
        ScalarValue::Missing => write!(f, "missing"),
        ScalarValue::Unit => write!(f, "()"),
        ScalarValue::Bool(v) => write!(f, "{v}"),
        ScalarValue::Int64(v) => write!(f, "{v}"),
        ScalarValue::Float64(v) => write!(f, "{v}"),
        ScalarValue::Utf8(v) => write!(f, "{v}"),
        ScalarValue::List(vals) => {
            write!(f, "[")?;
            for (idx, val) in vals.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write_scalar(f, val)?;
            }
            write!(f, "]")
        }
        ScalarValue::Tuple { labels, values } => {
            write!(f, "(")?;
            for (idx, val) in values.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                if let Some(label) = labels.get(idx) {
                    write!(f, "{label} = ")?;
                }
                write_scalar(f, val)?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::knot::DataKnot;

    #[test]
    fn scalar_display() {
        assert_eq!("42", DataKnot::new(42).to_string());
        assert_eq!("missing", DataKnot::missing().to_string());
    }

    #[test]
    fn list_display() {
        assert_eq!("[1, 2, 3]", DataKnot::from_values([1, 2, 3]).to_string());
    }

    #[test]
    fn record_display() {
        let knot =
            DataKnot::record([("x", DataKnot::new(1)), ("y", DataKnot::new(2))]).unwrap();
        assert_eq!("(x = 1, y = 2)", knot.to_string());
    }
}
