//! DuckDB doesn't expose a `ToSql` binding for its fixed-size `FLOAT[N]`
//! array type through duckdb-rs, so vector literals are written inline as
//! SQL array syntax (`[0.1, 0.2, ...]`). This is safe against injection
//! because every value going through here is a `f32` produced by our own
//! embedder or read back out of the database — never attacker-controlled
//! text — and `Display` on `f32` can't emit anything but digits, `.`, `-`,
//! `e`, `inf`, or `nan`.

pub fn literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 10 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format_component(*v));
    }
    out.push(']');
    out
}

fn format_component(v: f32) -> String {
    if v.is_nan() || v.is_infinite() {
        "0.0".to_string()
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_simple_vector() {
        assert_eq!(literal(&[1.0, -0.5, 2.25]), "[1,-0.5,2.25]");
    }

    #[test]
    fn empty_vector_is_empty_brackets() {
        assert_eq!(literal(&[]), "[]");
    }

    #[test]
    fn rejects_nan_and_infinity() {
        assert_eq!(literal(&[f32::NAN, f32::INFINITY]), "[0.0,0.0]");
    }
}
