use serde_json::{Map, Value};

use terminal_size::{terminal_size, Width};

const MIN_COL_WIDTH: usize = 4;

/// Rows of a list-shaped payload: a bare array, or an object holding exactly
/// one array (`{"expedientes": [...], "total": 3}`).
fn extract_rows(val: &Value) -> Option<&Vec<Value>> {
    match val {
        Value::Array(arr) => Some(arr),
        Value::Object(map) => {
            let mut arrays = map.values().filter_map(|v| v.as_array());
            let first = arrays.next()?;
            if arrays.next().is_some() { None } else { Some(first) }
        }
        _ => None,
    }
}

/// Column names in first-seen order across all object rows.
fn columns(rows: &[Value]) -> Vec<String> {
    let mut cols: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for k in map.keys() {
                if !cols.contains(k) { cols.push(k.clone()); }
            }
        }
    }
    cols
}

fn cell(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => if *b { "sí".into() } else { "no".into() },
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

fn grid(rows: &[Value]) -> (Vec<String>, Vec<Vec<String>>) {
    let cols = columns(rows);
    if cols.is_empty() {
        let body = rows.iter().map(|r| vec![cell(Some(r))]).collect();
        return (vec!["valor".to_string()], body);
    }
    let empty = Map::new();
    let body = rows
        .iter()
        .map(|r| {
            let obj = r.as_object().unwrap_or(&empty);
            cols.iter().map(|c| cell(obj.get(c))).collect()
        })
        .collect();
    (cols, body)
}

/// Shrink the widest column until the table fits in `max_width`.
fn fit_widths(mut widths: Vec<usize>, max_width: usize) -> Vec<usize> {
    // "| " + cell + " " per column, plus the closing "|"
    let total = |w: &[usize]| w.iter().map(|x| x + 3).sum::<usize>() + 1;
    while total(&widths) > max_width {
        let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else { break };
        if widest <= MIN_COL_WIDTH { break; }
        widths[idx] = widest - 1;
    }
    widths
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn looks_numeric(s: &str) -> bool {
    let t = s.trim();
    !t.is_empty() && t.chars().any(|c| c.is_ascii_digit()) && t.chars().all(|c| c.is_ascii_digit() || ".-+,".contains(c))
}

fn separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(w + 2));
        s.push('+');
    }
    s
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let text = truncate(cells.get(i).map(|c| c.as_str()).unwrap_or(""), *w);
        let pad = " ".repeat(w.saturating_sub(text.chars().count()));
        if looks_numeric(&text) {
            s.push_str(&format!(" {}{} |", pad, text));
        } else {
            s.push_str(&format!(" {}{} |", text, pad));
        }
    }
    s
}

/// Render `val` as an ASCII table no wider than `max_width`. None when the
/// value is not list-shaped or has no rows.
pub fn render_table(val: &Value, max_width: usize) -> Option<Vec<String>> {
    let rows = extract_rows(val)?;
    if rows.is_empty() { return None; }
    let (cols, body) = grid(rows);
    let mut widths: Vec<usize> = cols.iter().map(|c| c.chars().count()).collect();
    for r in &body {
        for (i, c) in r.iter().enumerate() {
            widths[i] = widths[i].max(c.chars().count());
        }
    }
    let widths = fit_widths(widths, max_width);
    let sep = separator(&widths);
    let mut out = vec![sep.clone(), line(&cols, &widths), sep.clone()];
    out.extend(body.iter().map(|r| line(r, &widths)));
    out.push(sep);
    out.push(format!("filas: {}", body.len()));
    Some(out)
}

pub fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) if w > 4 => (w - 2) as usize,
        _ => 100,
    }
}

/// Print `val` as a table fitted to the terminal. Returns false when it is not
/// list-shaped, leaving the caller to print it some other way.
pub fn print_table(val: &Value) -> bool {
    let width = terminal_width();
    crate::tprintln!("[cli.table] terminal width={}", width);
    match render_table(val, width) {
        Some(lines) => {
            for l in lines { println!("{}", l); }
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_object_rows_in_key_order() {
        let v = json!([
            {"numero_expediente": "DICRI-1", "total": 3},
            {"numero_expediente": "DICRI-22", "total": 12, "urgencia": null}
        ]);
        let lines = render_table(&v, 200).unwrap();
        assert_eq!(lines[1], "| numero_expediente | total | urgencia |");
        assert_eq!(lines[3], "| DICRI-1           |     3 |          |");
        assert_eq!(lines.last().unwrap(), "filas: 2");
    }

    #[test]
    fn wrapped_list_is_found() {
        let v = json!({"expedientes": [{"id": 1}], "total": 1, "total_paginas": 1});
        assert!(render_table(&v, 80).is_some());
        assert!(render_table(&json!({"a": [], "b": []}), 80).is_none());
        assert!(render_table(&json!({"total": 1}), 80).is_none());
        assert!(render_table(&json!([]), 80).is_none());
    }

    #[test]
    fn fits_narrow_terminals() {
        let long = "x".repeat(120);
        let v = json!([{"descripcion": long, "id": 1}]);
        let lines = render_table(&v, 40).unwrap();
        assert!(lines.iter().take(5).all(|l| l.chars().count() <= 40));
        assert!(lines[3].contains('…'));
    }

    #[test]
    fn scalar_rows_use_single_column() {
        let lines = render_table(&json!(["crear_expediente", "ver_expedientes"]), 80).unwrap();
        assert_eq!(lines[1], "| valor            |");
    }
}
